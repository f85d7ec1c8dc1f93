// ==========================================
// Localization (i18n)
// ==========================================
// rust-i18n; English (default) and Russian.
// The rust_i18n::i18n! macro is invoked in lib.rs.
// ==========================================

/// Active locale
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// Switch locale ("en" or "ru")
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// Translate a message key
///
/// # Example
/// ```no_run
/// use schedule_import::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// Translate a message key, substituting `%{name}` placeholders
///
/// # Example
/// ```no_run
/// use schedule_import::i18n::t_with_args;
/// let msg = t_with_args("import.file_not_found", &[("path", "/tmp/week.csv")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // locale is process-global and tests run in parallel
    pub(crate) static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("ru");
        assert_eq!(current_locale(), "ru");

        set_locale("en");
        assert_eq!(current_locale(), "en");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        assert_eq!(t("common.success"), "Operation successful");

        set_locale("ru");
        assert_eq!(t("common.success"), "Операция выполнена успешно");

        set_locale("en");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        let msg = t_with_args("import.file_not_found", &[("path", "/tmp/week.csv")]);
        assert!(msg.contains("/tmp/week.csv"));
        assert!(msg.contains("File not found"));

        set_locale("ru");
        let msg = t_with_args("import.file_not_found", &[("path", "/tmp/week.csv")]);
        assert!(msg.contains("/tmp/week.csv"));
        assert!(msg.contains("Файл не найден"));

        set_locale("en");
    }
}

// ==========================================
// Schedule Import - subject catalog model
// ==========================================
// Catalog entries are created lazily by imports and shared
// across all later imports.
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// SubjectCatalogEntry
// ==========================================
// `name` is unique, compared case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCatalogEntry {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub description: Option<String>,
    pub display_color: String,
    pub default_teacher_id: Option<i64>,
}

impl SubjectCatalogEntry {
    /// Unicode-aware, case-insensitive name comparison
    pub fn matches_name(&self, name: &str) -> bool {
        subject_name_key(&self.name) == subject_name_key(name)
    }
}

/// Uniqueness key of a subject name (stored in `subjects.name_key`)
pub fn subject_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Catalog entry waiting to be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub short_name: String,
    pub description: Option<String>,
    pub display_color: String,
    pub default_teacher_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_name_cyrillic_case() {
        let entry = SubjectCatalogEntry {
            id: 1,
            name: "Математика".to_string(),
            short_name: "Математика".to_string(),
            description: None,
            display_color: "#3B82F6".to_string(),
            default_teacher_id: None,
        };

        assert!(entry.matches_name("математика"));
        assert!(entry.matches_name("  МАТЕМАТИКА "));
        assert!(!entry.matches_name("Физика"));
    }

    #[test]
    fn test_name_key() {
        assert_eq!(subject_name_key("  Математика "), "математика");
        assert_eq!(subject_name_key("MATH"), subject_name_key("math"));
    }
}

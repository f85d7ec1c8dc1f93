// ==========================================
// Schedule Import - field normalization
// ==========================================
// RawFields -> CanonicalRow
// - day: Russian / English names, abbreviations, digits (Sunday = 0)
// - time: HH:MM, HH.MM, HHMM, HMM, HH:MM:SS -> zero-padded HH:MM
// ==========================================

use crate::domain::CanonicalRow;
use crate::importer::error::FieldError;
use crate::importer::header_resolver::{CanonicalField, RawFields};

// Index = day number (0 = Sunday)
const RU_FULL: [&str; 7] = [
    "воскресенье",
    "понедельник",
    "вторник",
    "среда",
    "четверг",
    "пятница",
    "суббота",
];
const RU_SHORT: [&str; 7] = ["вс", "пн", "вт", "ср", "чт", "пт", "сб"];
const EN_FULL: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];
const EN_SHORT: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Parse a day-of-week token
///
/// Digit strings are returned as-is; range checking happens in the validator.
pub fn parse_day(raw: &str) -> Result<i64, FieldError> {
    let token = raw.trim().trim_end_matches('.').trim();

    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        return token
            .parse::<i64>()
            .map_err(|_| FieldError::InvalidDay(raw.to_string()));
    }

    let lowered = token.to_lowercase();
    [RU_FULL, RU_SHORT, EN_FULL, EN_SHORT]
        .iter()
        .find_map(|names| names.iter().position(|n| *n == lowered))
        .map(|idx| idx as i64)
        .ok_or_else(|| FieldError::InvalidDay(raw.to_string()))
}

/// Parse a time token into zero-padded `HH:MM`
pub fn parse_time(field: CanonicalField, raw: &str) -> Result<String, FieldError> {
    let invalid = || FieldError::InvalidTime {
        field,
        value: raw.to_string(),
    };
    let token = raw.trim();

    let (hour, minute) = if let Some((h, rest)) = token.split_once(':') {
        // HH:MM or HH:MM:SS
        let m = match rest.split_once(':') {
            Some((m, s)) if is_digits(s, 1, 2) => m,
            Some(_) => return Err(invalid()),
            None => rest,
        };
        (h, m)
    } else if let Some((h, m)) = token.split_once('.') {
        (h, m)
    } else if is_digits(token, 3, 4) {
        // bare digits: last two are minutes
        token.split_at(token.len() - 2)
    } else {
        return Err(invalid());
    };

    if !is_digits(hour, 1, 2) || !is_digits(minute, 2, 2) {
        return Err(invalid());
    }

    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }

    Ok(format!("{:02}:{:02}", hour, minute))
}

fn is_digits(s: &str, min_len: usize, max_len: usize) -> bool {
    (min_len..=max_len).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
}

/// Normalize one row's raw fields
///
/// Absent fields stay absent; presence is the validator's concern.
pub fn normalize(fields: RawFields) -> Result<CanonicalRow, FieldError> {
    let day_of_week = match fields.day.as_deref() {
        Some(raw) => {
            let day = parse_day(raw)?;
            // i32 storage; anything wider is out of range anyway
            Some(i32::try_from(day).map_err(|_| FieldError::DayOutOfRange(day))?)
        }
        None => None,
    };

    let start_time = fields
        .start_time
        .as_deref()
        .map(|raw| parse_time(CanonicalField::StartTime, raw))
        .transpose()?;
    let end_time = fields
        .end_time
        .as_deref()
        .map(|raw| parse_time(CanonicalField::EndTime, raw))
        .transpose()?;

    let subject_id = fields
        .subject_id
        .as_deref()
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .map_err(|_| FieldError::InvalidSubjectId(raw.to_string()))
        })
        .transpose()?;

    Ok(CanonicalRow {
        source_row_number: fields.row_number,
        subject_name: fields.subject,
        day_of_week,
        start_time,
        end_time,
        room_number: fields.room,
        teacher_name: fields.teacher,
        subject_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_russian() {
        assert_eq!(parse_day("Понедельник").unwrap(), 1);
        assert_eq!(parse_day("пн").unwrap(), 1);
        assert_eq!(parse_day("ВС").unwrap(), 0);
        assert_eq!(parse_day("суббота").unwrap(), 6);
        assert_eq!(parse_day("Чт.").unwrap(), 4);
    }

    #[test]
    fn test_parse_day_english() {
        assert_eq!(parse_day("Monday").unwrap(), 1);
        assert_eq!(parse_day("MON").unwrap(), 1);
        assert_eq!(parse_day("sun").unwrap(), 0);
        assert_eq!(parse_day("Sat.").unwrap(), 6);
        assert_eq!(parse_day(" wednesday ").unwrap(), 3);
    }

    #[test]
    fn test_parse_day_digits_unchecked() {
        assert_eq!(parse_day("0").unwrap(), 0);
        assert_eq!(parse_day("5").unwrap(), 5);
        assert_eq!(parse_day("7").unwrap(), 7);
    }

    #[test]
    fn test_parse_day_rejects_unknown() {
        assert!(matches!(parse_day("Funday"), Err(FieldError::InvalidDay(_))));
        assert!(matches!(parse_day("-1"), Err(FieldError::InvalidDay(_))));
        assert!(matches!(parse_day("Mo"), Err(FieldError::InvalidDay(_))));
    }

    #[test]
    fn test_parse_time_notations() {
        let f = CanonicalField::StartTime;
        assert_eq!(parse_time(f, "09:05").unwrap(), "09:05");
        assert_eq!(parse_time(f, "9:05").unwrap(), "09:05");
        assert_eq!(parse_time(f, "9.05").unwrap(), "09:05");
        assert_eq!(parse_time(f, "0905").unwrap(), "09:05");
        assert_eq!(parse_time(f, "905").unwrap(), "09:05");
        assert_eq!(parse_time(f, "14:30:00").unwrap(), "14:30");
        assert_eq!(parse_time(f, " 23:59 ").unwrap(), "23:59");
    }

    #[test]
    fn test_parse_time_rejects() {
        let f = CanonicalField::EndTime;
        for bad in ["9-05", "25:00", "12:60", "9:5", "noon", "", "12345", "1:2:3:4"] {
            let err = parse_time(f, bad).unwrap_err();
            match err {
                FieldError::InvalidTime { field, value } => {
                    assert_eq!(field, CanonicalField::EndTime);
                    assert_eq!(value, bad);
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_normalize_full_row() {
        let fields = RawFields {
            row_number: 2,
            subject: Some("Math".to_string()),
            day: Some("пн".to_string()),
            start_time: Some("9.00".to_string()),
            end_time: Some("1030".to_string()),
            room: Some("101".to_string()),
            teacher: None,
            subject_id: Some(" 12 ".to_string()),
        };

        let row = normalize(fields).unwrap();
        assert_eq!(row.source_row_number, 2);
        assert_eq!(row.day_of_week, Some(1));
        assert_eq!(row.start_time.as_deref(), Some("09:00"));
        assert_eq!(row.end_time.as_deref(), Some("10:30"));
        assert_eq!(row.subject_id, Some(12));
        assert_eq!(row.teacher_name, None);
    }

    #[test]
    fn test_normalize_keeps_absent_fields_absent() {
        let row = normalize(RawFields {
            row_number: 3,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(row.subject_name, None);
        assert_eq!(row.day_of_week, None);
    }

    #[test]
    fn test_normalize_bad_subject_id() {
        let err = normalize(RawFields {
            row_number: 4,
            subject_id: Some("abc".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, FieldError::InvalidSubjectId("abc".to_string()));
    }
}

// ==========================================
// Schedule Import - row validation
// ==========================================
// CanonicalRow -> ValidatedRow
// Rules:
// - subject, day, start time, end time required (reported together)
// - day of week in [0, 6]
// - a pre-resolved subject id must exist
// ==========================================

use crate::domain::{CanonicalRow, ValidatedRow};
use crate::importer::error::FieldError;
use crate::importer::header_resolver::CanonicalField;
use std::collections::HashSet;

/// Existence check for pre-resolved subject ids
pub type SubjectExistsFn = Box<dyn Fn(i64) -> bool + Send + Sync>;

pub struct RowValidator {
    exists: SubjectExistsFn,
}

impl RowValidator {
    pub fn new(exists: SubjectExistsFn) -> Self {
        Self { exists }
    }

    /// Validator backed by a fixed id set
    pub fn with_known_ids(ids: HashSet<i64>) -> Self {
        Self::new(Box::new(move |id| ids.contains(&id)))
    }

    pub fn validate(&self, row: CanonicalRow) -> Result<ValidatedRow, FieldError> {
        let mut missing = Vec::new();
        if row.subject_name.is_none() {
            missing.push(CanonicalField::Subject);
        }
        if row.day_of_week.is_none() {
            missing.push(CanonicalField::Day);
        }
        if row.start_time.is_none() {
            missing.push(CanonicalField::StartTime);
        }
        if row.end_time.is_none() {
            missing.push(CanonicalField::EndTime);
        }

        let (Some(subject_name), Some(day_of_week), Some(start_time), Some(end_time)) = (
            row.subject_name,
            row.day_of_week,
            row.start_time,
            row.end_time,
        ) else {
            return Err(FieldError::MissingFields(missing));
        };

        if !(0..=6).contains(&day_of_week) {
            return Err(FieldError::DayOutOfRange(day_of_week as i64));
        }

        if let Some(id) = row.subject_id {
            if !(self.exists)(id) {
                return Err(FieldError::UnknownSubjectId(id));
            }
        }

        Ok(ValidatedRow {
            source_row_number: row.source_row_number,
            subject_name,
            day_of_week,
            start_time,
            end_time,
            room_number: row.room_number,
            teacher_name: row.teacher_name,
            subject_id: row.subject_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_row() -> CanonicalRow {
        CanonicalRow {
            source_row_number: 2,
            subject_name: Some("Math".to_string()),
            day_of_week: Some(1),
            start_time: Some("09:00".to_string()),
            end_time: Some("10:30".to_string()),
            ..Default::default()
        }
    }

    fn validator() -> RowValidator {
        RowValidator::with_known_ids([1, 2, 3].into_iter().collect())
    }

    #[test]
    fn test_valid_row() {
        let validated = validator().validate(complete_row()).unwrap();
        assert_eq!(validated.subject_name, "Math");
        assert_eq!(validated.day_of_week, 1);
        assert_eq!(validated.room_number, None);
    }

    #[test]
    fn test_missing_fields_reported_together() {
        let row = CanonicalRow {
            source_row_number: 3,
            day_of_week: Some(2),
            start_time: Some("09:00".to_string()),
            ..Default::default()
        };
        let err = validator().validate(row).unwrap_err();
        assert_eq!(
            err,
            FieldError::MissingFields(vec![CanonicalField::Subject, CanonicalField::EndTime])
        );
        assert!(err.to_string().contains("Subject"));
    }

    #[test]
    fn test_day_out_of_range() {
        let mut row = complete_row();
        row.day_of_week = Some(7);
        assert_eq!(
            validator().validate(row).unwrap_err(),
            FieldError::DayOutOfRange(7)
        );
    }

    #[test]
    fn test_day_bounds_accepted() {
        for day in [0, 6] {
            let mut row = complete_row();
            row.day_of_week = Some(day);
            assert!(validator().validate(row).is_ok());
        }
    }

    #[test]
    fn test_subject_id_checked_against_existence_fn() {
        let mut row = complete_row();
        row.subject_id = Some(2);
        assert!(validator().validate(row.clone()).is_ok());

        row.subject_id = Some(99);
        assert_eq!(
            validator().validate(row).unwrap_err(),
            FieldError::UnknownSubjectId(99)
        );
    }
}

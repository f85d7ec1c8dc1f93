// ==========================================
// Schedule Import - header resolution
// ==========================================
// Source column label -> canonical field.
// 1. exact alias match (table order)
// 2. case-insensitive keyword search (discovery order),
//    skipping labels already claimed by an exact match
// ==========================================

use crate::domain::RawRow;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

// ==========================================
// CanonicalField
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalField {
    Subject,
    Day,
    StartTime,
    EndTime,
    Room,
    Teacher,
    SubjectId,
}

impl CanonicalField {
    pub const REQUIRED: [CanonicalField; 4] = [
        CanonicalField::Subject,
        CanonicalField::Day,
        CanonicalField::StartTime,
        CanonicalField::EndTime,
    ];

    /// Human-readable label used in row error messages
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalField::Subject => "Subject",
            CanonicalField::Day => "Day",
            CanonicalField::StartTime => "Start Time",
            CanonicalField::EndTime => "End Time",
            CanonicalField::Room => "Room",
            CanonicalField::Teacher => "Teacher",
            CanonicalField::SubjectId => "Subject ID",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==========================================
// HeaderAliasTable - immutable resolver configuration
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAliases {
    pub field: CanonicalField,
    pub exact: Vec<String>,    // matched verbatim (after trim)
    pub keywords: Vec<String>, // lowercase substrings
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderAliasTable {
    entries: Vec<FieldAliases>,
}

impl HeaderAliasTable {
    pub fn new(entries: Vec<FieldAliases>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut e| {
                e.keywords = e.keywords.iter().map(|k| k.to_lowercase()).collect();
                e
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[FieldAliases] {
        &self.entries
    }
}

fn aliases(field: CanonicalField, exact: &[&str], keywords: &[&str]) -> FieldAliases {
    FieldAliases {
        field,
        exact: exact.iter().map(|s| s.to_string()).collect(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
    }
}

impl Default for HeaderAliasTable {
    /// Bilingual (English/Russian) table
    fn default() -> Self {
        Self::new(vec![
            aliases(
                CanonicalField::Subject,
                &["Subject", "Предмет", "subject", "subjectName", "Дисциплина"],
                &["subject", "предмет", "дисциплин"],
            ),
            aliases(
                CanonicalField::Day,
                &["Day", "День", "Day of Week", "День недели", "dayOfWeek"],
                &["day", "день", "дата"],
            ),
            aliases(
                CanonicalField::StartTime,
                &["Start Time", "Начало", "Время начала", "startTime", "Start"],
                &["start", "начал", "begin", "from"],
            ),
            aliases(
                CanonicalField::EndTime,
                &["End Time", "Конец", "Время окончания", "endTime", "End"],
                &["end", "конец", "оконч", "finish"],
            ),
            aliases(
                CanonicalField::Room,
                &["Room", "Аудитория", "Кабинет", "roomNumber", "Room Number"],
                &["room", "ауд", "кабинет", "каб"],
            ),
            aliases(
                CanonicalField::Teacher,
                &["Teacher", "Преподаватель", "Учитель", "teacherName"],
                &["teacher", "преподав", "учител", "instructor"],
            ),
            aliases(
                CanonicalField::SubjectId,
                &["Subject ID", "subjectId", "subject_id", "ID предмета"],
                &["subject_id", "subjectid", "id предмета"],
            ),
        ])
    }
}

// ==========================================
// RawFields - one row read through resolved headers
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub row_number: usize,
    pub subject: Option<String>,
    pub day: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub room: Option<String>,
    pub teacher: Option<String>,
    pub subject_id: Option<String>,
}

// ==========================================
// ResolvedHeaders - resolution result, computed once per import
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedHeaders {
    columns: HashMap<CanonicalField, String>,
}

impl ResolvedHeaders {
    pub fn column(&self, field: CanonicalField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    pub fn is_resolved(&self, field: CanonicalField) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn unresolved_required(&self) -> Vec<CanonicalField> {
        CanonicalField::REQUIRED
            .iter()
            .copied()
            .filter(|f| !self.is_resolved(*f))
            .collect()
    }

    /// Read a row's cells for every resolved field (blank -> None)
    pub fn extract(&self, row: &RawRow) -> RawFields {
        let get = |field: CanonicalField| -> Option<String> {
            self.column(field)
                .and_then(|label| row.get(label))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        RawFields {
            row_number: row.row_number,
            subject: get(CanonicalField::Subject),
            day: get(CanonicalField::Day),
            start_time: get(CanonicalField::StartTime),
            end_time: get(CanonicalField::EndTime),
            room: get(CanonicalField::Room),
            teacher: get(CanonicalField::Teacher),
            subject_id: get(CanonicalField::SubjectId),
        }
    }
}

// ==========================================
// HeaderResolver
// ==========================================
pub struct HeaderResolver {
    table: HeaderAliasTable,
}

impl HeaderResolver {
    pub fn new(table: HeaderAliasTable) -> Self {
        Self { table }
    }

    /// Resolve discovered header labels to canonical fields
    pub fn resolve(&self, headers: &[String]) -> ResolvedHeaders {
        let trimmed: Vec<&str> = headers.iter().map(|h| h.trim()).collect();
        let mut columns: HashMap<CanonicalField, String> = HashMap::new();
        let mut claimed: HashSet<usize> = HashSet::new();

        // pass 1: exact aliases
        for entry in self.table.entries() {
            let hit = entry.exact.iter().find_map(|alias| {
                trimmed
                    .iter()
                    .position(|h| *h == alias.trim())
                    .filter(|idx| !claimed.contains(idx))
            });
            if let Some(idx) = hit {
                claimed.insert(idx);
                columns.insert(entry.field, headers[idx].clone());
            }
        }

        // pass 2: keyword search
        for entry in self.table.entries() {
            if columns.contains_key(&entry.field) {
                continue;
            }
            let hit = trimmed.iter().enumerate().find(|(idx, h)| {
                if claimed.contains(idx) {
                    return false;
                }
                let lower = h.to_lowercase();
                entry.keywords.iter().any(|k| lower.contains(k.as_str()))
            });
            if let Some((idx, _)) = hit {
                claimed.insert(idx);
                columns.insert(entry.field, headers[idx].clone());
            }
        }

        let resolved = ResolvedHeaders { columns };
        debug!(resolved = ?resolved.columns, "headers resolved");

        let missing = resolved.unresolved_required();
        if !missing.is_empty() {
            warn!(
                missing = ?missing,
                headers = ?headers,
                "required columns could not be resolved"
            );
        }

        resolved
    }
}

impl Default for HeaderResolver {
    fn default() -> Self {
        Self::new(HeaderAliasTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_english() {
        let resolver = HeaderResolver::default();
        let resolved = resolver.resolve(&labels(&["Subject", "Day", "Start Time", "End Time", "Room"]));

        assert_eq!(resolved.column(CanonicalField::Subject), Some("Subject"));
        assert_eq!(resolved.column(CanonicalField::StartTime), Some("Start Time"));
        assert_eq!(resolved.column(CanonicalField::Room), Some("Room"));
        assert_eq!(resolved.column(CanonicalField::Teacher), None);
        assert!(resolved.unresolved_required().is_empty());
    }

    #[test]
    fn test_exact_russian() {
        let resolver = HeaderResolver::default();
        let resolved = resolver.resolve(&labels(&[
            "Предмет",
            "День недели",
            "Время начала",
            "Время окончания",
            "Аудитория",
            "Преподаватель",
        ]));

        assert_eq!(resolved.column(CanonicalField::Subject), Some("Предмет"));
        assert_eq!(resolved.column(CanonicalField::Day), Some("День недели"));
        assert_eq!(resolved.column(CanonicalField::EndTime), Some("Время окончания"));
        assert_eq!(resolved.column(CanonicalField::Teacher), Some("Преподаватель"));
    }

    #[test]
    fn test_keyword_fallback_case_insensitive() {
        let resolver = HeaderResolver::default();
        let resolved = resolver.resolve(&labels(&[
            "SUBJECT NAME",
            "Week DAY",
            "Lesson start",
            "Lesson END",
            "Номер аудитории",
        ]));

        assert_eq!(resolved.column(CanonicalField::Subject), Some("SUBJECT NAME"));
        assert_eq!(resolved.column(CanonicalField::Day), Some("Week DAY"));
        assert_eq!(resolved.column(CanonicalField::StartTime), Some("Lesson start"));
        assert_eq!(resolved.column(CanonicalField::EndTime), Some("Lesson END"));
        assert_eq!(resolved.column(CanonicalField::Room), Some("Номер аудитории"));
    }

    #[test]
    fn test_keyword_takes_first_in_discovery_order() {
        let resolver = HeaderResolver::default();
        let resolved = resolver.resolve(&labels(&["Дата занятия", "День"]));
        // "День" is an exact alias and wins over the keyword candidate
        assert_eq!(resolved.column(CanonicalField::Day), Some("День"));

        let resolved = resolver.resolve(&labels(&["Дата занятия", "Weekday"]));
        assert_eq!(resolved.column(CanonicalField::Day), Some("Дата занятия"));
    }

    #[test]
    fn test_exact_claim_not_reused_by_keyword() {
        let resolver = HeaderResolver::default();
        let resolved = resolver.resolve(&labels(&["Subject ID", "Subject title"]));

        assert_eq!(resolved.column(CanonicalField::SubjectId), Some("Subject ID"));
        assert_eq!(resolved.column(CanonicalField::Subject), Some("Subject title"));
    }

    #[test]
    fn test_labels_with_whitespace() {
        let resolver = HeaderResolver::default();
        let resolved = resolver.resolve(&labels(&["  Subject ", "Day"]));
        assert_eq!(resolved.column(CanonicalField::Subject), Some("  Subject "));
    }

    #[test]
    fn test_extract_trims_and_drops_blank() {
        let resolver = HeaderResolver::default();
        let headers = labels(&["Subject", "Day", "Room"]);
        let resolved = resolver.resolve(&headers);

        let mut row = RawRow {
            row_number: 2,
            cells: HashMap::new(),
        };
        row.cells.insert("Subject".to_string(), "  Math ".to_string());
        row.cells.insert("Day".to_string(), "Monday".to_string());
        row.cells.insert("Room".to_string(), "   ".to_string());

        let fields = resolved.extract(&row);
        assert_eq!(fields.row_number, 2);
        assert_eq!(fields.subject.as_deref(), Some("Math"));
        assert_eq!(fields.day.as_deref(), Some("Monday"));
        assert_eq!(fields.room, None);
        assert_eq!(fields.start_time, None);
    }

    #[test]
    fn test_custom_table_injected() {
        let table = HeaderAliasTable::new(vec![FieldAliases {
            field: CanonicalField::Subject,
            exact: vec!["Kurs".to_string()],
            keywords: vec!["FACH".to_string()],
        }]);
        let resolver = HeaderResolver::new(table);

        let resolved = resolver.resolve(&labels(&["Subject", "Fachname"]));
        assert_eq!(resolved.column(CanonicalField::Subject), Some("Fachname"));
    }
}

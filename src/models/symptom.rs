use crate::error::JournalError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Symptom intensity, stored as its numeric level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Severity {
    Resolved = 0,
    #[default]
    Mild = 1,
    Moderate = 2,
    Severe = 3,
    VerySevere = 4,
    Extreme = 5,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Self::Resolved,
        Self::Mild,
        Self::Moderate,
        Self::Severe,
        Self::VerySevere,
        Self::Extreme,
    ];

    /// Unknown levels read as `Mild`.
    pub fn from_level(level: i64) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.level() == level)
            .unwrap_or(Self::Mild)
    }

    pub fn level(self) -> i64 {
        self as i64
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Resolved => "Resolved",
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
            Self::VerySevere => "Very Severe",
            Self::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Accepts a level (`0`-`5`) or a name such as `very-severe`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(level) = s.parse::<i64>() {
            return Self::ALL
                .into_iter()
                .find(|sev| sev.level() == level)
                .ok_or_else(|| format!("Severity level must be 0-5, got {}", level));
        }

        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|sev| sev.display_name().replace(' ', "").to_ascii_lowercase() == key)
            .ok_or_else(|| format!("Unknown severity '{}'", s))
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.level())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_level(i64::deserialize(deserializer)?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub id: Uuid,
    pub name: String,
    pub severity: Severity,
    pub timestamp: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<NaiveDateTime>,
}

impl Symptom {
    pub fn new(
        name: &str,
        severity: Severity,
        timestamp: NaiveDateTime,
        notes: Option<String>,
    ) -> Result<Self, JournalError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JournalError::EmptyName("Symptom"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            severity,
            timestamp,
            notes: clean_notes(notes),
            resolved_at: None,
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.severity == Severity::Resolved
    }

    /// Marks the symptom resolved. `at` is raised to the logged time if earlier.
    pub fn resolve(&mut self, at: NaiveDateTime, notes: Option<String>) {
        self.severity = Severity::Resolved;
        self.resolved_at = Some(at.max(self.timestamp));
        if let Some(notes) = clean_notes(notes) {
            self.notes = Some(notes);
        }
    }

    pub fn reopen(&mut self) {
        self.severity = Severity::Mild;
        self.resolved_at = None;
    }

    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.timestamp.date() == date
    }
}

/// Blank notes are stored as none.
pub(crate) fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_unknown_level_is_mild() {
        assert_eq!(Severity::from_level(9), Severity::Mild);
        let parsed: Severity = serde_json::from_str("-2").unwrap();
        assert_eq!(parsed, Severity::Mild);
        assert_eq!(serde_json::to_string(&Severity::VerySevere).unwrap(), "4");
    }

    #[test]
    fn test_parse_severity() {
        assert_eq!("3".parse::<Severity>(), Ok(Severity::Severe));
        assert_eq!("very-severe".parse::<Severity>(), Ok(Severity::VerySevere));
        assert_eq!("Very Severe".parse::<Severity>(), Ok(Severity::VerySevere));
        assert!("7".parse::<Severity>().is_err());
        assert!("awful".parse::<Severity>().is_err());
    }

    #[test]
    fn test_new_rejects_blank_name() {
        let err = Symptom::new("   ", Severity::Mild, at(1, 9), None).unwrap_err();
        assert_eq!(err, JournalError::EmptyName("Symptom"));
    }

    #[test]
    fn test_new_trims_and_drops_blank_notes() {
        let symptom =
            Symptom::new(" Headache ", Severity::Moderate, at(1, 9), Some("  ".into())).unwrap();
        assert_eq!(symptom.name, "Headache");
        assert!(symptom.notes.is_none());
    }

    #[test]
    fn test_resolve_and_reopen() {
        let mut symptom = Symptom::new("Cough", Severity::Severe, at(2, 9), None).unwrap();
        symptom.resolve(at(1, 9), Some("gone".into()));
        assert!(symptom.is_resolved());
        assert_eq!(symptom.resolved_at, Some(at(2, 9)));
        assert_eq!(symptom.notes.as_deref(), Some("gone"));

        symptom.reopen();
        assert!(!symptom.is_resolved());
        assert_eq!(symptom.severity, Severity::Mild);
        assert!(symptom.resolved_at.is_none());
        assert_eq!(symptom.notes.as_deref(), Some("gone"));
    }

    #[test]
    fn test_occurs_on_same_day_only() {
        let symptom = Symptom::new("Cough", Severity::Mild, at(2, 23), None).unwrap();
        assert!(symptom.occurs_on(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()));
        assert!(!symptom.occurs_on(NaiveDate::from_ymd_opt(2024, 4, 3).unwrap()));
    }
}

use crate::schedule::duration::DurationUnit;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Homeopathic dilution label. Drives the default wait-and-watch period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Potency {
    #[serde(rename = "6C")]
    C6,
    #[default]
    #[serde(rename = "30C")]
    C30,
    #[serde(rename = "200C")]
    C200,
    #[serde(rename = "1M")]
    M1,
    #[serde(rename = "Other")]
    Other,
}

impl Potency {
    pub const ALL: [Potency; 5] = [Self::C6, Self::C30, Self::C200, Self::M1, Self::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::C6 => "6C",
            Self::C30 => "30C",
            Self::C200 => "200C",
            Self::M1 => "1M",
            Self::Other => "Other",
        }
    }

    pub fn default_wait_period(self) -> (i64, DurationUnit) {
        match self {
            Self::C6 => (1, DurationUnit::Day),
            Self::C30 => (1, DurationUnit::Week),
            Self::C200 => (1, DurationUnit::Month),
            Self::M1 => (2, DurationUnit::Month),
            Self::Other => (1, DurationUnit::Week),
        }
    }

    /// Unknown labels are treated as a custom potency.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(label.trim()))
            .unwrap_or(Self::Other)
    }
}

impl fmt::Display for Potency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Potency {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl<'de> Deserialize<'de> for Potency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_wait_periods() {
        assert_eq!(Potency::C6.default_wait_period(), (1, DurationUnit::Day));
        assert_eq!(Potency::C30.default_wait_period(), (1, DurationUnit::Week));
        assert_eq!(Potency::C200.default_wait_period(), (1, DurationUnit::Month));
        assert_eq!(Potency::M1.default_wait_period(), (2, DurationUnit::Month));
        assert_eq!(Potency::Other.default_wait_period(), (1, DurationUnit::Week));
    }

    #[test]
    fn test_unknown_label_is_other() {
        assert_eq!(Potency::from_label("200c"), Potency::C200);
        assert_eq!(Potency::from_label("LM1"), Potency::Other);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&Potency::M1).unwrap();
        assert_eq!(json, "\"1M\"");
        let parsed: Potency = serde_json::from_str("\"12X\"").unwrap();
        assert_eq!(parsed, Potency::Other);
    }
}

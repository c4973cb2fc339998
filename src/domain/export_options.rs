//! Options that shape the files produced for each table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do with a character the target encoding cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnencodablePolicy {
    /// Fail the table's transcode stage.
    #[default]
    Fail,
    /// Write the configured replacement character instead.
    Substitute,
}

impl FromStr for UnencodablePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(UnencodablePolicy::Fail),
            "substitute" => Ok(UnencodablePolicy::Substitute),
            other => Err(format!(
                "unknown unencodable policy '{}' (expected 'fail' or 'substitute')",
                other
            )),
        }
    }
}

impl fmt::Display for UnencodablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnencodablePolicy::Fail => write!(f, "fail"),
            UnencodablePolicy::Substitute => write!(f, "substitute"),
        }
    }
}

/// Record terminator used in the CSV files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "Substitute".parse::<UnencodablePolicy>().unwrap(),
            UnencodablePolicy::Substitute
        );
        assert_eq!(
            "fail".parse::<UnencodablePolicy>().unwrap(),
            UnencodablePolicy::Fail
        );
        assert!("ignore".parse::<UnencodablePolicy>().is_err());
    }
}

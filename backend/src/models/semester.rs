use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Semester {
    #[serde(rename = "1st")]
    First,
    #[serde(rename = "2nd")]
    Second,
    #[serde(rename = "3rd")]
    Third,
    #[serde(rename = "4th")]
    Fourth,
    #[serde(rename = "5th")]
    Fifth,
    #[serde(rename = "6th")]
    Sixth,
    #[serde(rename = "7th")]
    Seventh,
    #[serde(rename = "8th")]
    Eighth,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown semester: {0}")]
pub struct UnknownSemester(pub String);

impl Semester {
    pub const ALL: [Semester; 8] = [
        Semester::First,
        Semester::Second,
        Semester::Third,
        Semester::Fourth,
        Semester::Fifth,
        Semester::Sixth,
        Semester::Seventh,
        Semester::Eighth,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Semester::First => "1st",
            Semester::Second => "2nd",
            Semester::Third => "3rd",
            Semester::Fourth => "4th",
            Semester::Fifth => "5th",
            Semester::Sixth => "6th",
            Semester::Seventh => "7th",
            Semester::Eighth => "8th",
        }
    }

    /// 1 for `1st` through 8 for `8th`.
    pub fn ordinal(self) -> u32 {
        Self::ALL.iter().position(|s| *s == self).map_or(1, |i| i as u32 + 1)
    }
}

impl FromStr for Semester {
    type Err = UnknownSemester;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sem| sem.as_str() == s.trim())
            .ok_or_else(|| UnknownSemester(s.to_string()))
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

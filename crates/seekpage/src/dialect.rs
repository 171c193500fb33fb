//! SQL dialects.
//!
//! Compilation is dialect-agnostic except for one fork: how temporal values are
//! rendered as bind parameters. Each dialect maps to exactly one formatting
//! function in [`Dialect::temporal_formatter`]; adding a dialect means adding a
//! variant and one match arm there.

use crate::error::PageError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date-time literal layout shared by every dialect.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date literal layout shared by every dialect.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Offset suffix appended by offset-aware dialects. Values are normalized to UTC.
const UTC_OFFSET_SUFFIX: &str = "+0000";

/// A temporal value in UTC, ready to be formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
}

/// Formatting function for temporal bind values.
pub type TemporalFormatter = fn(Temporal) -> String;

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL / MariaDB (timezone-naive `DATETIME`).
    #[default]
    #[serde(alias = "mariadb")]
    MySql,
    /// SQLite (timezone-naive text timestamps).
    Sqlite,
    /// PostgreSQL (`timestamptz`, explicit offset).
    #[serde(alias = "postgresql", alias = "pgsql")]
    Postgres,
}

fn format_naive(value: Temporal) -> String {
    match value {
        Temporal::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        Temporal::Date(d) => d.format(DATE_FORMAT).to_string(),
    }
}

fn format_with_offset(value: Temporal) -> String {
    match value {
        Temporal::DateTime(dt) => {
            format!("{}{}", dt.format(DATETIME_FORMAT), UTC_OFFSET_SUFFIX)
        }
        Temporal::Date(d) => d.format(DATE_FORMAT).to_string(),
    }
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Dialect; 3] = [Dialect::MySql, Dialect::Sqlite, Dialect::Postgres];

    /// The temporal formatting strategy for this dialect.
    pub fn temporal_formatter(self) -> TemporalFormatter {
        match self {
            Dialect::MySql | Dialect::Sqlite => format_naive,
            Dialect::Postgres => format_with_offset,
        }
    }

    /// Format a temporal value for this dialect.
    pub fn format_temporal(self, value: Temporal) -> String {
        (self.temporal_formatter())(value)
    }

    /// Whether this dialect stores an explicit UTC offset with timestamps.
    pub fn is_timezone_aware(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" | "pgsql" => Ok(Dialect::Postgres),
            other => Err(PageError::invalid_argument(format!(
                "unknown dialect '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 5)
            .unwrap()
    }

    #[test]
    fn naive_dialects_emit_plain_literal() {
        for dialect in [Dialect::MySql, Dialect::Sqlite] {
            assert_eq!(
                dialect.format_temporal(Temporal::DateTime(sample())),
                "2024-01-15 10:30:05"
            );
        }
    }

    #[test]
    fn postgres_appends_utc_offset() {
        assert_eq!(
            Dialect::Postgres.format_temporal(Temporal::DateTime(sample())),
            "2024-01-15 10:30:05+0000"
        );
    }

    #[test]
    fn dates_have_no_offset() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        for dialect in Dialect::ALL {
            assert_eq!(dialect.format_temporal(Temporal::Date(d)), "2024-02-29");
        }
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("pgsql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("mariadb".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("sqlite".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn only_postgres_is_timezone_aware() {
        assert!(Dialect::Postgres.is_timezone_aware());
        assert!(!Dialect::MySql.is_timezone_aware());
        assert!(!Dialect::Sqlite.is_timezone_aware());
    }
}

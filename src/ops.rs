//! Benchmark operation catalogue
//!
//! Names and constants shared by every backend so the same logical
//! transformation is expressed identically everywhere.

use crate::errors::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rows with `FILTER_COLUMN` above this value survive `filter_data`.
pub const FILTER_THRESHOLD: f64 = 0.5;
pub const FILTER_COLUMN: &str = "col_0";

pub const GROUP_COLUMN: &str = "group";
pub const ID_COLUMN: &str = "id";
pub const MEAN_COLUMN: &str = "col_1";
pub const SUM_COLUMN: &str = "col_2";
pub const SORT_COLUMN: &str = "col_3";

/// Size of the right-hand side of `join_data`.
pub const JOIN_ROWS: usize = 1000;
pub const JOIN_SOURCE_COLUMN: &str = "col_0";
pub const JOIN_RENAMED_COLUMN: &str = "new_col";

pub const STRING_COLUMN: &str = "group_str";
pub const STRING_SUFFIX: &str = "_str";

pub const ROLLING_WINDOW: usize = 10;
pub const ROLLING_COLUMN: &str = "col_1";

pub const APPLY_COLUMN: &str = "col_0";
pub const APPLIED_COLUMN: &str = "col_0_applied";

/// Element-wise function used by `custom_apply`.
pub fn apply_fn(x: f64) -> f64 {
    x * 2.0 + 1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[serde(rename = "filter_data")]
    Filter,
    #[serde(rename = "aggregate_data")]
    Aggregate,
    #[serde(rename = "sort_data")]
    Sort,
    #[serde(rename = "join_data")]
    Join,
    StringManipulation,
    WriteParquet,
    ReadParquet,
    RollingAverage,
    CustomApply,
}

impl Operation {
    /// Catalogue in execution order. `ReadParquet` relies on the file left by
    /// `WriteParquet`, so the pair must stay in this order.
    pub const ALL: [Operation; 9] = [
        Operation::Filter,
        Operation::Aggregate,
        Operation::Sort,
        Operation::Join,
        Operation::StringManipulation,
        Operation::WriteParquet,
        Operation::ReadParquet,
        Operation::RollingAverage,
        Operation::CustomApply,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Filter => "filter_data",
            Operation::Aggregate => "aggregate_data",
            Operation::Sort => "sort_data",
            Operation::Join => "join_data",
            Operation::StringManipulation => "string_manipulation",
            Operation::WriteParquet => "write_parquet",
            Operation::ReadParquet => "read_parquet",
            Operation::RollingAverage => "rolling_average",
            Operation::CustomApply => "custom_apply",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = BenchError;

    fn from_str(s: &str) -> BenchResult<Self> {
        let normalized = s.trim().to_lowercase();
        let op = match normalized.as_str() {
            "filter" | "filter_data" => Operation::Filter,
            "aggregate" | "aggregate_data" => Operation::Aggregate,
            "sort" | "sort_data" => Operation::Sort,
            "join" | "join_data" => Operation::Join,
            "string" | "string_manipulation" => Operation::StringManipulation,
            "write" | "write_parquet" => Operation::WriteParquet,
            "read" | "read_parquet" => Operation::ReadParquet,
            "rolling" | "rolling_average" => Operation::RollingAverage,
            "apply" | "custom_apply" => Operation::CustomApply,
            _ => return Err(BenchError::UnknownOperation(s.to_string())),
        };
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_short_aliases() {
        assert_eq!("filter".parse::<Operation>().unwrap(), Operation::Filter);
        assert_eq!("Aggregate".parse::<Operation>().unwrap(), Operation::Aggregate);
        assert_eq!(" rolling ".parse::<Operation>().unwrap(), Operation::RollingAverage);
    }

    #[test]
    fn test_unknown_operation() {
        let err = "pivot".parse::<Operation>().unwrap_err();
        assert!(matches!(err, BenchError::UnknownOperation(ref name) if name == "pivot"));
    }

    #[test]
    fn test_write_precedes_read() {
        let write = Operation::ALL.iter().position(|op| *op == Operation::WriteParquet);
        let read = Operation::ALL.iter().position(|op| *op == Operation::ReadParquet);
        assert!(write < read);
    }

    #[test]
    fn test_apply_fn() {
        assert_eq!(apply_fn(0.0), 1.0);
        assert_eq!(apply_fn(0.5), 2.0);
    }
}

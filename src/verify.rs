//! Reference checks for operation outputs
//!
//! Every backend output is compared with a result computed directly from the
//! generated [`Dataset`] vectors. Row order is normalised where a backend does
//! not guarantee it (group-by output, join output).

use crate::backend::Output;
use crate::datagen::Dataset;
use crate::errors::{BenchError, BenchResult};
use crate::ops::*;
use std::collections::{BTreeMap, HashSet};

/// Absolute tolerance for floating point comparisons.
pub const TOLERANCE: f64 = 1e-9;

/// A single mismatch between an output and the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub operation: Operation,
    pub message: String,
}

impl Mismatch {
    fn new(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    pub fn into_error(self, backend: &str) -> BenchError {
        BenchError::VerificationFailed {
            backend: backend.to_string(),
            operation: self.operation.name().to_string(),
            message: self.message,
        }
    }
}

type CheckResult = BenchResult<Result<(), Mismatch>>;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE
}

fn reference<'a>(dataset: &'a Dataset, name: &str) -> BenchResult<&'a [f64]> {
    dataset.numeric_column(name).ok_or_else(|| {
        BenchError::Unknown(anyhow::anyhow!("reference column '{}' missing", name))
    })
}

fn non_null<T: Copy>(values: Vec<Option<T>>, op: Operation, column: &str) -> Result<Vec<T>, Mismatch> {
    values
        .into_iter()
        .collect::<Option<Vec<T>>>()
        .ok_or_else(|| Mismatch::new(op, format!("unexpected nulls in '{}'", column)))
}

/// Check `output` of `op` against the reference computed from `dataset`.
/// Returns the mismatch, if any; errors are reserved for malformed outputs
/// (missing or mistyped columns).
pub fn check_output(op: Operation, dataset: &Dataset, output: &Output) -> CheckResult {
    match op {
        Operation::Filter => check_filter(dataset, output),
        Operation::Aggregate => check_aggregate(dataset, output),
        Operation::Sort => check_sort(dataset, output),
        Operation::Join => check_join(dataset, output),
        Operation::StringManipulation => check_string(dataset, output),
        Operation::WriteParquet => match output {
            Output::Written(path) if path.exists() => Ok(Ok(())),
            _ => Ok(Err(Mismatch::new(op, "parquet file was not written"))),
        },
        Operation::ReadParquet => check_round_trip(dataset, output),
        Operation::RollingAverage => check_rolling(dataset, output),
        Operation::CustomApply => check_apply(dataset, output),
    }
}

fn check_filter(dataset: &Dataset, output: &Output) -> CheckResult {
    let op = Operation::Filter;
    let expected = reference(dataset, FILTER_COLUMN)?
        .iter()
        .filter(|v| **v > FILTER_THRESHOLD)
        .count();
    if output.height() != expected {
        return Ok(Err(Mismatch::new(
            op,
            format!("expected {} rows, got {}", expected, output.height()),
        )));
    }
    let values = match non_null(output.f64_column(FILTER_COLUMN)?, op, FILTER_COLUMN) {
        Ok(v) => v,
        Err(m) => return Ok(Err(m)),
    };
    if let Some(v) = values.iter().find(|v| **v <= FILTER_THRESHOLD) {
        return Ok(Err(Mismatch::new(
            op,
            format!("row with {} = {} survived the filter", FILTER_COLUMN, v),
        )));
    }
    Ok(Ok(()))
}

fn check_aggregate(dataset: &Dataset, output: &Output) -> CheckResult {
    let op = Operation::Aggregate;
    let to_mean = reference(dataset, MEAN_COLUMN)?;
    let to_sum = reference(dataset, SUM_COLUMN)?;

    let mut expected: BTreeMap<i64, (f64, usize, f64)> = BTreeMap::new();
    for (i, g) in dataset.group.iter().enumerate() {
        let entry = expected.entry(*g).or_insert((0.0, 0, 0.0));
        entry.0 += to_mean[i];
        entry.1 += 1;
        entry.2 += to_sum[i];
    }

    let groups = output.i64_column(GROUP_COLUMN)?;
    let means = output.f64_column(MEAN_COLUMN)?;
    let sums = output.f64_column(SUM_COLUMN)?;

    if groups.len() != expected.len() {
        return Ok(Err(Mismatch::new(
            op,
            format!("expected {} groups, got {}", expected.len(), groups.len()),
        )));
    }

    let mut seen = HashSet::new();
    for ((g, mean), sum) in groups.into_iter().zip(means).zip(sums) {
        let (Some(g), Some(mean), Some(sum)) = (g, mean, sum) else {
            return Ok(Err(Mismatch::new(op, "null in aggregate output")));
        };
        if !seen.insert(g) {
            return Ok(Err(Mismatch::new(op, format!("group {} appears twice", g))));
        }
        let Some((total, count, expected_sum)) = expected.get(&g) else {
            return Ok(Err(Mismatch::new(op, format!("unexpected group {}", g))));
        };
        let expected_mean = total / *count as f64;
        if !close(mean, expected_mean) || !close(sum, *expected_sum) {
            return Ok(Err(Mismatch::new(
                op,
                format!(
                    "group {}: mean {} (expected {}), sum {} (expected {})",
                    g, mean, expected_mean, sum, expected_sum
                ),
            )));
        }
    }
    Ok(Ok(()))
}

fn check_sort(dataset: &Dataset, output: &Output) -> CheckResult {
    let op = Operation::Sort;
    if output.height() != dataset.n_rows() {
        return Ok(Err(Mismatch::new(op, "sort changed the row count")));
    }
    let values = match non_null(output.f64_column(SORT_COLUMN)?, op, SORT_COLUMN) {
        Ok(v) => v,
        Err(m) => return Ok(Err(m)),
    };
    if let Some(pos) = values.windows(2).position(|w| w[0] > w[1]) {
        return Ok(Err(Mismatch::new(
            op,
            format!("{} not ascending at row {}", SORT_COLUMN, pos + 1),
        )));
    }
    Ok(Ok(()))
}

fn check_join(dataset: &Dataset, output: &Output) -> CheckResult {
    let op = Operation::Join;
    let right_len = JOIN_ROWS.min(dataset.n_rows());
    let right_ids: HashSet<i64> = dataset.id[..right_len].iter().copied().collect();

    if output.height() > right_len {
        return Ok(Err(Mismatch::new(
            op,
            format!("{} rows exceed the right side's {}", output.height(), right_len),
        )));
    }
    let ids = match non_null(output.i64_column(ID_COLUMN)?, op, ID_COLUMN) {
        Ok(v) => v,
        Err(m) => return Ok(Err(m)),
    };
    let renamed = output.f64_column(JOIN_RENAMED_COLUMN)?;
    let source = reference(dataset, JOIN_SOURCE_COLUMN)?;

    for (id, value) in ids.iter().zip(renamed) {
        if !right_ids.contains(id) {
            return Ok(Err(Mismatch::new(op, format!("id {} not in both inputs", id))));
        }
        // ids are dense, so an id is also its row number
        let expected = source[*id as usize];
        if value.map_or(true, |v| !close(v, expected)) {
            return Ok(Err(Mismatch::new(
                op,
                format!("{} for id {} does not match {}", JOIN_RENAMED_COLUMN, id, JOIN_SOURCE_COLUMN),
            )));
        }
    }
    if ids.len() != right_len {
        return Ok(Err(Mismatch::new(
            op,
            format!("expected {} matches, got {}", right_len, ids.len()),
        )));
    }
    Ok(Ok(()))
}

fn check_string(dataset: &Dataset, output: &Output) -> CheckResult {
    let op = Operation::StringManipulation;
    let derived = output.str_column(STRING_COLUMN)?;
    let groups = output.i64_column(GROUP_COLUMN)?;
    if derived.len() != dataset.n_rows() {
        return Ok(Err(Mismatch::new(op, "string column has the wrong length")));
    }
    for (s, g) in derived.iter().zip(groups) {
        let expected = g.map(|g| format!("{}{}", g, STRING_SUFFIX));
        if *s != expected {
            return Ok(Err(Mismatch::new(
                op,
                format!("got {:?}, expected {:?}", s, expected),
            )));
        }
    }
    Ok(Ok(()))
}

fn check_round_trip(dataset: &Dataset, output: &Output) -> CheckResult {
    let op = Operation::ReadParquet;
    if output.column_names() != dataset.column_names() {
        return Ok(Err(Mismatch::new(
            op,
            format!("schema {:?} differs from {:?}", output.column_names(), dataset.column_names()),
        )));
    }
    if output.height() != dataset.n_rows() {
        return Ok(Err(Mismatch::new(op, "row count changed on round-trip")));
    }

    let ids = match non_null(output.i64_column(ID_COLUMN)?, op, ID_COLUMN) {
        Ok(v) => v,
        Err(m) => return Ok(Err(m)),
    };
    // Compare by id so a backend that reorders rows still passes.
    let groups = output.i64_column(GROUP_COLUMN)?;
    for (row, id) in ids.iter().enumerate() {
        let source_row = match usize::try_from(*id) {
            Ok(r) if r < dataset.n_rows() => r,
            _ => return Ok(Err(Mismatch::new(op, format!("id {} out of range", id)))),
        };
        if groups[row] != Some(dataset.group[source_row]) {
            return Ok(Err(Mismatch::new(op, format!("group differs for id {}", id))));
        }
    }
    for (i, expected) in dataset.numeric.iter().enumerate() {
        let name = format!("col_{}", i);
        let values = output.f64_column(&name)?;
        for (row, id) in ids.iter().enumerate() {
            if values[row] != Some(expected[*id as usize]) {
                return Ok(Err(Mismatch::new(
                    op,
                    format!("{} differs for id {}", name, id),
                )));
            }
        }
    }
    Ok(Ok(()))
}

fn check_rolling(dataset: &Dataset, output: &Output) -> CheckResult {
    let op = Operation::RollingAverage;
    let source = reference(dataset, ROLLING_COLUMN)?;
    let rolled = output.f64_column(ROLLING_COLUMN)?;
    if rolled.len() != dataset.n_rows() {
        return Ok(Err(Mismatch::new(op, "rolling output has the wrong length")));
    }
    // The first WINDOW-1 outputs are a partial window; conventions differ
    // between libraries, so they are not compared.
    for i in (ROLLING_WINDOW - 1)..rolled.len() {
        let window = &source[i + 1 - ROLLING_WINDOW..=i];
        let expected = window.iter().sum::<f64>() / ROLLING_WINDOW as f64;
        match rolled[i] {
            Some(v) if close(v, expected) => {}
            other => {
                return Ok(Err(Mismatch::new(
                    op,
                    format!("row {}: got {:?}, expected {}", i, other, expected),
                )))
            }
        }
    }
    Ok(Ok(()))
}

fn check_apply(dataset: &Dataset, output: &Output) -> CheckResult {
    let op = Operation::CustomApply;
    let source = reference(dataset, APPLY_COLUMN)?;
    let applied = output.f64_column(APPLIED_COLUMN)?;
    if applied.len() != source.len() {
        return Ok(Err(Mismatch::new(op, "applied column has the wrong length")));
    }
    for (got, x) in applied.iter().zip(source) {
        if got.map_or(true, |v| !close(v, apply_fn(*x))) {
            return Ok(Err(Mismatch::new(
                op,
                format!("f({}) gave {:?}", x, got),
            )));
        }
    }
    Ok(Ok(()))
}

//! Polars eager backend: every operation runs directly on `DataFrame`
//! kernels without building a query plan.

use super::TableOps;
use crate::errors::{BenchError, BenchResult};
use crate::io;
use crate::ops::*;
use polars::prelude::*;
use std::path::Path;

pub struct EagerTable {
    df: DataFrame,
}

impl EagerTable {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    fn with_column(&self, column: Series) -> BenchResult<DataFrame> {
        let mut out = self.df.clone();
        out.with_column(column)?;
        Ok(out)
    }
}

impl TableOps for EagerTable {
    type Table = DataFrame;

    fn filter(&self) -> BenchResult<DataFrame> {
        let mask = self.df.column(FILTER_COLUMN)?.f64()?.gt(FILTER_THRESHOLD);
        Ok(self.df.filter(&mask)?)
    }

    // `GroupBy::mean`/`sum` are the eager kernels; polars steers new code to
    // the lazy API, which is benchmarked separately.
    #[allow(deprecated)]
    fn aggregate(&self) -> BenchResult<DataFrame> {
        // Both aggregations share one grouping, so their rows line up.
        let grouped = self.df.group_by([GROUP_COLUMN])?;
        let means = grouped.clone().select([MEAN_COLUMN]).mean()?;
        let sums = grouped.select([SUM_COLUMN]).sum()?;

        // Output columns are `[key, <column>_<agg>]`.
        let keys = means.select_at_idx(0).cloned();
        let mean = means.select_at_idx(1).cloned();
        let sum = sums.select_at_idx(1).cloned();
        let (Some(keys), Some(mean), Some(sum)) = (keys, mean, sum) else {
            return Err(BenchError::Unknown(anyhow::anyhow!(
                "group_by returned an unexpected shape"
            )));
        };

        Ok(DataFrame::new(vec![
            keys,
            mean.with_name(MEAN_COLUMN.into()),
            sum.with_name(SUM_COLUMN.into()),
        ])?)
    }

    fn sort(&self) -> BenchResult<DataFrame> {
        Ok(self
            .df
            .sort([SORT_COLUMN], SortMultipleOptions::default())?)
    }

    fn join(&self) -> BenchResult<DataFrame> {
        let mut right = self
            .df
            .select([ID_COLUMN, JOIN_SOURCE_COLUMN])?
            .head(Some(JOIN_ROWS));
        right.rename(JOIN_SOURCE_COLUMN, JOIN_RENAMED_COLUMN.into())?;
        Ok(self.df.inner_join(&right, [ID_COLUMN], [ID_COLUMN])?)
    }

    fn string_manipulation(&self) -> BenchResult<DataFrame> {
        let as_text = self.df.column(GROUP_COLUMN)?.cast(&DataType::String)?;
        let derived = as_text.str()? + STRING_SUFFIX;
        self.with_column(derived.with_name(STRING_COLUMN.into()).into_series())
    }

    fn write_parquet(&self, path: &Path) -> BenchResult<()> {
        io::write_parquet(&self.df, path)
    }

    fn read_parquet(&self, path: &Path) -> BenchResult<DataFrame> {
        io::read_parquet_eager(path)
    }

    fn rolling_average(&self) -> BenchResult<DataFrame> {
        let sorted = self.df.sort([ID_COLUMN], SortMultipleOptions::default())?;
        let options = RollingOptionsFixedWindow {
            window_size: ROLLING_WINDOW,
            min_periods: ROLLING_WINDOW,
            ..Default::default()
        };
        let rolled = sorted
            .column(ROLLING_COLUMN)?
            .as_materialized_series()
            .rolling_mean(options)?;

        Ok(DataFrame::new(vec![rolled.into_column()])?)
    }

    fn custom_apply(&self) -> BenchResult<DataFrame> {
        let applied = self
            .df
            .column(APPLY_COLUMN)?
            .f64()?
            .apply_values(apply_fn)
            .with_name(APPLIED_COLUMN.into());
        self.with_column(applied.into_series())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EagerTable {
        let df = df! {
            "col_0" => [0.1, 0.9, 0.6, 0.4],
            "col_1" => [1.0, 2.0, 3.0, 4.0],
            "col_2" => [10.0, 20.0, 30.0, 40.0],
            "col_3" => [0.3, 0.1, 0.4, 0.2],
            "group" => [1i64, 2, 1, 2],
            "id" => [0i64, 1, 2, 3],
        }
        .unwrap();
        EagerTable::new(df)
    }

    #[test]
    fn test_filter() {
        let result = table().filter().unwrap();
        assert_eq!(result.height(), 2);
        let ids = result.column("id").unwrap().i64().unwrap();
        assert_eq!(ids.get(0), Some(1));
        assert_eq!(ids.get(1), Some(2));
    }

    #[test]
    fn test_aggregate() {
        let result = table()
            .aggregate()
            .unwrap()
            .sort(["group"], Default::default())
            .unwrap();
        assert_eq!(result.height(), 2);
        let mean = result.column("col_1").unwrap().f64().unwrap();
        let sum = result.column("col_2").unwrap().f64().unwrap();
        assert!((mean.get(0).unwrap() - 2.0).abs() < 1e-12);
        assert!((sum.get(1).unwrap() - 60.0).abs() < 1e-12);
        assert_eq!(
            result.get_column_names(),
            vec!["group", "col_1", "col_2"]
        );
    }

    #[test]
    fn test_sort() {
        let result = table().sort().unwrap();
        let ids = result.column("id").unwrap().i64().unwrap();
        let order: Vec<i64> = ids.into_no_null_iter().collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_join_keeps_all_rows_below_limit() {
        let result = table().join().unwrap();
        assert_eq!(result.height(), 4);
        assert!(result.column("new_col").is_ok());
    }

    #[test]
    fn test_string_manipulation_leaves_source() {
        let t = table();
        let result = t.string_manipulation().unwrap();
        let s = result.column("group_str").unwrap().str().unwrap();
        assert_eq!(s.get(0), Some("1_str"));
        assert_eq!(s.get(3), Some("2_str"));
        assert_eq!(result.width(), 7);
        assert_eq!(result.get_column_names()[4].as_str(), "group");
    }

    #[test]
    fn test_custom_apply() {
        let result = table().custom_apply().unwrap();
        let applied = result.column("col_0_applied").unwrap().f64().unwrap();
        assert!((applied.get(1).unwrap() - 2.8).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_average_marks_partial_window_missing() {
        let n = 15;
        let df = df! {
            "col_1" => (0..n).map(|v| v as f64).collect::<Vec<_>>(),
            "id" => (0..n as i64).rev().collect::<Vec<_>>(),
        }
        .unwrap();
        let result = EagerTable::new(df).rolling_average().unwrap();
        let rolled = result.column("col_1").unwrap().f64().unwrap();
        assert_eq!(rolled.len(), n);
        assert_eq!(rolled.null_count(), ROLLING_WINDOW - 1);
        // Sorted by id the values run 14, 13, ..., 0.
        assert!((rolled.get(9).unwrap() - 9.5).abs() < 1e-12);
    }
}

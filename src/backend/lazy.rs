//! Polars lazy backend: each operation builds a query plan on top of the
//! in-memory frame and collects it, so planning and optimisation are part of
//! the measured time.

use super::TableOps;
use crate::errors::BenchResult;
use crate::io;
use crate::ops::*;
use polars::prelude::*;
use std::path::Path;

pub struct LazyTable {
    lf: LazyFrame,
}

impl LazyTable {
    pub fn new(df: DataFrame) -> Self {
        Self { lf: df.lazy() }
    }

    fn plan(&self) -> LazyFrame {
        self.lf.clone()
    }
}

impl TableOps for LazyTable {
    type Table = DataFrame;

    fn filter(&self) -> BenchResult<DataFrame> {
        Ok(self
            .plan()
            .filter(col(FILTER_COLUMN).gt(lit(FILTER_THRESHOLD)))
            .collect()?)
    }

    fn aggregate(&self) -> BenchResult<DataFrame> {
        Ok(self
            .plan()
            .group_by([col(GROUP_COLUMN)])
            .agg([col(MEAN_COLUMN).mean(), col(SUM_COLUMN).sum()])
            .collect()?)
    }

    fn sort(&self) -> BenchResult<DataFrame> {
        Ok(self
            .plan()
            .sort([SORT_COLUMN], SortMultipleOptions::default())
            .collect()?)
    }

    fn join(&self) -> BenchResult<DataFrame> {
        let right = self
            .plan()
            .select([
                col(ID_COLUMN),
                col(JOIN_SOURCE_COLUMN).alias(JOIN_RENAMED_COLUMN),
            ])
            .slice(0, JOIN_ROWS as IdxSize);

        Ok(self
            .plan()
            .join(
                right,
                [col(ID_COLUMN)],
                [col(ID_COLUMN)],
                JoinArgs::new(JoinType::Inner),
            )
            .collect()?)
    }

    fn string_manipulation(&self) -> BenchResult<DataFrame> {
        let derived = concat_str(
            [col(GROUP_COLUMN).cast(DataType::String), lit(STRING_SUFFIX)],
            "",
            true,
        );
        Ok(self
            .plan()
            .with_columns([derived.alias(STRING_COLUMN)])
            .collect()?)
    }

    fn write_parquet(&self, path: &Path) -> BenchResult<()> {
        let df = self.plan().collect()?;
        io::write_parquet(&df, path)
    }

    fn read_parquet(&self, path: &Path) -> BenchResult<DataFrame> {
        Ok(io::scan_parquet(path)?.collect()?)
    }

    fn rolling_average(&self) -> BenchResult<DataFrame> {
        let options = RollingOptionsFixedWindow {
            window_size: ROLLING_WINDOW,
            min_periods: ROLLING_WINDOW,
            ..Default::default()
        };
        Ok(self
            .plan()
            .sort([ID_COLUMN], SortMultipleOptions::default())
            .select([col(ROLLING_COLUMN).rolling_mean(options)])
            .collect()?)
    }

    fn custom_apply(&self) -> BenchResult<DataFrame> {
        let applied = col(APPLY_COLUMN) * lit(2.0) + lit(1.0);
        Ok(self
            .plan()
            .with_columns([applied.alias(APPLIED_COLUMN)])
            .collect()?)
    }
}

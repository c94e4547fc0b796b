//! Arrow backend built on `arrow` compute kernels.
//!
//! Arrow ships filter, sort, take, cast and string concat kernels but no
//! group-by, join or window operators; those are expressed here with hash
//! tables and index vectors over the typed arrays, then materialised with
//! `take`.

use super::TableOps;
use crate::errors::{BenchError, BenchResult};
use crate::io;
use crate::ops::*;
use ::arrow::array::{
    Array, ArrayRef, AsArray, Float64Array, Float64Builder, Int64Array, StringArray, UInt32Array,
};
use ::arrow::compute::kernels::cmp::gt;
use ::arrow::compute::kernels::concat_elements::concat_elements_utf8;
use ::arrow::compute::{cast, filter_record_batch, sort_to_indices, take, take_record_batch};
use ::arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use ::arrow::record_batch::RecordBatch;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

pub struct ArrowTable {
    batch: RecordBatch,
}

impl ArrowTable {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    fn column(&self, name: &str) -> BenchResult<&ArrayRef> {
        self.batch.column_by_name(name).ok_or_else(|| {
            BenchError::Unknown(anyhow::anyhow!("column '{}' not found", name))
        })
    }

    fn f64_values(&self, name: &str) -> BenchResult<&Float64Array> {
        self.column(name)?
            .as_primitive_opt::<Float64Type>()
            .ok_or_else(|| BenchError::Unknown(anyhow::anyhow!("column '{}' is not Float64", name)))
    }

    fn i64_values(&self, name: &str) -> BenchResult<&Int64Array> {
        self.column(name)?
            .as_primitive_opt::<Int64Type>()
            .ok_or_else(|| BenchError::Unknown(anyhow::anyhow!("column '{}' is not Int64", name)))
    }
}

/// Append `array` as a new column named `name`.
fn with_column(batch: &RecordBatch, name: &str, array: ArrayRef) -> BenchResult<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields.push(Field::new(name, array.data_type().clone(), array.null_count() > 0));

    let mut columns = batch.columns().to_vec();
    columns.push(array);
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

impl TableOps for ArrowTable {
    type Table = RecordBatch;

    fn filter(&self) -> BenchResult<RecordBatch> {
        let threshold = Float64Array::new_scalar(FILTER_THRESHOLD);
        let mask = gt(self.f64_values(FILTER_COLUMN)?, &threshold)?;
        Ok(filter_record_batch(&self.batch, &mask)?)
    }

    fn aggregate(&self) -> BenchResult<RecordBatch> {
        let groups = self.i64_values(GROUP_COLUMN)?;
        let to_mean = self.f64_values(MEAN_COLUMN)?;
        let to_sum = self.f64_values(SUM_COLUMN)?;

        // group -> (sum for mean, count, sum)
        let mut acc: BTreeMap<i64, (f64, usize, f64)> = BTreeMap::new();
        for ((g, m), s) in groups
            .values()
            .iter()
            .zip(to_mean.values().iter())
            .zip(to_sum.values().iter())
        {
            let entry = acc.entry(*g).or_insert((0.0, 0, 0.0));
            entry.0 += m;
            entry.1 += 1;
            entry.2 += s;
        }

        let keys = Int64Array::from_iter_values(acc.keys().copied());
        let means = Float64Array::from_iter_values(
            acc.values().map(|(total, count, _)| total / *count as f64),
        );
        let sums = Float64Array::from_iter_values(acc.values().map(|(_, _, sum)| *sum));

        let schema = Schema::new(vec![
            Field::new(GROUP_COLUMN, DataType::Int64, false),
            Field::new(MEAN_COLUMN, DataType::Float64, false),
            Field::new(SUM_COLUMN, DataType::Float64, false),
        ]);
        Ok(RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(keys), Arc::new(means), Arc::new(sums)],
        )?)
    }

    fn sort(&self) -> BenchResult<RecordBatch> {
        let indices = sort_to_indices(self.column(SORT_COLUMN)?, None, None)?;
        Ok(take_record_batch(&self.batch, &indices)?)
    }

    fn join(&self) -> BenchResult<RecordBatch> {
        let right_len = JOIN_ROWS.min(self.batch.num_rows());
        let right_ids = self.i64_values(ID_COLUMN)?.slice(0, right_len);
        let right_values = self.f64_values(JOIN_SOURCE_COLUMN)?.slice(0, right_len);

        let lookup: HashMap<i64, u32> = right_ids
            .values()
            .iter()
            .enumerate()
            .map(|(row, id)| (*id, row as u32))
            .collect();

        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        for (row, id) in self.i64_values(ID_COLUMN)?.values().iter().enumerate() {
            if let Some(r) = lookup.get(id) {
                left_rows.push(row as u32);
                right_rows.push(*r);
            }
        }

        let left = take_record_batch(&self.batch, &UInt32Array::from(left_rows))?;
        let renamed = take(&right_values, &UInt32Array::from(right_rows), None)?;
        with_column(&left, JOIN_RENAMED_COLUMN, renamed)
    }

    fn string_manipulation(&self) -> BenchResult<RecordBatch> {
        let as_text = cast(self.column(GROUP_COLUMN)?, &DataType::Utf8)?;
        let suffix =
            StringArray::from_iter_values(std::iter::repeat(STRING_SUFFIX).take(as_text.len()));
        let derived = concat_elements_utf8(as_text.as_string::<i32>(), &suffix)?;
        with_column(&self.batch, STRING_COLUMN, Arc::new(derived))
    }

    fn write_parquet(&self, path: &Path) -> BenchResult<()> {
        io::write_parquet_arrow(&self.batch, path)
    }

    fn read_parquet(&self, path: &Path) -> BenchResult<RecordBatch> {
        io::read_parquet_arrow(path)
    }

    fn rolling_average(&self) -> BenchResult<RecordBatch> {
        let order = sort_to_indices(self.column(ID_COLUMN)?, None, None)?;
        let sorted = take(self.column(ROLLING_COLUMN)?, &order, None)?;
        let values = sorted.as_primitive::<Float64Type>().values();

        let mut builder = Float64Builder::with_capacity(values.len());
        let mut window_sum = 0.0;
        for (i, v) in values.iter().enumerate() {
            window_sum += v;
            if i >= ROLLING_WINDOW {
                window_sum -= values[i - ROLLING_WINDOW];
            }
            if i + 1 >= ROLLING_WINDOW {
                builder.append_value(window_sum / ROLLING_WINDOW as f64);
            } else {
                builder.append_null();
            }
        }

        let schema = Schema::new(vec![Field::new(ROLLING_COLUMN, DataType::Float64, true)]);
        Ok(RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(builder.finish())],
        )?)
    }

    fn custom_apply(&self) -> BenchResult<RecordBatch> {
        let applied: Float64Array = self
            .f64_values(APPLY_COLUMN)?
            .unary::<_, Float64Type>(apply_fn);
        with_column(&self.batch, APPLIED_COLUMN, Arc::new(applied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ArrowTable {
        let schema = Schema::new(vec![
            Field::new("col_0", DataType::Float64, false),
            Field::new("col_1", DataType::Float64, false),
            Field::new("col_2", DataType::Float64, false),
            Field::new("col_3", DataType::Float64, false),
            Field::new("group", DataType::Int64, false),
            Field::new("id", DataType::Int64, false),
        ]);
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from(vec![0.1, 0.9, 0.6, 0.4])),
            Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0, 4.0])),
            Arc::new(Float64Array::from(vec![10.0, 20.0, 30.0, 40.0])),
            Arc::new(Float64Array::from(vec![0.3, 0.1, 0.4, 0.2])),
            Arc::new(Int64Array::from(vec![1, 2, 1, 2])),
            Arc::new(Int64Array::from(vec![0, 1, 2, 3])),
        ];
        ArrowTable::new(RecordBatch::try_new(Arc::new(schema), columns).unwrap())
    }

    fn ids(batch: &RecordBatch) -> Vec<i64> {
        batch
            .column_by_name("id")
            .unwrap()
            .as_primitive::<Int64Type>()
            .values()
            .to_vec()
    }

    #[test]
    fn test_filter() {
        let result = table().filter().unwrap();
        assert_eq!(ids(&result), vec![1, 2]);
    }

    #[test]
    fn test_aggregate() {
        let result = table().aggregate().unwrap();
        assert_eq!(result.num_rows(), 2);
        let means = result.column(1).as_primitive::<Float64Type>();
        let sums = result.column(2).as_primitive::<Float64Type>();
        assert!((means.value(0) - 2.0).abs() < 1e-12);
        assert!((sums.value(1) - 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_sort() {
        let result = table().sort().unwrap();
        assert_eq!(ids(&result), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_join() {
        let result = table().join().unwrap();
        assert_eq!(result.num_rows(), 4);
        assert_eq!(result.num_columns(), 7);
        let new_col = result
            .column_by_name("new_col")
            .unwrap()
            .as_primitive::<Float64Type>();
        assert!((new_col.value(1) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_string_manipulation() {
        let result = table().string_manipulation().unwrap();
        let s = result
            .column_by_name("group_str")
            .unwrap()
            .as_string::<i32>();
        assert_eq!(s.value(0), "1_str");
        assert_eq!(s.value(3), "2_str");
    }

    #[test]
    fn test_rolling_average() {
        let n = 11;
        let schema = Schema::new(vec![
            Field::new("col_1", DataType::Float64, false),
            Field::new("id", DataType::Int64, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Float64Array::from((0..n).map(|v| v as f64).collect::<Vec<_>>())),
                Arc::new(Int64Array::from((0..n as i64).collect::<Vec<_>>())),
            ],
        )
        .unwrap();
        let result = ArrowTable::new(batch).rolling_average().unwrap();
        let rolled = result.column(0).as_primitive::<Float64Type>();
        assert_eq!(rolled.null_count(), ROLLING_WINDOW - 1);
        assert!((rolled.value(10) - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_custom_apply() {
        let result = table().custom_apply().unwrap();
        let applied = result
            .column_by_name("col_0_applied")
            .unwrap()
            .as_primitive::<Float64Type>();
        assert!((applied.value(2) - 2.2).abs() < 1e-12);
    }
}

use crate::errors::{BenchError, BenchResult};
use ::arrow::compute::concat_batches;
use ::arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

pub fn write_csv<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> BenchResult<()> {
    let mut file = File::create(path).map_err(BenchError::IoError)?;
    CsvWriter::new(&mut file)
        .finish(df)
        .map_err(BenchError::PolarsError)
}

pub fn scan_parquet<P: AsRef<Path>>(path: P) -> BenchResult<LazyFrame> {
    LazyFrame::scan_parquet(path, Default::default()).map_err(BenchError::PolarsError)
}

pub fn read_parquet_eager<P: AsRef<Path>>(path: P) -> BenchResult<DataFrame> {
    let file = File::open(path).map_err(BenchError::IoError)?;
    ParquetReader::new(file)
        .finish()
        .map_err(BenchError::PolarsError)
}

pub fn write_parquet<P: AsRef<Path>>(df: &DataFrame, path: P) -> BenchResult<()> {
    let file = File::create(path).map_err(BenchError::IoError)?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(BenchError::PolarsError)?;
    Ok(())
}

pub fn write_parquet_arrow<P: AsRef<Path>>(batch: &RecordBatch, path: P) -> BenchResult<()> {
    let file = File::create(path).map_err(BenchError::IoError)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

pub fn read_parquet_arrow<P: AsRef<Path>>(path: P) -> BenchResult<RecordBatch> {
    let file = File::open(path).map_err(BenchError::IoError)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()?
        .collect::<Result<Vec<RecordBatch>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

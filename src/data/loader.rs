use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use thiserror::Error;

use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why the dataset could not be loaded.
///
/// A missing file is reported separately from every other read failure so the
/// user can tell "put the file there" apart from "fix the file".
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Dataset file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Error loading dataset: {0:#}")]
    Read(anyhow::Error),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the record table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-delimited with a header row
/// * `.tsv`          – tab-delimited with a header row
/// * `.parquet`      – flat Parquet file, one cell per column
///
/// Anything else is read as comma-delimited text.
pub fn load_dataset(path: &Path) -> Result<Table, LoadError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(LoadError::Read(
                anyhow::Error::new(e).context(format!("opening {}", path.display())),
            ));
        }
    };

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(file),
        "tsv" => load_delimited(file, b'\t'),
        _ => load_delimited(file, b','),
    }
    .map_err(LoadError::Read)?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.columns,
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with column names, one record per line.  Rows shorter than the
/// header are padded with nulls; longer rows are rejected.
fn load_delimited<R: io::Read>(source: R, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(source);

    let columns: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.trim().is_empty()) {
        bail!("No columns to parse from file");
    }

    let mut table = Table::new(columns);

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        if record.len() > table.columns.len() {
            bail!(
                "row {row_no}: expected {} fields, saw {}",
                table.columns.len(),
                record.len()
            );
        }
        table.push_row(record.iter().map(Value::infer).collect());
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file.  Every top-level column becomes a table column;
/// strings, integers, floats and bools map onto [`Value`], anything else is
/// kept as its type name.
fn load_parquet(file: File) -> Result<Table> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::new(columns);

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_value(col, row))
                .collect::<Result<Vec<_>>>()?;
            table.push_row(cells);
        }
    }

    Ok(table)
}

// -- Arrow helpers --

fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>) -> Result<&'a T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::Text(downcast::<StringArray>(col)?.value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Value::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => Value::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float32 => Value::Float(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => Value::Float(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => Value::Bool(downcast::<BooleanArray>(col)?.value(row)),
        other => Value::Text(format!("{other:?}")),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use anyhow::Result;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        match load_dataset(&path) {
            Err(LoadError::NotFound(p)) => assert_eq!(p, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn csv_is_loaded_with_inferred_types() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("births.csv");
        let mut f = File::create(&path)?;
        writeln!(f, "State of Residence,Month,Births")?;
        writeln!(f, "Texas,January,120")?;
        writeln!(f, "Ohio,February,N/A")?;
        writeln!(f, "Utah,March")?;
        drop(f);

        let table = load_dataset(&path)?;
        assert_eq!(table.columns, vec!["State of Residence", "Month", "Births"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0][2], Value::Integer(120));
        assert_eq!(table.rows[1][2], Value::Null);
        assert_eq!(table.rows[2][2], Value::Null);
        Ok(())
    }

    #[test]
    fn tsv_uses_tab_delimiter() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("births.tsv");
        std::fs::write(&path, "State\tBirths\nTexas\t7\n")?;

        let table = load_dataset(&path)?;
        assert_eq!(table.columns, vec!["State", "Births"]);
        assert_eq!(table.rows[0], vec![Value::from("Texas"), Value::Integer(7)]);
        Ok(())
    }

    #[test]
    fn overlong_row_is_a_read_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2,3\n")?;

        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, LoadError::Read(_)));
        assert!(err.to_string().starts_with("Error loading dataset:"));
        Ok(())
    }

    #[test]
    fn empty_file_is_a_read_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "")?;

        assert!(matches!(load_dataset(&path), Err(LoadError::Read(_))));
        Ok(())
    }

    #[test]
    fn parquet_columns_become_cells() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("births.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("State", DataType::Utf8, true),
            Field::new("Births", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("Texas"), None])) as ArrayRef,
                Arc::new(Int64Array::from(vec![Some(5), Some(9)])) as ArrayRef,
            ],
        )?;
        let mut writer = ArrowWriter::try_new(File::create(&path)?, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;

        let table = load_dataset(&path)?;
        assert_eq!(table.columns, vec!["State", "Births"]);
        assert_eq!(table.rows[0], vec![Value::from("Texas"), Value::Integer(5)]);
        assert_eq!(table.rows[1], vec![Value::Null, Value::Integer(9)]);
        Ok(())
    }
}

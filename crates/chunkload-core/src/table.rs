use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, new_null_array};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::errors::ChunkError;

/// The table parsed out of one chunk file
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub path: PathBuf,
    pub batch: RecordBatch,
    pub skipped_rows: usize,
}

impl ParsedTable {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// Ordered concatenation of every parsed chunk
#[derive(Debug, Clone)]
pub struct MergedTable {
    batch: RecordBatch,
}

impl MergedTable {
    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// Deep memory footprint of each column, buffers included
    pub fn column_memory_sizes(&self) -> Vec<(String, usize)> {
        self.batch
            .schema()
            .fields()
            .iter()
            .zip(self.batch.columns())
            .map(|(field, array)| (field.name().clone(), array.get_array_memory_size()))
            .collect()
    }

    /// Deep memory footprint of the whole table
    pub fn memory_size(&self) -> usize {
        self.batch
            .columns()
            .iter()
            .map(|a| a.get_array_memory_size())
            .sum()
    }
}

/// Common type for a column seen with two different inferred types
fn widen(left: &DataType, right: &DataType) -> DataType {
    match (left, right) {
        (l, r) if l == r => l.clone(),
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }
        _ => DataType::Utf8,
    }
}

/// Union of the chunk schemas, columns in first-seen order
pub fn merge_schemas(schemas: &[SchemaRef]) -> Schema {
    let mut names: Vec<String> = Vec::new();
    let mut types: Vec<DataType> = Vec::new();

    for schema in schemas {
        for field in schema.fields() {
            match names.iter().position(|n| n == field.name()) {
                Some(idx) => types[idx] = widen(&types[idx], field.data_type()),
                None => {
                    names.push(field.name().clone());
                    types.push(field.data_type().clone());
                }
            }
        }
    }

    let fields: Vec<Field> = names
        .into_iter()
        .zip(types)
        .map(|(name, data_type)| Field::new(name, data_type, true))
        .collect();
    Schema::new(fields)
}

/// Cast `batch` onto `schema`, filling columns it lacks with nulls
fn conform(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch, ChunkError> {
    let rows = batch.num_rows();
    let columns = schema
        .fields()
        .iter()
        .map(|field| match batch.column_by_name(field.name()) {
            Some(array) if array.data_type() == field.data_type() => Ok(array.clone()),
            Some(array) => cast(array, field.data_type()).map_err(ChunkError::from),
            None => Ok(new_null_array(field.data_type(), rows)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(rows));
    Ok(RecordBatch::try_new_with_options(
        schema.clone(),
        columns,
        &options,
    )?)
}

/// Concatenate parsed chunks in the given order.
///
/// Row order inside each chunk is kept. Column types that disagree between
/// chunks are widened (`Null` to anything, `Int64` to `Float64`, otherwise
/// `Utf8`).
pub fn merge_tables(tables: &[ParsedTable]) -> Result<MergedTable, ChunkError> {
    if tables.is_empty() {
        return Ok(MergedTable::empty());
    }

    let schemas: Vec<SchemaRef> = tables.iter().map(|t| t.batch.schema()).collect();
    let schema = Arc::new(merge_schemas(&schemas));

    let conformed = tables
        .iter()
        .map(|t| conform(&t.batch, &schema))
        .collect::<Result<Vec<_>, _>>()?;

    let batch = concat_batches(&schema, &conformed)?;
    Ok(MergedTable { batch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, NullArray, StringArray};

    fn parsed(columns: Vec<(&str, ArrayRef)>) -> ParsedTable {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        ParsedTable {
            path: PathBuf::from("chunk.csv"),
            batch,
            skipped_rows: 0,
        }
    }

    #[test]
    fn test_widen() {
        assert_eq!(widen(&DataType::Int64, &DataType::Int64), DataType::Int64);
        assert_eq!(widen(&DataType::Null, &DataType::Int64), DataType::Int64);
        assert_eq!(widen(&DataType::Boolean, &DataType::Null), DataType::Boolean);
        assert_eq!(widen(&DataType::Int64, &DataType::Float64), DataType::Float64);
        assert_eq!(widen(&DataType::Float64, &DataType::Int64), DataType::Float64);
        assert_eq!(widen(&DataType::Boolean, &DataType::Int64), DataType::Utf8);
        assert_eq!(widen(&DataType::Date32, &DataType::Utf8), DataType::Utf8);
    }

    #[test]
    fn test_merge_keeps_order() {
        let first = parsed(vec![("a", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef)]);
        let second = parsed(vec![("a", Arc::new(Int64Array::from(vec![3])) as ArrayRef)]);

        let merged = merge_tables(&[first, second]).unwrap();
        assert_eq!(merged.num_rows(), 3);
        let a = merged
            .column("a")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(a.values().to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_widens_int_and_float() {
        let first = parsed(vec![("x", Arc::new(Int64Array::from(vec![1])) as ArrayRef)]);
        let second = parsed(vec![("x", Arc::new(Float64Array::from(vec![2.5])) as ArrayRef)]);

        let merged = merge_tables(&[first, second]).unwrap();
        assert_eq!(merged.schema().field(0).data_type(), &DataType::Float64);
        let x = merged
            .column("x")
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(x.value(0), 1.0);
        assert_eq!(x.value(1), 2.5);
    }

    #[test]
    fn test_merge_falls_back_to_utf8() {
        let first = parsed(vec![("x", Arc::new(Int64Array::from(vec![7])) as ArrayRef)]);
        let second = parsed(vec![("x", Arc::new(StringArray::from(vec!["seven"])) as ArrayRef)]);

        let merged = merge_tables(&[first, second]).unwrap();
        let x = merged
            .column("x")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(x.value(0), "7");
        assert_eq!(x.value(1), "seven");
    }

    #[test]
    fn test_merge_null_column_takes_other_type() {
        let first = parsed(vec![("x", Arc::new(NullArray::new(2)) as ArrayRef)]);
        let second = parsed(vec![("x", Arc::new(Int64Array::from(vec![5])) as ArrayRef)]);

        let merged = merge_tables(&[first, second]).unwrap();
        assert_eq!(merged.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(merged.column("x").unwrap().null_count(), 2);
    }

    #[test]
    fn test_merge_union_of_columns() {
        let first = parsed(vec![("a", Arc::new(Int64Array::from(vec![1])) as ArrayRef)]);
        let second = parsed(vec![
            ("a", Arc::new(Int64Array::from(vec![2])) as ArrayRef),
            ("b", Arc::new(StringArray::from(vec!["z"])) as ArrayRef),
        ]);

        let merged = merge_tables(&[first, second]).unwrap();
        assert_eq!(merged.column_names(), vec!["a", "b"]);
        assert_eq!(merged.num_rows(), 2);
        assert_eq!(merged.column("b").unwrap().null_count(), 1);
    }

    #[test]
    fn test_merge_nothing() {
        let merged = merge_tables(&[]).unwrap();
        assert!(merged.is_empty());
        assert_eq!(merged.num_columns(), 0);
        assert_eq!(merged.memory_size(), 0);
    }

    #[test]
    fn test_memory_sizes() {
        let table = parsed(vec![
            ("a", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
            ("b", Arc::new(StringArray::from(vec!["x", "yy", "zzz"])) as ArrayRef),
        ]);
        let merged = merge_tables(&[table]).unwrap();

        let sizes = merged.column_memory_sizes();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[0].0, "a");
        assert!(sizes.iter().all(|(_, s)| *s > 0));
        assert_eq!(merged.memory_size(), sizes.iter().map(|(_, s)| s).sum::<usize>());
    }
}

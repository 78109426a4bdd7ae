//! Split loading and format conversion.
//!
//! Datasets on the hub store split data as parquet shards named like
//! `train-00000-of-00002.parquet`. This module groups shards by split,
//! decodes them into Arrow record batches, and writes each split back
//! out as CSV, JSON, or parquet.

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{RecordBatch, UInt64Array};
use arrow::compute;
use arrow::datatypes::SchemaRef;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::hub::{DatasetHub, HubError};

/// Output format for converted split files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    /// Comma-separated values with a header row
    Csv,
    /// A single JSON array of row objects
    Json,
    /// Parquet with default writer properties
    Parquet,
}

impl SaveFormat {
    /// Parse a user-supplied format name, case-insensitively.
    ///
    /// Returns `None` for anything other than `csv`, `json`, or `parquet`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(SaveFormat::Csv),
            "json" => Some(SaveFormat::Json),
            "parquet" => Some(SaveFormat::Parquet),
            _ => None,
        }
    }

    /// File extension for this format, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Csv => "csv",
            SaveFormat::Json => "json",
            SaveFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// An in-memory table holding one dataset split.
///
/// Batches share a single schema; shards of the same split are appended
/// in shard order.
#[derive(Debug, Clone)]
pub struct SplitTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl SplitTable {
    /// Decode a parquet shard held in memory
    pub fn from_parquet_bytes(data: Bytes) -> Result<Self, HubError> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(data)?;
        let schema = builder.schema().clone();
        let reader = builder.build()?;

        let batches = reader.collect::<Result<Vec<_>, _>>()?;

        Ok(Self { schema, batches })
    }

    /// Append the rows of another shard of the same split
    pub fn append(&mut self, other: SplitTable) -> Result<(), HubError> {
        if other.schema != self.schema {
            return Err(HubError::Convert(
                "shards of the same split have mismatched schemas".to_string(),
            ));
        }
        self.batches.extend(other.batches);
        Ok(())
    }

    /// Total number of rows across all batches
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|batch| batch.num_rows()).sum()
    }

    /// Schema shared by every batch
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// The underlying record batches
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Take a uniform random sample of up to `n` rows.
    ///
    /// When `n` covers the whole table the table is returned unchanged.
    /// Selected rows keep their original relative order.
    pub fn sample(&self, n: usize) -> Result<SplitTable, HubError> {
        let total = self.num_rows();
        if n >= total {
            return Ok(self.clone());
        }

        let mut indices: Vec<u64> = (0..total as u64).collect();
        let mut rng = rand::rng();
        indices.shuffle(&mut rng);
        indices.truncate(n);
        indices.sort_unstable();

        let combined = compute::concat_batches(&self.schema, &self.batches)?;
        let index_array = UInt64Array::from(indices);
        let columns = combined
            .columns()
            .iter()
            .map(|column| compute::take(column.as_ref(), &index_array, None))
            .collect::<Result<Vec<_>, _>>()?;
        let batch = RecordBatch::try_new(Arc::clone(&self.schema), columns)?;

        Ok(SplitTable {
            schema: Arc::clone(&self.schema),
            batches: vec![batch],
        })
    }

    /// Write the table to `path` in the requested format
    pub fn write(&self, format: SaveFormat, path: &Path) -> Result<(), HubError> {
        let file = File::create(path)?;

        match format {
            SaveFormat::Csv => {
                let mut writer = arrow::csv::WriterBuilder::new()
                    .with_header(true)
                    .build(file);
                for batch in &self.batches {
                    writer.write(batch)?;
                }
            }
            SaveFormat::Json => {
                // One JSON array of row objects, not JSON lines.
                let mut writer = arrow::json::ArrayWriter::new(file);
                let refs: Vec<&RecordBatch> = self.batches.iter().collect();
                writer.write_batches(&refs)?;
                writer.finish()?;
            }
            SaveFormat::Parquet => {
                let props = WriterProperties::builder().build();
                let mut writer = ArrowWriter::try_new(file, Arc::clone(&self.schema), Some(props))?;
                for batch in &self.batches {
                    writer.write(batch)?;
                }
                writer.close()?;
            }
        }

        Ok(())
    }
}

/// Infer the split name from a parquet shard path.
///
/// Shards usually follow the `<split>-00000-of-00002.parquet` convention;
/// anything else falls back to the file stem. `val`, `valid`, and `dev`
/// are normalized to `validation`.
pub fn infer_split_name(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem = file_name.strip_suffix(".parquet").unwrap_or(file_name);

    let raw = Regex::new(r"^([A-Za-z][A-Za-z0-9_.]*?)-\d{5}-of-\d{5}$")
        .ok()
        .and_then(|re| re.captures(stem).map(|caps| caps[1].to_string()))
        .unwrap_or_else(|| stem.to_string());

    match raw.to_ascii_lowercase().as_str() {
        "val" | "valid" | "dev" => "validation".to_string(),
        lower => lower.to_string(),
    }
}

/// Load every split of a dataset into memory.
///
/// Lists the repository, keeps parquet shards, groups them by inferred
/// split name in first-seen repository order, and concatenates each
/// split's shards in path order. Fails with [`HubError::NotFound`] when
/// the dataset has no parquet shards to load.
pub async fn load_splits(
    hub: &dyn DatasetHub,
    dataset_id: &str,
) -> Result<Vec<(String, SplitTable)>, HubError> {
    let files = hub.list_files(dataset_id).await?;

    let mut shards: Vec<(String, Vec<String>)> = Vec::new();
    for file in files.iter().filter(|file| file.is_file()) {
        if !file.path.ends_with(".parquet") {
            continue;
        }
        let split = infer_split_name(&file.path);
        match shards.iter_mut().find(|(name, _)| *name == split) {
            Some((_, paths)) => paths.push(file.path.clone()),
            None => shards.push((split, vec![file.path.clone()])),
        }
    }

    if shards.is_empty() {
        return Err(HubError::NotFound(format!(
            "no parquet split files in dataset '{}'",
            dataset_id
        )));
    }

    let mut splits = Vec::with_capacity(shards.len());
    for (split, mut paths) in shards {
        // Shard order within a split is the path order, 00000 first.
        paths.sort();

        let mut table: Option<SplitTable> = None;
        for path in paths {
            tracing::debug!("Fetching shard {} of split '{}'", path, split);
            let bytes = hub.fetch_bytes(dataset_id, &path).await?;
            let shard = SplitTable::from_parquet_bytes(bytes)?;
            match table.as_mut() {
                Some(table) => table.append(shard)?,
                None => table = Some(shard),
            }
        }

        if let Some(table) = table {
            splits.push((split, table));
        }
    }

    Ok(splits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    fn test_batch(start: i32, count: usize) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("text", DataType::Utf8, false),
        ]));

        let ids: Vec<i32> = (start..start + count as i32).collect();
        let texts: Vec<String> = ids.iter().map(|i| format!("row {}", i)).collect();

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(ids)),
                Arc::new(StringArray::from(texts)),
            ],
        )
        .unwrap()
    }

    fn parquet_bytes(batch: &RecordBatch) -> Bytes {
        let mut buffer = Vec::new();
        let props = WriterProperties::builder().build();
        let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props)).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
        Bytes::from(buffer)
    }

    #[test]
    fn test_save_format_parse() {
        assert_eq!(SaveFormat::parse("csv"), Some(SaveFormat::Csv));
        assert_eq!(SaveFormat::parse("JSON"), Some(SaveFormat::Json));
        assert_eq!(SaveFormat::parse(" parquet "), Some(SaveFormat::Parquet));
        assert_eq!(SaveFormat::parse("xlsx"), None);
        assert_eq!(SaveFormat::parse(""), None);
    }

    #[test]
    fn test_save_format_extension() {
        assert_eq!(SaveFormat::Csv.extension(), "csv");
        assert_eq!(SaveFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_infer_split_name_sharded() {
        assert_eq!(infer_split_name("train-00000-of-00002.parquet"), "train");
        assert_eq!(infer_split_name("data/test-00000-of-00001.parquet"), "test");
        assert_eq!(
            infer_split_name("plain_text/train-00042-of-00099.parquet"),
            "train"
        );
    }

    #[test]
    fn test_infer_split_name_normalizes_validation_aliases() {
        assert_eq!(infer_split_name("val-00000-of-00001.parquet"), "validation");
        assert_eq!(infer_split_name("data/valid.parquet"), "validation");
        assert_eq!(infer_split_name("dev-00000-of-00003.parquet"), "validation");
    }

    #[test]
    fn test_infer_split_name_falls_back_to_stem() {
        assert_eq!(infer_split_name("my_data.parquet"), "my_data");
        assert_eq!(infer_split_name("data/Custom.parquet"), "custom");
    }

    #[test]
    fn test_parquet_bytes_roundtrip() {
        let batch = test_batch(0, 10);
        let table = SplitTable::from_parquet_bytes(parquet_bytes(&batch)).unwrap();

        assert_eq!(table.num_rows(), 10);
        assert_eq!(table.schema(), batch.schema());
    }

    #[test]
    fn test_append_concatenates_shards() {
        let mut table = SplitTable::from_parquet_bytes(parquet_bytes(&test_batch(0, 5))).unwrap();
        let shard = SplitTable::from_parquet_bytes(parquet_bytes(&test_batch(5, 5))).unwrap();

        table.append(shard).unwrap();
        assert_eq!(table.num_rows(), 10);
    }

    #[test]
    fn test_append_rejects_schema_mismatch() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "other",
            DataType::Int32,
            false,
        )]));
        let odd = RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![1]))]).unwrap();

        let mut table = SplitTable::from_parquet_bytes(parquet_bytes(&test_batch(0, 3))).unwrap();
        let shard = SplitTable::from_parquet_bytes(parquet_bytes(&odd)).unwrap();

        assert!(matches!(table.append(shard), Err(HubError::Convert(_))));
    }

    #[test]
    fn test_sample_caps_row_count() {
        let table = SplitTable::from_parquet_bytes(parquet_bytes(&test_batch(0, 20))).unwrap();

        let sampled = table.sample(5).unwrap();
        assert_eq!(sampled.num_rows(), 5);
        assert_eq!(sampled.schema(), table.schema());
    }

    #[test]
    fn test_sample_larger_than_table_is_identity() {
        let table = SplitTable::from_parquet_bytes(parquet_bytes(&test_batch(0, 4))).unwrap();

        let sampled = table.sample(100).unwrap();
        assert_eq!(sampled.num_rows(), 4);
    }

    #[test]
    fn test_sample_preserves_row_order() {
        let table = SplitTable::from_parquet_bytes(parquet_bytes(&test_batch(0, 50))).unwrap();

        let sampled = table.sample(10).unwrap();
        let combined = compute::concat_batches(&sampled.schema(), sampled.batches()).unwrap();
        let ids = combined
            .column(0)
            .as_any()
            .downcast_ref::<Int32Array>()
            .unwrap();

        for i in 1..ids.len() {
            assert!(ids.value(i - 1) < ids.value(i));
        }
    }

    #[test]
    fn test_write_csv_has_header_row() {
        let table = SplitTable::from_parquet_bytes(parquet_bytes(&test_batch(0, 3))).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        table.write(SaveFormat::Csv, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "id,text");
    }

    #[test]
    fn test_write_json_is_array_of_objects() {
        let table = SplitTable::from_parquet_bytes(parquet_bytes(&test_batch(0, 3))).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        table.write(SaveFormat::Json, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["id"], 0);
        assert_eq!(rows[0]["text"], "row 0");
    }

    #[test]
    fn test_write_parquet_roundtrip() {
        let table = SplitTable::from_parquet_bytes(parquet_bytes(&test_batch(0, 6))).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.parquet");

        table.write(SaveFormat::Parquet, &path).unwrap();

        let data = Bytes::from(std::fs::read(&path).unwrap());
        let back = SplitTable::from_parquet_bytes(data).unwrap();
        assert_eq!(back.num_rows(), 6);
    }

    #[tokio::test]
    async fn test_load_splits_groups_shards_in_path_order() {
        use crate::hub::MockHub;

        // Shard 00001 listed before 00000; path sort must restore row order.
        let hub = MockHub::new()
            .with_file(
                "org/name",
                "data/train-00001-of-00002.parquet",
                parquet_bytes(&test_batch(5, 5)),
            )
            .with_file(
                "org/name",
                "data/train-00000-of-00002.parquet",
                parquet_bytes(&test_batch(0, 5)),
            )
            .with_file(
                "org/name",
                "data/test-00000-of-00001.parquet",
                parquet_bytes(&test_batch(10, 2)),
            )
            .with_file("org/name", "README.md", b"# readme".to_vec());

        let splits = load_splits(&hub, "org/name").await.unwrap();

        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].0, "train");
        assert_eq!(splits[0].1.num_rows(), 10);
        assert_eq!(splits[1].0, "test");
        assert_eq!(splits[1].1.num_rows(), 2);

        let combined =
            compute::concat_batches(&splits[0].1.schema(), splits[0].1.batches()).unwrap();
        let ids = combined
            .column(0)
            .as_any()
            .downcast_ref::<Int32Array>()
            .unwrap();
        assert_eq!(ids.value(0), 0);
        assert_eq!(ids.value(9), 9);
    }

    #[tokio::test]
    async fn test_load_splits_without_parquet_is_not_found() {
        use crate::hub::MockHub;

        let hub = MockHub::new().with_file("org/name", "README.md", b"# readme".to_vec());

        let result = load_splits(&hub, "org/name").await;
        assert!(matches!(result, Err(HubError::NotFound(_))));
    }
}

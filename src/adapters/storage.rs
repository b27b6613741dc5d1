use crate::core::{CheckpointSink, Dataset, DatasetStore, Record, Storage};
use crate::domain::model::{SCRAPED_ADDRESS_COLUMN, UPDATED_FIELDS_COLUMN};
use crate::utils::error::{EnrichError, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

/// Delimited-text datasets. Empty cells load as `None` and are written back empty.
#[derive(Debug, Clone)]
pub struct CsvDatasetStore<S: Storage> {
    storage: S,
    delimiter: u8,
}

impl<S: Storage> CsvDatasetStore<S> {
    pub fn new(storage: S, delimiter: u8) -> Self {
        Self { storage, delimiter }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Dataset> {
        // 先嘗試 UTF-8，失敗時視為 Windows-1252 (Excel 匯出的 CSV 常見)
        let text: Cow<'_, str> = match std::str::from_utf8(bytes) {
            Ok(s) => Cow::Borrowed(s),
            Err(_) => {
                tracing::warn!("Dataset is not valid UTF-8; decoding as Windows-1252");
                let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                decoded
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Err(EnrichError::DatasetError {
                message: "dataset has no header row".to_string(),
            });
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(EnrichError::DatasetError {
                    message: format!("duplicate column '{}'", column),
                });
            }
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            // 短列補 None，超出標題的欄位捨棄
            let data: HashMap<String, Option<String>> = columns
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let value = row
                        .get(i)
                        .filter(|value| !value.is_empty())
                        .map(str::to_string);
                    (column.clone(), value)
                })
                .collect();
            records.push(Record { data });
        }

        let mut dataset = Dataset::new(columns, records);
        dataset.ensure_column(SCRAPED_ADDRESS_COLUMN);
        dataset.ensure_column(UPDATED_FIELDS_COLUMN);
        Ok(dataset)
    }

    pub fn encode(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        writer.write_record(&dataset.columns)?;
        for record in &dataset.records {
            writer.write_record(
                dataset
                    .columns
                    .iter()
                    .map(|column| record.get(column).unwrap_or("")),
            )?;
        }

        writer
            .into_inner()
            .map_err(|e| EnrichError::IoError(e.into_error()))
    }
}

impl<S: Storage> DatasetStore for CsvDatasetStore<S> {
    async fn load(&self, source: &str) -> Result<Dataset> {
        tracing::debug!("Reading dataset from {}", source);
        let bytes = self.storage.read_file(source).await?;
        let dataset = self.decode(&bytes)?;
        tracing::info!(
            "📥 Loaded {} rows ({} columns) from '{}'",
            dataset.len(),
            dataset.columns.len(),
            source
        );
        Ok(dataset)
    }

    async fn save(&self, dataset: &Dataset, destination: &str) -> Result<()> {
        let bytes = self.encode(dataset)?;
        tracing::debug!("Writing {} bytes to {}", bytes.len(), destination);
        self.storage.write_file(destination, &bytes).await
    }
}

/// Writes full dataset snapshots to a fixed path.
pub struct FileCheckpoint<D: DatasetStore> {
    store: D,
    path: String,
}

impl<D: DatasetStore> FileCheckpoint<D> {
    pub fn new(store: D, path: String) -> Self {
        Self { store, path }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait::async_trait]
impl<D: DatasetStore> CheckpointSink for FileCheckpoint<D> {
    async fn checkpoint(&self, dataset: &Dataset) -> Result<()> {
        self.store.save(dataset, &self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> CsvDatasetStore<LocalStorage> {
        CsvDatasetStore::new(
            LocalStorage::new(dir.path().to_str().unwrap().to_string()),
            b',',
        )
    }

    #[tokio::test]
    async fn test_load_appends_audit_columns_and_maps_empty_cells() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("in.csv"),
            "Id,Name,BillingCity,BillingPostalCode\n1,Acme,Austin,\n2,,TBD,78701\n",
        )
        .unwrap();

        let dataset = store(&dir).load("in.csv").await.unwrap();

        assert_eq!(
            dataset.columns,
            vec!["Id", "Name", "BillingCity", "BillingPostalCode", "ScrapedAddress", "UpdatedFields"]
        );
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].get("BillingPostalCode"), None);
        assert_eq!(dataset.records[1].get("Name"), None);
        assert_eq!(dataset.records[1].get("BillingCity"), Some("TBD"));
    }

    #[tokio::test]
    async fn test_save_preserves_column_order_and_values() {
        let dir = TempDir::new().unwrap();
        let input = "Name,Notes,UpdatedFields,ScrapedAddress\n\"Acme, Inc\",\u{a0},Not found,\n";
        std::fs::write(dir.path().join("in.csv"), input).unwrap();
        let store = store(&dir);

        let dataset = store.load("in.csv").await.unwrap();
        store.save(&dataset, "out/result.csv").await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("out/result.csv")).unwrap();
        assert_eq!(written, input);
    }

    #[tokio::test]
    async fn test_tab_delimited_dataset() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("in.tsv"), "Name\tBillingCity\nAcme\tAustin\n").unwrap();
        let store = CsvDatasetStore::new(
            LocalStorage::new(dir.path().to_str().unwrap().to_string()),
            b'\t',
        );

        let dataset = store.load("in.tsv").await.unwrap();

        assert_eq!(dataset.records[0].get("BillingCity"), Some("Austin"));
        let encoded = String::from_utf8(store.encode(&dataset).unwrap()).unwrap();
        assert_eq!(encoded, "Name\tBillingCity\tScrapedAddress\tUpdatedFields\nAcme\tAustin\t\t\n");
    }

    #[test]
    fn test_duplicate_columns_are_rejected() {
        let store = CsvDatasetStore::new(LocalStorage::default(), b',');
        let result = store.decode(b"Name,Name\na,b\n");
        assert!(matches!(result, Err(EnrichError::DatasetError { .. })));
    }

    #[test]
    fn test_short_rows_load_with_empty_cells() {
        let store = CsvDatasetStore::new(LocalStorage::default(), b',');
        let dataset = store
            .decode(b"Name,BillingStreet,BillingCity,Notes\nAcme,,Austin\nBeta,1 Elm,Waco,x\n")
            .unwrap();

        assert_eq!(dataset.len(), 2);
        let acme = &dataset.records[0];
        assert_eq!(acme.get("BillingCity"), Some("Austin"));
        assert_eq!(acme.get("BillingStreet"), None);
        assert_eq!(acme.get("Notes"), None);
        assert!(acme.data.contains_key("Notes"));
        assert_eq!(dataset.records[1].get("Notes"), Some("x"));
    }

    #[test]
    fn test_windows_1252_dataset_is_decoded() {
        let store = CsvDatasetStore::new(LocalStorage::default(), b',');
        let dataset = store
            .decode(b"Name,BillingCity\nCaf\xe9 Ol\xe9,Austin\n")
            .unwrap();
        assert_eq!(dataset.records[0].get("Name"), Some("Café Olé"));

        let written = String::from_utf8(store.encode(&dataset).unwrap()).unwrap();
        assert_eq!(
            written,
            "Name,BillingCity,ScrapedAddress,UpdatedFields\nCafé Olé,Austin,,\n"
        );
        assert!(!written.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_missing_source_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = store(&dir).load("nope.csv").await;
        assert!(matches!(result, Err(EnrichError::IoError(_))));
    }

    #[tokio::test]
    async fn test_file_checkpoint_writes_snapshot() {
        let dir = TempDir::new().unwrap();
        let checkpoint = FileCheckpoint::new(store(&dir), "autosave.csv".to_string());
        let dataset = Dataset::new(
            vec!["Name".to_string(), "UpdatedFields".to_string()],
            vec![Record::new().with("Name", "Acme").with("UpdatedFields", "Not found")],
        );

        checkpoint.checkpoint(&dataset).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("autosave.csv")).unwrap();
        assert_eq!(written, "Name,UpdatedFields\nAcme,Not found\n");
    }
}

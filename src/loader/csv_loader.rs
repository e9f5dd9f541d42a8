use crate::models::Upload;
use anyhow::{Context, Result, anyhow};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// Parses uploaded CSV bytes into a typed table.
///
/// `infer_schema_rows == 0` infers column types from every row. A bounded
/// sample can type a column as numeric that later holds text; that upload is
/// re-read with every column as text so the cleaning stages can coerce it.
pub struct CsvLoader {
    infer_schema_rows: usize,
}

impl CsvLoader {
    pub fn new(infer_schema_rows: usize) -> Self {
        Self { infer_schema_rows }
    }

    pub async fn read_upload(path: &Path) -> Result<Upload> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read upload: {}", path.display()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Upload::new(name, bytes))
    }

    pub fn load(&self, upload: &Upload) -> Result<DataFrame> {
        if upload.bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(anyhow!("Upload '{}' is empty", upload.name));
        }

        let infer_length = match self.infer_schema_rows {
            0 => None,
            rows => Some(rows),
        };

        let df = match Self::read_csv(upload, infer_length) {
            Ok(df) => df,
            Err(e) if infer_length.is_some() => {
                warn!(
                    "Type inference over {} rows failed for '{}' ({}), reading every column as text",
                    self.infer_schema_rows, upload.name, e
                );
                Self::read_csv(upload, Some(0))
                    .with_context(|| format!("Failed to parse CSV upload '{}'", upload.name))?
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to parse CSV upload '{}'", upload.name));
            }
        };

        info!(
            "Loaded '{}': {} rows x {} columns",
            upload.name,
            df.height(),
            df.width()
        );

        Ok(df)
    }

    fn read_csv(upload: &Upload, infer_length: Option<usize>) -> PolarsResult<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(infer_length)
            .into_reader_with_file_handle(Cursor::new(upload.bytes.clone()))
            .finish()
    }
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "name,main_category,ratings,no_of_ratings,discount_price,actual_price\n\
        Phone,electronics,4.2,\"2,255\",\"₹1,299\",\"₹2,000\"\n\
        Kettle,,3.9,120,₹499,₹999\n";

    #[test]
    fn test_load_infers_types() {
        let loader = CsvLoader::default();
        let df = loader
            .load(&Upload::new("sample.csv", SAMPLE.as_bytes().to_vec()))
            .unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 6);
        assert_eq!(df.column("ratings").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("no_of_ratings").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("discount_price").unwrap().dtype(), &DataType::String);
        // Empty fields load as missing
        assert_eq!(df.column("main_category").unwrap().null_count(), 1);
    }

    fn listings_with_late_text_rating(rows: usize, text_at: usize) -> Upload {
        let mut csv = String::from("main_category,ratings,no_of_ratings,discount_price,actual_price\n");
        for i in 0..rows {
            let rating = if i == text_at { "Get" } else { "4.1" };
            csv.push_str(&format!("toys,{},12,₹80,₹100\n", rating));
        }
        Upload::new("late.csv", csv.into_bytes())
    }

    #[test]
    fn test_full_scan_types_late_text_as_string() {
        let upload = listings_with_late_text_rating(10_005, 10_003);
        let df = CsvLoader::default().load(&upload).unwrap();

        assert_eq!(df.height(), 10_005);
        assert_eq!(df.column("ratings").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_bounded_inference_falls_back_to_text() {
        let upload = listings_with_late_text_rating(20, 15);
        let df = CsvLoader::new(5).load(&upload).unwrap();

        assert_eq!(df.height(), 20);
        assert_eq!(df.column("ratings").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("no_of_ratings").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_empty_upload_is_error() {
        let loader = CsvLoader::default();
        assert!(loader.load(&Upload::new("empty.csv", b"  \n".to_vec())).is_err());
    }

    #[tokio::test]
    async fn test_read_upload_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let upload = CsvLoader::read_upload(file.path()).await.unwrap();
        assert_eq!(upload.bytes, SAMPLE.as_bytes());
        assert!(!upload.name.is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_file_is_error() {
        let err = CsvLoader::read_upload(Path::new("no/such/upload.csv"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no/such/upload.csv"));
    }
}

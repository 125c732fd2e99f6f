//! Raw archive batches.
//!
//! Every record fetched from the API lands unmodified in the archive before
//! anything derived is written, so the index can always be rebuilt from
//! here.

use crate::Result;
use crate::store::ObjectStore;
use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use ohno::IntoAppError;
use std::io::Write;
use std::sync::Arc;

const LOG_TARGET: &str = "   archive";

/// Result of committing one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The batch was committed as a single object.
    Written { key: String, records: usize },

    /// The batch was empty; nothing was written.
    Skipped,
}

/// Writes batches of raw records as gzip-compressed NDJSON objects.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    objects: Arc<dyn ObjectStore>,
}

impl ArchiveWriter {
    #[must_use]
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    /// Serialize `records` as one compact JSON document per line, compress
    /// the batch, and commit it as one immutable object under `prefix`. An
    /// empty batch writes nothing and reports [`BatchOutcome::Skipped`].
    pub fn write_batch(&self, prefix: &str, records: &[serde_json::Value]) -> Result<BatchOutcome> {
        if records.is_empty() {
            log::info!(target: LOG_TARGET, "SKIP write {prefix} 0 rows");
            return Ok(BatchOutcome::Skipped);
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for record in records {
            let line = serde_json::to_vec(record).into_app_err("serializing archive record")?;
            encoder.write_all(&line).into_app_err("compressing archive batch")?;
            encoder.write_all(b"\n").into_app_err("compressing archive batch")?;
        }

        let body = encoder.finish().into_app_err("compressing archive batch")?;
        let key = format!("{prefix}/part-{}.ndjson.gz", Utc::now().timestamp());
        self.objects.put(&key, &body, "application/json", "gzip")?;

        log::info!(target: LOG_TARGET, "WROTE {key} rows {}", records.len());
        Ok(BatchOutcome::Written {
            key,
            records: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryObjectStore;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_empty_batch_is_skipped() {
        let objects = Arc::new(MemoryObjectStore::new());
        let writer = ArchiveWriter::new(Arc::clone(&objects) as Arc<dyn ObjectStore>);

        let outcome = writer.write_batch("raw/user=octocat/dt=2024-01-01/events", &[]).unwrap();
        assert_eq!(outcome, BatchOutcome::Skipped);
        assert!(objects.keys().is_empty());
    }

    #[test]
    fn test_batch_written_as_gzip_ndjson() {
        let objects = Arc::new(MemoryObjectStore::new());
        let writer = ArchiveWriter::new(Arc::clone(&objects) as Arc<dyn ObjectStore>);

        let records = vec![
            serde_json::json!({"id": 1, "name": "a"}),
            serde_json::json!({"id": 2, "name": "b"}),
        ];
        let outcome = writer.write_batch("raw/user=octocat/dt=2024-01-01/repos", &records).unwrap();

        let BatchOutcome::Written { key, records: count } = outcome else {
            panic!("expected a write");
        };
        assert_eq!(count, 2);
        assert!(key.starts_with("raw/user=octocat/dt=2024-01-01/repos/part-"));
        assert!(key.ends_with(".ndjson.gz"));

        let object = objects.get(&key).unwrap();
        assert_eq!(object.content_type, "application/json");
        assert_eq!(object.content_encoding, "gzip");

        let mut text = String::new();
        let _ = GzDecoder::new(object.body.as_slice()).read_to_string(&mut text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"id":1,"name":"a"}"#);
        assert_eq!(lines[1], r#"{"id":2,"name":"b"}"#);
    }

    #[test]
    fn test_object_timestamp_is_numeric() {
        let objects = Arc::new(MemoryObjectStore::new());
        let writer = ArchiveWriter::new(Arc::clone(&objects) as Arc<dyn ObjectStore>);

        let outcome = writer
            .write_batch("raw/user=octocat/dt=2024-01-01/profile", &[serde_json::json!({})])
            .unwrap();
        let BatchOutcome::Written { key, .. } = outcome else {
            panic!("expected a write");
        };

        let stamp = key
            .rsplit_once("part-")
            .and_then(|(_, rest)| rest.strip_suffix(".ndjson.gz"))
            .unwrap();
        assert!(stamp.parse::<i64>().unwrap() > 1_700_000_000);
    }
}

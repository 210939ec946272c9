/// Travel data store
///
/// The itinerary dataset is one JSON document keyed by region name. Each
/// region carries `photos` and `videos` filename lists plus arbitrary
/// other fields this store never touches. Every mutation is a full
/// read-modify-write of the document, serialized behind a single mutex so
/// concurrent uploads cannot lose updates.
use crate::{
    error::{TabiError, TabiResult},
    media::MediaKind,
};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// JSON document store for the travel itinerary
pub struct TravelStore {
    path: PathBuf,
    /// Single-writer serialization point for all document access
    lock: Mutex<()>,
}

impl TravelStore {
    /// Create a store over the given document path. The file is not
    /// required to exist yet; absence surfaces as `NotFound` on access.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Load and parse the document. Callers must hold the lock.
    async fn load(&self) -> TabiResult<Map<String, Value>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TabiError::NotFound(format!(
                    "travel data file not found: {}",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(TabiError::MalformedData(
                "travel data root must be a JSON object".to_string(),
            )),
            Err(e) => Err(TabiError::MalformedData(format!(
                "invalid JSON in travel data: {}",
                e
            ))),
        }
    }

    /// Serialize the document and replace the file on disk
    async fn persist(&self, document: &Map<String, Value>) -> TabiResult<()> {
        let raw = serde_json::to_vec_pretty(&Value::Object(document.clone()))
            .map_err(|e| TabiError::Internal(format!("serialize travel data: {}", e)))?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    /// Read the full document
    pub async fn read(&self) -> TabiResult<Value> {
        let _guard = self.lock.lock().await;
        Ok(Value::Object(self.load().await?))
    }

    /// Append freshly stored filenames to a region's photo or video list.
    ///
    /// Names already present in the list are skipped, so replaying an
    /// upload never duplicates entries. All other region fields are
    /// carried through the rewrite untouched. Fails with `NotFound` when
    /// the region key is absent from the document.
    pub async fn append_media(
        &self,
        region: &str,
        kind: MediaKind,
        names: &[String],
    ) -> TabiResult<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;

        let record = document.get_mut(region).ok_or_else(|| {
            TabiError::NotFound(format!("region \"{}\" not found in travel data", region))
        })?;

        let record = record.as_object_mut().ok_or_else(|| {
            TabiError::MalformedData(format!("region \"{}\" is not a JSON object", region))
        })?;

        let list_key = match kind {
            MediaKind::Image => "photos",
            MediaKind::Video => "videos",
        };

        let list = record
            .entry(list_key)
            .or_insert_with(|| Value::Array(Vec::new()));
        let list = list.as_array_mut().ok_or_else(|| {
            TabiError::MalformedData(format!(
                "\"{}\" of region \"{}\" is not a list",
                list_key, region
            ))
        })?;

        for name in names {
            let already_present = list.iter().any(|v| v.as_str() == Some(name.as_str()));
            if already_present {
                debug!("{} already recorded for {}, skipping", name, region);
                continue;
            }
            list.push(Value::String(name.clone()));
        }

        self.persist(&document).await
    }
}

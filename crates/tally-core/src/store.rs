//! JSON-file document store.
//!
//! Stands in for the original deployment's hosted document store: one JSON
//! object file, one entry per document key. Writes go through a temp file and
//! rename so a crash mid-write cannot leave a torn file behind.

use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::{fs, sync::Mutex};

use crate::{
    domain::{MarkerId, UserId},
    ports::{MarkerStore, StateStore},
    Result,
};

pub struct JsonDocumentStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the backing file.
    lock: Mutex<()>,
}

impl JsonDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => {
                let value: Value = serde_json::from_str(&text)?;
                Ok(value.as_object().cloned().unwrap_or_default())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, docs: &Map<String, Value>) -> Result<()> {
        let body = serde_json::to_string_pretty(&Value::Object(docs.clone()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        let docs = self.read_all().await?;
        Ok(docs.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut docs = self.read_all().await?;
        docs.insert(key.to_string(), value);
        self.write_all(&docs).await
    }
}

/// Moderation markers stored as per-user documents in a `StateStore`.
///
/// Document key `markers/<user>`, value: JSON array of marker id strings.
pub struct StoredMarkers {
    store: Arc<dyn StateStore>,
}

impl StoredMarkers {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    fn key(user: &UserId) -> String {
        format!("markers/{}", user.0)
    }
}

#[async_trait]
impl MarkerStore for StoredMarkers {
    async fn has_marker(&self, user: &UserId, marker: &MarkerId) -> Result<bool> {
        let Some(doc) = self.store.get(&Self::key(user)).await? else {
            return Ok(false);
        };
        Ok(doc
            .as_array()
            .is_some_and(|xs| xs.iter().any(|x| x.as_str() == Some(marker.0.as_str()))))
    }

    async fn grant_marker(&self, user: &UserId, marker: &MarkerId) -> Result<()> {
        let key = Self::key(user);
        let mut markers = match self.store.get(&key).await? {
            Some(Value::Array(xs)) => xs,
            _ => Vec::new(),
        };
        if markers.iter().any(|x| x.as_str() == Some(marker.0.as_str())) {
            return Ok(());
        }
        markers.push(Value::String(marker.0.clone()));
        self.store.put(&key, Value::Array(markers)).await
    }
}

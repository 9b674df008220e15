//! Catalog providers — where stores and benefits come from.
//!
//! `JsonCatalogProvider` reads `stores.json` and `benefits.json` from a directory.
//! Each file may hold a bare array or an object wrapping the array under
//! `stores` / `benefits`. A missing file is treated as an empty list; the
//! generation path rejects an empty catalog on its own.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::models::{Benefit, Store};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Source of catalog records. Implementations must return fully-formed records
/// or an explicit error; an empty list is a valid answer.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn load_stores(&self) -> Result<Vec<Store>, CatalogError>;
    async fn load_benefits(&self) -> Result<Vec<Benefit>, CatalogError>;
}

pub struct JsonCatalogProvider {
    dir: PathBuf,
}

impl JsonCatalogProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_listing<T: DeserializeOwned>(
        &self,
        file_name: &str,
        key: &str,
    ) -> Result<Vec<T>, CatalogError> {
        let path = self.dir.join(file_name);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Catalog file {} not found, treating as empty", path.display());
                return Ok(Vec::new());
            }
            Err(source) => return Err(CatalogError::Io { path, source }),
        };

        let items: Vec<T> =
            parse_listing(&raw, key).map_err(|source| CatalogError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!("Read {} records from {}", items.len(), path.display());
        Ok(items)
    }
}

#[async_trait]
impl CatalogProvider for JsonCatalogProvider {
    async fn load_stores(&self) -> Result<Vec<Store>, CatalogError> {
        self.read_listing("stores.json", "stores").await
    }

    async fn load_benefits(&self) -> Result<Vec<Benefit>, CatalogError> {
        self.read_listing("benefits.json", "benefits").await
    }
}

/// Parses either `[...]` or `{"<key>": [...]}`.
fn parse_listing<T: DeserializeOwned>(raw: &str, key: &str) -> Result<Vec<T>, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let list = match value {
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(list)
}

/// In-memory provider for tests.
#[cfg(test)]
pub struct StaticCatalogProvider {
    pub stores: Vec<Store>,
    pub benefits: Vec<Benefit>,
}

#[cfg(test)]
#[async_trait]
impl CatalogProvider for StaticCatalogProvider {
    async fn load_stores(&self) -> Result<Vec<Store>, CatalogError> {
        Ok(self.stores.clone())
    }

    async fn load_benefits(&self) -> Result<Vec<Benefit>, CatalogError> {
        Ok(self.benefits.clone())
    }
}

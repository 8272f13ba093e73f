//! In-process catalog and custom-model storage.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use mebel_core::{CatalogItem, FurnitureModel, PriceTable};
use mebel_protocol::{AccessError, CatalogFilter, DataAccess};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

const BUNDLED: &str = include_str!("../data/catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug)]
pub struct CatalogStore {
    items: Vec<CatalogItem>,
    saved: RwLock<HashMap<u64, FurnitureModel>>,
    next_id: AtomicU64,
    prices: PriceTable,
}

impl CatalogStore {
    pub fn new(items: Vec<CatalogItem>, prices: PriceTable) -> Self {
        Self {
            items,
            saved: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            prices,
        }
    }

    pub fn load(path: impl AsRef<Path>, prices: PriceTable) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path.display().to_string(), prices)
    }

    /// Catalog shipped with the server.
    pub fn bundled(prices: PriceTable) -> Result<Self, CatalogError> {
        Self::parse(BUNDLED, "bundled catalog".to_string(), prices)
    }

    fn parse(content: &str, origin: String, prices: PriceTable) -> Result<Self, CatalogError> {
        let items: Vec<CatalogItem> = serde_json::from_str(content)
            .map_err(|source| CatalogError::Parse { origin, source })?;
        Ok(Self::new(items, prices))
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn filtered(&self, filter: &CatalogFilter) -> Vec<CatalogItem> {
        self.items
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect()
    }

    pub fn item(&self, id: u64) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Checks a submitted model against its catalog base.
    pub fn validate(&self, model: &FurnitureModel) -> Result<(), AccessError> {
        let Some(base) = self.item(model.base_item_id) else {
            return Err(AccessError::Validation(format!(
                "unknown base item {}",
                model.base_item_id
            )));
        };
        if model.elements.is_empty() {
            return Err(AccessError::Validation("model has no elements".to_string()));
        }
        let expected = self.prices.price(&base.default_model, model);
        if model.total_price != expected {
            return Err(AccessError::Validation(format!(
                "total price {} does not match {expected}",
                model.total_price
            )));
        }
        Ok(())
    }

    /// Validates and stores a model under a fresh id.
    pub async fn store(&self, model: FurnitureModel) -> Result<FurnitureModel, AccessError> {
        self.validate(&model)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = FurnitureModel {
            id: Some(id),
            ..model
        };
        self.saved.write().await.insert(id, stored.clone());
        debug!(id, base = stored.base_item_id, "custom model stored");
        Ok(stored)
    }

    pub async fn saved(&self, id: u64) -> Result<FurnitureModel, AccessError> {
        self.saved
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AccessError::NotFound(id))
    }
}

impl DataAccess for CatalogStore {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, AccessError> {
        Ok(self.items.clone())
    }

    async fn fetch_item(&self, id: u64) -> Result<CatalogItem, AccessError> {
        self.item(id).cloned().ok_or(AccessError::NotFound(id))
    }

    async fn save_model(&self, model: FurnitureModel) -> Result<FurnitureModel, AccessError> {
        self.store(model).await
    }
}

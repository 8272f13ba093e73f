//! Client <-> server message protocol and the data-access seam the
//! constructor talks through.

use std::future::Future;

use mebel_core::{CatalogItem, FurnitureModel, FurnitureType};
use serde::{Deserialize, Serialize};

pub mod routes {
    pub const CATALOG: &str = "/furniture";
    pub const CATALOG_ITEM: &str = "/furniture/:id";
    pub const CUSTOM_MODELS: &str = "/customModels";
    pub const CUSTOM_MODEL: &str = "/customModels/:id";
    pub const SOCKET: &str = "/ws";
}

/// Catalog query, sent as the query string of [`routes::CATALOG`].
///
/// Color matches case-insensitively by substring; size limits are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFilter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FurnitureType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub min_depth: f64,
    pub max_depth: f64,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            kind: None,
            color: None,
            min_width: 0.0,
            max_width: 500.0,
            min_height: 0.0,
            max_height: 300.0,
            min_depth: 0.0,
            max_depth: 200.0,
        }
    }
}

impl CatalogFilter {
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if self.kind.is_some_and(|kind| kind != item.kind) {
            return false;
        }
        if let Some(color) = self.color.as_deref().filter(|c| !c.is_empty()) {
            if !item.color.to_lowercase().contains(&color.to_lowercase()) {
                return false;
            }
        }
        let dim = item.default_model.dimensions;
        (self.min_width..=self.max_width).contains(&dim.width)
            && (self.min_height..=self.max_height).contains(&dim.height)
            && (self.min_depth..=self.max_depth).contains(&dim.depth)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMsg {
    Hello { client_version: String },
    FetchCatalog {
        #[serde(default)]
        filter: CatalogFilter,
    },
    FetchItem { id: u64 },
    SaveModel { model: FurnitureModel },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMsg {
    HelloAck,
    Catalog { items: Vec<CatalogItem> },
    Item { item: CatalogItem },
    ModelSaved { model: FurnitureModel },
    Error { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    NotFound,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("item {0} not found")]
    NotFound(u64),
    #[error("model rejected: {0}")]
    Validation(String),
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::Transport(_) => ErrorKind::Transport,
            AccessError::NotFound(_) => ErrorKind::NotFound,
            AccessError::Validation(_) => ErrorKind::Validation,
        }
    }
}

/// JSON body of a failed REST call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl From<&AccessError> for ErrorBody {
    fn from(err: &AccessError) -> Self {
        let (id, message) = match err {
            AccessError::NotFound(id) => (Some(*id), err.to_string()),
            AccessError::Transport(msg) | AccessError::Validation(msg) => (None, msg.clone()),
        };
        Self {
            kind: err.kind(),
            message,
            id,
        }
    }
}

impl From<ErrorBody> for AccessError {
    fn from(body: ErrorBody) -> Self {
        match (body.kind, body.id) {
            (ErrorKind::NotFound, Some(id)) => AccessError::NotFound(id),
            (ErrorKind::Validation, _) => AccessError::Validation(body.message),
            _ => AccessError::Transport(body.message),
        }
    }
}

impl From<AccessError> for ServerMsg {
    fn from(err: AccessError) -> Self {
        ServerMsg::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Catalog reads and custom-model writes. Implemented by the server's
/// in-process store and by whatever transport a client wires in.
pub trait DataAccess: Send + Sync {
    fn fetch_catalog(&self) -> impl Future<Output = Result<Vec<CatalogItem>, AccessError>> + Send;

    fn fetch_item(&self, id: u64) -> impl Future<Output = Result<CatalogItem, AccessError>> + Send;

    /// Persists a model and returns the stored copy, which carries its id.
    fn save_model(
        &self,
        model: FurnitureModel,
    ) -> impl Future<Output = Result<FurnitureModel, AccessError>> + Send;
}

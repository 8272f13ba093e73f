//! HTTP and websocket front of the furniture catalog.

pub mod catalog;

use std::sync::Arc;

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use mebel_core::{CatalogItem, FurnitureModel};
use mebel_protocol::{
    routes, AccessError, CatalogFilter, ClientMsg, ErrorBody, ErrorKind, ServerMsg,
};
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use catalog::{CatalogError, CatalogStore};

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<CatalogStore>,
    save_tx: mpsc::Sender<SaveJob>,
}

struct SaveJob {
    model: FurnitureModel,
    respond_to: oneshot::Sender<Result<FurnitureModel, AccessError>>,
}

impl AppState {
    /// Spawns the save worker; must be called inside a tokio runtime.
    pub fn spawn(catalog: Arc<CatalogStore>, queue: usize) -> Self {
        let (save_tx, save_rx) = mpsc::channel(queue.max(1));
        tokio::spawn(save_worker(Arc::clone(&catalog), save_rx));
        Self { catalog, save_tx }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Queues a save behind any outstanding ones and waits for its result.
    pub async fn save(&self, model: FurnitureModel) -> Result<FurnitureModel, AccessError> {
        let (respond_to, reply) = oneshot::channel();
        self.save_tx
            .send(SaveJob { model, respond_to })
            .await
            .map_err(|_| AccessError::Transport("save queue unavailable".to_string()))?;
        reply
            .await
            .map_err(|_| AccessError::Transport("save worker stopped".to_string()))?
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(routes::CATALOG, get(list_catalog))
        .route(routes::CATALOG_ITEM, get(get_item))
        .route(routes::CUSTOM_MODELS, post(create_model))
        .route(routes::CUSTOM_MODEL, get(get_model))
        .route(routes::SOCKET, get(ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// [`AccessError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub AccessError);

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Transport => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}

async fn list_catalog(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> Json<Vec<CatalogItem>> {
    Json(state.catalog.filtered(&filter))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CatalogItem>, ApiError> {
    state
        .catalog
        .item(id)
        .cloned()
        .map(Json)
        .ok_or(ApiError(AccessError::NotFound(id)))
}

async fn create_model(
    State(state): State<AppState>,
    Json(model): Json<FurnitureModel>,
) -> Result<(StatusCode, Json<FurnitureModel>), ApiError> {
    let saved = state.save(model).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<FurnitureModel>, ApiError> {
    Ok(Json(state.catalog.saved(id).await?))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMsg>(32);

    let send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_tx.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        let reply = match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(client_msg) => respond(&state, client_msg).await,
                Err(err) => ServerMsg::Error {
                    kind: ErrorKind::Validation,
                    message: format!("unrecognized payload: {err}"),
                },
            },
            Message::Binary(_) => ServerMsg::Error {
                kind: ErrorKind::Validation,
                message: "binary messages are not supported".to_string(),
            },
            Message::Close(_) => break,
            _ => continue,
        };
        if out_tx.send(reply).await.is_err() {
            break;
        }
    }

    drop(out_tx);
    let _ = send_task.await;
    info!("websocket closed");
}

async fn respond(state: &AppState, msg: ClientMsg) -> ServerMsg {
    match msg {
        ClientMsg::Hello { client_version } => {
            info!(%client_version, "client hello");
            ServerMsg::HelloAck
        }
        ClientMsg::FetchCatalog { filter } => ServerMsg::Catalog {
            items: state.catalog.filtered(&filter),
        },
        ClientMsg::FetchItem { id } => match state.catalog.item(id) {
            Some(item) => ServerMsg::Item { item: item.clone() },
            None => AccessError::NotFound(id).into(),
        },
        ClientMsg::SaveModel { model } => match state.save(model).await {
            Ok(model) => ServerMsg::ModelSaved { model },
            Err(err) => err.into(),
        },
    }
}

async fn save_worker(catalog: Arc<CatalogStore>, mut rx: mpsc::Receiver<SaveJob>) {
    while let Some(job) = rx.recv().await {
        let result = catalog.store(job.model).await;
        match &result {
            Ok(model) => info!(id = ?model.id, price = model.total_price, "custom model saved"),
            Err(err) => warn!(error = %err, "custom model rejected"),
        }
        let _ = job.respond_to.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mebel_core::{ConfigurationStore, ElementEdit, PriceTable};

    fn state() -> AppState {
        let catalog = CatalogStore::bundled(PriceTable::default()).unwrap();
        AppState::spawn(Arc::new(catalog), 4)
    }

    fn leather_sofa(state: &AppState) -> FurnitureModel {
        let item = state.catalog().item(2).unwrap();
        let mut store = ConfigurationStore::new(
            item.default_model.clone(),
            item.available_materials.clone(),
            item.available_colors.clone(),
        );
        let seat = item.default_model.elements[0].id.clone();
        store.update_element(&seat, ElementEdit::Material("кожа".to_string()));
        (*store.model()).clone()
    }

    #[tokio::test]
    async fn save_goes_through_worker() {
        let state = state();
        let model = leather_sofa(&state);
        assert_eq!(model.total_price, 67_500);

        let (status, Json(saved)) = create_model(State(state.clone()), Json(model))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved.id, Some(1));

        let Json(fetched) = get_model(State(state), Path(1)).await.unwrap();
        assert_eq!(fetched, saved);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let state = state();
        let err = get_item(State(state.clone()), Path(404)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let mut model = leather_sofa(&state);
        model.total_price = 1;
        let err = create_model(State(state), Json(model)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let transport = ApiError(AccessError::Transport("down".to_string()));
        assert_eq!(
            transport.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn socket_messages_are_answered() {
        let state = state();
        let reply = respond(
            &state,
            ClientMsg::Hello {
                client_version: "0.1.0".to_string(),
            },
        )
        .await;
        assert_eq!(reply, ServerMsg::HelloAck);

        let reply = respond(&state, ClientMsg::FetchItem { id: 3 }).await;
        assert!(matches!(reply, ServerMsg::Item { item } if item.id == 3));

        let reply = respond(&state, ClientMsg::FetchItem { id: 77 }).await;
        assert!(matches!(
            reply,
            ServerMsg::Error {
                kind: ErrorKind::NotFound,
                ..
            }
        ));

        let model = leather_sofa(&state);
        let reply = respond(&state, ClientMsg::SaveModel { model }).await;
        assert!(matches!(reply, ServerMsg::ModelSaved { model } if model.id == Some(1)));
    }

    #[tokio::test]
    async fn catalog_query_filters_items() {
        let state = state();
        let filter = CatalogFilter {
            min_height: 100.0,
            ..CatalogFilter::default()
        };
        let Json(items) = list_catalog(State(state), Query(filter)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 3);
    }
}

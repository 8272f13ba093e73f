//! Constructor session: wires the configuration store, the preview and the
//! data-access seam together for one opened catalog item.

use std::sync::Arc;

use glam::DVec2;
use mebel_config::AppConfig;
use mebel_core::{CatalogItem, ConfigurationStore, ElementId, FurnitureModel, StoreSettings};
use mebel_geom::ViewRotation;
use mebel_protocol::{AccessError, DataAccess};
use mebel_render::interaction::{DEFAULT_VIEW, DRAG_SENSITIVITY};
use mebel_render::{render, Frame, InteractionController, ViewState};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no furniture item is open")]
    NotOpen,
    #[error("a save is already in progress")]
    SaveInProgress,
    #[error(transparent)]
    Access(#[from] AccessError),
}

#[derive(Debug, Clone)]
pub struct ConstructorSettings {
    pub store: StoreSettings,
    pub home_view: ViewRotation,
    pub drag_sensitivity: f64,
}

impl Default for ConstructorSettings {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            home_view: DEFAULT_VIEW,
            drag_sensitivity: DRAG_SENSITIVITY,
        }
    }
}

impl ConstructorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            store: config.store_settings(),
            home_view: ViewRotation::new(config.view.default_pitch, config.view.default_yaw),
            drag_sensitivity: config.view.drag_sensitivity,
        }
    }
}

/// One row of the shelf list.
#[derive(Debug, Clone, PartialEq)]
pub struct ShelfSummary {
    pub id: ElementId,
    pub name: String,
    /// `"{color} • {material} • Высота: {y}см"`
    pub line: String,
    pub removable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewStats {
    pub element_count: usize,
    pub scale_percent: i64,
}

/// Proof that a save was started, tied to the session that started it.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    generation: u64,
    model: Arc<FurnitureModel>,
}

impl SaveTicket {
    /// Snapshot to send.
    pub fn model(&self) -> &FurnitureModel {
        &self.model
    }
}

#[derive(Debug)]
struct Session {
    item_id: u64,
    store: ConfigurationStore,
    view: InteractionController,
}

impl Session {
    fn frame(&self) -> Frame {
        render(&self.store.model(), self.store.selected_id(), self.view.rotation())
    }
}

#[derive(Debug, Default)]
pub struct Constructor {
    settings: ConstructorSettings,
    session: Option<Session>,
    // Bumped on every open and close; save results from an older generation
    // are dropped.
    generation: u64,
    saving: Option<u64>,
}

impl Constructor {
    pub fn new(settings: ConstructorSettings) -> Self {
        Self {
            settings,
            session: None,
            generation: 0,
            saving: None,
        }
    }

    pub fn settings(&self) -> &ConstructorSettings {
        &self.settings
    }

    /// Starts a fresh session on `item`, discarding any open one.
    pub fn open(&mut self, item: &CatalogItem) -> Arc<FurnitureModel> {
        self.generation += 1;
        self.saving = None;
        let store = ConfigurationStore::with_settings(
            item.default_model.clone(),
            item.available_materials.clone(),
            item.available_colors.clone(),
            self.settings.store.clone(),
        );
        let model = store.model();
        info!(
            item = item.id,
            name = %item.name,
            price = model.total_price,
            "constructor opened"
        );
        self.session = Some(Session {
            item_id: item.id,
            store,
            view: InteractionController::new(
                self.settings.home_view,
                self.settings.drag_sensitivity,
            ),
        });
        model
    }

    /// Fetches a catalog item and opens it. The current session is kept if
    /// the fetch fails.
    pub async fn open_item(
        &mut self,
        access: &impl DataAccess,
        id: u64,
    ) -> Result<Arc<FurnitureModel>, SessionError> {
        let item = access.fetch_item(id).await?;
        Ok(self.open(&item))
    }

    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            info!(item = session.item_id, "constructor closed");
        }
        self.generation += 1;
        self.saving = None;
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn item_id(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.item_id)
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }

    pub fn store(&self) -> Result<&ConfigurationStore, SessionError> {
        self.session().map(|s| &s.store)
    }

    pub fn store_mut(&mut self) -> Result<&mut ConfigurationStore, SessionError> {
        self.session_mut().map(|s| &mut s.store)
    }

    pub fn interaction(&self) -> Result<&InteractionController, SessionError> {
        self.session().map(|s| &s.view)
    }

    pub fn interaction_mut(&mut self) -> Result<&mut InteractionController, SessionError> {
        self.session_mut().map(|s| &mut s.view)
    }

    pub fn frame(&self) -> Result<Frame, SessionError> {
        self.session().map(Session::frame)
    }

    /// Selects the part under `point`, in scene pixels.
    pub fn click(&mut self, point: DVec2) -> Result<Option<ElementId>, SessionError> {
        let session = self.session_mut()?;
        let frame = session.frame();
        Ok(session.view.click(&frame, point, &mut session.store))
    }

    pub fn view_state(&self) -> Result<ViewState, SessionError> {
        self.session().map(|s| s.view.view_state(&s.store))
    }

    pub fn preview_stats(&self) -> Result<PreviewStats, SessionError> {
        let frame = self.frame()?;
        Ok(PreviewStats {
            element_count: frame.element_count(),
            scale_percent: frame.scene.scale_percent(),
        })
    }

    pub fn shelf_summaries(&self) -> Result<Vec<ShelfSummary>, SessionError> {
        let store = self.store()?;
        let removable = store.can_remove_shelf();
        Ok(store
            .model()
            .shelves()
            .map(|shelf| ShelfSummary {
                id: shelf.id.clone(),
                name: shelf.name.clone(),
                line: format!(
                    "{} • {} • Высота: {}см",
                    shelf.color, shelf.material, shelf.position.y
                ),
                removable,
            })
            .collect())
    }

    /// Marks a save as outstanding and hands out the snapshot to send.
    pub fn begin_save(&mut self) -> Result<SaveTicket, SessionError> {
        let model = self.store()?.model();
        if self.saving.is_some() {
            return Err(SessionError::SaveInProgress);
        }
        self.saving = Some(self.generation);
        debug!(generation = self.generation, "save started");
        Ok(SaveTicket {
            generation: self.generation,
            model,
        })
    }

    /// Applies the outcome of a save.
    ///
    /// Returns `Ok(None)` when the ticket belongs to a session that has since
    /// been closed or replaced. On failure the working model is left as is.
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<FurnitureModel, AccessError>,
    ) -> Result<Option<Arc<FurnitureModel>>, SessionError> {
        if ticket.generation != self.generation || self.saving != Some(ticket.generation) {
            debug!(ticket = ticket.generation, current = self.generation, "stale save result ignored");
            return Ok(None);
        }
        self.saving = None;

        match result {
            Ok(confirmed) => {
                let saved_id = confirmed.id;
                let model = self.store_mut()?.adopt_saved(confirmed);
                info!(id = ?saved_id, price = model.total_price, "model saved");
                Ok(Some(model))
            }
            Err(err) => {
                warn!(error = %err, "save failed; keeping the local model");
                Err(err.into())
            }
        }
    }

    pub async fn save(
        &mut self,
        access: &impl DataAccess,
    ) -> Result<Option<Arc<FurnitureModel>>, SessionError> {
        let ticket = self.begin_save()?;
        let result = access.save_model(ticket.model().clone()).await;
        self.finish_save(ticket, result)
    }

    fn session(&self) -> Result<&Session, SessionError> {
        self.session.as_ref().ok_or(SessionError::NotOpen)
    }

    fn session_mut(&mut self) -> Result<&mut Session, SessionError> {
        self.session.as_mut().ok_or(SessionError::NotOpen)
    }
}

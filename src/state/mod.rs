mod sse;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{config::AppConfig, dao::board_store::BoardStore, sync::RoomHandle};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Capacity of the per-process SSE broadcast channel.
const SSE_CAPACITY: usize = 16;

/// Central application state storing live rooms and the board store handle.
pub struct AppState {
    config: AppConfig,
    board_store: RwLock<Option<Arc<dyn BoardStore>>>,
    rooms: DashMap<Uuid, RoomHandle>,
    sse: SseHub,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a board store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            board_store: RwLock::new(None),
            rooms: DashMap::new(),
            sse: SseHub::new(SSE_CAPACITY),
            degraded: degraded_tx,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current board store, if one is installed.
    pub async fn board_store(&self) -> Option<Arc<dyn BoardStore>> {
        let guard = self.board_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a board store implementation and leave degraded mode.
    pub async fn install_board_store(&self, store: Arc<dyn BoardStore>) {
        {
            let mut guard = self.board_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current board store and enter degraded mode.
    pub async fn clear_board_store(&self) {
        {
            let mut guard = self.board_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.board_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Registry of live rooms keyed by their identifier.
    pub fn rooms(&self) -> &DashMap<Uuid, RoomHandle> {
        &self.rooms
    }

    /// Look up a room handle by id.
    pub fn room(&self, id: Uuid) -> Option<RoomHandle> {
        self.rooms.get(&id).map(|entry| entry.clone())
    }

    /// Update and broadcast the degraded flag when the value changes.
    async fn update_degraded(&self, value: bool) {
        if self.is_degraded().await == value {
            return;
        }

        let _ = self.degraded.send(value);
    }
}

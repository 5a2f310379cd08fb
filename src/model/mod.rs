//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the
//! application. It is organized into submodules by responsibility:
//!
//! - `types`: Core type definitions (UI state, section focus)
//! - `catalog`: Track records, the catalog, and the selection cursor
//! - `session`: The playback session state machine and the device contract
//! - `catalog_client`: HTTP catalog fetch
//! - `app_model`: Main application model with state management methods

mod app_model;
mod catalog;
mod catalog_client;
mod session;
mod types;

// Re-export all public types for convenient access
pub use types::{ActiveSection, UiState};

pub use catalog::{SelectionCursor, TrackCatalog, TrackRecord};

pub use session::{
    DeviceEvent, PlaybackSession, PlaybackSnapshot, PlaybackState, PlayerError, RenderingBackend,
    DEFAULT_VOLUME,
};

pub use catalog_client::CatalogClient;

pub use app_model::AppModel;

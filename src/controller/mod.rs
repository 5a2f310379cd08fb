//! Controller module - Application logic and event handling
//!
//! The controller turns user input into intents against the model, wires
//! selection changes into playback rebinds, and runs the device-event
//! listener. It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `selection`: Catalog loading and track selection
//! - `playback`: Transport control methods
//! - `device_events`: Device event listener

mod device_events;
mod input;
mod playback;
mod selection;

use std::sync::Arc;

use crate::model::{AppModel, CatalogClient};

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<AppModel>,
    pub(crate) catalog_client: CatalogClient,
}

impl AppController {
    pub fn new(model: Arc<AppModel>, catalog_client: CatalogClient) -> Self {
        Self {
            model,
            catalog_client,
        }
    }
}

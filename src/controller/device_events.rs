//! Device event listener
//!
//! Drains the audio backend's event stream into the playback session, one
//! event at a time. Generation filtering happens inside the session; this
//! task only moves messages.

use tokio::sync::mpsc::UnboundedReceiver;

use crate::audio::TaggedDeviceEvent;

use super::AppController;

impl AppController {
    pub fn start_device_event_listener(&self, mut events: UnboundedReceiver<TaggedDeviceEvent>) {
        let model = self.model.clone();
        tracing::info!("Starting device event listener");

        tokio::spawn(async move {
            while let Some(tagged) = events.recv().await {
                if model.should_quit().await {
                    tracing::debug!("Device event listener shutting down");
                    break;
                }
                tracing::trace!(generation = tagged.generation, event = ?tagged.event, "Device event");
                model
                    .handle_device_event(tagged.generation, tagged.event)
                    .await;
            }
        });
    }
}

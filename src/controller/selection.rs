//! Catalog loading and track selection
//!
//! Cursor changes are the only trigger for a playback rebind: every path
//! that moves the cursor funnels through `rebind`.

use crate::model::TrackRecord;

use super::AppController;

impl AppController {
    /// Fetch the catalog and swap it in. On failure the current catalog is
    /// kept (empty on first load) and the error is shown; nothing retries.
    pub async fn load_catalog(&self) {
        match self.catalog_client.fetch().await {
            Ok(catalog) => {
                let is_empty = catalog.is_empty();
                let to_bind = self.model.replace_catalog(catalog).await;
                if is_empty {
                    tracing::warn!("Catalog is empty");
                    self.model.unbind_playback().await;
                } else if let Some(track) = to_bind {
                    self.rebind(track).await;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Catalog fetch failed");
                self.model.set_error(e.to_string()).await;
            }
        }
    }

    /// Select the highlighted row of the (possibly filtered) track list.
    pub async fn select_highlighted(&self) {
        let Some(catalog_index) = self.model.selected_catalog_index().await else {
            return;
        };
        if let Some(track) = self.model.select_track(catalog_index).await {
            self.rebind(track).await;
        }
    }

    pub async fn next_track(&self) {
        if let Some(track) = self.model.next_track().await {
            self.rebind(track).await;
        }
    }

    pub async fn previous_track(&self) {
        if let Some(track) = self.model.previous_track().await {
            self.rebind(track).await;
        }
    }

    async fn rebind(&self, track: TrackRecord) {
        tracing::debug!(track = %track.name, "Selection changed, rebinding");
        self.model.bind_track(&track).await;
    }
}

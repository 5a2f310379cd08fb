//! Main application model with state management

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use super::catalog::{SelectionCursor, TrackCatalog, TrackRecord};
use super::session::{DeviceEvent, PlaybackSession, PlaybackSnapshot, PlayerError};
use super::types::{ActiveSection, UiState};

/// Main application model containing all state
pub struct AppModel {
    catalog: Arc<Mutex<TrackCatalog>>,
    cursor: Arc<Mutex<SelectionCursor>>,
    session: Arc<Mutex<PlaybackSession>>,
    pub ui_state: Arc<Mutex<UiState>>,
    pub should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new(session: PlaybackSession) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(TrackCatalog::default())),
            cursor: Arc::new(Mutex::new(SelectionCursor::default())),
            session: Arc::new(Mutex::new(session)),
            ui_state: Arc::new(Mutex::new(UiState::default())),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    // ========================================================================
    // Catalog & Selection
    // ========================================================================

    /// Replace the catalog wholesale. The cursor is reset to the first track
    /// when it was previously unset; the record to bind (if any) is returned
    /// so the caller can wire the selection into the session.
    pub async fn replace_catalog(&self, new_catalog: TrackCatalog) -> Option<TrackRecord> {
        let mut catalog = self.catalog.lock().await;
        let mut cursor = self.cursor.lock().await;
        *catalog = new_catalog;

        if catalog.is_empty() {
            cursor.clear();
            return None;
        }
        if cursor.index().is_none() {
            cursor.select(0, catalog.len());
            return catalog.get(0).cloned();
        }
        // Keep an existing selection if it still fits the new catalog.
        if let Some(i) = cursor.index() {
            if i >= catalog.len() {
                cursor.select(0, catalog.len());
                return catalog.get(0).cloned();
            }
        }
        None
    }

    pub async fn catalog(&self) -> TrackCatalog {
        self.catalog.lock().await.clone()
    }

    pub async fn cursor_index(&self) -> Option<usize> {
        self.cursor.lock().await.index()
    }

    /// Select the track at catalog index `i`. Returns the record to bind
    /// when the cursor actually moved; out-of-range indices are ignored.
    pub async fn select_track(&self, i: usize) -> Option<TrackRecord> {
        let catalog = self.catalog.lock().await;
        let mut cursor = self.cursor.lock().await;
        if cursor.select(i, catalog.len()) {
            catalog.get(i).cloned()
        } else {
            None
        }
    }

    pub async fn next_track(&self) -> Option<TrackRecord> {
        let catalog = self.catalog.lock().await;
        let mut cursor = self.cursor.lock().await;
        if cursor.next(catalog.len()) {
            cursor.index().and_then(|i| catalog.get(i).cloned())
        } else {
            None
        }
    }

    pub async fn previous_track(&self) -> Option<TrackRecord> {
        let catalog = self.catalog.lock().await;
        let mut cursor = self.cursor.lock().await;
        if cursor.previous(catalog.len()) {
            cursor.index().and_then(|i| catalog.get(i).cloned())
        } else {
            None
        }
    }

    /// Catalog index of the highlighted row in the filtered list.
    pub async fn selected_catalog_index(&self) -> Option<usize> {
        let catalog = self.catalog.lock().await;
        let ui_state = self.ui_state.lock().await;
        let filtered = catalog.filtered_indices(&ui_state.search_query);
        filtered.get(ui_state.list_selected).copied()
    }

    // ========================================================================
    // Playback Session
    // ========================================================================

    pub async fn bind_track(&self, track: &TrackRecord) {
        self.session.lock().await.bind(track);
    }

    pub async fn unbind_playback(&self) {
        self.session.lock().await.unbind();
    }

    pub async fn play(&self) -> Result<(), PlayerError> {
        self.session.lock().await.play()
    }

    pub async fn pause(&self) {
        self.session.lock().await.pause();
    }

    pub async fn is_playing(&self) -> bool {
        self.session.lock().await.snapshot().is_playing
    }

    pub async fn seek(&self, percent: f64) -> Result<(), PlayerError> {
        self.session.lock().await.seek(percent)
    }

    pub async fn set_volume(&self, volume: f32) -> Result<(), PlayerError> {
        self.session.lock().await.set_volume(volume)
    }

    pub async fn toggle_mute(&self) {
        self.session.lock().await.toggle_mute();
    }

    pub async fn handle_device_event(&self, generation: u64, event: DeviceEvent) {
        self.session.lock().await.handle_event(generation, event);
    }

    pub async fn playback_snapshot(&self) -> PlaybackSnapshot {
        self.session.lock().await.snapshot()
    }

    // ========================================================================
    // UI State
    // ========================================================================

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn set_active_section(&self, section: ActiveSection) {
        let mut state = self.ui_state.lock().await;
        state.active_section = section;
    }

    pub async fn cycle_section(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.next();
    }

    pub async fn append_to_search(&self, c: char) {
        let mut state = self.ui_state.lock().await;
        state.search_query.push(c);
        state.list_selected = 0;
    }

    pub async fn backspace_search(&self) {
        let mut state = self.ui_state.lock().await;
        state.search_query.pop();
        state.list_selected = 0;
    }

    pub async fn clear_search(&self) {
        let mut state = self.ui_state.lock().await;
        state.search_query.clear();
        state.list_selected = 0;
    }

    pub async fn move_selection_up(&self) {
        let mut state = self.ui_state.lock().await;
        if state.list_selected > 0 {
            state.list_selected -= 1;
        }
    }

    pub async fn move_selection_down(&self) {
        let catalog = self.catalog.lock().await;
        let mut state = self.ui_state.lock().await;
        let filtered_len = catalog.filtered_indices(&state.search_query).len();
        if state.list_selected + 1 < filtered_len {
            state.list_selected += 1;
        }
    }

    pub async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    /// Errors fade out on their own after a few seconds.
    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(ts) = state.error_timestamp {
            if ts.elapsed().as_secs() >= 5 {
                state.error_message = None;
                state.error_timestamp = None;
            }
        }
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::session::RenderingBackend;
    use std::time::Duration;

    struct NullBackend;

    impl RenderingBackend for NullBackend {
        fn bind(&mut self, _generation: u64, _media_url: &str) {}
        fn play(&mut self) -> Result<(), PlayerError> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn seek(&mut self, _position: Duration) {}
        fn set_volume(&mut self, _volume: f32) {}
        fn unbind(&mut self) {}
    }

    fn model() -> AppModel {
        AppModel::new(PlaybackSession::new(Box::new(NullBackend)))
    }

    fn catalog(n: usize) -> TrackCatalog {
        TrackCatalog::new(
            (0..n)
                .map(|i| TrackRecord {
                    id: format!("id-{i}"),
                    name: format!("Track {i}"),
                    artist: "Artist".to_string(),
                    cover_url: String::new(),
                    media_url: format!("https://example.com/{i}.mp3"),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn first_catalog_load_selects_track_zero() {
        let model = model();
        let to_bind = model.replace_catalog(catalog(3)).await;
        assert_eq!(to_bind.unwrap().id, "id-0");
        assert_eq!(model.cursor_index().await, Some(0));
    }

    #[tokio::test]
    async fn refetch_keeps_valid_selection() {
        let model = model();
        model.replace_catalog(catalog(3)).await;
        model.select_track(2).await;

        assert!(model.replace_catalog(catalog(5)).await.is_none());
        assert_eq!(model.cursor_index().await, Some(2));
    }

    #[tokio::test]
    async fn refetch_with_empty_catalog_clears_selection() {
        let model = model();
        model.replace_catalog(catalog(3)).await;
        model.replace_catalog(catalog(0)).await;
        assert_eq!(model.cursor_index().await, None);
    }

    #[tokio::test]
    async fn filtered_row_resolves_to_catalog_index() {
        let model = model();
        let mut tracks = catalog(4).tracks().to_vec();
        tracks[3].name = "Needle".to_string();
        model.replace_catalog(TrackCatalog::new(tracks)).await;

        for c in "needle".chars() {
            model.append_to_search(c).await;
        }
        assert_eq!(model.selected_catalog_index().await, Some(3));
    }

    #[tokio::test]
    async fn selection_stays_within_filtered_list() {
        let model = model();
        model.replace_catalog(catalog(2)).await;

        model.move_selection_down().await;
        model.move_selection_down().await;
        model.move_selection_down().await;
        assert_eq!(model.get_ui_state().await.list_selected, 1);

        model.move_selection_up().await;
        model.move_selection_up().await;
        assert_eq!(model.get_ui_state().await.list_selected, 0);
    }
}

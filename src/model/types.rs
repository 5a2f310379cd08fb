//! Core type definitions for the application

use std::time::Instant;

/// Which section of the UI is currently active/focused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveSection {
    Search,
    TrackList,
}

impl ActiveSection {
    pub fn next(self) -> Self {
        match self {
            ActiveSection::Search => ActiveSection::TrackList,
            ActiveSection::TrackList => ActiveSection::Search,
        }
    }
}

/// UI state for the application
#[derive(Clone)]
pub struct UiState {
    pub active_section: ActiveSection,
    pub search_query: String,
    /// Row within the *filtered* track list, not a catalog index.
    pub list_selected: usize,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_section: ActiveSection::TrackList,
            search_query: String::new(),
            list_selected: 0,
            error_message: None,
            error_timestamp: None,
        }
    }
}

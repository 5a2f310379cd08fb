//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::ActiveSection;

use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        // Ctrl-C quits from anywhere, including search input.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.model.set_should_quit(true).await;
            return Ok(());
        }

        // A visible error blocks other interactions until dismissed.
        if self.model.has_error().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.model.clear_error().await;
            }
            return Ok(());
        }

        let ui_state = self.model.get_ui_state().await;

        // Search input captures printable keys while focused.
        if ui_state.active_section == ActiveSection::Search {
            match key.code {
                KeyCode::Tab => {
                    self.model.cycle_section().await;
                }
                KeyCode::Enter => {
                    self.model.set_active_section(ActiveSection::TrackList).await;
                }
                KeyCode::Esc => {
                    self.model.clear_search().await;
                    self.model.set_active_section(ActiveSection::TrackList).await;
                }
                KeyCode::Backspace => {
                    self.model.backspace_search().await;
                }
                KeyCode::Char(c) => {
                    self.model.append_to_search(c).await;
                }
                _ => {}
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.model.set_should_quit(true).await;
            }
            KeyCode::Tab => {
                self.model.cycle_section().await;
            }
            KeyCode::Char('/') => {
                self.model.set_active_section(ActiveSection::Search).await;
            }
            KeyCode::Up => {
                self.model.move_selection_up().await;
            }
            KeyCode::Down => {
                self.model.move_selection_down().await;
            }
            KeyCode::Enter => {
                self.select_highlighted().await;
            }
            // Play/Pause toggle
            KeyCode::Char(' ') => {
                self.toggle_playback().await;
            }
            // Next track
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.next_track().await;
            }
            // Previous track
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.previous_track().await;
            }
            KeyCode::Left => {
                self.seek_backward().await;
            }
            KeyCode::Right => {
                self.seek_forward().await;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.volume_up().await;
            }
            KeyCode::Char('-') => {
                self.volume_down().await;
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.toggle_mute().await;
            }
            // Re-fetch the catalog
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let controller = self.clone();
                tokio::spawn(async move {
                    controller.load_catalog().await;
                });
            }
            _ => {}
        }
        Ok(())
    }
}

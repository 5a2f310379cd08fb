//! View module - TUI rendering
//!
//! Stateless rendering of model snapshots: a searchable track list on the
//! left, track details on the right, and the transport bar along the bottom.

mod details;
mod progress;
mod utils;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, ListItem, Padding, Paragraph},
};

use crate::model::{ActiveSection, PlaybackSnapshot, TrackCatalog, UiState};

pub struct AppView;

impl AppView {
    pub fn render(
        frame: &mut Frame,
        playback: &PlaybackSnapshot,
        ui_state: &UiState,
        catalog: &TrackCatalog,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar
                Constraint::Min(0),    // Track list + details
                Constraint::Length(3), // Transport bar
            ])
            .split(frame.area());

        Self::render_search_bar(frame, chunks[0], ui_state);
        Self::render_main_area(frame, chunks[1], playback, ui_state, catalog);

        let bound_track = playback
            .track_id
            .as_deref()
            .and_then(|id| catalog.tracks().iter().find(|t| t.id == id));
        progress::render_transport_bar(frame, chunks[2], playback, bound_track);

        if ui_state.error_message.is_some() {
            Self::render_error_notification(frame, ui_state);
        }
    }

    fn render_search_bar(frame: &mut Frame, area: Rect, ui_state: &UiState) {
        let focused = ui_state.active_section == ActiveSection::Search;
        let search_text = if ui_state.search_query.is_empty() {
            "Search Song, Artist"
        } else {
            &ui_state.search_query
        };

        let search = Paragraph::new(search_text)
            .style(if focused {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Search ")
                    .padding(Padding::horizontal(1))
                    .border_style(if focused {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default()
                    }),
            );
        frame.render_widget(search, area);
    }

    fn render_main_area(
        frame: &mut Frame,
        area: Rect,
        playback: &PlaybackSnapshot,
        ui_state: &UiState,
        catalog: &TrackCatalog,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(35), // Track list
                Constraint::Percentage(65), // Track details
            ])
            .split(area);

        Self::render_track_list(frame, chunks[0], playback, ui_state, catalog);

        let bound_track = playback
            .track_id
            .as_deref()
            .and_then(|id| catalog.tracks().iter().find(|t| t.id == id));
        details::render_track_details(frame, chunks[1], playback, bound_track);
    }

    fn render_track_list(
        frame: &mut Frame,
        area: Rect,
        playback: &PlaybackSnapshot,
        ui_state: &UiState,
        catalog: &TrackCatalog,
    ) {
        let focused = ui_state.active_section == ActiveSection::TrackList;
        let filtered = catalog.filtered_indices(&ui_state.search_query);

        let items: Vec<ListItem> = filtered
            .iter()
            .enumerate()
            .filter_map(|(row, &catalog_index)| catalog.get(catalog_index).map(|t| (row, t)))
            .map(|(row, track)| {
                let is_bound = playback.track_id.as_deref() == Some(track.id.as_str());
                let marker = if is_bound { "♪ " } else { "  " };
                let text = format!("{}{} — {}", marker, track.name, track.artist);

                let mut style = Style::default();
                if is_bound {
                    style = style.fg(Color::Green);
                }
                if focused && row == ui_state.list_selected {
                    style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                }
                ListItem::new(text).style(style)
            })
            .collect();

        let title = if ui_state.search_query.is_empty() {
            format!(" Tracks ({}) ", catalog.len())
        } else {
            format!(" Tracks ({}/{}) ", filtered.len(), catalog.len())
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(if focused {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            });

        utils::render_scrollable_list(frame, area, items, ui_state.list_selected, block);
    }

    fn render_error_notification(frame: &mut Frame, ui_state: &UiState) {
        let Some(message) = &ui_state.error_message else {
            return;
        };

        let area = frame.area();
        let width = (message.len() as u16 + 6).min(area.width.saturating_sub(4)).max(20);
        let popup = Rect {
            x: area.width.saturating_sub(width) / 2,
            y: area.height / 2,
            width,
            height: 3,
        };

        frame.render_widget(Clear, popup);
        let error = Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::Red))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Error (Esc to dismiss) ")
                    .border_style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(error, popup);
    }
}

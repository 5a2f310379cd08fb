//! Track details pane

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::model::{PlaybackSnapshot, PlaybackState, TrackRecord};

pub fn render_track_details(
    frame: &mut Frame,
    area: Rect,
    playback: &PlaybackSnapshot,
    bound_track: Option<&TrackRecord>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Now Playing ")
        .padding(Padding::uniform(1));

    let Some(track) = bound_track else {
        let placeholder = Paragraph::new("Select a track to see details")
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let state_line = match playback.state {
        PlaybackState::Idle => "—",
        PlaybackState::Loading => "Loading…",
        PlaybackState::Paused => "Paused",
        PlaybackState::Playing => "Playing",
    };

    let mut lines = vec![
        Line::from(Span::styled(
            track.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            track.artist.clone(),
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(format!("State: {}", state_line)),
        Line::default(),
        Line::from(Span::styled(
            format!("Cover: {}", track.cover_url),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    if let Some(status) = &playback.status {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("⚠ {}", status),
            Style::default().fg(Color::Yellow),
        )));
    }

    let details = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(details, area);
}

//! Transport bar rendering

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
};

use crate::model::{PlaybackSnapshot, PlaybackState, TrackRecord};

use super::utils::format_duration;

pub fn render_transport_bar(
    frame: &mut Frame,
    area: Rect,
    playback: &PlaybackSnapshot,
    bound_track: Option<&TrackRecord>,
) {
    let status_text = match (playback.state, bound_track) {
        (PlaybackState::Idle, _) | (_, None) => " No track selected".to_string(),
        (PlaybackState::Loading, Some(track)) => {
            format!(" ⏳ {} | {}", track.name, track.artist)
        }
        (PlaybackState::Playing, Some(track)) => {
            format!(" ▶ {} | {}", track.name, track.artist)
        }
        (PlaybackState::Paused, Some(track)) => {
            format!(" ⏸ {} | {}", track.name, track.artist)
        }
    };

    let volume_text = if playback.is_muted {
        "Vol: muted".to_string()
    } else {
        format!("Vol: {:.0}%", playback.volume * 100.0)
    };
    let controls_info = format!(" {} | space play/pause | n/p track | ←/→ seek ", volume_text);

    let time_str = format!(
        "{} / {}",
        format_duration(playback.position_seconds),
        format_duration(playback.duration_seconds)
    );

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ", status_text))
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((playback.progress_percent / 100.0).clamp(0.0, 1.0))
        .label(time_str);

    frame.render_widget(gauge, area);
}

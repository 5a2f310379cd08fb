//! Playback session state machine
//!
//! The session is the single owner of the rendering handle: it mediates
//! between user intents (play, pause, seek, volume) and the asynchronous
//! device callbacks coming back from the audio backend, and exposes a
//! consistent `PlaybackSnapshot` to the view.
//!
//! Every `bind` bumps a generation counter and every device event carries the
//! generation of the handle it belongs to. Events from a superseded handle
//! are discarded, so a track switched away from mid-load can never mutate the
//! current snapshot.

use std::time::Duration;
use thiserror::Error;

use super::catalog::TrackRecord;

pub const DEFAULT_VOLUME: f32 = 1.0;

/// Errors surfaced to the presentation layer as status values. None of these
/// are retried and none of them cross the boundary as panics.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PlayerError {
    #[error("catalog fetch failed: {0}")]
    CatalogFetch(String),
    #[error("media load failed: {0}")]
    MediaLoad(String),
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),
    #[error("invalid intent: {0}")]
    InvalidIntent(&'static str),
}

/// Commands the session issues to the audio device. The session holds the
/// only reference to the backend; nothing else may drive the device.
pub trait RenderingBackend: Send {
    /// Start loading `media_url` under `generation`. Events the device emits
    /// for this handle must carry the same generation.
    fn bind(&mut self, generation: u64, media_url: &str);
    /// Request rendering to start. An immediate refusal (e.g. platform
    /// policy) is returned here; asynchronous refusals arrive later as
    /// [`DeviceEvent::PlayRejected`].
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self);
    fn seek(&mut self, position: Duration);
    fn set_volume(&mut self, volume: f32);
    /// Stop rendering and discard the current handle.
    fn unbind(&mut self);
}

/// Callbacks from the audio device, delivered one at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceEvent {
    /// Track metadata became available; fires once per handle.
    MetadataLoaded { duration: Duration },
    /// Periodic position report while rendering.
    Position { position: Duration },
    /// The device refused a previously issued play request.
    PlayRejected { reason: String },
    /// The track played to completion.
    Ended,
    /// The device could not load or keep decoding the track.
    Failed { message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// No track bound.
    Idle,
    /// Handle bound, metadata not yet known.
    Loading,
    /// Duration known, not rendering.
    Paused,
    /// Duration known, rendering requested.
    Playing,
}

/// The observable playback state, cloned out to the view on every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackSnapshot {
    pub track_id: Option<String>,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub progress_percent: f64,
    pub volume: f32,
    pub is_muted: bool,
    pub status: Option<String>,
}

pub struct PlaybackSession {
    backend: Box<dyn RenderingBackend>,
    generation: u64,
    state: PlaybackState,
    track_id: Option<String>,
    position_seconds: f64,
    duration_seconds: f64,
    volume: f32,
    is_muted: bool,
    /// Last non-zero volume, restored by `toggle_mute`.
    remembered_volume: f32,
    status: Option<PlayerError>,
}

impl PlaybackSession {
    pub fn new(backend: Box<dyn RenderingBackend>) -> Self {
        Self {
            backend,
            generation: 0,
            state: PlaybackState::Idle,
            track_id: None,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            volume: DEFAULT_VOLUME,
            is_muted: false,
            remembered_volume: DEFAULT_VOLUME,
            status: None,
        }
    }

    /// Tear down the current handle and bind the given track. The previous
    /// handle is detached before the new one is created, so at most one
    /// handle is live at any instant.
    pub fn bind(&mut self, track: &TrackRecord) {
        self.backend.unbind();
        self.generation += 1;
        tracing::info!(
            track = %track.name,
            track_id = %track.id,
            generation = self.generation,
            "Binding track"
        );
        self.backend.bind(self.generation, &track.media_url);

        self.track_id = Some(track.id.clone());
        self.state = PlaybackState::Loading;
        self.position_seconds = 0.0;
        self.duration_seconds = 0.0;
        self.status = None;
    }

    /// Release the handle and return to `Idle` (empty catalog, explicit
    /// unbind). The generation still advances so in-flight events from the
    /// released handle are discarded.
    pub fn unbind(&mut self) {
        self.backend.unbind();
        self.generation += 1;
        self.track_id = None;
        self.state = PlaybackState::Idle;
        self.position_seconds = 0.0;
        self.duration_seconds = 0.0;
    }

    /// Request rendering. `is_playing` flips optimistically on the intent,
    /// not on device acknowledgment; an asynchronous refusal reverts it via
    /// [`DeviceEvent::PlayRejected`].
    pub fn play(&mut self) -> Result<(), PlayerError> {
        if self.state != PlaybackState::Paused {
            tracing::debug!(state = ?self.state, "Ignoring play intent");
            return Ok(());
        }
        match self.backend.play() {
            Ok(()) => {
                self.state = PlaybackState::Playing;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Device refused play request");
                self.status = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            tracing::debug!(state = ?self.state, "Ignoring pause intent");
            return;
        }
        self.backend.pause();
        self.state = PlaybackState::Paused;
    }

    /// Jump to `percent` of the track. Only meaningful once the duration is
    /// known; does not change the play/pause state.
    pub fn seek(&mut self, percent: f64) -> Result<(), PlayerError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(PlayerError::InvalidIntent("seek percent out of range"));
        }
        if !matches!(self.state, PlaybackState::Paused | PlaybackState::Playing) {
            tracing::debug!(state = ?self.state, "Ignoring seek before duration is known");
            return Ok(());
        }
        self.position_seconds = percent / 100.0 * self.duration_seconds;
        self.backend
            .seek(Duration::from_secs_f64(self.position_seconds));
        Ok(())
    }

    /// Set the volume. Volume and mute are coupled: exactly zero mutes,
    /// any non-zero volume unmutes.
    pub fn set_volume(&mut self, volume: f32) -> Result<(), PlayerError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlayerError::InvalidIntent("volume out of range"));
        }
        self.volume = volume;
        self.is_muted = volume == 0.0;
        if volume > 0.0 {
            self.remembered_volume = volume;
        }
        self.backend.set_volume(volume);
        Ok(())
    }

    /// Mute to zero or restore the last non-zero volume. Toggling twice with
    /// no intervening `set_volume` restores the exact prior volume.
    pub fn toggle_mute(&mut self) {
        if self.is_muted {
            self.volume = self.remembered_volume;
            self.is_muted = false;
        } else {
            if self.volume > 0.0 {
                self.remembered_volume = self.volume;
            }
            self.volume = 0.0;
            self.is_muted = true;
        }
        self.backend.set_volume(self.volume);
    }

    /// Apply one device callback. Events tagged with a superseded generation
    /// belong to a handle that has already been torn down and are dropped.
    pub fn handle_event(&mut self, generation: u64, event: DeviceEvent) {
        if generation != self.generation {
            tracing::debug!(
                event_generation = generation,
                current_generation = self.generation,
                ?event,
                "Discarding stale device event"
            );
            return;
        }

        match event {
            DeviceEvent::MetadataLoaded { duration } => {
                self.duration_seconds = duration.as_secs_f64();
                if self.state == PlaybackState::Loading {
                    self.state = PlaybackState::Paused;
                }
                tracing::debug!(duration_seconds = self.duration_seconds, "Metadata loaded");
            }
            DeviceEvent::Position { position } => {
                // Position reports are only meaningful while rendering;
                // anything else is a late report from a paused handle.
                if self.state == PlaybackState::Playing {
                    self.position_seconds = position.as_secs_f64();
                }
            }
            DeviceEvent::PlayRejected { reason } => {
                tracing::warn!(%reason, "Play request rejected by device");
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Paused;
                }
                self.status = Some(PlayerError::PlaybackRejected(reason));
            }
            DeviceEvent::Ended => {
                // No auto-advance: the track rests at its end, paused.
                self.position_seconds = self.duration_seconds;
                self.state = PlaybackState::Paused;
                tracing::debug!("Track ended");
            }
            DeviceEvent::Failed { message } => {
                tracing::warn!(%message, "Device failure");
                match self.state {
                    PlaybackState::Loading => {
                        self.backend.unbind();
                        self.generation += 1;
                        self.track_id = None;
                        self.state = PlaybackState::Idle;
                        self.position_seconds = 0.0;
                        self.duration_seconds = 0.0;
                    }
                    PlaybackState::Playing => self.state = PlaybackState::Paused,
                    PlaybackState::Paused | PlaybackState::Idle => {}
                }
                self.status = Some(PlayerError::MediaLoad(message));
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let progress_percent = if self.duration_seconds > 0.0 {
            (self.position_seconds / self.duration_seconds * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        PlaybackSnapshot {
            track_id: self.track_id.clone(),
            state: self.state,
            is_playing: self.state == PlaybackState::Playing,
            position_seconds: self.position_seconds,
            duration_seconds: self.duration_seconds,
            progress_percent,
            volume: self.volume,
            is_muted: self.is_muted,
            status: self.status.as_ref().map(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    enum Command {
        Bind { generation: u64, url: String },
        Play,
        Pause,
        Seek(Duration),
        SetVolume(f32),
        Unbind,
    }

    /// Records every command and optionally refuses play requests.
    #[derive(Clone, Default)]
    struct FakeBackend {
        commands: Arc<Mutex<Vec<Command>>>,
        reject_play: Arc<Mutex<bool>>,
    }

    impl FakeBackend {
        fn commands(&self) -> Vec<Command> {
            self.commands.lock().unwrap().clone()
        }

        fn set_reject_play(&self, reject: bool) {
            *self.reject_play.lock().unwrap() = reject;
        }
    }

    impl RenderingBackend for FakeBackend {
        fn bind(&mut self, generation: u64, media_url: &str) {
            self.commands.lock().unwrap().push(Command::Bind {
                generation,
                url: media_url.to_string(),
            });
        }

        fn play(&mut self) -> Result<(), PlayerError> {
            if *self.reject_play.lock().unwrap() {
                return Err(PlayerError::PlaybackRejected("blocked".to_string()));
            }
            self.commands.lock().unwrap().push(Command::Play);
            Ok(())
        }

        fn pause(&mut self) {
            self.commands.lock().unwrap().push(Command::Pause);
        }

        fn seek(&mut self, position: Duration) {
            self.commands.lock().unwrap().push(Command::Seek(position));
        }

        fn set_volume(&mut self, volume: f32) {
            self.commands.lock().unwrap().push(Command::SetVolume(volume));
        }

        fn unbind(&mut self) {
            self.commands.lock().unwrap().push(Command::Unbind);
        }
    }

    fn track(id: &str) -> TrackRecord {
        TrackRecord {
            id: id.to_string(),
            name: format!("Track {id}"),
            artist: "Artist".to_string(),
            cover_url: String::new(),
            media_url: format!("https://example.com/{id}.mp3"),
        }
    }

    fn session() -> (PlaybackSession, FakeBackend) {
        let backend = FakeBackend::default();
        (PlaybackSession::new(Box::new(backend.clone())), backend)
    }

    fn ready_session(duration_secs: u64) -> (PlaybackSession, FakeBackend) {
        let (mut session, backend) = session();
        session.bind(&track("a"));
        session.handle_event(
            session.generation(),
            DeviceEvent::MetadataLoaded {
                duration: Duration::from_secs(duration_secs),
            },
        );
        (session, backend)
    }

    #[test]
    fn bind_detaches_old_handle_before_attaching_new() {
        let (mut session, backend) = session();
        session.bind(&track("a"));

        let commands = backend.commands();
        assert_eq!(commands[0], Command::Unbind);
        assert!(matches!(commands[1], Command::Bind { generation: 1, .. }));

        let snap = session.snapshot();
        assert_eq!(snap.state, PlaybackState::Loading);
        assert_eq!(snap.track_id.as_deref(), Some("a"));
        assert_eq!(snap.position_seconds, 0.0);
        assert_eq!(snap.duration_seconds, 0.0);
        assert!(!snap.is_playing);
    }

    #[test]
    fn metadata_moves_loading_to_paused() {
        let (session, _) = ready_session(200);
        let snap = session.snapshot();
        assert_eq!(snap.state, PlaybackState::Paused);
        assert_eq!(snap.duration_seconds, 200.0);
    }

    #[test]
    fn stale_metadata_from_superseded_bind_is_discarded() {
        let (mut session, _) = session();
        session.bind(&track("a"));
        let gen_a = session.generation();
        session.bind(&track("b"));

        // A's metadata arrives after the rebind to B.
        session.handle_event(
            gen_a,
            DeviceEvent::MetadataLoaded {
                duration: Duration::from_secs(99),
            },
        );

        let snap = session.snapshot();
        assert_eq!(snap.state, PlaybackState::Loading);
        assert_eq!(snap.track_id.as_deref(), Some("b"));
        assert_eq!(snap.duration_seconds, 0.0);
    }

    #[test]
    fn seek_play_pause_scenario() {
        // bind(A) -> duration 200 -> seek(50) -> play -> pause
        let (mut session, _) = ready_session(200);

        session.seek(50.0).unwrap();
        assert_eq!(session.snapshot().position_seconds, 100.0);

        session.play().unwrap();
        assert!(session.snapshot().is_playing);

        session.pause();
        let snap = session.snapshot();
        assert!(!snap.is_playing);
        assert_eq!(snap.position_seconds, 100.0);
    }

    #[test]
    fn seek_does_not_change_play_state() {
        let (mut session, _) = ready_session(100);
        session.play().unwrap();
        session.seek(25.0).unwrap();
        let snap = session.snapshot();
        assert!(snap.is_playing);
        assert!((snap.position_seconds - 25.0).abs() < 1e-9);
    }

    #[test]
    fn seek_out_of_range_is_rejected_without_state_change() {
        let (mut session, _) = ready_session(200);
        session.seek(40.0).unwrap();

        assert!(matches!(
            session.seek(100.1),
            Err(PlayerError::InvalidIntent(_))
        ));
        assert!(matches!(
            session.seek(-0.1),
            Err(PlayerError::InvalidIntent(_))
        ));
        assert_eq!(session.snapshot().position_seconds, 80.0);
    }

    #[test]
    fn seek_before_metadata_is_ignored() {
        let (mut session, backend) = session();
        session.bind(&track("a"));
        session.seek(50.0).unwrap();
        assert_eq!(session.snapshot().position_seconds, 0.0);
        assert!(!backend.commands().iter().any(|c| matches!(c, Command::Seek(_))));
    }

    #[test]
    fn play_outside_paused_is_noop() {
        let (mut session, backend) = session();
        session.play().unwrap();
        session.bind(&track("a"));
        session.play().unwrap();
        assert!(!backend.commands().contains(&Command::Play));
        assert!(!session.snapshot().is_playing);
    }

    #[test]
    fn immediate_play_rejection_stays_paused_with_status() {
        let (mut session, backend) = ready_session(100);
        backend.set_reject_play(true);

        assert!(session.play().is_err());
        let snap = session.snapshot();
        assert_eq!(snap.state, PlaybackState::Paused);
        assert!(snap.status.unwrap().contains("playback rejected"));
    }

    #[test]
    fn async_play_rejection_reverts_optimistic_flip() {
        let (mut session, _) = ready_session(100);
        session.play().unwrap();
        assert!(session.snapshot().is_playing);

        session.handle_event(
            session.generation(),
            DeviceEvent::PlayRejected {
                reason: "blocked by platform".to_string(),
            },
        );
        let snap = session.snapshot();
        assert_eq!(snap.state, PlaybackState::Paused);
        assert!(snap.status.is_some());
    }

    #[test]
    fn position_applies_only_while_playing() {
        let (mut session, _) = ready_session(100);
        let generation = session.generation();

        session.handle_event(
            generation,
            DeviceEvent::Position {
                position: Duration::from_secs(10),
            },
        );
        assert_eq!(session.snapshot().position_seconds, 0.0);

        session.play().unwrap();
        session.handle_event(
            generation,
            DeviceEvent::Position {
                position: Duration::from_secs(10),
            },
        );
        assert_eq!(session.snapshot().position_seconds, 10.0);

        // A late report after pausing must not move the position.
        session.pause();
        session.handle_event(
            generation,
            DeviceEvent::Position {
                position: Duration::from_secs(20),
            },
        );
        assert_eq!(session.snapshot().position_seconds, 10.0);
    }

    #[test]
    fn progress_is_zero_while_duration_unknown() {
        let (mut session, _) = session();
        session.bind(&track("a"));
        assert_eq!(session.snapshot().progress_percent, 0.0);
    }

    #[test]
    fn ended_pauses_at_full_duration() {
        let (mut session, _) = ready_session(180);
        session.play().unwrap();
        session.handle_event(session.generation(), DeviceEvent::Ended);

        let snap = session.snapshot();
        assert_eq!(snap.state, PlaybackState::Paused);
        assert_eq!(snap.position_seconds, 180.0);
        assert_eq!(snap.progress_percent, 100.0);
        // No auto-advance: the bound track is unchanged.
        assert_eq!(snap.track_id.as_deref(), Some("a"));
    }

    #[test]
    fn volume_and_mute_are_coupled() {
        let (mut session, _) = session();

        session.set_volume(0.0).unwrap();
        assert!(session.snapshot().is_muted);

        session.set_volume(0.3).unwrap();
        let snap = session.snapshot();
        assert!(!snap.is_muted);
        assert_eq!(snap.volume, 0.3);
    }

    #[test]
    fn volume_out_of_range_is_rejected() {
        let (mut session, _) = session();
        session.set_volume(0.7).unwrap();
        assert!(session.set_volume(1.5).is_err());
        assert!(session.set_volume(-0.1).is_err());
        assert_eq!(session.snapshot().volume, 0.7);
    }

    #[test]
    fn double_mute_restores_exact_volume() {
        let (mut session, backend) = session();
        session.set_volume(0.5).unwrap();

        session.toggle_mute();
        let snap = session.snapshot();
        assert!(snap.is_muted);
        assert_eq!(snap.volume, 0.0);

        session.toggle_mute();
        let snap = session.snapshot();
        assert!(!snap.is_muted);
        assert_eq!(snap.volume, 0.5);

        assert_eq!(
            backend.commands(),
            vec![
                Command::SetVolume(0.5),
                Command::SetVolume(0.0),
                Command::SetVolume(0.5),
            ]
        );
    }

    #[test]
    fn unmute_after_zero_volume_restores_last_nonzero() {
        let (mut session, _) = session();
        session.set_volume(0.8).unwrap();
        session.set_volume(0.0).unwrap();
        assert!(session.snapshot().is_muted);

        session.toggle_mute();
        let snap = session.snapshot();
        assert!(!snap.is_muted);
        assert_eq!(snap.volume, 0.8);
    }

    #[test]
    fn load_failure_returns_to_idle() {
        let (mut session, _) = session();
        session.bind(&track("a"));
        session.handle_event(
            session.generation(),
            DeviceEvent::Failed {
                message: "unsupported media".to_string(),
            },
        );

        let snap = session.snapshot();
        assert_eq!(snap.state, PlaybackState::Idle);
        assert_eq!(snap.track_id, None);
        assert!(snap.status.unwrap().contains("media load failed"));
    }

    #[test]
    fn mid_playback_failure_degrades_to_paused() {
        let (mut session, _) = ready_session(100);
        session.play().unwrap();
        session.handle_event(
            session.generation(),
            DeviceEvent::Failed {
                message: "network failure".to_string(),
            },
        );

        let snap = session.snapshot();
        assert_eq!(snap.state, PlaybackState::Paused);
        // Last known-good snapshot survives the failure.
        assert_eq!(snap.track_id.as_deref(), Some("a"));
        assert_eq!(snap.duration_seconds, 100.0);
    }

    #[test]
    fn unbind_returns_to_idle_and_invalidates_events() {
        let (mut session, _) = ready_session(100);
        let old_generation = session.generation();
        session.unbind();

        assert_eq!(session.snapshot().state, PlaybackState::Idle);

        session.handle_event(
            old_generation,
            DeviceEvent::Position {
                position: Duration::from_secs(5),
            },
        );
        assert_eq!(session.snapshot().position_seconds, 0.0);
    }
}

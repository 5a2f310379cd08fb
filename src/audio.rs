//! Rodio-backed rendering device
//!
//! The rodio output stream is not `Send`, so the device lives on a dedicated
//! OS thread. Session commands arrive over a std mpsc channel and device
//! events leave over a tokio unbounded channel, each tagged with the
//! generation of the handle they belong to. Media bytes are fetched on a
//! short-lived helper thread with blocking reqwest; a fetch that completes
//! after the handle was superseded is dropped without touching the sink.

use std::io::Cursor;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::model::{DeviceEvent, PlayerError, RenderingBackend, DEFAULT_VOLUME};

const POSITION_TICK: Duration = Duration::from_millis(250);

/// A device event tagged with the rendering-handle generation it belongs to.
#[derive(Debug)]
pub struct TaggedDeviceEvent {
    pub generation: u64,
    pub event: DeviceEvent,
}

enum AudioCommand {
    Bind { generation: u64, url: String },
    MediaReady { generation: u64, bytes: Vec<u8> },
    MediaFailed { generation: u64, message: String },
    Play,
    Pause,
    Seek(Duration),
    SetVolume(f32),
    Unbind,
    Shutdown,
}

/// Handle to the audio thread. Implements the session's device contract by
/// forwarding commands; all rodio state stays on the audio thread.
pub struct RodioBackend {
    commands: mpsc::Sender<AudioCommand>,
}

impl RodioBackend {
    /// Spawn the audio thread and return the backend handle together with
    /// the stream of device events.
    pub fn spawn() -> (Self, UnboundedReceiver<TaggedDeviceEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();

        let fetch_tx = cmd_tx.clone();
        thread::spawn(move || {
            AudioThread::run(cmd_rx, fetch_tx, event_tx);
        });

        (Self { commands: cmd_tx }, event_rx)
    }

    fn send(&self, command: AudioCommand) {
        if self.commands.send(command).is_err() {
            tracing::error!("Audio thread is gone, dropping command");
        }
    }
}

impl RenderingBackend for RodioBackend {
    fn bind(&mut self, generation: u64, media_url: &str) {
        self.send(AudioCommand::Bind {
            generation,
            url: media_url.to_string(),
        });
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        // rodio never refuses synchronously; failures surface as events.
        self.send(AudioCommand::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.send(AudioCommand::Pause);
    }

    fn seek(&mut self, position: Duration) {
        self.send(AudioCommand::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(AudioCommand::SetVolume(volume));
    }

    fn unbind(&mut self) {
        self.send(AudioCommand::Unbind);
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        let _ = self.commands.send(AudioCommand::Shutdown);
    }
}

struct AudioThread {
    stream_handle: OutputStreamHandle,
    events: UnboundedSender<TaggedDeviceEvent>,
    fetch_tx: mpsc::Sender<AudioCommand>,
    sink: Option<Sink>,
    generation: u64,
    volume: f32,
    loaded: bool,
    ended_emitted: bool,
}

impl AudioThread {
    fn run(
        commands: mpsc::Receiver<AudioCommand>,
        fetch_tx: mpsc::Sender<AudioCommand>,
        events: UnboundedSender<TaggedDeviceEvent>,
    ) {
        // The OutputStream must outlive every sink, so it is owned here for
        // the whole lifetime of the thread.
        let (_stream, stream_handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "No audio output device available");
                let _ = events.send(TaggedDeviceEvent {
                    generation: 0,
                    event: DeviceEvent::Failed {
                        message: format!("no audio output device: {e}"),
                    },
                });
                return;
            }
        };

        let mut thread = AudioThread {
            stream_handle,
            events,
            fetch_tx,
            sink: None,
            generation: 0,
            volume: DEFAULT_VOLUME,
            loaded: false,
            ended_emitted: false,
        };

        tracing::info!("Audio thread started");
        loop {
            match commands.recv_timeout(POSITION_TICK) {
                Ok(command) => {
                    if !thread.handle_command(command) {
                        break;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => thread.tick(),
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::info!("Audio thread stopped");
    }

    /// Returns false when the thread should shut down.
    fn handle_command(&mut self, command: AudioCommand) -> bool {
        match command {
            AudioCommand::Bind { generation, url } => {
                self.drop_sink();
                self.generation = generation;
                self.spawn_fetch(generation, url);
            }
            AudioCommand::MediaReady { generation, bytes } => {
                if generation != self.generation {
                    tracing::debug!(generation, "Dropping media for superseded handle");
                    return true;
                }
                self.attach_media(bytes);
            }
            AudioCommand::MediaFailed { generation, message } => {
                if generation == self.generation {
                    self.emit(DeviceEvent::Failed { message });
                }
            }
            AudioCommand::Play => {
                if let Some(sink) = &self.sink {
                    sink.play();
                }
            }
            AudioCommand::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                }
            }
            AudioCommand::Seek(position) => {
                if let Some(sink) = &self.sink {
                    if let Err(e) = sink.try_seek(position) {
                        tracing::warn!(error = %e, "Seek failed");
                    }
                }
            }
            AudioCommand::SetVolume(volume) => {
                self.volume = volume;
                if let Some(sink) = &self.sink {
                    sink.set_volume(volume);
                }
            }
            AudioCommand::Unbind => self.drop_sink(),
            AudioCommand::Shutdown => return false,
        }
        true
    }

    fn spawn_fetch(&self, generation: u64, url: String) {
        let fetch_tx = self.fetch_tx.clone();
        thread::spawn(move || {
            tracing::debug!(%url, generation, "Fetching media");
            let result = reqwest::blocking::get(&url)
                .and_then(|resp| resp.error_for_status())
                .and_then(|resp| resp.bytes());
            let command = match result {
                Ok(bytes) => AudioCommand::MediaReady {
                    generation,
                    bytes: bytes.to_vec(),
                },
                Err(e) => AudioCommand::MediaFailed {
                    generation,
                    message: e.to_string(),
                },
            };
            let _ = fetch_tx.send(command);
        });
    }

    fn attach_media(&mut self, bytes: Vec<u8>) {
        let source = match Decoder::new(Cursor::new(bytes)) {
            Ok(source) => source,
            Err(e) => {
                self.emit(DeviceEvent::Failed {
                    message: format!("decode failed: {e}"),
                });
                return;
            }
        };
        let duration = source.total_duration().unwrap_or_default();

        let sink = match Sink::try_new(&self.stream_handle) {
            Ok(sink) => sink,
            Err(e) => {
                self.emit(DeviceEvent::Failed {
                    message: format!("sink creation failed: {e}"),
                });
                return;
            }
        };
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(source);

        self.sink = Some(sink);
        self.loaded = true;
        self.ended_emitted = false;
        self.emit(DeviceEvent::MetadataLoaded { duration });
    }

    /// Periodic position report; fires only while rendering.
    fn tick(&mut self) {
        let (is_empty, is_paused, position) = match &self.sink {
            Some(sink) => (sink.empty(), sink.is_paused(), sink.get_pos()),
            None => return,
        };

        if is_empty {
            if self.loaded && !self.ended_emitted {
                self.ended_emitted = true;
                self.emit(DeviceEvent::Ended);
                tracing::debug!(?position, "Sink drained");
            }
            return;
        }
        if !is_paused {
            self.emit(DeviceEvent::Position { position });
        }
    }

    fn drop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.loaded = false;
        self.ended_emitted = false;
    }

    fn emit(&self, event: DeviceEvent) {
        let _ = self.events.send(TaggedDeviceEvent {
            generation: self.generation,
            event,
        });
    }
}

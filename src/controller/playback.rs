//! Transport control methods

use super::AppController;

const SEEK_STEP_PERCENT: f64 = 5.0;
const VOLUME_STEP: f32 = 0.05;

impl AppController {
    pub async fn toggle_playback(&self) {
        if self.model.is_playing().await {
            tracing::debug!("Pausing playback");
            self.model.pause().await;
            return;
        }
        tracing::debug!("Resuming playback");
        if let Err(e) = self.model.play().await {
            // Rejection is non-fatal: the session stays paused.
            self.model.set_error(e.to_string()).await;
        }
    }

    pub async fn seek_forward(&self) {
        self.seek_by(SEEK_STEP_PERCENT).await;
    }

    pub async fn seek_backward(&self) {
        self.seek_by(-SEEK_STEP_PERCENT).await;
    }

    async fn seek_by(&self, delta_percent: f64) {
        let snapshot = self.model.playback_snapshot().await;
        if snapshot.duration_seconds <= 0.0 {
            return;
        }
        let target = (snapshot.progress_percent + delta_percent).clamp(0.0, 100.0);
        if let Err(e) = self.model.seek(target).await {
            self.model.set_error(e.to_string()).await;
        }
    }

    pub async fn volume_up(&self) {
        self.adjust_volume(VOLUME_STEP).await;
    }

    pub async fn volume_down(&self) {
        self.adjust_volume(-VOLUME_STEP).await;
    }

    async fn adjust_volume(&self, delta: f32) {
        let current = self.model.playback_snapshot().await.volume;
        let target = (current + delta).clamp(0.0, 1.0);
        if let Err(e) = self.model.set_volume(target).await {
            self.model.set_error(e.to_string()).await;
        }
    }

    pub async fn toggle_mute(&self) {
        self.model.toggle_mute().await;
    }
}

//! Clock-driven media player
//!
//! Tracks position from the tokio clock and posts `ItemEnded` when the
//! loaded item's duration elapses while playing. Items without a duration
//! hint never end on their own.

use crate::playback::{MediaPlayer, PlayerError, PlayerEvent, PlayerPosition, PlaylistItem};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

pub struct SimulatedPlayer {
    events: mpsc::UnboundedSender<PlayerEvent>,
    item_id: Option<String>,
    total: Option<Duration>,
    /// Position at the last state change
    base: Duration,
    /// Set while playing
    playing_since: Option<Instant>,
    rate: f32,
    /// Bumped on every state change so stale end timers stay quiet
    generation: Arc<AtomicU64>,
}

impl SimulatedPlayer {
    pub fn new(events: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self {
            events,
            item_id: None,
            total: None,
            base: Duration::ZERO,
            playing_since: None,
            rate: 1.0,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn current_elapsed(&self) -> Duration {
        let elapsed = match self.playing_since {
            Some(since) => {
                let advanced = scale(since.elapsed(), f64::from(self.rate)).unwrap_or(Duration::MAX);
                self.base.saturating_add(advanced)
            }
            None => self.base,
        };
        match self.total {
            Some(total) => elapsed.min(total),
            None => elapsed,
        }
    }

    /// Freeze the running position into `base`
    fn settle(&mut self) {
        self.base = self.current_elapsed();
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn schedule_end(&self) {
        let (Some(item_id), Some(total), Some(_)) =
            (self.item_id.clone(), self.total, self.playing_since)
        else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime available, end of {} will not be reported", item_id);
            return;
        };

        let Some(remaining) = scale(total.saturating_sub(self.base), 1.0 / f64::from(self.rate))
        else {
            warn!("End of {} out of range at rate {}, not scheduled", item_id, self.rate);
            return;
        };
        let generation = self.generation.clone();
        let scheduled = generation.load(Ordering::SeqCst);
        let events = self.events.clone();

        runtime.spawn(async move {
            tokio::time::sleep(remaining).await;
            if generation.load(Ordering::SeqCst) == scheduled {
                debug!("Simulated item {} ended", item_id);
                let _ = events.send(PlayerEvent::ItemEnded { item_id });
            }
        });
    }
}

/// `duration * factor`, or None when the product is not a valid duration
fn scale(duration: Duration, factor: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(duration.as_secs_f64() * factor).ok()
}

impl MediaPlayer for SimulatedPlayer {
    fn load_media(&mut self, item: &PlaylistItem) -> Result<(), PlayerError> {
        if item.media_url.trim().is_empty() {
            return Err(PlayerError::Load {
                url: item.media_url.clone(),
                reason: "empty media url".to_string(),
            });
        }

        let was_playing = self.playing_since.is_some();
        self.settle();
        self.item_id = Some(item.id.clone());
        self.total = item.duration_hint();
        self.base = Duration::ZERO;
        if was_playing {
            self.schedule_end();
        }
        Ok(())
    }

    fn play(&mut self) {
        if self.playing_since.is_some() {
            return;
        }
        self.settle();
        self.playing_since = Some(Instant::now());
        self.schedule_end();
    }

    fn pause(&mut self) {
        self.settle();
        self.playing_since = None;
    }

    fn set_rate(&mut self, rate: f32) {
        if !rate.is_finite() || rate <= 0.0 {
            warn!("Ignoring invalid rate {}", rate);
            return;
        }
        self.settle();
        self.rate = rate;
        self.schedule_end();
    }

    fn seek(&mut self, to: Duration) {
        self.settle();
        self.base = match self.total {
            Some(total) => to.min(total),
            None => to,
        };
        self.schedule_end();
    }

    fn position(&self) -> Option<PlayerPosition> {
        self.item_id.as_ref()?;
        Some(PlayerPosition {
            elapsed: self.current_elapsed(),
            total: self.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(secs: u64) -> PlaylistItem {
        PlaylistItem::new("a", "A", "file:///a.m4a").with_duration(Duration::from_secs(secs))
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_follows_clock_and_rate() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut player = SimulatedPlayer::new(tx);
        player.load_media(&item(100)).unwrap();
        player.set_rate(2.0);
        player.play();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(player.position().unwrap().elapsed, Duration::from_secs(20));

        player.pause();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(player.position().unwrap().elapsed, Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_end_of_item_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut player = SimulatedPlayer::new(tx);
        player.load_media(&item(5)).unwrap();
        player.play();
        // Seek reschedules; only the latest timer fires
        player.seek(Duration::from_secs(2));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(
            rx.recv().await,
            Some(PlayerEvent::ItemEnded {
                item_id: "a".to_string()
            })
        );
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut player = SimulatedPlayer::new(tx);
        let bad = PlaylistItem::new("x", "X", " ");
        assert!(player.load_media(&bad).is_err());
        assert!(player.position().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extreme_rates_do_not_panic() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut player = SimulatedPlayer::new(tx);
        player.load_media(&item(60)).unwrap();

        player.set_rate(1e-30);
        player.play();
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(player.position().unwrap().elapsed < Duration::from_millis(1));

        player.set_rate(3e38);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(player.position().unwrap().elapsed, Duration::from_secs(60));
    }
}

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::config::AnimationConfig;

const ENABLE_LOGS: bool = false;

use crate::log_debug;

/// Drives the avatar frame counter while a session is on screen.
///
/// The counter is published through a `watch` channel; renderers redraw on
/// every change. The loop runs under a child of the owning session's token,
/// so cancelling the session also stops the animation.
pub struct AnimationLoop {
    config: AnimationConfig,
    frame_tx: Arc<watch::Sender<f64>>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl AnimationLoop {
    pub fn new(config: AnimationConfig) -> Self {
        let (frame_tx, _) = watch::channel(0.0);
        Self {
            config,
            frame_tx: Arc::new(frame_tx),
            handle: None,
            cancel_token: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.frame_tx.subscribe()
    }

    pub fn frame(&self) -> f64 {
        *self.frame_tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Starts counting from frame zero.
    pub fn start(&mut self, parent: &CancellationToken) -> Result<()> {
        if self.is_running() {
            bail!("animation already running");
        }

        let cancel_token = parent.child_token();
        self.frame_tx.send_replace(0.0);

        let handle = tokio::spawn(frame_loop(
            self.frame_tx.clone(),
            self.config.clone(),
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("animation loop task failed to join")
        } else {
            Ok(())
        }
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}

async fn frame_loop(
    frame_tx: Arc<watch::Sender<f64>>,
    config: AnimationConfig,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(config.frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if cancel_token.is_cancelled() {
                    break;
                }
                frame_tx.send_modify(|frame| *frame += config.frame_increment);
            }
            _ = cancel_token.cancelled() => {
                log_debug!("animation loop shutting down at frame {:.1}", *frame_tx.borrow());
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> AnimationConfig {
        AnimationConfig {
            frame_increment: 0.1,
            frame_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn frame_advances_per_interval() {
        let parent = CancellationToken::new();
        let mut animation = AnimationLoop::new(config());
        animation.start(&parent).unwrap();

        // first tick is immediate, then one every 10ms
        time::sleep(Duration::from_millis(95)).await;
        let frame = animation.frame();
        assert!((frame - 1.0).abs() < 1e-9, "frame was {frame}");
        assert!(animation.is_running());

        animation.stop().await.unwrap();
        assert!(!animation.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_the_loop() {
        let parent = CancellationToken::new();
        let mut animation = AnimationLoop::new(config());
        animation.start(&parent).unwrap();
        time::sleep(Duration::from_millis(25)).await;

        parent.cancel();
        time::sleep(Duration::from_millis(5)).await;
        let frozen = animation.frame();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(animation.frame(), frozen);
        assert!(!animation.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_counts_from_zero() {
        let parent = CancellationToken::new();
        let mut animation = AnimationLoop::new(config());
        let mut frames = animation.subscribe();
        animation.start(&parent).unwrap();
        assert!(animation.start(&parent).is_err());

        frames.changed().await.unwrap();
        time::sleep(Duration::from_millis(50)).await;
        animation.stop().await.unwrap();
        assert!(animation.frame() > 0.0);

        animation.start(&parent).unwrap();
        assert_eq!(animation.frame(), 0.0);
        animation.stop().await.unwrap();
    }
}

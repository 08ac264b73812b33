use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::studio::Studio;
use crate::surface::Surface;

/// Frame loop settings for [`run`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    pub fps: f64,
    /// Stop after this many frames; unbounded when `None`
    pub max_frames: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            fps: 60.0,
            max_frames: None,
        }
    }
}

impl RunOptions {
    /// Time between ticks; must be representable and non-zero
    fn period(&self) -> Result<Duration> {
        let period = if self.fps.is_finite() && self.fps > 0.0 {
            Duration::try_from_secs_f64(1.0 / self.fps).ok()
        } else {
            None
        };
        match period {
            Some(period) if !period.is_zero() => Ok(period),
            _ => Err(ConfigError::InvalidValue {
                key: "fps".to_string(),
                value: self.fps.to_string(),
            }
            .into()),
        }
    }
}

/// Drive `studio` at a fixed frame rate until it is stopped
///
/// Starts the Studio, then ticks once per period. Late periods are skipped
/// rather than replayed in a burst. After every tick `on_frame` gets the
/// Studio and the number of frames run so far; it may call
/// [`Studio::stop`] to end the loop. The loop also ends at
/// `options.max_frames` or when `shutdown` resolves, and the Studio is left
/// stopped.
///
/// Returns the number of frames run.
pub async fn run<S, F, D>(
    studio: &mut Studio<S>,
    options: RunOptions,
    mut on_frame: F,
    shutdown: D,
) -> Result<u64>
where
    S: Surface,
    F: FnMut(&mut Studio<S>, u64) -> Result<()>,
    D: Future<Output = ()>,
{
    let mut ticker = interval(options.period()?);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!("Frame loop starting at {} fps", options.fps);
    studio.start();
    let mut frames = 0u64;

    while studio.is_running() {
        if options.max_frames.is_some_and(|max| frames >= max) {
            debug!("Frame limit {} reached", frames);
            break;
        }

        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                if !studio.tick() {
                    break;
                }
                frames += 1;
                if let Err(e) = on_frame(studio, frames) {
                    studio.stop();
                    return Err(e);
                }
            }
        }
    }

    studio.stop();
    info!("Frame loop finished after {} frames", frames);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioError;
    use crate::modules::ModuleFactory;
    use crate::surface::RecordingSurface;

    fn studio() -> Studio<RecordingSurface> {
        Studio::new(RecordingSurface::new(50, 50).unwrap(), ModuleFactory::with_seed(0)).unwrap()
    }

    #[tokio::test]
    async fn test_frame_limit() {
        let mut studio = studio();
        let options = RunOptions { fps: 1000.0, max_frames: Some(5) };
        let frames = run(&mut studio, options, |_, _| Ok(()), std::future::pending()).await.unwrap();

        assert_eq!(frames, 5);
        assert_eq!(studio.tick_count(), 5);
        assert!(!studio.is_running());
    }

    #[tokio::test]
    async fn test_callback_can_stop() {
        let mut studio = studio();
        let options = RunOptions { fps: 1000.0, max_frames: None };
        let frames = run(
            &mut studio,
            options,
            |studio, frame| {
                if frame == 3 {
                    studio.stop();
                }
                Ok(())
            },
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(frames, 3);
    }

    #[tokio::test]
    async fn test_shutdown_wins_over_ticks() {
        let mut studio = studio();
        let frames = run(&mut studio, RunOptions::default(), |_, _| Ok(()), std::future::ready(()))
            .await
            .unwrap();
        assert_eq!(frames, 0);
    }

    #[tokio::test]
    async fn test_callback_error_stops() {
        let mut studio = studio();
        let options = RunOptions { fps: 1000.0, max_frames: Some(10) };
        let result = run(
            &mut studio,
            options,
            |_, frame| if frame == 2 { Err(StudioError::generic("disk full")) } else { Ok(()) },
            std::future::pending(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(studio.tick_count(), 2);
        assert!(!studio.is_running());
    }

    #[tokio::test]
    async fn test_rejects_bad_fps() {
        let mut studio = studio();
        for fps in [0.0, -5.0, f64::NAN, 1e-20, f64::MAX] {
            let options = RunOptions { fps, max_frames: Some(1) };
            assert!(run(&mut studio, options, |_, _| Ok(()), std::future::pending()).await.is_err());
        }
        assert_eq!(studio.tick_count(), 0);
    }
}

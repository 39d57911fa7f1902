//! Background idle timer.
//!
//! A cancelable, restartable single-shot countdown. While the app is in the
//! background and playback is not active, the timer counts down
//! [`BG_IDLE_END_TIMEOUT_MS`](sw_core::config::BG_IDLE_END_TIMEOUT_MS) and then
//! hands an [`IdleTimeout`] to the caller-supplied callback, which is
//! expected to push it back through the session's event queue.
//!
//! Every start bumps a generation counter and the fire path re-checks it
//! under the slot lock, so a `cancel()` that wins the lock before the
//! callback runs fully suppresses the timeout. A timeout that already fired
//! carries its generation; consumers compare it with [`generation()`] when
//! it is dequeued and drop it if the countdown has since been replaced.
//!
//! [`generation()`]: BackgroundIdleTimer::generation

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use sw_core::{Error, EventKind, PlaybackEvent, Result};

/// A fired countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleTimeout {
    /// Generation of the countdown that produced this timeout.
    pub generation: u64,
    /// Always a `BackgroundIdleTimeout` event.
    pub event: PlaybackEvent,
}

/// Callback receiving fired timeouts.
///
/// Invoked while the timer's internal lock is held: it must not call back
/// into the same [`BackgroundIdleTimer`].
pub type TimeoutCallback = Arc<dyn Fn(IdleTimeout) + Send + Sync>;

#[derive(Default)]
struct TimerSlot {
    generation: u64,
    task: Option<JoinHandle<()>>,
    in_background: bool,
}

impl TimerSlot {
    fn cancel(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

pub struct BackgroundIdleTimer {
    slot: Arc<Mutex<TimerSlot>>,
    timeout: Duration,
    runtime: Handle,
    on_timeout: TimeoutCallback,
}

impl BackgroundIdleTimer {
    /// Create a timer on the current tokio runtime.
    ///
    /// Fails with [`Error::Internal`] when called outside a runtime.
    pub fn new(
        timeout: Duration,
        on_timeout: impl Fn(IdleTimeout) + Send + Sync + 'static,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            Error::Internal(format!("background idle timer requires a tokio runtime: {e}"))
        })?;
        Ok(Self::with_handle(runtime, timeout, on_timeout))
    }

    /// Create a timer that schedules its countdown on `runtime`.
    pub fn with_handle(
        runtime: Handle,
        timeout: Duration,
        on_timeout: impl Fn(IdleTimeout) + Send + Sync + 'static,
    ) -> Self {
        Self {
            slot: Arc::new(Mutex::new(TimerSlot::default())),
            timeout,
            runtime,
            on_timeout: Arc::new(on_timeout),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `true` while a countdown is pending.
    pub fn is_running(&self) -> bool {
        self.slot.lock().task.is_some()
    }

    pub fn is_in_background(&self) -> bool {
        self.slot.lock().in_background
    }

    /// Current countdown generation. Bumped by every start and cancel, so
    /// only a timeout carrying this value belongs to the live countdown.
    pub fn generation(&self) -> u64 {
        self.slot.lock().generation
    }

    /// The app went to the background. Starts a fresh countdown unless
    /// playback is active, in which case any countdown is stopped.
    pub fn on_app_backgrounded(&self, playback_active: bool) {
        let mut slot = self.slot.lock();
        slot.in_background = true;
        if playback_active {
            if slot.cancel() {
                tracing::debug!("Background idle timer cancelled: playback active");
            }
        } else {
            self.restart(&mut slot);
        }
    }

    /// The app returned to the foreground. Always cancels.
    pub fn on_app_foregrounded(&self) {
        let mut slot = self.slot.lock();
        slot.in_background = false;
        if slot.cancel() {
            tracing::debug!("Background idle timer cancelled: app foregrounded");
        }
    }

    /// Playback-active flipped. Ignored while in the foreground; in the
    /// background, active cancels and inactive restarts from zero.
    pub fn on_playback_active_changed(&self, active: bool) {
        let mut slot = self.slot.lock();
        if !slot.in_background {
            return;
        }
        if active {
            if slot.cancel() {
                tracing::debug!("Background idle timer cancelled: playback resumed");
            }
        } else {
            self.restart(&mut slot);
        }
    }

    /// Stop any pending countdown. Idempotent.
    pub fn cancel(&self) {
        self.slot.lock().cancel();
    }

    fn restart(&self, slot: &mut TimerSlot) {
        slot.cancel();
        let generation = slot.generation;
        // Created here so the countdown starts now; `sleep` clamps durations
        // past the clock's range instead of overflowing.
        let countdown = {
            let _runtime = self.runtime.enter();
            tokio::time::sleep(self.timeout)
        };
        let shared = Arc::clone(&self.slot);
        let on_timeout = Arc::clone(&self.on_timeout);
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);

        slot.task = Some(self.runtime.spawn(async move {
            countdown.await;

            let mut slot = shared.lock();
            if slot.generation != generation {
                return;
            }
            slot.task = None;
            tracing::info!(timeout_ms, generation, "Background idle timeout fired");
            on_timeout(IdleTimeout {
                generation,
                event: PlaybackEvent::now(EventKind::BackgroundIdleTimeout),
            });
        }));

        tracing::debug!(timeout_ms, "Background idle timer started");
    }
}

impl Drop for BackgroundIdleTimer {
    fn drop(&mut self) {
        self.slot.lock().cancel();
    }
}

impl fmt::Debug for BackgroundIdleTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("BackgroundIdleTimer")
            .field("timeout", &self.timeout)
            .field("running", &slot.task.is_some())
            .field("in_background", &slot.in_background)
            .finish()
    }
}

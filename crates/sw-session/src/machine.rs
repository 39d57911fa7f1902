//! Session lifecycle state machine.
//!
//! [`SessionStateMachine`] consumes normalized [`PlaybackEvent`]s one at a
//! time and decides the session's state, whether it ever saw meaningful
//! activity, and why it ended. Every branch is total over the closed
//! event/state sets, so processing never fails.
//!
//! Callers must deliver events sequentially; the machine has no internal
//! locking.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use sw_core::{EndReason, EventKind, PlaybackEvent, PlaybackInputs, SessionId, SessionState};

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A single observed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub session_id: SessionId,
    pub old_state: SessionState,
    pub new_state: SessionState,
    /// Tag of the event that caused the transition.
    pub reason: &'static str,
}

/// Receives a synchronous notification for every actual state transition.
pub trait StateChangeListener: Send {
    fn on_state_changed(&self, change: &StateChange);
}

impl<F> StateChangeListener for F
where
    F: Fn(&StateChange) + Send,
{
    fn on_state_changed(&self, change: &StateChange) {
        self(change)
    }
}

/// Handle returned by [`SessionStateMachine::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Resolved outcome of one event.
enum Target {
    State(SessionState),
    End(EndReason),
}

// ---------------------------------------------------------------------------
// SessionStateMachine
// ---------------------------------------------------------------------------

pub struct SessionStateMachine {
    session_id: SessionId,
    state: SessionState,
    meaningful_activity: bool,
    end_reason: Option<EndReason>,
    /// Set only while `state == Background`.
    pre_background: Option<SessionState>,
    inputs: PlaybackInputs,
    listeners: Vec<(ListenerId, Box<dyn StateChangeListener>)>,
    next_listener_id: u64,
}

impl SessionStateMachine {
    /// Create a machine for a freshly attached player, in `ATTACHED`.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            state: SessionState::Attached,
            meaningful_activity: false,
            end_reason: None,
            pre_background: None,
            inputs: PlaybackInputs::default(),
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn has_meaningful_activity(&self) -> bool {
        self.meaningful_activity
    }

    /// `Some` if and only if the session has ended.
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// State remembered on entering `BACKGROUND`; `None` outside it.
    pub fn pre_background_state(&self) -> Option<SessionState> {
        self.pre_background
    }

    pub fn inputs(&self) -> PlaybackInputs {
        self.inputs
    }

    /// Playback-active predicate over the most recently observed inputs.
    pub fn is_playback_active(&self) -> bool {
        self.inputs.is_active()
    }

    /// A session with no meaningful activity should have its summary dropped.
    pub fn should_discard(&self) -> bool {
        !self.meaningful_activity
    }

    pub fn is_ended(&self) -> bool {
        self.state.is_terminal()
    }

    /// Register a listener. Listeners are invoked in registration order.
    pub fn add_listener(&mut self, listener: impl StateChangeListener + 'static) -> ListenerId {
        self.add_boxed_listener(Box::new(listener))
    }

    pub fn add_boxed_listener(&mut self, listener: Box<dyn StateChangeListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove a previously registered listener. Returns `false` if unknown.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Apply one event.
    ///
    /// Returns `false` without touching any field once the session has ended.
    /// Otherwise returns `true`, whether or not the state changed.
    pub fn process_event(&mut self, event: &PlaybackEvent) -> bool {
        if self.state.is_terminal() {
            tracing::trace!(
                session_id = %self.session_id,
                event = event.tag(),
                "Session already ended; event ignored"
            );
            return false;
        }

        let old_state = self.state;
        match self.resolve(&event.kind) {
            Some(Target::State(next)) => self.move_to(next),
            Some(Target::End(reason)) => {
                self.end_reason = Some(reason);
                self.move_to(SessionState::Ended);
            }
            None => {}
        }

        if self.state != old_state {
            let change = StateChange {
                session_id: self.session_id,
                old_state,
                new_state: self.state,
                reason: event.tag(),
            };
            tracing::debug!(
                session_id = %self.session_id,
                from = %old_state,
                to = %self.state,
                reason = change.reason,
                "Session state changed"
            );
            if let Some(reason) = self.end_reason {
                tracing::info!(
                    session_id = %self.session_id,
                    end_reason = %reason,
                    discard = self.should_discard(),
                    "Session ended"
                );
            }
            self.notify(&change);
        }

        true
    }

    /// Update tracked inputs and activity for `kind`, and decide where the
    /// session goes next. `None` means the state is unchanged.
    fn resolve(&mut self, kind: &EventKind) -> Option<Target> {
        use EventKind::*;

        let state = self.state;
        match kind {
            PlayRequested => {
                self.mark_meaningful_activity();
                None
            }
            FirstFrameRendered => {
                self.mark_meaningful_activity();
                (state == SessionState::Attached).then_some(Target::State(SessionState::Playing))
            }
            BufferingStarted => {
                self.mark_meaningful_activity();
                matches!(
                    state,
                    SessionState::Attached
                        | SessionState::Playing
                        | SessionState::Paused
                        | SessionState::Seeking
                )
                .then_some(Target::State(SessionState::Buffering))
            }
            BufferingEnded { .. } => (state == SessionState::Buffering)
                .then(|| Target::State(self.resume_state())),
            IsPlayingChanged { is_playing } => {
                self.inputs.is_playing = *is_playing;
                if *is_playing {
                    self.mark_meaningful_activity();
                }
                match (state, *is_playing) {
                    (SessionState::Attached | SessionState::Paused, true) => {
                        Some(Target::State(SessionState::Playing))
                    }
                    (SessionState::Playing, false) => Some(Target::State(SessionState::Paused)),
                    // Buffering and seeking resolve on their own end events.
                    _ => None,
                }
            }
            PlayWhenReadyChanged { play_when_ready } => {
                self.inputs.play_when_ready = *play_when_ready;
                None
            }
            PlaybackStateChanged { playback_state } => {
                self.inputs.playback_state = *playback_state;
                None
            }
            SeekStarted => matches!(state, SessionState::Playing | SessionState::Paused)
                .then_some(Target::State(SessionState::Seeking)),
            SeekEnded { .. } => {
                (state == SessionState::Seeking).then(|| Target::State(self.resume_state()))
            }
            AppBackgrounded => {
                if state == SessionState::Background {
                    return None;
                }
                self.pre_background = Some(state);
                Some(Target::State(SessionState::Background))
            }
            AppForegrounded => (state == SessionState::Background).then(|| {
                Target::State(self.pre_background.unwrap_or_else(|| self.resume_state()))
            }),
            PlayerReleased => Some(Target::End(EndReason::PlayerReleased)),
            PlayerReplaced => Some(Target::End(EndReason::PlayerReplaced)),
            PlaybackEnded => Some(Target::End(EndReason::PlaybackEnded)),
            BackgroundIdleTimeout => (state == SessionState::Background
                && !self.is_playback_active())
            .then_some(Target::End(EndReason::BackgroundIdleTimeout)),
            MediaItemTransition { .. } => (self.meaningful_activity
                && matches!(
                    state,
                    SessionState::Playing | SessionState::Paused | SessionState::Buffering
                ))
            .then_some(Target::End(EndReason::ContentSwitch)),
            // Errors feed downstream metrics only.
            PlayerError { .. } => None,
        }
    }

    /// PLAYING or PAUSED, from the last known `is_playing`.
    fn resume_state(&self) -> SessionState {
        if self.inputs.is_playing {
            SessionState::Playing
        } else {
            SessionState::Paused
        }
    }

    fn move_to(&mut self, next: SessionState) {
        if next != SessionState::Background {
            self.pre_background = None;
        }
        self.state = next;
    }

    fn mark_meaningful_activity(&mut self) {
        self.meaningful_activity = true;
    }

    fn notify(&self, change: &StateChange) {
        for (id, listener) in &self.listeners {
            let delivered =
                panic::catch_unwind(AssertUnwindSafe(|| listener.on_state_changed(change)));
            if delivered.is_err() {
                tracing::warn!(
                    session_id = %self.session_id,
                    listener = id.0,
                    from = %change.old_state,
                    to = %change.new_state,
                    "State change listener panicked; continuing with remaining listeners"
                );
            }
        }
    }
}

impl fmt::Debug for SessionStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStateMachine")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("meaningful_activity", &self.meaningful_activity)
            .field("end_reason", &self.end_reason)
            .field("pre_background", &self.pre_background)
            .field("inputs", &self.inputs)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

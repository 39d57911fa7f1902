//! Session tracker.
//!
//! Runs one [`SessionStateMachine`] inside a tokio task. Caller events and
//! background idle timeouts share a single mailbox, so the machine sees a
//! strictly ordered stream no matter which thread produced an event. After
//! each event the tracker re-wires the [`BackgroundIdleTimer`] and publishes
//! the new state on a `watch` channel.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sw_core::config::Config;
use sw_core::{EndReason, Error, EventKind, PlaybackEvent, Result, SessionId, SessionState, StreamType};

use crate::machine::{SessionStateMachine, StateChangeListener};
use crate::summary::{SessionSummary, SummaryCollector};
use crate::timer::{BackgroundIdleTimer, IdleTimeout};

/// Final outcome of a tracked session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session_id: SessionId,
    pub final_state: SessionState,
    pub end_reason: Option<EndReason>,
    /// `true` when the session never saw meaningful activity.
    pub discard: bool,
    pub summary: SessionSummary,
}

impl SessionReport {
    pub fn new(machine: &SessionStateMachine, collector: &SummaryCollector) -> Self {
        Self {
            session_id: machine.session_id(),
            final_state: machine.state(),
            end_reason: machine.end_reason(),
            discard: machine.should_discard(),
            summary: collector.finish(machine.end_reason()),
        }
    }
}

/// Mailbox message. Timer timeouts stay distinct from caller events so a
/// timeout can be matched against the countdown that produced it.
#[derive(Debug)]
enum Mail {
    Event(PlaybackEvent),
    IdleTimeout(IdleTimeout),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and spawns a tracked session.
pub struct SessionTracker {
    session_id: SessionId,
    timeout: Duration,
    schema_version: String,
    content_id: Option<String>,
    stream_type: Option<StreamType>,
    listeners: Vec<Box<dyn StateChangeListener>>,
    cancel: CancellationToken,
}

impl SessionTracker {
    pub fn new(config: &Config) -> Self {
        Self {
            session_id: SessionId::new(),
            timeout: config.session.background_idle_timeout(),
            schema_version: config.summary.schema_version.clone(),
            content_id: None,
            stream_type: None,
            listeners: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_content(mut self, content_id: impl Into<String>, stream_type: StreamType) -> Self {
        self.content_id = Some(content_id.into());
        self.stream_type = Some(stream_type);
        self
    }

    pub fn with_listener(mut self, listener: impl StateChangeListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Stop the session early when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Start the session task on the current runtime.
    pub fn spawn(self) -> Result<SessionHandle> {
        let runtime = Handle::try_current().map_err(|e| {
            Error::Internal(format!("session tracker requires a tokio runtime: {e}"))
        })?;

        let (tx, rx) = mpsc::unbounded_channel::<Mail>();
        let (state_tx, state_rx) = watch::channel(SessionState::Attached);

        // The timer only holds a weak sender so dropping every handle still
        // closes the mailbox.
        let timer_tx = tx.downgrade();
        let timer = BackgroundIdleTimer::with_handle(runtime.clone(), self.timeout, move |timeout| {
            if let Some(tx) = timer_tx.upgrade() {
                let _ = tx.send(Mail::IdleTimeout(timeout));
            }
        });

        let mut machine = SessionStateMachine::new(self.session_id);
        for listener in self.listeners {
            machine.add_boxed_listener(listener);
        }
        let collector = SummaryCollector::new(self.session_id)
            .with_schema_version(self.schema_version)
            .with_content(self.content_id, self.stream_type);

        let actor = SessionActor {
            machine,
            collector,
            timer,
            rx,
            state_tx,
            cancel: self.cancel.clone(),
        };

        tracing::info!(session_id = %self.session_id, "Session started");
        let task = runtime.spawn(actor.run());

        Ok(SessionHandle {
            session_id: self.session_id,
            tx,
            state_rx,
            cancel: self.cancel,
            task,
        })
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Caller side of a running session.
#[derive(Debug)]
pub struct SessionHandle {
    session_id: SessionId,
    tx: mpsc::UnboundedSender<Mail>,
    state_rx: watch::Receiver<SessionState>,
    cancel: CancellationToken,
    task: JoinHandle<SessionReport>,
}

impl SessionHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Queue an event. Fails once the session has ended or stopped.
    pub fn send(&self, event: impl Into<PlaybackEvent>) -> Result<()> {
        self.tx
            .send(Mail::Event(event.into()))
            .map_err(|_| Error::session_closed(self.session_id))
    }

    /// Most recently published state.
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Wait until the session reaches `ENDED` on its own.
    pub async fn ended(&self) -> SessionState {
        let mut rx = self.state_rx.clone();
        let ended = rx.wait_for(|state| state.is_terminal()).await.map(|state| *state);
        // The task stopped without ending; report where it stopped.
        ended.unwrap_or_else(|_| *rx.borrow())
    }

    /// Stop the session without an end event.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Close the mailbox and wait for the final report.
    ///
    /// Events already queued are still processed. A session that has not
    /// ended reports `end_reason: None`.
    pub async fn finish(self) -> Result<SessionReport> {
        let Self {
            session_id,
            tx,
            task,
            ..
        } = self;
        drop(tx);
        task.await
            .map_err(|e| Error::Internal(format!("session {session_id} task failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct SessionActor {
    machine: SessionStateMachine,
    collector: SummaryCollector,
    timer: BackgroundIdleTimer,
    rx: mpsc::UnboundedReceiver<Mail>,
    state_tx: watch::Sender<SessionState>,
    cancel: CancellationToken,
}

impl SessionActor {
    async fn run(mut self) -> SessionReport {
        let session_id = self.machine.session_id();

        loop {
            let mail = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(%session_id, state = %self.machine.state(), "Session cancelled");
                    break;
                }
                mail = self.rx.recv() => match mail {
                    Some(mail) => mail,
                    None => {
                        tracing::debug!(%session_id, "Session mailbox closed");
                        break;
                    }
                },
            };

            let event = match mail {
                Mail::Event(event) => event,
                Mail::IdleTimeout(timeout) => {
                    // Fired before a foreground/background or activity change
                    // that was still queued; that change replaced the countdown.
                    if timeout.generation != self.timer.generation() {
                        tracing::debug!(
                            %session_id,
                            generation = timeout.generation,
                            "Dropping stale background idle timeout"
                        );
                        continue;
                    }
                    timeout.event
                }
            };

            if self.handle(&event) {
                break;
            }
        }

        self.timer.cancel();
        self.rx.close();
        SessionReport::new(&self.machine, &self.collector)
    }

    /// Process one event. Returns `true` once the session has ended.
    fn handle(&mut self, event: &PlaybackEvent) -> bool {
        let was_active = self.machine.is_playback_active();
        if !self.machine.process_event(event) {
            return true;
        }
        self.collector.observe(event);

        let active = self.machine.is_playback_active();
        match event.kind {
            EventKind::AppBackgrounded => self.timer.on_app_backgrounded(active),
            EventKind::AppForegrounded => self.timer.on_app_foregrounded(),
            _ if active != was_active => self.timer.on_playback_active_changed(active),
            _ => {}
        }

        let ended = self.machine.is_ended();
        if ended {
            // Close before publishing so an observer of ENDED can never
            // successfully enqueue another event.
            self.timer.cancel();
            self.rx.close();
        }
        self.state_tx.send_replace(self.machine.state());
        ended
    }
}

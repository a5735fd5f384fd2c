//! Background supervision of one signed-in session

use buildledger_config::{SessionConfig, Validatable};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::backend::{AuthBackend, AuthSession, AuthUser};
use crate::error::{SessionError, SessionResult};
use crate::monitor::{ActivityKind, SessionMonitor, SessionState, Transition};

const EVENT_CAPACITY: usize = 32;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    IdleTimeout,
    UserRequested,
}

/// Notifications published by a running supervisor
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Sign-out is imminent
    WarningShown { remaining: Duration },
    WarningCleared,
    TokenRefreshed { expires_at: DateTime<Utc> },
    Expired,
    SignedOut { reason: SignOutReason },
}

#[derive(Debug)]
enum Command {
    Activity(ActivityKind),
    DismissWarning,
    SignOut,
}

/// Cloneable handle to a running supervisor
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    user: AuthUser,
}

impl SessionHandle {
    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    pub fn record_activity(&self, kind: ActivityKind) -> SessionResult<()> {
        self.send(Command::Activity(kind))
    }

    /// "Stay signed in"
    pub fn dismiss_warning(&self) -> SessionResult<()> {
        self.send(Command::DismissWarning)
    }

    pub fn sign_out(&self) -> SessionResult<()> {
        self.send(Command::SignOut)
    }

    /// Wait until the supervisor has stopped
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        while state.changed().await.is_ok() {}
    }

    fn send(&self, command: Command) -> SessionResult<()> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::SupervisorStopped)
    }
}

/// Runs the idle check and token refresh for one session
///
/// The background task is aborted when the supervisor is dropped.
pub struct SessionSupervisor {
    handle: SessionHandle,
    task: JoinHandle<()>,
}

impl SessionSupervisor {
    /// Start supervising `session`; must be called within a tokio runtime
    pub fn start(
        config: SessionConfig,
        backend: Arc<dyn AuthBackend>,
        session: AuthSession,
    ) -> SessionResult<Self> {
        config
            .validate()
            .map_err(|e| SessionError::Config(e.to_string()))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Active);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let handle = SessionHandle {
            commands: command_tx,
            state: state_rx,
            events: event_tx.clone(),
            user: session.user.clone(),
        };

        info!(
            user_id = %session.user.id,
            idle_timeout_secs = config.idle_timeout.as_secs(),
            "Starting session supervisor"
        );

        let task = SupervisorTask {
            monitor: SessionMonitor::new(&config, Instant::now()),
            config,
            backend,
            session,
            commands: command_rx,
            state: state_tx,
            events: event_tx,
        };

        Ok(Self {
            handle,
            task: tokio::spawn(task.run()),
        })
    }

    /// Start from a stored session, refreshing it if the access token was rejected
    pub async fn resume(
        config: SessionConfig,
        backend: Arc<dyn AuthBackend>,
        stored: AuthSession,
    ) -> SessionResult<Self> {
        let session = match backend.get_user(&stored.access_token).await? {
            Some(user) => AuthSession { user, ..stored },
            None => {
                debug!("Stored access token rejected, trying refresh token");
                backend
                    .refresh_session(&stored.refresh_token)
                    .await
                    .map_err(|e| if e.is_rejected() { SessionError::NoSession } else { e })?
            }
        };

        Self::start(config, backend, session)
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SessionSupervisor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct SupervisorTask {
    config: SessionConfig,
    backend: Arc<dyn AuthBackend>,
    session: AuthSession,
    monitor: SessionMonitor,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupervisorTask {
    async fn run(mut self) {
        let period = self.config.check_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let transition = self.monitor.evaluate(Instant::now());
                    if self.apply(transition).await {
                        break;
                    }
                    self.refresh_if_due().await;
                }
                command = self.commands.recv() => {
                    let now = Instant::now();
                    let transition = match command {
                        Some(Command::Activity(kind)) => self.monitor.record_activity(kind, now),
                        Some(Command::DismissWarning) => self.monitor.dismiss_warning(now),
                        Some(Command::SignOut) => {
                            self.sign_out(SignOutReason::UserRequested).await;
                            break;
                        }
                        None => {
                            debug!("All session handles dropped");
                            break;
                        }
                    };
                    if self.apply(transition).await {
                        break;
                    }
                }
            }
        }

        debug!(user_id = %self.session.user.id, "Session supervisor stopped");
    }

    /// Publish a transition; true once the session has ended
    async fn apply(&mut self, transition: Option<Transition>) -> bool {
        let Some(transition) = transition else {
            return false;
        };
        self.state.send_replace(self.monitor.state());

        match transition {
            Transition::WarningRaised { remaining } => {
                info!(remaining_secs = remaining.as_secs(), "Session idle, sign-out warning shown");
                self.emit(SessionEvent::WarningShown { remaining });
                false
            }
            Transition::WarningCleared => {
                debug!("Session warning cleared by activity");
                self.emit(SessionEvent::WarningCleared);
                false
            }
            Transition::Expired => {
                warn!(
                    user_id = %self.session.user.id,
                    idle_timeout_secs = self.config.idle_timeout.as_secs(),
                    "Session expired after inactivity"
                );
                self.emit(SessionEvent::Expired);
                self.sign_out(SignOutReason::IdleTimeout).await;
                true
            }
        }
    }

    async fn refresh_if_due(&mut self) {
        if !self.session.needs_refresh(Utc::now(), self.config.refresh_buffer) {
            return;
        }

        match self.backend.refresh_session(&self.session.refresh_token).await {
            Ok(session) => {
                let expires_at = session.expires_at;
                self.session = session;
                self.emit(SessionEvent::TokenRefreshed { expires_at });
            }
            Err(e) => {
                error!(error = %e, "Failed to refresh auth session");
            }
        }
    }

    async fn sign_out(&mut self, reason: SignOutReason) {
        // The local session ends even if the backend call fails
        if let Err(e) = self.backend.sign_out(&self.session.access_token).await {
            error!(error = %e, ?reason, "Backend sign-out failed");
        }
        info!(user_id = %self.session.user.id, ?reason, "Signed out");
        self.state.send_replace(SessionState::Expired);
        self.emit(SessionEvent::SignedOut { reason });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

use async_trait::async_trait;
use buildledger_session::{
    ActivityKind, AuthBackend, AuthSession, AuthUser, SessionConfig, SessionError, SessionEvent,
    SessionResult, SessionState, SessionSupervisor, SignOutReason,
};
use chrono::{Duration as ChronoDuration, Utc};
use mockall::mock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

mock! {
    pub Backend {}

    #[async_trait]
    impl AuthBackend for Backend {
        async fn get_user(&self, access_token: &str) -> SessionResult<Option<AuthUser>>;
        async fn refresh_session(&self, refresh_token: &str) -> SessionResult<AuthSession>;
        async fn sign_out(&self, access_token: &str) -> SessionResult<()>;
    }
}

const IDLE: Duration = Duration::from_secs(60);
const LEAD: Duration = Duration::from_secs(10);
const CHECK: Duration = Duration::from_secs(1);

fn test_config() -> SessionConfig {
    SessionConfig {
        idle_timeout: IDLE,
        warning_lead: LEAD,
        check_interval: CHECK,
        refresh_buffer: Duration::from_secs(300),
    }
}

fn test_user() -> AuthUser {
    AuthUser {
        id: Uuid::parse_str("7b1c9a52-3c1e-4a55-9a0c-2f1f7e1f2a10").unwrap(),
        email: Some("owner@example.com".to_string()),
        user_metadata: HashMap::new(),
    }
}

fn session(access_token: &str, expires_in_secs: i64) -> AuthSession {
    AuthSession {
        access_token: access_token.to_string(),
        refresh_token: format!("{}-refresh", access_token),
        expires_at: Utc::now() + ChronoDuration::seconds(expires_in_secs),
        user: test_user(),
    }
}

async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(600), events.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event channel closed")
}

fn assert_warning(event: SessionEvent) {
    match event {
        SessionEvent::WarningShown { remaining } => {
            assert!(remaining <= LEAD && remaining > LEAD - CHECK, "remaining {:?}", remaining)
        }
        other => panic!("expected warning, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_idle_session_warns_then_signs_out() {
    let mut backend = MockBackend::new();
    backend.expect_refresh_session().never();
    backend
        .expect_sign_out()
        .withf(|token: &str| token == "access-1")
        .times(1)
        .returning(|_| Ok(()));
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    let started = tokio::time::Instant::now();
    let supervisor = SessionSupervisor::start(test_config(), backend.clone(), session("access-1", 3600)).unwrap();
    let handle = supervisor.handle();
    let mut events = handle.subscribe();

    assert_warning(next_event(&mut events).await);
    assert_eq!(handle.state(), SessionState::Warning);
    assert!(started.elapsed() >= IDLE - LEAD);

    assert_eq!(next_event(&mut events).await, SessionEvent::Expired);
    assert!(started.elapsed() >= IDLE);
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::SignedOut { reason: SignOutReason::IdleTimeout }
    );
    assert_eq!(handle.state(), SessionState::Expired);

    handle.closed().await;
    assert!(!handle.is_running());
    assert!(matches!(
        handle.record_activity(ActivityKind::Mouse),
        Err(SessionError::SupervisorStopped)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_activity_clears_warning() {
    let mut backend = MockBackend::new();
    backend.expect_sign_out().times(1).returning(|_| Ok(()));
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    let supervisor = SessionSupervisor::start(test_config(), backend.clone(), session("access-1", 3600)).unwrap();
    let handle = supervisor.handle();
    let mut events = handle.subscribe();

    assert_warning(next_event(&mut events).await);

    handle.record_activity(ActivityKind::Key).unwrap();
    assert_eq!(next_event(&mut events).await, SessionEvent::WarningCleared);
    assert_eq!(handle.state(), SessionState::Active);

    // Idle clock restarted, so the next warning is a full window away
    let cleared = tokio::time::Instant::now();
    assert_warning(next_event(&mut events).await);
    assert!(cleared.elapsed() >= IDLE - LEAD - CHECK);

    handle.sign_out().unwrap();
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::SignedOut { reason: SignOutReason::UserRequested }
    );
    handle.closed().await;
}

#[tokio::test(start_paused = true)]
async fn test_stay_signed_in_dismisses_warning() {
    let mut backend = MockBackend::new();
    backend.expect_sign_out().times(1).returning(|_| Ok(()));
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    let supervisor = SessionSupervisor::start(test_config(), backend.clone(), session("access-1", 3600)).unwrap();
    let handle = supervisor.handle();
    let mut events = handle.subscribe();

    // Dismissing with no warning shown does nothing
    handle.dismiss_warning().unwrap();

    assert_warning(next_event(&mut events).await);
    handle.dismiss_warning().unwrap();
    assert_eq!(next_event(&mut events).await, SessionEvent::WarningCleared);

    tokio::time::sleep(IDLE - LEAD - CHECK * 2).await;
    assert_eq!(handle.state(), SessionState::Active);

    handle.sign_out().unwrap();
    handle.closed().await;
}

#[tokio::test(start_paused = true)]
async fn test_token_refreshed_near_expiry() {
    let refreshed = session("access-2", 3600);
    let refreshed_expiry = refreshed.expires_at;

    let mut backend = MockBackend::new();
    backend
        .expect_refresh_session()
        .withf(|token: &str| token == "access-1-refresh")
        .times(1)
        .returning(move |_| Ok(refreshed.clone()));
    backend
        .expect_sign_out()
        .withf(|token: &str| token == "access-2")
        .times(1)
        .returning(|_| Ok(()));
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    // Expires inside the 300s refresh buffer
    let supervisor = SessionSupervisor::start(test_config(), backend.clone(), session("access-1", 60)).unwrap();
    let handle = supervisor.handle();
    let mut events = handle.subscribe();

    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::TokenRefreshed { expires_at: refreshed_expiry }
    );

    // Later checks see the fresh token and leave it alone
    tokio::time::sleep(CHECK * 5).await;

    handle.sign_out().unwrap();
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::SignedOut { reason: SignOutReason::UserRequested }
    );
    handle.closed().await;
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_keeps_supervising() {
    let mut backend = MockBackend::new();
    backend.expect_refresh_session().times(3).returning(|_| {
        Err(SessionError::Backend {
            status: 500,
            message: "upstream unavailable".to_string(),
        })
    });
    backend.expect_sign_out().times(1).returning(|_| Ok(()));
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    let supervisor = SessionSupervisor::start(test_config(), backend.clone(), session("access-1", 60)).unwrap();
    let handle = supervisor.handle();

    // Three checks, each retrying the refresh
    tokio::time::sleep(CHECK * 3 + CHECK / 2).await;
    assert!(handle.is_running());
    assert_eq!(handle.state(), SessionState::Active);

    handle.sign_out().unwrap();
    handle.closed().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_backend_sign_out_still_ends_session() {
    let mut backend = MockBackend::new();
    backend.expect_sign_out().times(1).returning(|_| {
        Err(SessionError::Backend {
            status: 502,
            message: "bad gateway".to_string(),
        })
    });
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    let supervisor = SessionSupervisor::start(test_config(), backend.clone(), session("access-1", 3600)).unwrap();
    let handle = supervisor.handle();
    let mut events = handle.subscribe();

    handle.sign_out().unwrap();
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::SignedOut { reason: SignOutReason::UserRequested }
    );
    handle.closed().await;
    assert!(supervisor.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_supervisor_stops_task() {
    let mut backend = MockBackend::new();
    backend.expect_sign_out().never();
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    let supervisor = SessionSupervisor::start(test_config(), backend.clone(), session("access-1", 3600)).unwrap();
    let handle = supervisor.handle();
    drop(supervisor);

    handle.closed().await;
    assert!(!handle.is_running());
}

#[tokio::test]
async fn test_start_rejects_invalid_config() {
    let backend: Arc<dyn AuthBackend> = Arc::new(MockBackend::new());
    let mut config = test_config();
    config.warning_lead = config.idle_timeout;

    let result = SessionSupervisor::start(config, backend, session("access-1", 3600));
    assert!(matches!(result, Err(SessionError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn test_start_rejects_unbounded_interval() {
    let backend: Arc<dyn AuthBackend> = Arc::new(MockBackend::new());
    let config = SessionConfig {
        check_interval: Duration::from_secs(u64::MAX),
        ..test_config()
    };

    let result = SessionSupervisor::start(config, backend, session("access-1", 3600));
    assert!(matches!(result, Err(SessionError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn test_resume_with_valid_token() {
    let mut backend = MockBackend::new();
    backend
        .expect_get_user()
        .withf(|token: &str| token == "access-1")
        .times(1)
        .returning(|_| Ok(Some(test_user())));
    backend.expect_refresh_session().never();
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    let supervisor = SessionSupervisor::resume(test_config(), backend.clone(), session("access-1", 3600))
        .await
        .unwrap();
    assert_eq!(supervisor.handle().user().email.as_deref(), Some("owner@example.com"));
    assert_eq!(supervisor.handle().state(), SessionState::Active);
}

#[tokio::test(start_paused = true)]
async fn test_resume_refreshes_rejected_token() {
    let mut backend = MockBackend::new();
    backend.expect_get_user().times(1).returning(|_| Ok(None));
    backend
        .expect_refresh_session()
        .withf(|token: &str| token == "stale-refresh")
        .times(1)
        .returning(|_| Ok(session("access-2", 3600)));
    backend
        .expect_sign_out()
        .withf(|token: &str| token == "access-2")
        .times(1)
        .returning(|_| Ok(()));
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    let supervisor = SessionSupervisor::resume(test_config(), backend.clone(), session("stale", 3600))
        .await
        .unwrap();
    let handle = supervisor.handle();
    let mut events = handle.subscribe();
    handle.sign_out().unwrap();
    handle.closed().await;

    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::SignedOut {
            reason: SignOutReason::UserRequested
        }
    );
    assert_eq!(handle.state(), SessionState::Expired);
    assert!(!handle.is_running());
}

#[tokio::test]
async fn test_resume_keeps_backend_outage_distinct() {
    let mut backend = MockBackend::new();
    backend.expect_get_user().times(1).returning(|_| Ok(None));
    backend.expect_refresh_session().times(1).returning(|_| {
        Err(SessionError::Backend {
            status: 503,
            message: "maintenance".to_string(),
        })
    });
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    let result = SessionSupervisor::resume(test_config(), backend, session("stale", 3600)).await;
    assert!(matches!(result, Err(SessionError::Backend { status: 503, .. })));
}

#[tokio::test]
async fn test_resume_without_valid_tokens() {
    let mut backend = MockBackend::new();
    backend.expect_get_user().times(1).returning(|_| Ok(None));
    backend.expect_refresh_session().times(1).returning(|_| {
        Err(SessionError::Backend {
            status: 400,
            message: "Invalid Refresh Token: Already Used".to_string(),
        })
    });
    let backend: Arc<dyn AuthBackend> = Arc::new(backend);

    let result = SessionSupervisor::resume(test_config(), backend, session("stale", 3600)).await;
    assert!(matches!(result, Err(SessionError::NoSession)));
}

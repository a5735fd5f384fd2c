//! Session monitoring for BuildLedger
//!
//! A signed-in session moves through three states:
//! - `Active` while the user is interacting
//! - `Warning` once idle long enough that sign-out is imminent
//! - `Expired` when the idle timeout is reached, which forces a sign-out
//!
//! [`SessionMonitor`] is the pure state machine. [`SessionSupervisor`] runs
//! it on a tokio interval for one session and, on the same tick, refreshes
//! the backend auth token when it is close to expiry.

pub mod backend;
pub mod error;
pub mod monitor;
pub mod supabase;
pub mod supervisor;

pub use backend::{AuthBackend, AuthSession, AuthUser};
pub use buildledger_config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use monitor::{ActivityKind, SessionMonitor, SessionState, Transition};
pub use supabase::SupabaseAuthClient;
pub use supervisor::{SessionEvent, SessionHandle, SessionSupervisor, SignOutReason};

//! Dashboard façade and bootstrap.
//!
//! This crate wires host-provided bridges (HTTP, secure storage) into the
//! session, catalog and rendering layers and exposes them through a single
//! [`Dashboard`]. Desktop hosts enable the `desktop-shims` feature to get the
//! reqwest client and an in-memory session store by default; `secure-store`
//! switches the session store to the OS keyring.

pub mod actions;
pub mod dashboard;
pub mod error;
pub mod state;

pub use actions::{ActionRegistry, Intent};
pub use dashboard::{load_failure_message, Dashboard, DashboardBuilder, DispatchOutcome};
pub use error::{CoreError, Result};
pub use state::{project, update, AppState, Message, Section, Slot, SESSION_EXPIRED};

pub use core_auth::{Role, SignupRequest, UserProfile};
pub use core_library::render::{ActionKind, Presentation};
pub use core_runtime::events::{CoreEvent, EventStream};
pub use core_sync::{MutationReport, Operation, ReloadOutcome};

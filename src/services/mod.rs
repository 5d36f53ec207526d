// src/services/mod.rs
// Services backing the outer HTTP surfaces

pub mod auth;
pub mod exec;
pub mod metrics;

pub use auth::{AuthError, TokenCheck, TokenManager};
pub use exec::{CommandOutput, ExecService};
pub use metrics::{MetricsService, MetricsSnapshot};

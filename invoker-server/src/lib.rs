//! HTTP entrypoint for a tool-calling agent.
//!
//! `POST /invocations` runs one prompt through the agent; `GET /ping` reports
//! whether any invocation is in flight.

pub mod config;
pub mod error;
pub mod handler;
pub mod health;
pub mod routes;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::ApiError;
pub use handler::{
    InvocationHandler, InvocationRequest, InvocationResponse, SharedAgent, DEFAULT_PROMPT,
};
pub use health::{BusyGuard, HealthStatus, HealthTracker, PingResponse};
pub use routes::{router, AppState, SESSION_ID_HEADER};

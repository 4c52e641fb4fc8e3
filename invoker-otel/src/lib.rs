//! Session-scoped OpenTelemetry baggage.
//!
//! The active [`Context`] is thread-local and stack-shaped. Everything here
//! either hands out a [`ScopeToken`] that restores the previous context when
//! released, or wraps a future so the context is only active while it polls.

mod baggage;
mod propagation;
mod scope;

pub use baggage::{
    baggage_value, current_baggage_value, current_session_id, session_context, set_baggage,
    SESSION_ID_KEY,
};
pub use opentelemetry::propagation::Extractor;
pub use opentelemetry::Context;
pub use propagation::{extract_context, w3c_propagator};
pub use scope::{attach, detach, ScopeToken, Scoped, ScopedExt};

use opentelemetry::baggage::BaggageExt;
use opentelemetry::{Context, KeyValue};

/// Baggage key carrying the caller's session identifier.
pub const SESSION_ID_KEY: &str = "session.id";

/// Returns a copy of `cx` with `key` bound to `value` in its baggage.
pub fn set_baggage(cx: &Context, key: &'static str, value: impl Into<String>) -> Context {
    cx.with_baggage(vec![KeyValue::new(key, value.into())])
}

pub fn baggage_value(cx: &Context, key: &'static str) -> Option<String> {
    cx.baggage().get(key).map(|value| value.to_string())
}

pub fn current_baggage_value(key: &'static str) -> Option<String> {
    baggage_value(&Context::current(), key)
}

/// The current context with `session.id` bound on top.
pub fn session_context(session_id: &str) -> Context {
    set_baggage(&Context::current(), SESSION_ID_KEY, session_id)
}

pub fn current_session_id() -> Option<String> {
    current_baggage_value(SESSION_ID_KEY)
}

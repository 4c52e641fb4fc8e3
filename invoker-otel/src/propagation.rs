use opentelemetry::propagation::{Extractor, TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

/// `traceparent`/`tracestate` plus `baggage`.
pub fn w3c_propagator() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ])
}

/// Builds the parent context for an inbound request on top of the current one.
pub fn extract_context(carrier: &dyn Extractor) -> Context {
    w3c_propagator().extract_with_context(&Context::current(), carrier)
}

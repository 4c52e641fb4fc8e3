use std::future::Future;

use opentelemetry::trace::{FutureExt, WithContext};
use opentelemetry::{Context, ContextGuard};

/// Handle to the context that was active before [`attach`].
///
/// Dropping the token restores that context. [`detach`] does the same
/// explicitly; it consumes the token, so a context can only be restored once.
/// The token is `!Send` and must be released on the thread that created it.
#[must_use = "dropping the token immediately restores the previous context"]
pub struct ScopeToken {
    _guard: ContextGuard,
}

impl std::fmt::Debug for ScopeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeToken").finish_non_exhaustive()
    }
}

/// Makes `cx` the active context until the returned token is released.
pub fn attach(cx: Context) -> ScopeToken {
    ScopeToken {
        _guard: cx.attach(),
    }
}

pub fn detach(token: ScopeToken) {
    drop(token);
}

/// A future that runs with a fixed context attached for the span of each poll.
pub type Scoped<F> = WithContext<F>;

pub trait ScopedExt: Future + Sized {
    /// Attaches `cx` around every poll of `self` and detaches it when the poll
    /// returns, so the context cannot outlive the future on a shared worker
    /// thread, whichever way the future completes.
    fn scoped(self, cx: Context) -> Scoped<Self> {
        self.with_context(cx)
    }
}

impl<F: Future> ScopedExt for F {}

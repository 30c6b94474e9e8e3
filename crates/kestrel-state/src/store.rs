//! Store and middleware chain
//!
//! `dispatch` is serialized by the middleware lock: one action runs through
//! the whole chain and the reducer before the next one starts.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::action::BrowserAction;
use crate::reducer::reduce;
use crate::state::BrowserState;

/// Forwards an action to the rest of the chain (and finally the reducer).
pub type Next<'a> = &'a mut dyn FnMut(&BrowserAction);

/// Observes actions around the reducer.
///
/// Implementations must call `next` exactly once to let the action through.
/// Anything read from the context before `next` sees the state the action is
/// about to change; anything read after sees the reduced state.
pub trait Middleware: Send {
    fn invoke(&mut self, context: &MiddlewareContext<'_>, next: Next<'_>, action: &BrowserAction);
}

/// Read access to the store's state from inside a middleware.
pub struct MiddlewareContext<'a> {
    state: &'a RwLock<BrowserState>,
}

impl MiddlewareContext<'_> {
    /// Snapshot of the current state
    pub fn state(&self) -> BrowserState {
        self.state.read().clone()
    }

    /// Borrow the current state without cloning it.
    /// `next` must not be called from inside `f`.
    pub fn with_state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&BrowserState) -> T,
    {
        f(&self.state.read())
    }
}

pub struct Store {
    state: Arc<RwLock<BrowserState>>,
    middleware: Arc<Mutex<Vec<Box<dyn Middleware>>>>,
}

impl Store {
    pub fn new(initial_state: BrowserState) -> Self {
        Self::with_middleware(initial_state, Vec::new())
    }

    pub fn with_middleware(
        initial_state: BrowserState,
        middleware: Vec<Box<dyn Middleware>>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial_state)),
            middleware: Arc::new(Mutex::new(middleware)),
        }
    }

    /// Run an action through every middleware, in registration order, then reduce it.
    pub fn dispatch(&self, action: impl Into<BrowserAction>) {
        let action = action.into();
        let mut chain = self.middleware.lock();
        let context = MiddlewareContext { state: &self.state };

        tracing::trace!(?action, "Dispatching action");
        dispatch_through(&mut chain, &context, &action);
    }

    pub fn state(&self) -> BrowserState {
        self.state.read().clone()
    }

    pub fn with_state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&BrowserState) -> T,
    {
        f(&self.state.read())
    }
}

fn dispatch_through(
    chain: &mut [Box<dyn Middleware>],
    context: &MiddlewareContext<'_>,
    action: &BrowserAction,
) {
    match chain.split_first_mut() {
        Some((middleware, rest)) => {
            let mut next = |action: &BrowserAction| dispatch_through(&mut *rest, context, action);
            middleware.invoke(context, &mut next, action);
        }
        None => reduce(&mut context.state.write(), action),
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            middleware: Arc::clone(&self.middleware),
        }
    }
}

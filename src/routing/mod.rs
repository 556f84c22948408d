//! Event routing and dispatch.
//!
//! A [`Router`] maps an event type, and optionally an action, to an ordered
//! list of [`Handler`]s. Per-feature routers are built independently and then
//! merged with [`Router::compose`] into the single router the server uses.
//!
//! # Matching
//!
//! | Registered with | Fires for |
//! |-----------------|-----------|
//! | `(kind, None)` | every event of `kind`, with or without an action |
//! | `(kind, Some(action))` | events of `kind` whose action equals `action` |
//!
//! Registering never replaces an earlier handler; it appends. An event that
//! matches nothing is silently ignored.
//!
//! # Execution
//!
//! All handlers matching one event run concurrently on the dispatching task.
//! Each must be correct in isolation: there is no ordering guarantee between
//! them, and a failure in one does not stop the others.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, join_all};
use thiserror::Error;
use tracing::{debug, warn};

use crate::github::GitHubApiError;
use crate::webhooks::{Action, Event, EventKind, PayloadError};

/// Errors a handler can fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The payload lacks a field the handler needs.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// A GitHub call failed and the failure was not a benign race.
    #[error(transparent)]
    GitHub(#[from] GitHubApiError),
}

/// An asynchronous reaction to an event.
///
/// `G` is the GitHub client type the handler issues calls through.
pub trait Handler<G>: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn handle<'a>(&'a self, event: &'a Event, gh: &'a G)
    -> BoxFuture<'a, Result<(), HandlerError>>;
}

/// One handler's failure during a dispatch.
#[derive(Debug)]
pub struct HandlerFailure {
    pub handler: &'static str,
    pub error: HandlerError,
}

/// At least one handler failed. Every matching handler still ran to completion.
#[derive(Debug, Error)]
#[error(
    "{} handler(s) failed for {kind} event; first: {}: {}",
    .failures.len(),
    .failures[0].handler,
    .failures[0].error
)]
pub struct DispatchError {
    pub kind: String,
    pub failures: Vec<HandlerFailure>,
}

/// A registered handler, shared between routers built from the same parts.
pub type SharedHandler<G> = Arc<dyn Handler<G>>;

struct RouteTable<G> {
    /// Handlers registered without an action constraint.
    any_action: Vec<SharedHandler<G>>,
    by_action: HashMap<Action, Vec<SharedHandler<G>>>,
}

impl<G> Default for RouteTable<G> {
    fn default() -> Self {
        RouteTable {
            any_action: Vec::new(),
            by_action: HashMap::new(),
        }
    }
}

impl<G> Clone for RouteTable<G> {
    fn clone(&self) -> Self {
        RouteTable {
            any_action: self.any_action.clone(),
            by_action: self.by_action.clone(),
        }
    }
}

/// Maps `(event type, action)` to ordered handler lists.
pub struct Router<G> {
    routes: HashMap<EventKind, RouteTable<G>>,
}

impl<G> Default for Router<G> {
    fn default() -> Self {
        Router {
            routes: HashMap::new(),
        }
    }
}

impl<G> Clone for Router<G> {
    fn clone(&self) -> Self {
        Router {
            routes: self.routes.clone(),
        }
    }
}

impl<G> std::fmt::Debug for Router<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("handlers", &self.handler_count())
            .finish_non_exhaustive()
    }
}

impl<G> Router<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to events of `kind`, optionally only for `action`.
    pub fn register<H>(&mut self, kind: EventKind, action: Option<Action>, handler: H) -> &mut Self
    where
        H: Handler<G> + 'static,
    {
        let table = self.routes.entry(kind).or_default();
        let handler: SharedHandler<G> = Arc::new(handler);
        match action {
            Some(action) => table.by_action.entry(action).or_default().push(handler),
            None => table.any_action.push(handler),
        }
        self
    }

    /// Builds a router holding the registrations of all `routers`.
    ///
    /// Within each key, handlers from earlier routers come first and each
    /// router's own ordering is kept.
    pub fn compose(routers: impl IntoIterator<Item = Router<G>>) -> Self {
        let mut composed = Router::new();
        for router in routers {
            composed.merge(router);
        }
        composed
    }

    /// Appends all of `other`'s registrations to this router.
    pub fn merge(&mut self, other: Router<G>) {
        for (kind, table) in other.routes {
            let target = self.routes.entry(kind).or_default();
            target.any_action.extend(table.any_action);
            for (action, handlers) in table.by_action {
                target.by_action.entry(action).or_default().extend(handlers);
            }
        }
    }

    /// Returns the handlers matching `event`, action-agnostic ones first.
    pub fn resolve(&self, event: &Event) -> Vec<SharedHandler<G>> {
        let Some(table) = self.routes.get(event.kind()) else {
            return Vec::new();
        };
        let mut handlers = table.any_action.clone();
        if let Some(matched) = event.action().and_then(|a| table.by_action.get(a)) {
            handlers.extend(matched.iter().cloned());
        }
        handlers
    }

    /// Total number of registrations.
    pub fn handler_count(&self) -> usize {
        self.routes
            .values()
            .map(|t| t.any_action.len() + t.by_action.values().map(Vec::len).sum::<usize>())
            .sum()
    }
}

impl<G: Sync> Router<G> {
    /// Runs every handler matching `event` and waits for all of them.
    ///
    /// Returns `Ok(())` when nothing matches. When handlers fail, each failure
    /// is logged and all of them are returned together.
    pub async fn dispatch(&self, event: &Event, gh: &G) -> Result<(), DispatchError> {
        let handlers = self.resolve(event);
        if handlers.is_empty() {
            debug!(
                event = %event.kind(),
                action = ?event.action().map(Action::as_str),
                "No handlers registered for event"
            );
            return Ok(());
        }

        debug!(
            event = %event.kind(),
            action = ?event.action().map(Action::as_str),
            handlers = handlers.len(),
            "Dispatching event"
        );

        let results = join_all(handlers.iter().map(|handler| async move {
            (handler.name(), handler.handle(event, gh).await)
        }))
        .await;

        let failures: Vec<HandlerFailure> = results
            .into_iter()
            .filter_map(|(handler, result)| {
                result.err().map(|error| {
                    warn!(
                        delivery_id = %event.delivery_id(),
                        handler,
                        error = %error,
                        "Handler failed"
                    );
                    HandlerFailure { handler, error }
                })
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError {
                kind: event.kind().to_string(),
                failures,
            })
        }
    }
}

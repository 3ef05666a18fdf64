//! Alternative-route requester: the asynchronous boundary to an external
//! routing provider
//!
//! A recalculation escalation spawns at most one provider call at a time;
//! further escalations while one is in flight are ignored rather than queued.
//! Completions are delivered through an internal channel and drained at the
//! top of the next sample's processing, so a slow provider never blocks the
//! position pipeline. A generation counter stamped on each request lets
//! `stop()` invalidate in-flight work: a late completion from a stopped (or
//! restarted) session carries a stale generation and is discarded.

use crate::modes::TransportMode;
use crate::route::Route;
use async_trait::async_trait;
use geo::Point;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Routing-provider failure; never fatal to the session
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("routing provider unavailable: {0}")]
    Unavailable(String),
    #[error("no alternative routes found")]
    NoRoutes,
}

/// External routing provider capable of computing alternative routes
///
/// Implementations typically wrap an HTTP routing API. The engine only ever
/// consumes routes; it never computes them.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn compute_alternatives(
        &self,
        origin: Point<f64>,
        destination: Point<f64>,
        mode: TransportMode,
    ) -> Result<Vec<Route>, RoutingError>;
}

struct RerouteOutcome {
    generation: u64,
    request_id: u64,
    result: Result<Vec<Route>, RoutingError>,
}

struct InFlight {
    request_id: u64,
    handle: tokio::task::JoinHandle<()>,
}

/// Owns the single-in-flight request discipline for one session
pub(crate) struct RerouteRequester {
    provider: Arc<dyn RoutingProvider>,
    tx: mpsc::UnboundedSender<RerouteOutcome>,
    rx: mpsc::UnboundedReceiver<RerouteOutcome>,
    in_flight: Option<InFlight>,
    generation: u64,
    next_request_id: u64,
}

impl RerouteRequester {
    pub(crate) fn new(provider: Arc<dyn RoutingProvider>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            tx,
            rx,
            in_flight: None,
            generation: 0,
            next_request_id: 0,
        }
    }

    /// Whether a request is currently outstanding
    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|req| !req.handle.is_finished())
    }

    /// Ask the provider for alternatives unless a request is already in
    /// flight
    ///
    /// Must be called from within a tokio runtime context.
    pub(crate) fn request(
        &mut self,
        origin: Point<f64>,
        destination: Point<f64>,
        mode: TransportMode,
    ) {
        if self.is_in_flight() {
            tracing::debug!("reroute already in flight, ignoring new escalation");
            return;
        }

        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let generation = self.generation;
        self.next_request_id += 1;
        let request_id = self.next_request_id;

        let handle = tokio::spawn(async move {
            let result = provider.compute_alternatives(origin, destination, mode).await;
            // The session may have dropped the receiver by stopping
            let _ = tx.send(RerouteOutcome {
                generation,
                request_id,
                result,
            });
        });
        self.in_flight = Some(InFlight { request_id, handle });
    }

    /// Drain any completed request, returning found alternatives
    ///
    /// Stale-generation and failed outcomes are discarded; failures are
    /// logged and leave the session free to retry on a later escalation.
    pub(crate) fn poll(&mut self) -> Option<Vec<Route>> {
        let mut found = None;
        while let Ok(outcome) = self.rx.try_recv() {
            if outcome.generation != self.generation {
                tracing::debug!(
                    generation = outcome.generation,
                    "discarding stale reroute completion"
                );
                continue;
            }
            // An earlier request's queued outcome must not drop tracking of
            // a newer request still running
            if self
                .in_flight
                .as_ref()
                .is_some_and(|req| req.request_id == outcome.request_id)
            {
                self.in_flight = None;
            }
            match outcome.result {
                Ok(routes) if routes.is_empty() => {
                    tracing::debug!("routing provider returned no alternatives");
                }
                Ok(routes) => found = Some(routes),
                Err(e) => tracing::warn!("alternative route request failed: {e}"),
            }
        }
        found
    }

    /// Invalidate any in-flight request so its completion cannot be applied
    pub(crate) fn invalidate(&mut self) {
        self.generation += 1;
        if let Some(req) = self.in_flight.take() {
            req.handle.abort();
        }
    }
}

//! Position-source boundary
//!
//! The engine consumes positions through a subscription seam so it never
//! touches sensor hardware: a [`PositionSource`] hands out a channel of
//! updates, and [`drive`] pumps that channel into a session. Timing is the
//! source's business - the engine tolerates gaps and bursts and only
//! enforces sample ordering.

use crate::position::Position;
use crate::session::NavigationSession;
use crate::{NavError, Result};
use tokio::sync::mpsc;

/// Fatal position-source failures
///
/// Permission denial ends the session; there is no point retrying a source
/// the platform refuses to expose.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("position source permission denied")]
    PermissionDenied,
    #[error("position source failed: {0}")]
    Failed(String),
}

/// One update from the position source
#[derive(Debug, Clone)]
pub enum PositionUpdate {
    /// A position fix
    Fix(Position),
    /// The source is temporarily unable to deliver fixes (signal loss,
    /// timeout); the session stays alive on its last known state
    Unavailable { reason: String },
}

/// A subscribable stream of position updates
///
/// Implementations wrap platform location services, replay files, or test
/// fixtures. Dropping the returned receiver is the unsubscribe.
pub trait PositionSource {
    fn subscribe(&mut self) -> std::result::Result<mpsc::UnboundedReceiver<PositionUpdate>, SourceError>;
}

/// Pump a position source into a session until the source ends or the
/// session stops
///
/// Transient unavailability is surfaced as a warning event and processing
/// resumes with the next fix. A subscription failure stops the session and
/// is returned as the terminal error.
pub async fn drive<S: PositionSource>(
    session: &mut NavigationSession,
    source: &mut S,
) -> Result<()> {
    let mut rx = match source.subscribe() {
        Ok(rx) => rx,
        Err(e) => {
            session.stop();
            return Err(NavError::Source(e));
        }
    };

    while let Some(update) = rx.recv().await {
        if !session.is_active() {
            break;
        }
        match update {
            PositionUpdate::Fix(position) => session.process_position(position),
            PositionUpdate::Unavailable { reason } => session.report_source_warning(reason),
        }
    }

    Ok(())
}

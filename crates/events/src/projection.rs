use crate::{Event, EventEnvelope};

/// A projection builds a read model from an append-only event stream.
///
/// Projections are this workspace's stand-in for dependency-tracked field
/// recomputation: every stored fact a derived value depends on arrives here
/// as an event, and the derived values are re-read from the updated state.
///
/// Implementations must be **idempotent** — the same envelope may be
/// delivered more than once (at-least-once delivery, replays, crash
/// recovery). Tracking per-stream sequence numbers is the usual strategy.
///
/// Read models are disposable: delete one and rebuild it by replaying the
/// stream. Events are the source of truth. Persistence of the read model is
/// an infrastructure concern and is not defined here.
pub trait Projection {
    type Ev: Event;

    /// Apply a single event to the projection, updating the read model.
    ///
    /// Must be idempotent: applying the same envelope twice leaves the read
    /// model in the same state as applying it once.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);
}

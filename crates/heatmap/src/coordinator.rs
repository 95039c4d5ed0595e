//! Synchronous publish/subscribe bus for render and extrema events.
//!
//! Handlers run on the publisher's thread in subscription order. The first
//! handler that fails aborts the publish and its error is returned to the
//! publisher.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use heatmap_common::{Gradient, HeatmapData, HeatmapResult};

/// Event categories handlers subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RenderPartial,
    RenderAll,
    ExtremaChange,
}

/// Payload forwarded to extrema-change observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremaChange {
    pub min: f64,
    pub max: f64,
    /// Gradient active when the change happened, for legends
    pub gradient: Gradient,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeatmapEvent {
    RenderPartial(HeatmapData),
    RenderAll(HeatmapData),
    ExtremaChange(ExtremaChange),
}

impl HeatmapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HeatmapEvent::RenderPartial(_) => EventKind::RenderPartial,
            HeatmapEvent::RenderAll(_) => EventKind::RenderAll,
            HeatmapEvent::ExtremaChange(_) => EventKind::ExtremaChange,
        }
    }
}

/// Boxed event handler.
pub type Handler = Box<dyn FnMut(&HeatmapEvent) -> HeatmapResult<()>>;

#[derive(Default)]
pub struct Coordinator {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `kind`. There is no unsubscribe.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&HeatmapEvent) -> HeatmapResult<()> + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Invoke every handler subscribed to the event's kind.
    pub fn publish(&mut self, event: &HeatmapEvent) -> HeatmapResult<()> {
        let Some(handlers) = self.handlers.get_mut(&event.kind()) else {
            return Ok(());
        };

        trace!(kind = ?event.kind(), handlers = handlers.len(), "Publishing event");
        for handler in handlers.iter_mut() {
            handler(event)?;
        }
        Ok(())
    }

    pub fn has_subscribers(&self, kind: EventKind) -> bool {
        self.handler_count(kind) > 0
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<EventKind, usize> =
            self.handlers.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("Coordinator").field("handlers", &counts).finish()
    }
}

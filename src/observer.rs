//! Event reporting seam between library code and logging.
//!
//! Aggregation and scenario code never configure logging themselves;
//! they report events to an [`Observer`] handed in by the caller.

use tracing::Level;

/// A single reported event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub level: Level,
    pub message: String,
}

impl Event {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Receives events from aggregation and scenario runs.
pub trait Observer {
    fn notify(&self, event: Event);
}

/// Forwards events to the global `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&self, event: Event) {
        let message = event.message;
        if event.level == Level::ERROR {
            tracing::error!("{}", message);
        } else if event.level == Level::WARN {
            tracing::warn!("{}", message);
        } else if event.level == Level::INFO {
            tracing::info!("{}", message);
        } else if event.level == Level::DEBUG {
            tracing::debug!("{}", message);
        } else {
            tracing::trace!("{}", message);
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: std::cell::RefCell<Vec<Event>>,
}

#[cfg(test)]
impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.events.borrow().iter().filter(|e| e.level == level).count()
    }
}

#[cfg(test)]
impl Observer for RecordingObserver {
    fn notify(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::default();
        observer.notify(Event::new(Level::INFO, "first"));
        observer.notify(Event::new(Level::ERROR, "second"));

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "first");
        assert_eq!(events[1].level, Level::ERROR);
        assert_eq!(observer.count_at(Level::ERROR), 1);
    }

    #[test]
    fn test_tracing_observer_without_subscriber() {
        // No subscriber installed: events are dropped silently.
        TracingObserver.notify(Event::new(Level::WARN, "ignored"));
    }
}

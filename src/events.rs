use std::sync::Arc;

use tracing::{debug, info};

use crate::personnes::repo_types::Person;

/// Domain events emitted by the person handlers.
#[derive(Debug, Clone)]
pub enum PersonEvent {
    /// A record was created. Updates never emit this.
    Added(Person),
}

impl PersonEvent {
    pub const ADD_PERSON: &'static str = "personne.add";

    pub fn name(&self) -> &'static str {
        match self {
            PersonEvent::Added(_) => Self::ADD_PERSON,
        }
    }
}

pub trait PersonListener: Send + Sync {
    fn on_event(&self, event: &PersonEvent);
}

/// Synchronous fan-out to every registered listener, in registration order.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    listeners: Vec<Arc<dyn PersonListener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(mut self, listener: Arc<dyn PersonListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn dispatch(&self, event: &PersonEvent) {
        debug!(event = event.name(), listeners = self.listeners.len(), "dispatch");
        for listener in &self.listeners {
            listener.on_event(event);
        }
    }
}

/// Writes every added person to the log.
pub struct LoggingListener;

impl PersonListener for LoggingListener {
    fn on_event(&self, event: &PersonEvent) {
        match event {
            PersonEvent::Added(p) => {
                info!(
                    event = event.name(),
                    person_id = p.id,
                    firstname = %p.firstname,
                    lastname = %p.lastname,
                    "person added"
                );
            }
        }
    }
}

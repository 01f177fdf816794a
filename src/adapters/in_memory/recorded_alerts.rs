use crate::core::ports::UserAlerts;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Alert sink that logs each alert and keeps it until the user reads it.
#[derive(Debug, Default)]
pub struct RecordedAlerts {
    messages: Mutex<Vec<String>>,
}

impl RecordedAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl UserAlerts for RecordedAlerts {
    fn alert(&self, message: &str) {
        warn!(alert = message, "user alert");
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

use crate::domain_port::*;
use crate::logger::*;
use std::sync::{Mutex, PoisonError};

/// Navigator for a client without a screen: remembers where it was sent.
pub struct HeadlessNavigator {
    current: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl HeadlessNavigator {
    pub fn new(initial_path: &str) -> Self {
        Self {
            current: Mutex::new(initial_path.to_owned()),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for HeadlessNavigator {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, path: &str) {
        info!(path, "navigate");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = path.to_owned();
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_owned());
    }
}

//! Process-wide table of named loggers

use super::logger::Logger;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Name to logger map; every name resolves to the same logger for the life
/// of the hierarchy
#[derive(Default)]
pub struct LoggerHierarchy {
    loggers: Mutex<HashMap<String, Logger>>,
}

impl LoggerHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch `name`, creating it with default level and no handlers
    pub fn get(&self, name: &str) -> Logger {
        self.loggers
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Logger::new(name))
            .clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers.lock().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

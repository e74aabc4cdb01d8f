//! User-facing notification seam

use std::sync::Mutex;

/// Receives user-visible notices from the agent loop
pub trait UserInterface: Send + Sync {
    fn handle_system_message(&self, message: &str);
}

/// Interface that forwards notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogInterface;

impl UserInterface for LogInterface {
    fn handle_system_message(&self, message: &str) {
        tracing::info!(target: "hdev::ui", "{}", message);
    }
}

/// Interface that keeps every notice in memory
#[derive(Debug, Default)]
pub struct BufferedInterface {
    messages: Mutex<Vec<String>>,
}

impl BufferedInterface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far, oldest first
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl UserInterface for BufferedInterface {
    fn handle_system_message(&self, message: &str) {
        let mut messages = match self.messages.lock() {
            Ok(messages) => messages,
            Err(poisoned) => poisoned.into_inner(),
        };
        messages.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_interface_keeps_order() {
        let ui = BufferedInterface::new();
        ui.handle_system_message("first");
        ui.handle_system_message("second");
        assert_eq!(ui.messages(), vec!["first", "second"]);
    }
}

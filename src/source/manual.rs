//! Hand-fed source.
//!
//! Events are pushed through a channel instead of being produced by tasks,
//! and every command the dashboard issues is recorded. Useful for tests and
//! for driving the dashboard from another process.

use std::sync::mpsc;

use super::{SourceControl, SourceEvent};
use crate::monitor::ProbeRequest;

/// A command the dashboard sent to its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCommand {
    Reconfigure { flow_url: String, generation: u64 },
    Probe(ProbeRequest),
}

#[derive(Debug)]
pub struct ManualSource {
    receiver: mpsc::Receiver<SourceEvent>,
    commands: mpsc::Sender<SourceCommand>,
    description: String,
}

impl ManualSource {
    /// Create a source plus the handles to feed it and observe its commands.
    pub fn create(
        description: &str,
    ) -> (mpsc::Sender<SourceEvent>, mpsc::Receiver<SourceCommand>, Self) {
        let (event_tx, event_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let source = Self {
            receiver: event_rx,
            commands: command_tx,
            description: format!("manual: {}", description),
        };
        (event_tx, command_rx, source)
    }
}

impl SourceControl for ManualSource {
    fn poll(&mut self) -> Option<SourceEvent> {
        self.receiver.try_recv().ok()
    }

    fn reconfigure(&mut self, flow_url: &str, generation: u64) {
        let _ = self.commands.send(SourceCommand::Reconfigure {
            flow_url: flow_url.to_string(),
            generation,
        });
    }

    fn probe(&mut self, request: ProbeRequest) {
        let _ = self.commands.send(SourceCommand::Probe(request));
    }

    fn description(&self) -> &str {
        &self.description
    }
}

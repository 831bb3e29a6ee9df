//! Cleaning bot lifecycle. Driven only by operator commands.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BotState {
    #[default]
    Standby,
    Deployed,
}

impl BotState {
    pub fn label(&self) -> &'static str {
        match self {
            BotState::Standby => "Standby",
            BotState::Deployed => "Deployed",
        }
    }
}

/// Standby/Deployed tracker. Independent of the warning state.
#[derive(Debug, Clone, Default)]
pub struct BotLifecycle {
    state: BotState,
}

impl BotLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    pub fn is_deployed(&self) -> bool {
        self.state == BotState::Deployed
    }

    /// Standby -> Deployed. Returns `false` when already deployed.
    pub fn deploy(&mut self) -> bool {
        if self.is_deployed() {
            return false;
        }
        self.state = BotState::Deployed;
        true
    }

    /// Deployed -> Standby. Returns `false` when already docked.
    pub fn return_to_dock(&mut self) -> bool {
        if !self.is_deployed() {
            return false;
        }
        self.state = BotState::Standby;
        true
    }
}

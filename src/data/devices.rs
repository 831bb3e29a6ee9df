//! Per-channel connectivity and data-mode tracking.

use serde::Serialize;

/// An external source whose status is tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    FlowMeter,
    DrainCamera,
    BotCamera,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::FlowMeter, Channel::DrainCamera, Channel::BotCamera];

    pub fn label(&self) -> &'static str {
        match self {
            Channel::FlowMeter => "Flow meter",
            Channel::DrainCamera => "Drain camera",
            Channel::BotCamera => "Bot interface",
        }
    }

    fn index(self) -> usize {
        match self {
            Channel::FlowMeter => 0,
            Channel::DrainCamera => 1,
            Channel::BotCamera => 2,
        }
    }
}

/// Connectivity record for one channel.
///
/// `using_real_data == false` means synthetic/mock data is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeviceStatus {
    pub using_real_data: bool,
    pub connected: bool,
}

impl DeviceStatus {
    pub fn label(&self) -> &'static str {
        match (self.using_real_data, self.connected) {
            (false, _) => "Mock",
            (true, true) => "Connected",
            (true, false) => "Disconnected",
        }
    }
}

/// Plain state store, one entry per [`Channel`]. No cross-channel coupling.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    entries: [DeviceStatus; 3],
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, channel: Channel, connected: bool, using_real_data: bool) {
        self.entries[channel.index()] = DeviceStatus {
            using_real_data,
            connected,
        };
    }

    pub fn status(&self, channel: Channel) -> DeviceStatus {
        self.entries[channel.index()]
    }

    /// Every channel back to `{false, false}`.
    pub fn reset_all(&mut self) {
        self.entries = Default::default();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, DeviceStatus)> + '_ {
        Channel::ALL.iter().map(move |&c| (c, self.status(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_independent() {
        let mut registry = DeviceRegistry::new();
        registry.set_status(Channel::FlowMeter, true, true);
        registry.set_status(Channel::BotCamera, false, true);

        assert_eq!(
            registry.status(Channel::FlowMeter),
            DeviceStatus {
                using_real_data: true,
                connected: true
            }
        );
        assert_eq!(registry.status(Channel::DrainCamera), DeviceStatus::default());
        assert!(!registry.status(Channel::BotCamera).connected);
    }

    #[test]
    fn test_reset_all() {
        let mut registry = DeviceRegistry::new();
        for channel in Channel::ALL {
            registry.set_status(channel, true, true);
        }
        registry.reset_all();
        assert!(registry.iter().all(|(_, s)| s == DeviceStatus::default()));
    }

    #[test]
    fn test_labels() {
        assert_eq!(DeviceStatus::default().label(), "Mock");
        let offline = DeviceStatus {
            using_real_data: true,
            connected: false,
        };
        assert_eq!(offline.label(), "Disconnected");
    }
}

//! Connection events and their subscribers

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Why a slot stopped contributing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectionReason {
    /// Every active slot was disactivated at once
    MassDisactivation,
    /// The slot alone was disactivated
    Disactivation,
    HardwareDisconnection,
    ManagerDisabled,
}

impl fmt::Display for DisconnectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DisconnectionReason::MassDisactivation => "mass disactivation",
            DisconnectionReason::Disactivation => "disactivation",
            DisconnectionReason::HardwareDisconnection => "hardware disconnection",
            DisconnectionReason::ManagerDisabled => "manager disabled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConnectionEvent {
    Connected {
        slot: usize,
        device: String,
    },
    Disconnected {
        slot: usize,
        device: String,
        reason: DisconnectionReason,
    },
    Activated {
        slot: usize,
    },
    Disactivated {
        slot: usize,
        reason: DisconnectionReason,
    },
}

impl ConnectionEvent {
    pub fn slot(&self) -> usize {
        match *self {
            ConnectionEvent::Connected { slot, .. }
            | ConnectionEvent::Disconnected { slot, .. }
            | ConnectionEvent::Activated { slot }
            | ConnectionEvent::Disactivated { slot, .. } => slot,
        }
    }
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionEvent::Connected { slot, device } => {
                write!(f, "gamepad{} connected: {}", slot + 1, device)
            }
            ConnectionEvent::Disconnected { slot, device, reason } => {
                write!(f, "gamepad{} disconnected ({}): {}", slot + 1, reason, device)
            }
            ConnectionEvent::Activated { slot } => write!(f, "gamepad{} activated", slot + 1),
            ConnectionEvent::Disactivated { slot, reason } => {
                write!(f, "gamepad{} disactivated ({})", slot + 1, reason)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type EventCallback = Arc<dyn Fn(&ConnectionEvent) + Send + Sync>;

/// Observer list notified synchronously as events are emitted
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, EventCallback)>,
}

impl Subscribers {
    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sid, _)| *sid != id);
        self.callbacks.len() != before
    }

    pub fn notify(&self, event: &ConnectionEvent) {
        for (_, callback) in &self.callbacks {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

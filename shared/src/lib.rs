//! Device Router Shared Protocol Types
//!
//! This crate provides the command message type, the text codec, and the
//! device registry shared by the router and anything that speaks to it.

pub mod codec;
pub mod registry;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use codec::{decode, encode, CodecError, LineDecoder, ProtocolError};
pub use registry::{Device, DeviceRegistry};

/// Argument map of a command. Keys are unique; sorted so encoding is stable.
pub type Args = BTreeMap<String, String>;

/// Triggers with a fixed meaning in the protocol
pub mod protocol {
    /// Liveness probe sent by the router and answered by devices
    pub const PING: &str = "ping";

    /// Reply sent to a device whose command could not be handled
    pub const UNKNOWN_COMMAND: &str = "unknown_command";

    /// Triggers that can never be bound to an action handler
    pub const RESERVED_TRIGGERS: [&str; 2] = [PING, UNKNOWN_COMMAND];

    /// Check whether a trigger is owned by the protocol itself
    pub fn is_reserved(trigger: &str) -> bool {
        RESERVED_TRIGGERS.contains(&trigger)
    }
}

/// Liveness parameters
pub mod liveness {
    /// Time between sweep rounds; also the window a device has to answer a ping
    pub const SWEEP_PERIOD_MS: u64 = 5000;
}

/// A single decoded command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identity the sender presents for itself. Opaque, never coerced to a number.
    pub device_token: String,
    /// Action name
    pub trigger: String,
    /// Optional key/value arguments
    pub args: Args,
}

impl Message {
    /// Create a message without arguments
    pub fn new(device_token: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self {
            device_token: device_token.into(),
            trigger: trigger.into(),
            args: Args::new(),
        }
    }

    /// Create a ping addressed to a device
    pub fn ping(device_token: impl Into<String>) -> Self {
        Self::new(device_token, protocol::PING)
    }

    /// Create the reply for a command the router could not handle
    pub fn unknown_command(device_token: impl Into<String>) -> Self {
        Self::new(device_token, protocol::UNKNOWN_COMMAND)
    }

    /// Add an argument, replacing any previous value for the key
    pub fn with_arg(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.args.insert(key.into(), value.to_string());
        self
    }

    /// Look up an argument value
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }

    /// Encode to the wire format
    pub fn encode(&self) -> String {
        codec::encode(&self.device_token, &self.trigger, &self.args)
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        codec::decode(raw)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

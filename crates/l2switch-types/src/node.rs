//! Switch and port identifiers.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a managed switch (OpenFlow datapath id).
///
/// The learning switch never creates or destroys switches; it only keys
/// state by this identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchId(u64);

impl SwitchId {
    /// Creates a switch identifier from a datapath id.
    pub const fn new(dpid: u64) -> Self {
        SwitchId(dpid)
    }

    /// Returns the datapath id.
    pub const fn dpid(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "of:{:016x}", self.0)
    }
}

impl FromStr for SwitchId {
    type Err = ParseError;

    /// Accepts `of:<hex dpid>` or a plain decimal datapath id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.strip_prefix("of:") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        };
        parsed
            .map(SwitchId)
            .map_err(|_| ParseError::InvalidSwitchId(s.to_string()))
    }
}

/// A switch interface. A port belongs to exactly one switch, and two ports
/// are equal only if both the switch and the port number match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId {
    switch: SwitchId,
    number: u32,
}

impl PortId {
    /// Creates a port identifier on `switch`.
    pub const fn new(switch: SwitchId, number: u32) -> Self {
        PortId { switch, number }
    }

    /// Returns the switch this port belongs to.
    pub const fn switch(&self) -> SwitchId {
        self.switch
    }

    /// Returns the port number on its switch.
    pub const fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.switch, self.number)
    }
}

impl FromStr for PortId {
    type Err = ParseError;

    /// Parses the `Display` form, `<switch>/<port number>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (switch, number) = s
            .rsplit_once('/')
            .ok_or_else(|| ParseError::InvalidPortId(s.to_string()))?;
        let switch = switch
            .parse::<SwitchId>()
            .map_err(|_| ParseError::InvalidPortId(s.to_string()))?;
        let number = number
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidPortId(s.to_string()))?;
        Ok(PortId::new(switch, number))
    }
}

/// Operational state of a port as reported by the switch inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    /// Port is operationally down (default).
    #[default]
    Down,
    /// Port is operationally up.
    Up,
}

impl PortState {
    /// Returns true if the port is operationally up.
    pub const fn is_up(&self) -> bool {
        matches!(self, PortState::Up)
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortState::Up => write!(f, "up"),
            PortState::Down => write!(f, "down"),
        }
    }
}

impl FromStr for PortState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(PortState::Up),
            "down" => Ok(PortState::Down),
            _ => Err(ParseError::InvalidPortState(s.to_string())),
        }
    }
}

//! Common types for the L2 learning switch.
//!
//! This crate provides type-safe representations of the network primitives
//! the learning switch keys its state by:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`EtherType`]: Ethernet II payload type identifiers
//! - [`SwitchId`]: Opaque datapath identifier of a managed switch
//! - [`PortId`]: A port, always scoped to exactly one switch
//! - [`PortState`]: Operational state reported by the switch inventory

mod ether;
mod mac;
mod node;

pub use ether::EtherType;
pub use mac::MacAddress;
pub use node::{PortId, PortState, SwitchId};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("MAC address value out of 48-bit range: {0:#x}")]
    MacOutOfRange(u64),

    #[error("invalid ether type: {0}")]
    InvalidEtherType(String),

    #[error("invalid switch id: {0}")]
    InvalidSwitchId(String),

    #[error("invalid port id: {0}")]
    InvalidPortId(String),

    #[error("invalid port state: {0}")]
    InvalidPortState(String),
}

//! Error types for the learning switch.
//!
//! Every failure is contained within the handling of a single packet-in;
//! none of them roll back the learning table. Frames this application
//! declines (not Ethernet, filtered ether type) and destinations it has not
//! learned are ordinary outcomes, see [`RejectReason`](crate::RejectReason)
//! and [`Decision`](crate::Decision).

use l2switch_types::{PortId, SwitchId};
use thiserror::Error;

/// Errors that can occur while handling a packet-in or loading configuration.
#[derive(Debug, Error)]
pub enum L2SwitchError {
    /// The flow programmer rejected a rule.
    #[error("Flow install on {switch} failed: {reason}")]
    InstallFailure { switch: SwitchId, reason: String },

    /// The packet transmitter failed to send a packet-out.
    #[error("Packet-out on {port} failed: {reason}")]
    TransmitFailure { port: PortId, reason: String },

    /// A required collaborator is not bound.
    #[error("Service not available: {0}")]
    ServiceUnavailable(&'static str),

    /// The packet codec failed outright (as opposed to not recognizing the frame).
    #[error("Packet decode failed: {0}")]
    Decode(String),

    /// The switch inventory could not enumerate ports.
    #[error("Switch inventory query for {switch} failed: {reason}")]
    Inventory { switch: SwitchId, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl L2SwitchError {
    /// Returns true for failures outside the expected taxonomy, which the
    /// packet-in boundary reports and answers with "ignored".
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            L2SwitchError::ServiceUnavailable(_)
                | L2SwitchError::Decode(_)
                | L2SwitchError::Inventory { .. }
                | L2SwitchError::Config(_)
                | L2SwitchError::Io(_)
        )
    }
}

/// Result type alias for learning switch operations
pub type Result<T> = std::result::Result<T, L2SwitchError>;

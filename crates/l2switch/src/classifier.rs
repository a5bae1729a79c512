//! Frame classification.
//!
//! Decides whether a packet-in is something the learning switch handles.
//! Classification has no side effects: it reads the raw packet and asks the
//! codec to decode it, nothing else.

use crate::error::{L2SwitchError, Result};
use crate::packet::{DecodedPacket, RawPacket};
use crate::services::PacketCodec;
use l2switch_types::{EtherType, MacAddress, PortId, SwitchId};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Ether types other controller applications own by default.
pub const DEFAULT_FILTERED_ETHER_TYPES: [EtherType; 2] = [EtherType::LLDP, EtherType::IPV6];

/// A decoded Ethernet frame accepted for forwarding decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFrame {
    pub ether_type: EtherType,
    pub source: MacAddress,
    pub destination: MacAddress,
    pub ingress_port: PortId,
    pub ingress_switch: SwitchId,
    /// The original indication, kept for packet-out.
    pub packet: RawPacket,
}

/// Why a packet-in was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotEthernet,
    FilteredType(EtherType),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotEthernet => write!(f, "not an Ethernet frame"),
            RejectReason::FilteredType(t) => match t.name() {
                Some(name) => write!(f, "filtered ether type {} ({})", t, name),
                None => write!(f, "filtered ether type {}", t),
            },
        }
    }
}

/// Outcome of [`FrameClassifier::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Frame(ClassifiedFrame),
    Rejected(RejectReason),
}

/// Accepts Ethernet frames whose ether type is not in the filter set.
#[derive(Debug, Clone)]
pub struct FrameClassifier {
    filtered: HashSet<EtherType>,
}

impl Default for FrameClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_FILTERED_ETHER_TYPES)
    }
}

impl FrameClassifier {
    pub fn new(filtered: impl IntoIterator<Item = EtherType>) -> Self {
        Self {
            filtered: filtered.into_iter().collect(),
        }
    }

    pub fn is_filtered(&self, ether_type: EtherType) -> bool {
        self.filtered.contains(&ether_type)
    }

    /// Classifies `packet`. `Err` only when the codec itself fails.
    pub fn classify(&self, codec: &dyn PacketCodec, packet: &RawPacket) -> Result<Classification> {
        let decoded = codec
            .decode_data_packet(packet)
            .map_err(L2SwitchError::Decode)?;

        let frame = match decoded {
            DecodedPacket::Ethernet(frame) => frame,
            DecodedPacket::Unrecognized => {
                debug!(ingress = %packet.ingress(), "Packet is not an Ethernet frame");
                return Ok(Classification::Rejected(RejectReason::NotEthernet));
            }
        };

        if self.is_filtered(frame.ether_type) {
            let reason = RejectReason::FilteredType(frame.ether_type);
            debug!(ingress = %packet.ingress(), %reason, "Packet declined");
            return Ok(Classification::Rejected(reason));
        }

        Ok(Classification::Frame(ClassifiedFrame {
            ether_type: frame.ether_type,
            source: frame.source,
            destination: frame.destination,
            ingress_port: packet.ingress(),
            ingress_switch: packet.ingress_switch(),
            packet: packet.clone(),
        }))
    }
}

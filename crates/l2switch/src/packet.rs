//! Packet-in indications and decoded frames.

use l2switch_types::{EtherType, MacAddress, PortId, SwitchId};
use std::sync::Arc;

/// A raw packet as delivered by a packet-in, or as submitted for packet-out.
///
/// The payload is shared, so cloning a packet to retarget it at another
/// egress port does not copy frame bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    ingress: PortId,
    egress: Option<PortId>,
    payload: Arc<[u8]>,
}

impl RawPacket {
    /// Creates a packet-in indication received on `ingress`.
    pub fn new(ingress: PortId, payload: impl Into<Arc<[u8]>>) -> Self {
        Self {
            ingress,
            egress: None,
            payload: payload.into(),
        }
    }

    /// Port the packet arrived on.
    pub fn ingress(&self) -> PortId {
        self.ingress
    }

    /// Switch the packet arrived on, derived from the ingress port.
    pub fn ingress_switch(&self) -> SwitchId {
        self.ingress.switch()
    }

    /// Egress port, set only on packet-out copies.
    pub fn egress(&self) -> Option<PortId> {
        self.egress
    }

    /// Frame bytes as received.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns a copy of this packet addressed at `port`.
    pub fn with_egress(&self, port: PortId) -> Self {
        Self {
            ingress: self.ingress,
            egress: Some(port),
            payload: Arc::clone(&self.payload),
        }
    }
}

/// Ethernet header fields extracted by a [`PacketCodec`](crate::PacketCodec).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetFrame {
    pub destination: MacAddress,
    pub source: MacAddress,
    /// Ether type of the payload (the inner type when 802.1Q tagged).
    pub ether_type: EtherType,
    /// 802.1Q VLAN id, if the frame carried a tag.
    pub vlan: Option<u16>,
}

/// Result of decoding a raw packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedPacket {
    Ethernet(EthernetFrame),
    /// The codec did not recognize the payload as an Ethernet frame.
    Unrecognized,
}

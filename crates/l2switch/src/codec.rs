//! Built-in Ethernet II decoder.
//!
//! Frame layout:
//! - Destination MAC (6 bytes)
//! - Source MAC (6 bytes)
//! - EtherType (2 bytes), or 0x8100 + TCI (2 bytes) + inner EtherType (2 bytes)

use crate::packet::{DecodedPacket, EthernetFrame, RawPacket};
use crate::services::PacketCodec;
use l2switch_types::{EtherType, MacAddress};
use tracing::trace;

const HEADER_LEN: usize = 14;
const VLAN_TAG_LEN: usize = 4;
const VLAN_ID_MASK: u16 = 0x0fff;
/// Minimum frame size without FCS.
const MIN_FRAME_LEN: usize = 60;

/// Decodes Ethernet II headers, stepping over a single 802.1Q tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct EthernetCodec;

impl EthernetCodec {
    pub fn new() -> Self {
        Self
    }

    /// Parses the header of `data`, or `None` if it is not an Ethernet II frame.
    pub fn parse(data: &[u8]) -> Option<EthernetFrame> {
        if data.len() < HEADER_LEN {
            trace!(len = data.len(), "Ethernet frame too small");
            return None;
        }

        let mut destination = [0u8; 6];
        destination.copy_from_slice(&data[0..6]);
        let mut source = [0u8; 6];
        source.copy_from_slice(&data[6..12]);

        let mut ether_type = EtherType::new(u16::from_be_bytes([data[12], data[13]]));
        let mut vlan = None;

        if ether_type == EtherType::VLAN {
            if data.len() < HEADER_LEN + VLAN_TAG_LEN {
                trace!(len = data.len(), "802.1Q tagged frame too small");
                return None;
            }
            let tci = u16::from_be_bytes([data[14], data[15]]);
            vlan = Some(tci & VLAN_ID_MASK);
            ether_type = EtherType::new(u16::from_be_bytes([data[16], data[17]]));
        }

        if !ether_type.is_ether_ii() {
            trace!(value = ether_type.as_u16(), "802.3 length field, not Ethernet II");
            return None;
        }

        Some(EthernetFrame {
            destination: MacAddress::new(destination),
            source: MacAddress::new(source),
            ether_type,
            vlan,
        })
    }

    /// Serializes `frame` as a header followed by zero padding up to the
    /// minimum Ethernet frame size.
    pub fn encode(frame: &EthernetFrame) -> Vec<u8> {
        let mut data = Vec::with_capacity(MIN_FRAME_LEN);
        data.extend_from_slice(frame.destination.as_bytes());
        data.extend_from_slice(frame.source.as_bytes());
        if let Some(vlan) = frame.vlan {
            data.extend_from_slice(&EtherType::VLAN.as_u16().to_be_bytes());
            data.extend_from_slice(&(vlan & VLAN_ID_MASK).to_be_bytes());
        }
        data.extend_from_slice(&frame.ether_type.as_u16().to_be_bytes());
        data.resize(data.len().max(MIN_FRAME_LEN), 0);
        data
    }
}

impl PacketCodec for EthernetCodec {
    fn decode_data_packet(&self, packet: &RawPacket) -> Result<DecodedPacket, String> {
        Ok(match Self::parse(packet.payload()) {
            Some(frame) => DecodedPacket::Ethernet(frame),
            None => DecodedPacket::Unrecognized,
        })
    }
}

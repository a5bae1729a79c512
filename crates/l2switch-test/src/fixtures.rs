//! Test fixtures for learning switch scenarios
//!
//! Provides frame builders and a ready-wired switch/fabric pair

use l2switch::{EthernetCodec, EthernetFrame, InMemoryFabric, L2SwitchConfig, LearningSwitch, RawPacket};
use l2switch_types::{EtherType, MacAddress, PortId, SwitchId};
use std::sync::Arc;

/// MAC address from its 48-bit integer form.
///
/// Panics on values wider than 48 bits; fixtures only use literal constants.
pub fn mac(value: u64) -> MacAddress {
    match MacAddress::from_u64(value) {
        Ok(mac) => mac,
        Err(e) => panic!("fixture MAC {:#x}: {}", value, e),
    }
}

pub fn port(dpid: u64, number: u32) -> PortId {
    PortId::new(SwitchId::new(dpid), number)
}

/// Builds Ethernet frames for packet-in injection.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    frame: EthernetFrame,
}

impl FrameBuilder {
    /// IPv4 unicast frame from `src` to `dst`.
    pub fn new(src: u64, dst: u64) -> Self {
        Self {
            frame: EthernetFrame {
                destination: mac(dst),
                source: mac(src),
                ether_type: EtherType::IPV4,
                vlan: None,
            },
        }
    }

    /// ARP broadcast from `src`.
    pub fn broadcast(src: u64) -> Self {
        Self::new(src, MacAddress::BROADCAST.to_u64()).ether_type(EtherType::ARP)
    }

    pub fn ether_type(mut self, ether_type: EtherType) -> Self {
        self.frame.ether_type = ether_type;
        self
    }

    pub fn vlan(mut self, vlan: u16) -> Self {
        self.frame.vlan = Some(vlan);
        self
    }

    pub fn frame(&self) -> EthernetFrame {
        self.frame
    }

    pub fn bytes(&self) -> Vec<u8> {
        EthernetCodec::encode(&self.frame)
    }

    /// Packet-in of this frame received on `ingress`.
    pub fn arrive_on(&self, ingress: PortId) -> RawPacket {
        RawPacket::new(ingress, self.bytes())
    }
}

/// A learning switch bound to a fresh in-memory fabric.
pub struct TestBed {
    pub switch: LearningSwitch,
    pub fabric: Arc<InMemoryFabric>,
}

impl TestBed {
    pub fn new() -> Self {
        Self::with_config(&L2SwitchConfig::default())
    }

    pub fn with_config(config: &L2SwitchConfig) -> Self {
        let switch = LearningSwitch::new(config);
        let fabric = Arc::new(InMemoryFabric::new());
        switch.attach_fabric(fabric.clone());
        Self { switch, fabric }
    }

    /// Adds switch `dpid` with up ports `ports`.
    pub fn with_switch(self, dpid: u64, ports: impl IntoIterator<Item = u32>) -> Self {
        self.fabric.add_switch(SwitchId::new(dpid), ports);
        self
    }
}

impl Default for TestBed {
    fn default() -> Self {
        Self::new()
    }
}

/// Addresses used by the end-to-end scenarios
pub mod hosts {
    /// Host attached to S1/P1
    pub const HOST_A: u64 = 0xaabb_ccdd_eeff;
    /// Host attached to S1/P2
    pub const HOST_B: u64 = 0x0011_2233_4455;
    pub const HOST_C: u64 = 0x0000_0000_000c;
}

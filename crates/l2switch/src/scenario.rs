//! Packet-in replay scripts.
//!
//! A scenario describes a fabric (switches, their ports and any injected
//! failures) and a list of packet-ins to feed the learning switch.
//!
//! ```toml
//! [[switch]]
//! dpid = 1
//! up_ports = [1, 2, 3]
//! down_ports = [4]
//! fail_transmit_ports = [3]
//!
//! [[packet]]
//! switch = 1
//! in_port = 2
//! src = "00:11:22:33:44:55"
//! dst = "ff:ff:ff:ff:ff:ff"
//! ether_type = 0x0806
//! ```

use crate::codec::EthernetCodec;
use crate::error::{L2SwitchError, Result};
use crate::fabric::InMemoryFabric;
use crate::packet::{EthernetFrame, RawPacket};
use l2switch_types::{EtherType, MacAddress, PortId, PortState, SwitchId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// One switch of the simulated fabric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchSpec {
    pub dpid: u64,

    #[serde(default)]
    pub up_ports: Vec<u32>,

    #[serde(default)]
    pub down_ports: Vec<u32>,

    /// Reject every flow install on this switch
    #[serde(default)]
    pub fail_installs: bool,

    /// Ports whose packet-outs fail
    #[serde(default)]
    pub fail_transmit_ports: Vec<u32>,
}

impl SwitchSpec {
    pub fn switch_id(&self) -> SwitchId {
        SwitchId::new(self.dpid)
    }
}

/// One packet-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketSpec {
    pub switch: u64,
    pub in_port: u32,
    pub src: MacAddress,
    pub dst: MacAddress,

    #[serde(default = "default_ether_type")]
    pub ether_type: EtherType,

    #[serde(default)]
    pub vlan: Option<u16>,
}

fn default_ether_type() -> EtherType {
    EtherType::IPV4
}

impl PacketSpec {
    pub fn ingress(&self) -> PortId {
        PortId::new(SwitchId::new(self.switch), self.in_port)
    }

    /// Builds the packet-in this entry describes.
    pub fn to_packet(&self) -> RawPacket {
        let frame = EthernetFrame {
            destination: self.dst,
            source: self.src,
            ether_type: self.ether_type,
            vlan: self.vlan,
        };
        RawPacket::new(self.ingress(), EthernetCodec::encode(&frame))
    }
}

/// A complete replay script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, rename = "switch")]
    pub switches: Vec<SwitchSpec>,

    #[serde(default, rename = "packet")]
    pub packets: Vec<PacketSpec>,
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(content)
            .map_err(|e| L2SwitchError::Config(format!("Failed to parse scenario: {}", e)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Rejects duplicate switches and packets whose ingress port is not declared.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.switches {
            if !seen.insert(spec.dpid) {
                return Err(L2SwitchError::Config(format!(
                    "switch {} declared twice",
                    spec.switch_id()
                )));
            }
        }

        for (index, packet) in self.packets.iter().enumerate() {
            let declared = self.switches.iter().any(|s| {
                s.dpid == packet.switch
                    && (s.up_ports.contains(&packet.in_port) || s.down_ports.contains(&packet.in_port))
            });
            if !declared {
                return Err(L2SwitchError::Config(format!(
                    "packet #{} arrives on undeclared port {}",
                    index,
                    packet.ingress()
                )));
            }
        }

        Ok(())
    }

    /// Builds a fabric with the declared ports and failures.
    pub fn build_fabric(&self) -> InMemoryFabric {
        let fabric = InMemoryFabric::new();
        for spec in &self.switches {
            let switch = spec.switch_id();
            fabric.add_switch(switch, spec.up_ports.iter().copied());
            for number in &spec.down_ports {
                fabric.set_port(PortId::new(switch, *number), PortState::Down);
            }
            if spec.fail_installs {
                fabric.fail_installs_on(switch);
            }
            for number in &spec.fail_transmit_ports {
                fabric.fail_transmits_on(PortId::new(switch, *number));
            }
        }
        fabric
    }

    /// Packet-ins grouped by ingress switch, each group in script order.
    pub fn packets_by_switch(&self) -> BTreeMap<SwitchId, Vec<RawPacket>> {
        let mut streams: BTreeMap<SwitchId, Vec<RawPacket>> = BTreeMap::new();
        for packet in &self.packets {
            streams
                .entry(SwitchId::new(packet.switch))
                .or_default()
                .push(packet.to_packet());
        }
        streams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SwitchInventory;
    use pretty_assertions::assert_eq;

    const SCRIPT: &str = r#"
        [[switch]]
        dpid = 1
        up_ports = [1, 2, 3]
        down_ports = [4]
        fail_transmit_ports = [3]

        [[switch]]
        dpid = 2
        up_ports = [1, 2]
        fail_installs = true

        [[packet]]
        switch = 1
        in_port = 2
        src = "00:11:22:33:44:55"
        dst = "ff:ff:ff:ff:ff:ff"
        ether_type = 0x0806

        [[packet]]
        switch = 2
        in_port = 1
        src = "00:00:00:00:00:0a"
        dst = "00:00:00:00:00:0b"

        [[packet]]
        switch = 1
        in_port = 1
        src = "aa:bb:cc:dd:ee:ff"
        dst = "00:11:22:33:44:55"
    "#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml(SCRIPT).unwrap();

        assert_eq!(scenario.switches.len(), 2);
        assert_eq!(scenario.packets.len(), 3);
        assert_eq!(scenario.packets[0].ether_type, EtherType::ARP);
        assert_eq!(scenario.packets[1].ether_type, EtherType::IPV4);
        assert!(scenario.switches[1].fail_installs);
    }

    #[test]
    fn test_packets_grouped_in_order() {
        let scenario = Scenario::from_toml(SCRIPT).unwrap();
        let streams = scenario.packets_by_switch();

        let s1 = &streams[&SwitchId::new(1)];
        assert_eq!(s1.len(), 2);
        assert_eq!(s1[0].ingress(), PortId::new(SwitchId::new(1), 2));
        assert_eq!(s1[1].ingress(), PortId::new(SwitchId::new(1), 1));

        let frame = EthernetCodec::parse(s1[1].payload()).unwrap();
        assert_eq!(frame.source.to_u64(), 0xaabb_ccdd_eeff);
        assert_eq!(frame.destination.to_u64(), 0x0011_2233_4455);
    }

    #[test]
    fn test_build_fabric() {
        let scenario = Scenario::from_toml(SCRIPT).unwrap();
        let fabric = scenario.build_fabric();
        let s1 = SwitchId::new(1);

        let up = fabric.up_ports(s1).unwrap();
        assert_eq!(up, vec![PortId::new(s1, 1), PortId::new(s1, 2), PortId::new(s1, 3)]);
        assert_eq!(fabric.switches(), vec![s1, SwitchId::new(2)]);
    }

    #[test]
    fn test_undeclared_port_rejected() {
        let err = Scenario::from_toml(
            r#"
            [[switch]]
            dpid = 1
            up_ports = [1]

            [[packet]]
            switch = 1
            in_port = 9
            src = "00:00:00:00:00:01"
            dst = "00:00:00:00:00:02"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("undeclared port"));
    }

    #[test]
    fn test_duplicate_switch_rejected() {
        let err = Scenario::from_toml("[[switch]]\ndpid = 1\n[[switch]]\ndpid = 1\n").unwrap_err();
        assert!(matches!(err, L2SwitchError::Config(_)));
    }
}

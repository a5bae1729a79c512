//! In-memory switch fabric.
//!
//! Stands in for the controller's inventory, packet transmitter and flow
//! programmer. Every packet-out and flow install is recorded so callers can
//! inspect what the switch application asked for.

use crate::flow::FlowRule;
use crate::packet::RawPacket;
use crate::services::{FlowProgrammer, PacketTransmitter, SwitchInventory};
use l2switch_types::{PortId, PortState, SwitchId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use tracing::trace;

#[derive(Debug, Default)]
struct FabricState {
    ports: BTreeMap<SwitchId, BTreeMap<u32, PortState>>,
    transmitted: Vec<RawPacket>,
    flows: Vec<(SwitchId, FlowRule)>,
    failing_switches: HashSet<SwitchId>,
    failing_ports: HashSet<PortId>,
}

#[derive(Debug, Default)]
pub struct InMemoryFabric {
    state: Mutex<FabricState>,
}

impl InMemoryFabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or updates a port. The switch is created on first use.
    pub fn set_port(&self, port: PortId, state: PortState) {
        self.state
            .lock()
            .ports
            .entry(port.switch())
            .or_default()
            .insert(port.number(), state);
    }

    /// Adds `ports` as up ports of `switch`.
    pub fn add_switch(&self, switch: SwitchId, ports: impl IntoIterator<Item = u32>) {
        let mut state = self.state.lock();
        let entry = state.ports.entry(switch).or_default();
        for number in ports {
            entry.insert(number, PortState::Up);
        }
    }

    pub fn switches(&self) -> Vec<SwitchId> {
        self.state.lock().ports.keys().copied().collect()
    }

    /// Makes every later `add_flow` on `switch` fail.
    pub fn fail_installs_on(&self, switch: SwitchId) {
        self.state.lock().failing_switches.insert(switch);
    }

    /// Makes every later packet-out through `port` fail.
    pub fn fail_transmits_on(&self, port: PortId) {
        self.state.lock().failing_ports.insert(port);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failing_switches.clear();
        state.failing_ports.clear();
    }

    /// Packet-outs accepted so far, in submission order.
    pub fn transmitted(&self) -> Vec<RawPacket> {
        self.state.lock().transmitted.clone()
    }

    /// Egress ports of the accepted packet-outs, in submission order.
    pub fn transmitted_ports(&self) -> Vec<PortId> {
        self.state
            .lock()
            .transmitted
            .iter()
            .filter_map(RawPacket::egress)
            .collect()
    }

    /// Flows accepted so far, in install order.
    pub fn installed_flows(&self) -> Vec<(SwitchId, FlowRule)> {
        self.state.lock().flows.clone()
    }

    pub fn installed_flows_on(&self, switch: SwitchId) -> Vec<FlowRule> {
        self.state
            .lock()
            .flows
            .iter()
            .filter(|(s, _)| *s == switch)
            .map(|(_, rule)| rule.clone())
            .collect()
    }

    /// Forgets recorded packet-outs and flows. Ports and failures are kept.
    pub fn reset_records(&self) {
        let mut state = self.state.lock();
        state.transmitted.clear();
        state.flows.clear();
    }
}

impl SwitchInventory for InMemoryFabric {
    fn up_ports(&self, switch: SwitchId) -> Result<Vec<PortId>, String> {
        let state = self.state.lock();
        let ports = state
            .ports
            .get(&switch)
            .ok_or_else(|| format!("switch {} not in inventory", switch))?;

        Ok(ports
            .iter()
            .filter(|(_, s)| s.is_up())
            .map(|(number, _)| PortId::new(switch, *number))
            .collect())
    }
}

impl PacketTransmitter for InMemoryFabric {
    fn transmit_data_packet(&self, packet: &RawPacket) -> Result<(), String> {
        let port = packet
            .egress()
            .ok_or_else(|| "packet-out without egress port".to_string())?;

        let mut state = self.state.lock();
        if state.failing_ports.contains(&port) {
            return Err(format!("transmit on {} failed", port));
        }
        match state.ports.get(&port.switch()).and_then(|p| p.get(&port.number())) {
            Some(PortState::Up) => {}
            Some(PortState::Down) => return Err(format!("port {} is down", port)),
            None => return Err(format!("port {} does not exist", port)),
        }

        trace!(port = %port, len = packet.payload().len(), "Fabric accepted packet-out");
        state.transmitted.push(packet.clone());
        Ok(())
    }
}

impl FlowProgrammer for InMemoryFabric {
    fn add_flow(&self, switch: SwitchId, flow: &FlowRule) -> Result<(), String> {
        let mut state = self.state.lock();
        if state.failing_switches.contains(&switch) {
            return Err(format!("flow table on {} rejected the rule", switch));
        }
        if !state.ports.contains_key(&switch) {
            return Err(format!("switch {} not in inventory", switch));
        }

        trace!(switch = %switch, flow = %flow, "Fabric accepted flow");
        state.flows.push((switch, flow.clone()));
        Ok(())
    }
}

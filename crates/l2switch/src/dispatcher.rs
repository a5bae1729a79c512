//! Packet-out dispatch: single-port forward and flood.

use crate::error::{L2SwitchError, Result};
use crate::packet::RawPacket;
use crate::services::{PacketTransmitter, SwitchInventory};
use l2switch_types::PortId;
use tracing::{debug, warn};

/// Result of flooding one packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloodReport {
    /// Ports a packet-out was attempted on, in inventory order.
    pub attempted: Vec<PortId>,
    /// Ports whose packet-out failed, with the transmitter's reason.
    pub failed: Vec<(PortId, String)>,
}

impl FloodReport {
    pub fn delivered(&self) -> usize {
        self.attempted.len() - self.failed.len()
    }
}

/// Builds and submits packet-outs. Holds no state of its own.
pub struct PacketDispatcher<'a> {
    transmitter: &'a dyn PacketTransmitter,
    inventory: &'a dyn SwitchInventory,
}

impl<'a> PacketDispatcher<'a> {
    pub fn new(transmitter: &'a dyn PacketTransmitter, inventory: &'a dyn SwitchInventory) -> Self {
        Self {
            transmitter,
            inventory,
        }
    }

    /// Sends a copy of `packet` out of `port`.
    pub fn forward(&self, port: PortId, packet: &RawPacket) -> Result<()> {
        let out = packet.with_egress(port);
        self.transmitter
            .transmit_data_packet(&out)
            .map_err(|reason| L2SwitchError::TransmitFailure { port, reason })?;
        debug!(port = %port, "Packet sent");
        Ok(())
    }

    /// Sends a copy of `packet` out of every up port of its ingress switch
    /// except the ingress port. A failed port is recorded and flooding
    /// continues with the next one.
    pub fn flood(&self, packet: &RawPacket) -> Result<FloodReport> {
        let switch = packet.ingress_switch();
        let ingress = packet.ingress();

        let ports = self
            .inventory
            .up_ports(switch)
            .map_err(|reason| L2SwitchError::Inventory { switch, reason })?;

        debug!(switch = %switch, ingress = %ingress, "Begin flooding");
        let mut report = FloodReport::default();
        for port in ports.into_iter().filter(|p| *p != ingress) {
            report.attempted.push(port);
            if let Err(e) = self.forward(port, packet) {
                warn!(error = %e, "Flood packet-out failed");
                if let L2SwitchError::TransmitFailure { reason, .. } = e {
                    report.failed.push((port, reason));
                }
            }
        }
        debug!(
            switch = %switch,
            attempted = report.attempted.len(),
            failed = report.failed.len(),
            "End flooding"
        );

        Ok(report)
    }
}

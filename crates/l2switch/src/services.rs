//! Collaborator traits and the runtime service bindings.
//!
//! The learning switch drives four external services: a packet codec, the
//! switch inventory, a packet transmitter and a flow programmer. The host
//! binds and unbinds them at runtime; a packet-in that arrives while any of
//! them is unbound is answered with "ignored".

use crate::error::{L2SwitchError, Result};
use crate::flow::FlowRule;
use crate::packet::{DecodedPacket, RawPacket};
use l2switch_types::{PortId, SwitchId};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Decodes raw packet-in payloads.
pub trait PacketCodec: Send + Sync {
    /// Returns `Unrecognized` for payloads that are not Ethernet frames;
    /// `Err` is reserved for the codec itself failing.
    fn decode_data_packet(&self, packet: &RawPacket) -> std::result::Result<DecodedPacket, String>;
}

/// Switch/port inventory.
pub trait SwitchInventory: Send + Sync {
    /// Ports on `switch` that are currently up.
    fn up_ports(&self, switch: SwitchId) -> std::result::Result<Vec<PortId>, String>;
}

/// Packet-out transport.
pub trait PacketTransmitter: Send + Sync {
    /// Transmits `packet` out of its egress port.
    fn transmit_data_packet(&self, packet: &RawPacket) -> std::result::Result<(), String>;
}

/// Flow-table programming transport.
pub trait FlowProgrammer: Send + Sync {
    /// Installs `flow` on `switch`, returning a failure description on rejection.
    fn add_flow(&self, switch: SwitchId, flow: &FlowRule) -> std::result::Result<(), String>;
}

/// A consistent set of bound collaborators for one packet-in.
#[derive(Clone)]
pub struct BoundServices {
    pub codec: Arc<dyn PacketCodec>,
    pub inventory: Arc<dyn SwitchInventory>,
    pub transmitter: Arc<dyn PacketTransmitter>,
    pub programmer: Arc<dyn FlowProgrammer>,
}

#[derive(Default)]
struct Bindings {
    codec: Option<Arc<dyn PacketCodec>>,
    inventory: Option<Arc<dyn SwitchInventory>>,
    transmitter: Option<Arc<dyn PacketTransmitter>>,
    programmer: Option<Arc<dyn FlowProgrammer>>,
}

/// Runtime collaborator bindings.
///
/// `unset_*` only clears a binding when handed the instance that is
/// currently bound, so a late unbind of a replaced service is a no-op.
#[derive(Default)]
pub struct Services {
    bindings: RwLock<Bindings>,
}

/// Clears `slot` if it holds exactly `service`.
fn unset_if_same<T: ?Sized>(slot: &mut Option<Arc<T>>, service: &Arc<T>) -> bool {
    match slot {
        Some(current) if Arc::ptr_eq(current, service) => {
            *slot = None;
            true
        }
        _ => false,
    }
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_packet_codec(&self, codec: Arc<dyn PacketCodec>) {
        self.bindings.write().codec = Some(codec);
        debug!("PacketCodec is set");
    }

    pub fn unset_packet_codec(&self, codec: &Arc<dyn PacketCodec>) -> bool {
        let removed = unset_if_same(&mut self.bindings.write().codec, codec);
        debug!(removed, "PacketCodec unset requested");
        removed
    }

    pub fn set_switch_inventory(&self, inventory: Arc<dyn SwitchInventory>) {
        self.bindings.write().inventory = Some(inventory);
        debug!("SwitchInventory is set");
    }

    pub fn unset_switch_inventory(&self, inventory: &Arc<dyn SwitchInventory>) -> bool {
        let removed = unset_if_same(&mut self.bindings.write().inventory, inventory);
        debug!(removed, "SwitchInventory unset requested");
        removed
    }

    pub fn set_packet_transmitter(&self, transmitter: Arc<dyn PacketTransmitter>) {
        self.bindings.write().transmitter = Some(transmitter);
        debug!("PacketTransmitter is set");
    }

    pub fn unset_packet_transmitter(&self, transmitter: &Arc<dyn PacketTransmitter>) -> bool {
        let removed = unset_if_same(&mut self.bindings.write().transmitter, transmitter);
        debug!(removed, "PacketTransmitter unset requested");
        removed
    }

    pub fn set_flow_programmer(&self, programmer: Arc<dyn FlowProgrammer>) {
        self.bindings.write().programmer = Some(programmer);
        debug!("FlowProgrammer is set");
    }

    pub fn unset_flow_programmer(&self, programmer: &Arc<dyn FlowProgrammer>) -> bool {
        let removed = unset_if_same(&mut self.bindings.write().programmer, programmer);
        debug!(removed, "FlowProgrammer unset requested");
        removed
    }

    /// Snapshots the current bindings, failing if any collaborator is unbound.
    pub fn bound(&self) -> Result<BoundServices> {
        let b = self.bindings.read();
        Ok(BoundServices {
            codec: b
                .codec
                .clone()
                .ok_or(L2SwitchError::ServiceUnavailable("packet codec"))?,
            inventory: b
                .inventory
                .clone()
                .ok_or(L2SwitchError::ServiceUnavailable("switch inventory"))?,
            transmitter: b
                .transmitter
                .clone()
                .ok_or(L2SwitchError::ServiceUnavailable("packet transmitter"))?,
            programmer: b
                .programmer
                .clone()
                .ok_or(L2SwitchError::ServiceUnavailable("flow programmer"))?,
        })
    }
}

//! Forwarding decisions.
//!
//! The engine learns the frame's source binding and then picks one of the
//! [`Decision`] branches. It runs with the ingress switch's learning table
//! locked by the caller and does not talk to any collaborator; carrying
//! out the decision is the packet-in handler's job.

use crate::classifier::{ClassifiedFrame, RejectReason};
use crate::config::UnknownDestinationPolicy;
use crate::flow::FlowRule;
use crate::learning::SwitchMacTable;
use l2switch_types::{EtherType, MacAddress, PortId};
use std::fmt;

/// Why a frame is flooded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodCause {
    Broadcast,
    /// Destination not learned yet and the policy is to flood.
    UnknownDestination,
}

/// What to do with a packet-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Not acted on; other applications may still handle it.
    Ignore(RejectReason),
    /// Send out every up port of the ingress switch except the ingress port.
    Flood(FloodCause),
    /// Install `rule` on the ingress switch, then forward the first packet to `port`.
    InstallAndForward { rule: FlowRule, port: PortId },
    /// Forward to `port` without installing a rule. The engine never emits
    /// this: every unicast decision installs a rule. Hosts that construct
    /// it explicitly get a plain packet-out.
    ForwardOnly(PortId),
    /// Destination not learned and the policy is to drop: no rule, no packet-out.
    UnknownDestination(MacAddress),
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Ignore(reason) => write!(f, "ignore ({})", reason),
            Decision::Flood(FloodCause::Broadcast) => write!(f, "flood (broadcast)"),
            Decision::Flood(FloodCause::UnknownDestination) => {
                write!(f, "flood (unknown destination)")
            }
            Decision::InstallAndForward { port, .. } => write!(f, "install and forward to {}", port),
            Decision::ForwardOnly(port) => write!(f, "forward to {}", port),
            Decision::UnknownDestination(mac) => write!(f, "drop (unknown destination {})", mac),
        }
    }
}

/// Learns source bindings and decides between flood and flow install.
#[derive(Debug, Clone, Copy)]
pub struct ForwardingEngine {
    unknown_destination: UnknownDestinationPolicy,
    flow_ether_type: EtherType,
}

impl Default for ForwardingEngine {
    fn default() -> Self {
        Self::new(UnknownDestinationPolicy::default(), EtherType::IPV4)
    }
}

impl ForwardingEngine {
    pub fn new(unknown_destination: UnknownDestinationPolicy, flow_ether_type: EtherType) -> Self {
        Self {
            unknown_destination,
            flow_ether_type,
        }
    }

    /// Learns `frame.source` on the ingress port, then decides.
    ///
    /// `table` must be the ingress switch's table, locked for the duration
    /// of the packet's handling.
    pub fn decide(&self, table: &mut SwitchMacTable, frame: &ClassifiedFrame) -> Decision {
        debug_assert_eq!(table.switch(), frame.ingress_switch);

        table.learn(frame.source, frame.ingress_port);

        if frame.destination.is_broadcast() {
            return Decision::Flood(FloodCause::Broadcast);
        }

        match table.lookup(frame.destination) {
            Some(port) => Decision::InstallAndForward {
                rule: FlowRule::unicast(self.flow_ether_type, frame.source, frame.destination, port),
                port,
            },
            None => match self.unknown_destination {
                UnknownDestinationPolicy::Flood => Decision::Flood(FloodCause::UnknownDestination),
                UnknownDestinationPolicy::Drop => Decision::UnknownDestination(frame.destination),
            },
        }
    }
}

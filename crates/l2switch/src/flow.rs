//! Flow rule construction and installation.
//!
//! The learning switch installs one rule per learned unicast conversation:
//! match {ether type, exact source MAC, exact destination MAC} and output
//! to the destination's learned port. Rules are built fresh for each
//! qualifying packet and never deduplicated here; a second packet of the
//! same conversation that reaches the controller before the first rule
//! takes effect triggers another install, and the switch is expected to
//! treat an identical add as idempotent.

use crate::error::{L2SwitchError, Result};
use crate::services::FlowProgrammer;
use l2switch_types::{EtherType, MacAddress, PortId, SwitchId};
use std::fmt;
use tracing::{debug, error};

/// Match fields of a learning-switch rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowMatch {
    pub ether_type: EtherType,
    pub source: MacAddress,
    pub destination: MacAddress,
}

/// Flow actions. An output always names its target port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowAction {
    Output(PortId),
}

/// A match plus its action list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowRule {
    pub flow_match: FlowMatch,
    pub actions: Vec<FlowAction>,
}

impl FlowRule {
    /// Builds the unicast rule steering `source -> destination` out of `out_port`.
    pub fn unicast(
        ether_type: EtherType,
        source: MacAddress,
        destination: MacAddress,
        out_port: PortId,
    ) -> Self {
        Self {
            flow_match: FlowMatch {
                ether_type,
                source,
                destination,
            },
            actions: vec![FlowAction::Output(out_port)],
        }
    }

    /// Output ports named by this rule's actions.
    pub fn output_ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.actions.iter().map(|action| match action {
            FlowAction::Output(port) => *port,
        })
    }
}

impl fmt::Display for FlowRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.flow_match;
        write!(
            f,
            "dl_type={} dl_src={} dl_dst={} actions=",
            m.ether_type, m.source, m.destination
        )?;
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match action {
                FlowAction::Output(port) => write!(f, "output:{}", port)?,
            }
        }
        Ok(())
    }
}

/// Submits rules to the flow programmer. No retry: a rejection is returned
/// as [`L2SwitchError::InstallFailure`] and is terminal for the packet.
pub struct FlowInstaller<'a> {
    programmer: &'a dyn FlowProgrammer,
}

impl<'a> FlowInstaller<'a> {
    pub fn new(programmer: &'a dyn FlowProgrammer) -> Self {
        Self { programmer }
    }

    pub fn install(&self, switch: SwitchId, rule: &FlowRule) -> Result<()> {
        match self.programmer.add_flow(switch, rule) {
            Ok(()) => {
                debug!(switch = %switch, flow = %rule, "Setting new flow to the target switch succeeded");
                Ok(())
            }
            Err(reason) => {
                error!(switch = %switch, flow = %rule, reason = %reason, "Setting new flow to the target switch failed");
                Err(L2SwitchError::InstallFailure { switch, reason })
            }
        }
    }
}

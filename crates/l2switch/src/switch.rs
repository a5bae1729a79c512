//! Packet-in handling.
//!
//! [`LearningSwitch::receive_data_packet`] is the host-facing entry point.
//! It runs classification, learning, the forwarding decision and the
//! resulting flow install / packet-out as one unit, and tells the host
//! whether other listeners should still see the packet.
//!
//! # Ordering
//!
//! Everything after classification runs with the ingress switch's learning
//! table locked, so learns and flow installs for one switch happen strictly
//! in lock-acquisition order. Under [`Serialization::Global`] an additional
//! process-wide lock is taken first and held for the whole packet-in.

use crate::classifier::{Classification, FrameClassifier, RejectReason};
use crate::codec::EthernetCodec;
use crate::config::{L2SwitchConfig, Serialization};
use crate::decision::{Decision, FloodCause, ForwardingEngine};
use crate::dispatcher::{FloodReport, PacketDispatcher};
use crate::error::{L2SwitchError, Result};
use crate::fabric::InMemoryFabric;
use crate::flow::FlowInstaller;
use crate::learning::MacLearningTable;
use crate::packet::RawPacket;
use crate::services::{BoundServices, Services};
use crate::stats::{LearningSwitchStats, PacketCounters};
use l2switch_types::{MacAddress, PortId};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Disposition returned to the host for a packet-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketResult {
    /// Not handled here; other listeners should process it.
    Ignored,
    /// Handled here, and other listeners may still act on it.
    KeepProcessing,
    /// Handled here; no other listener sees it.
    Consumed,
}

/// Terminal state of one packet-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOutcome {
    Ignored(RejectReason),
    Flooded { cause: FloodCause, report: FloodReport },
    /// Rule installed and first packet forwarded.
    Installed { port: PortId },
    /// Rule installed but the first-packet forward failed. The rule stays.
    InstalledForwardFailed { port: PortId, reason: String },
    /// Rule rejected; nothing was forwarded.
    InstallFailed { reason: String },
    Forwarded { port: PortId },
    ForwardFailed { port: PortId, reason: String },
    /// Destination unknown under the drop policy. The frame reached the
    /// decision engine, so it is still consumed.
    Dropped(MacAddress),
}

impl PacketOutcome {
    /// Disposition the host sees for this outcome.
    pub fn result(&self) -> PacketResult {
        match self {
            PacketOutcome::Ignored(_) => PacketResult::Ignored,
            PacketOutcome::Flooded { .. } => PacketResult::KeepProcessing,
            PacketOutcome::Installed { .. }
            | PacketOutcome::InstalledForwardFailed { .. }
            | PacketOutcome::InstallFailed { .. }
            | PacketOutcome::Forwarded { .. }
            | PacketOutcome::ForwardFailed { .. }
            | PacketOutcome::Dropped(_) => PacketResult::Consumed,
        }
    }
}

/// The learning switch application.
pub struct LearningSwitch {
    services: Services,
    classifier: FrameClassifier,
    engine: ForwardingEngine,
    table: MacLearningTable,
    serialization: Serialization,
    global: Mutex<()>,
    counters: PacketCounters,
}

impl Default for LearningSwitch {
    fn default() -> Self {
        Self::new(&L2SwitchConfig::default())
    }
}

impl LearningSwitch {
    pub fn new(config: &L2SwitchConfig) -> Self {
        let forwarding = &config.forwarding;
        Self {
            services: Services::new(),
            classifier: FrameClassifier::new(forwarding.filtered_ether_types.iter().copied()),
            engine: ForwardingEngine::new(forwarding.unknown_destination, forwarding.flow_ether_type),
            table: MacLearningTable::new(),
            serialization: config.concurrency.serialization,
            global: Mutex::new(()),
            counters: PacketCounters::default(),
        }
    }

    /// Collaborator bindings; the host sets and unsets services here.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Binds the built-in Ethernet codec and `fabric` as inventory,
    /// transmitter and flow programmer.
    pub fn attach_fabric(&self, fabric: Arc<InMemoryFabric>) {
        self.services.set_packet_codec(Arc::new(EthernetCodec::new()));
        self.services.set_switch_inventory(fabric.clone());
        self.services.set_packet_transmitter(fabric.clone());
        self.services.set_flow_programmer(fabric);
    }

    pub fn learning_table(&self) -> &MacLearningTable {
        &self.table
    }

    pub fn stats(&self) -> LearningSwitchStats {
        self.counters.snapshot()
    }

    /// Handles a packet-in and returns its disposition. Never panics or
    /// propagates: unexpected failures are logged and answered with
    /// [`PacketResult::Ignored`].
    #[instrument(skip_all, fields(ingress = %packet.ingress()))]
    pub fn receive_data_packet(&self, packet: &RawPacket) -> PacketResult {
        info!("PACKET-IN occurred");
        self.counters.record_received();

        match self.process_packet(packet) {
            Ok(outcome) => {
                self.record(&outcome);
                let result = outcome.result();
                debug!(?outcome, ?result, "Packet-in handled");
                result
            }
            Err(e) => self.record_failure(&e),
        }
    }

    /// Counts a failure that escaped the pipeline and answers with
    /// [`PacketResult::Ignored`]. Install and transmit failures are normally
    /// folded into a [`PacketOutcome`]; if one surfaces here it is counted
    /// under its own kind rather than as unexpected.
    fn record_failure(&self, e: &L2SwitchError) -> PacketResult {
        if e.is_unexpected() {
            error!(error = %e, "Unexpected failure while handling packet-in");
            self.counters.record_unexpected_error();
        } else {
            warn!(error = %e, "Packet-in failed");
            match e {
                L2SwitchError::InstallFailure { .. } => self.counters.record_install_failure(),
                L2SwitchError::TransmitFailure { .. } => self.counters.record_transmit_failure(),
                _ => self.counters.record_unexpected_error(),
            }
        }
        self.counters.record_ignored();
        PacketResult::Ignored
    }

    /// Runs the full pipeline for one packet-in and reports its terminal state.
    ///
    /// Does not update counters; [`receive_data_packet`](Self::receive_data_packet) does.
    pub fn process_packet(&self, packet: &RawPacket) -> Result<PacketOutcome> {
        let services = self.services.bound()?;
        let _global = self.global_guard();

        let frame = match self.classifier.classify(services.codec.as_ref(), packet)? {
            Classification::Frame(frame) => frame,
            Classification::Rejected(reason) => {
                return self.execute(&services, Decision::Ignore(reason), packet);
            }
        };

        let table = self.table.switch_table(frame.ingress_switch);
        let mut table = table.lock();

        let decision = self.engine.decide(&mut table, &frame);
        debug!(
            switch = %frame.ingress_switch,
            src = %frame.source,
            dst = %frame.destination,
            %decision,
            "Forwarding decision made"
        );

        self.execute(&services, decision, &frame.packet)
    }

    /// Carries out a decision made outside the engine for `packet`, under
    /// the same locks a packet-in would take. Learning is not performed and
    /// no sub-table is created for a switch not seen yet.
    pub fn apply_decision(&self, decision: Decision, packet: &RawPacket) -> Result<PacketOutcome> {
        let services = self.services.bound()?;
        let _global = self.global_guard();

        let table = self.table.existing_table(packet.ingress_switch());
        let _table = table.as_ref().map(|t| t.lock());

        let outcome = self.execute(&services, decision, packet)?;
        self.record(&outcome);
        Ok(outcome)
    }

    fn global_guard(&self) -> Option<parking_lot::MutexGuard<'_, ()>> {
        match self.serialization {
            Serialization::Global => Some(self.global.lock()),
            Serialization::PerSwitch => None,
        }
    }

    fn execute(
        &self,
        services: &BoundServices,
        decision: Decision,
        packet: &RawPacket,
    ) -> Result<PacketOutcome> {
        let dispatcher = PacketDispatcher::new(services.transmitter.as_ref(), services.inventory.as_ref());

        match decision {
            Decision::Ignore(reason) => Ok(PacketOutcome::Ignored(reason)),
            Decision::Flood(cause) => {
                let report = dispatcher.flood(packet)?;
                Ok(PacketOutcome::Flooded { cause, report })
            }
            Decision::InstallAndForward { rule, port } => {
                let installer = FlowInstaller::new(services.programmer.as_ref());
                match installer.install(packet.ingress_switch(), &rule) {
                    Ok(()) => {}
                    Err(L2SwitchError::InstallFailure { reason, .. }) => {
                        return Ok(PacketOutcome::InstallFailed { reason });
                    }
                    Err(e) => return Err(e),
                }
                match dispatcher.forward(port, packet) {
                    Ok(()) => Ok(PacketOutcome::Installed { port }),
                    Err(L2SwitchError::TransmitFailure { port, reason }) => {
                        warn!(port = %port, reason = %reason, "First-packet forward failed after flow install");
                        Ok(PacketOutcome::InstalledForwardFailed { port, reason })
                    }
                    Err(e) => Err(e),
                }
            }
            Decision::ForwardOnly(port) => match dispatcher.forward(port, packet) {
                Ok(()) => Ok(PacketOutcome::Forwarded { port }),
                Err(L2SwitchError::TransmitFailure { port, reason }) => {
                    warn!(port = %port, reason = %reason, "Forward failed");
                    Ok(PacketOutcome::ForwardFailed { port, reason })
                }
                Err(e) => Err(e),
            },
            Decision::UnknownDestination(mac) => {
                debug!(dst = %mac, "Destination unknown, dropping");
                Ok(PacketOutcome::Dropped(mac))
            }
        }
    }

    fn record(&self, outcome: &PacketOutcome) {
        let c = &self.counters;
        match outcome {
            PacketOutcome::Ignored(_) => c.record_ignored(),
            PacketOutcome::Flooded { cause, report } => {
                c.record_flooded(report.failed.len());
                if *cause == FloodCause::UnknownDestination {
                    c.record_unknown_destination();
                }
            }
            PacketOutcome::Installed { .. } => {
                c.record_consumed();
                c.record_flow_installed();
            }
            PacketOutcome::InstalledForwardFailed { .. } => {
                c.record_consumed();
                c.record_flow_installed();
                c.record_transmit_failure();
            }
            PacketOutcome::InstallFailed { .. } => {
                c.record_consumed();
                c.record_install_failure();
            }
            PacketOutcome::Forwarded { .. } => c.record_consumed(),
            PacketOutcome::ForwardFailed { .. } => {
                c.record_consumed();
                c.record_transmit_failure();
            }
            PacketOutcome::Dropped(_) => {
                c.record_consumed();
                c.record_unknown_destination();
            }
        }
    }
}

//! Packet-in counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter, updated without locking.
#[derive(Debug, Default)]
struct Counter(AtomicU64);

impl Counter {
    fn inc(&self) {
        self.add(1);
    }

    fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Live packet-in counters of a learning switch.
#[derive(Debug, Default)]
pub struct PacketCounters {
    received: Counter,
    ignored: Counter,
    flooded: Counter,
    consumed: Counter,
    flows_installed: Counter,
    install_failures: Counter,
    transmit_failures: Counter,
    unknown_destinations: Counter,
    unexpected_errors: Counter,
}

impl PacketCounters {
    /// Record a packet-in entering the handler
    pub fn record_received(&self) {
        self.received.inc();
    }

    pub fn record_ignored(&self) {
        self.ignored.inc();
    }

    /// Record a flood; `failed_ports` packet-outs of it did not go out
    pub fn record_flooded(&self, failed_ports: usize) {
        self.flooded.inc();
        self.transmit_failures.add(failed_ports as u64);
    }

    pub fn record_consumed(&self) {
        self.consumed.inc();
    }

    pub fn record_flow_installed(&self) {
        self.flows_installed.inc();
    }

    pub fn record_install_failure(&self) {
        self.install_failures.inc();
    }

    pub fn record_transmit_failure(&self) {
        self.transmit_failures.inc();
    }

    pub fn record_unknown_destination(&self) {
        self.unknown_destinations.inc();
    }

    pub fn record_unexpected_error(&self) {
        self.unexpected_errors.inc();
    }

    pub fn snapshot(&self) -> LearningSwitchStats {
        LearningSwitchStats {
            packets_received: self.received.get(),
            packets_ignored: self.ignored.get(),
            packets_flooded: self.flooded.get(),
            packets_consumed: self.consumed.get(),
            flows_installed: self.flows_installed.get(),
            install_failures: self.install_failures.get(),
            transmit_failures: self.transmit_failures.get(),
            unknown_destinations: self.unknown_destinations.get(),
            unexpected_errors: self.unexpected_errors.get(),
        }
    }
}

/// Point-in-time copy of [`PacketCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearningSwitchStats {
    pub packets_received: u64,
    pub packets_ignored: u64,
    pub packets_flooded: u64,
    pub packets_consumed: u64,
    pub flows_installed: u64,
    pub install_failures: u64,
    pub transmit_failures: u64,
    pub unknown_destinations: u64,
    pub unexpected_errors: u64,
}

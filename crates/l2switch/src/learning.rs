//! MAC learning table.
//!
//! One sub-table per switch maps a MAC address to the port it was last seen
//! on. Sub-tables are created on first sighting of a switch and are never
//! removed; entries never expire.
//!
//! # Concurrency
//!
//! Each sub-table sits behind its own mutex. The packet-in handler holds
//! that mutex for the whole learn/decide/install/forward sequence, so all
//! operations affecting one switch are strictly ordered by lock acquisition
//! while different switches proceed in parallel.

use dashmap::DashMap;
use l2switch_types::{MacAddress, PortId, SwitchId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// What a [`SwitchMacTable::learn`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnOutcome {
    /// First sighting of the MAC on this switch.
    Registered,
    /// The MAC was bound to another port and now points at the new one.
    Moved { previous: PortId },
    /// Already bound to this port.
    Unchanged,
}

#[derive(Debug, Default)]
struct LearningCounters {
    tables_created: AtomicU64,
    entries_registered: AtomicU64,
    entries_moved: AtomicU64,
}

/// Snapshot of learning table activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearningStats {
    pub tables_created: u64,
    pub entries_registered: u64,
    pub entries_moved: u64,
}

/// MAC-to-port bindings of a single switch.
#[derive(Debug)]
pub struct SwitchMacTable {
    switch: SwitchId,
    entries: HashMap<MacAddress, PortId>,
    counters: Arc<LearningCounters>,
}

impl SwitchMacTable {
    fn new(switch: SwitchId, counters: Arc<LearningCounters>) -> Self {
        Self {
            switch,
            entries: HashMap::new(),
            counters,
        }
    }

    pub fn switch(&self) -> SwitchId {
        self.switch
    }

    /// Binds `mac` to `port`, last writer wins.
    pub fn learn(&mut self, mac: MacAddress, port: PortId) -> LearnOutcome {
        debug_assert_eq!(port.switch(), self.switch, "port belongs to another switch");

        match self.entries.insert(mac, port) {
            None => {
                self.counters.entries_registered.fetch_add(1, Ordering::Relaxed);
                info!(switch = %self.switch, mac = %mac, port = %port, "MAC binding registered");
                LearnOutcome::Registered
            }
            Some(previous) if previous != port => {
                self.counters.entries_moved.fetch_add(1, Ordering::Relaxed);
                info!(
                    switch = %self.switch,
                    mac = %mac,
                    port = %port,
                    previous = %previous,
                    "MAC binding updated"
                );
                LearnOutcome::Moved { previous }
            }
            Some(_) => LearnOutcome::Unchanged,
        }
    }

    pub fn lookup(&self, mac: MacAddress) -> Option<PortId> {
        self.entries.get(&mac).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bindings ordered by MAC address.
    pub fn entries(&self) -> Vec<(MacAddress, PortId)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(m, p)| (*m, *p)).collect();
        entries.sort();
        entries
    }
}

/// Per-switch MAC learning tables.
#[derive(Debug, Default)]
pub struct MacLearningTable {
    tables: DashMap<SwitchId, Arc<Mutex<SwitchMacTable>>>,
    counters: Arc<LearningCounters>,
}

impl MacLearningTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sub-table for `switch`, creating it on first sighting.
    pub fn switch_table(&self, switch: SwitchId) -> Arc<Mutex<SwitchMacTable>> {
        if let Some(table) = self.tables.get(&switch) {
            return Arc::clone(table.value());
        }

        let entry = self.tables.entry(switch).or_insert_with(|| {
            self.counters.tables_created.fetch_add(1, Ordering::Relaxed);
            info!(switch = %switch, "New MAC learning table created");
            Arc::new(Mutex::new(SwitchMacTable::new(
                switch,
                Arc::clone(&self.counters),
            )))
        });
        Arc::clone(entry.value())
    }

    /// Returns the sub-table for `switch` if it has been seen.
    pub fn existing_table(&self, switch: SwitchId) -> Option<Arc<Mutex<SwitchMacTable>>> {
        self.tables.get(&switch).map(|t| Arc::clone(t.value()))
    }

    /// Learns `mac` on `port` under the port's switch lock.
    pub fn learn(&self, mac: MacAddress, port: PortId) -> LearnOutcome {
        let table = self.switch_table(port.switch());
        let mut table = table.lock();
        table.learn(mac, port)
    }

    /// Looks up `mac` on `switch` without creating a sub-table.
    pub fn lookup(&self, switch: SwitchId, mac: MacAddress) -> Option<PortId> {
        let table = self.existing_table(switch)?;
        let table = table.lock();
        table.lookup(mac)
    }

    /// Number of switches with a sub-table.
    pub fn switch_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of bindings on `switch` (zero if never seen).
    pub fn entry_count(&self, switch: SwitchId) -> usize {
        self.existing_table(switch).map_or(0, |t| t.lock().len())
    }

    /// Switches with a sub-table, in ascending order.
    pub fn switches(&self) -> Vec<SwitchId> {
        let mut switches: Vec<_> = self.tables.iter().map(|t| *t.key()).collect();
        switches.sort();
        switches
    }

    /// Bindings of `switch` ordered by MAC address.
    pub fn entries(&self, switch: SwitchId) -> Vec<(MacAddress, PortId)> {
        self.existing_table(switch)
            .map_or_else(Vec::new, |t| t.lock().entries())
    }

    pub fn stats(&self) -> LearningStats {
        LearningStats {
            tables_created: self.counters.tables_created.load(Ordering::Relaxed),
            entries_registered: self.counters.entries_registered.load(Ordering::Relaxed),
            entries_moved: self.counters.entries_moved.load(Ordering::Relaxed),
        }
    }
}

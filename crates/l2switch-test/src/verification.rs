//! Verification helpers for learning switch tests
//!
//! Provides assertion helpers over the fabric's recorded packet-outs and
//! flows and over the learning table

use l2switch::{FlowRule, InMemoryFabric, MacLearningTable};
use l2switch_types::{EtherType, MacAddress, PortId, SwitchId};
use thiserror::Error;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected flow {expected} on {switch}, installed: {installed:?}")]
    FlowNotFound {
        switch: SwitchId,
        expected: String,
        installed: Vec<String>,
    },

    #[error("Expected {expected} flows, found {actual}")]
    FlowCountMismatch { expected: usize, actual: usize },

    #[error("Expected packet-outs on {expected:?}, got {actual:?}")]
    TransmitMismatch {
        expected: Vec<PortId>,
        actual: Vec<PortId>,
    },

    #[error("Expected {mac} on {expected:?} in the table of {switch}, found {actual:?}")]
    BindingMismatch {
        switch: SwitchId,
        mac: MacAddress,
        expected: Option<PortId>,
        actual: Option<PortId>,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Fabric-side verification helper
pub struct FabricVerifier<'a> {
    fabric: &'a InMemoryFabric,
}

impl<'a> FabricVerifier<'a> {
    pub fn new(fabric: &'a InMemoryFabric) -> Self {
        Self { fabric }
    }

    /// Verify that the IPv4 unicast rule `src -> dst : output port` was
    /// installed on `switch`
    pub fn assert_unicast_flow(
        &self,
        switch: SwitchId,
        src: MacAddress,
        dst: MacAddress,
        port: PortId,
    ) -> VerifyResult<()> {
        let expected = FlowRule::unicast(EtherType::IPV4, src, dst, port);
        let installed = self.fabric.installed_flows_on(switch);
        if installed.contains(&expected) {
            return Ok(());
        }
        Err(VerificationError::FlowNotFound {
            switch,
            expected: expected.to_string(),
            installed: installed.iter().map(ToString::to_string).collect(),
        })
    }

    /// Verify the total number of installed flows across all switches
    pub fn assert_flow_count(&self, expected: usize) -> VerifyResult<()> {
        let actual = self.fabric.installed_flows().len();
        if actual != expected {
            return Err(VerificationError::FlowCountMismatch { expected, actual });
        }
        Ok(())
    }

    /// Verify the egress ports of all packet-outs, in submission order
    pub fn assert_transmitted(&self, expected: &[PortId]) -> VerifyResult<()> {
        let actual = self.fabric.transmitted_ports();
        if actual != expected {
            return Err(VerificationError::TransmitMismatch {
                expected: expected.to_vec(),
                actual,
            });
        }
        Ok(())
    }

    /// Verify the set of packet-out egress ports, ignoring order
    pub fn assert_transmitted_unordered(&self, expected: &[PortId]) -> VerifyResult<()> {
        let mut actual = self.fabric.transmitted_ports();
        let mut wanted = expected.to_vec();
        actual.sort();
        wanted.sort();
        if actual != wanted {
            return Err(VerificationError::TransmitMismatch {
                expected: wanted,
                actual,
            });
        }
        Ok(())
    }

    pub fn assert_nothing_sent(&self) -> VerifyResult<()> {
        self.assert_transmitted(&[])
    }
}

/// Learning-table verification helper
pub struct TableVerifier<'a> {
    table: &'a MacLearningTable,
}

impl<'a> TableVerifier<'a> {
    pub fn new(table: &'a MacLearningTable) -> Self {
        Self { table }
    }

    /// Verify that `mac` is bound to `expected` (or unbound when `None`)
    pub fn assert_binding(
        &self,
        switch: SwitchId,
        mac: MacAddress,
        expected: Option<PortId>,
    ) -> VerifyResult<()> {
        let actual = self.table.lookup(switch, mac);
        if actual != expected {
            return Err(VerificationError::BindingMismatch {
                switch,
                mac,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

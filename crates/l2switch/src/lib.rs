//! L2 MAC-learning switch for an SDN controller.
//!
//! Reacts to packet-in notifications from managed switches, learns which
//! port leads to which MAC address, and for each packet either floods it,
//! or installs a unicast flow rule on the switch and forwards the first
//! packet itself.
//!
//! # Architecture
//!
//! ```text
//! packet-in
//!     │
//!     ▼
//! ┌──────────────────┐  not Ethernet / filtered type
//! │ FrameClassifier  │────────────────────────────────▶ Ignored
//! └────────┬─────────┘
//!          │  (ingress switch table locked from here on)
//!          ▼
//! ┌──────────────────┐      ┌─────────────────────┐
//! │ ForwardingEngine │◀────▶│ MacLearningTable    │
//! └────────┬─────────┘      │  switch → mac → port│
//!          │                └─────────────────────┘
//!    ┌─────┴────────────┐
//!    ▼                  ▼
//! broadcast /      known destination
//! unknown dst           │
//!    │                  ▼
//!    │          ┌───────────────┐   rejected
//!    │          │ FlowInstaller │──────────────▶ Consumed
//!    │          └───────┬───────┘
//!    ▼                  ▼
//! ┌─────────────────────────────┐
//! │ PacketDispatcher            │
//! │ flood ─▶ KeepProcessing     │
//! │ forward ─▶ Consumed         │
//! └─────────────────────────────┘
//! ```
//!
//! External collaborators (codec, inventory, transmitter, flow programmer)
//! are traits bound at runtime through [`Services`].

pub mod classifier;
pub mod codec;
pub mod config;
pub mod decision;
pub mod dispatcher;
pub mod error;
pub mod fabric;
pub mod flow;
pub mod learning;
pub mod packet;
pub mod scenario;
pub mod services;
pub mod stats;
pub mod switch;

pub use classifier::{Classification, ClassifiedFrame, FrameClassifier, RejectReason};
pub use codec::EthernetCodec;
pub use config::{L2SwitchConfig, Serialization, UnknownDestinationPolicy};
pub use decision::{Decision, FloodCause, ForwardingEngine};
pub use dispatcher::{FloodReport, PacketDispatcher};
pub use error::{L2SwitchError, Result};
pub use fabric::InMemoryFabric;
pub use flow::{FlowAction, FlowInstaller, FlowMatch, FlowRule};
pub use learning::{LearnOutcome, LearningStats, MacLearningTable, SwitchMacTable};
pub use packet::{DecodedPacket, EthernetFrame, RawPacket};
pub use scenario::{PacketSpec, Scenario, SwitchSpec};
pub use services::{
    BoundServices, FlowProgrammer, PacketCodec, PacketTransmitter, Services, SwitchInventory,
};
pub use stats::{LearningSwitchStats, PacketCounters};
pub use switch::{LearningSwitch, PacketOutcome, PacketResult};

pub use l2switch_types::{EtherType, MacAddress, PortId, PortState, SwitchId};

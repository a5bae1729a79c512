//! End-to-end packet-in tests
//!
//! Drives a learning switch wired to an in-memory fabric and checks the
//! disposition, flow installs and packet-outs of each scenario.

use l2switch::{
    Decision, L2SwitchConfig, PacketOutcome, PacketResult, RejectReason, UnknownDestinationPolicy,
};
use l2switch_test::hosts::{HOST_A, HOST_B, HOST_C};
use l2switch_test::{FabricVerifier, FrameBuilder, TableVerifier, TestBed, mac, port};
use l2switch_types::{EtherType, MacAddress, PortState, SwitchId};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const S1: SwitchId = SwitchId::new(1);

/// Four-port switch with HOST_B already learned on P2.
fn bed_with_host_b() -> TestBed {
    let bed = TestBed::new().with_switch(1, [1, 2, 3, 4]);
    bed.switch
        .learning_table()
        .learn(mac(HOST_B), port(1, 2));
    bed
}

/// Scenario:
/// 1. HOST_B is known on S1/P2
/// 2. HOST_A sends an IPv4 frame to HOST_B on S1/P1
/// 3. One rule A->B output P2 is installed, the packet goes out P2 only
#[test]
fn test_unicast_to_learned_destination() {
    let bed = bed_with_host_b();
    let packet = FrameBuilder::new(HOST_A, HOST_B).arrive_on(port(1, 1));

    let result = bed.switch.receive_data_packet(&packet);

    assert_eq!(result, PacketResult::Consumed);
    let fabric = FabricVerifier::new(&bed.fabric);
    fabric
        .assert_unicast_flow(S1, mac(HOST_A), mac(HOST_B), port(1, 2))
        .unwrap();
    fabric.assert_flow_count(1).unwrap();
    fabric.assert_transmitted(&[port(1, 2)]).unwrap();

    let table = TableVerifier::new(bed.switch.learning_table());
    table.assert_binding(S1, mac(HOST_A), Some(port(1, 1))).unwrap();
    table.assert_binding(S1, mac(HOST_B), Some(port(1, 2))).unwrap();
    assert_eq!(bed.switch.learning_table().entry_count(S1), 2);

    // the forwarded copy is the original frame
    let sent = bed.fabric.transmitted();
    assert_eq!(sent[0].payload(), packet.payload());
    assert_eq!(sent[0].ingress(), port(1, 1));
}

/// Scenario: same as above but the destination is broadcast
#[test]
fn test_broadcast_floods_all_up_ports_but_ingress() {
    let bed = bed_with_host_b();
    let packet = FrameBuilder::new(HOST_A, MacAddress::BROADCAST.to_u64()).arrive_on(port(1, 1));

    let result = bed.switch.receive_data_packet(&packet);

    assert_eq!(result, PacketResult::KeepProcessing);
    let fabric = FabricVerifier::new(&bed.fabric);
    fabric.assert_flow_count(0).unwrap();
    fabric
        .assert_transmitted_unordered(&[port(1, 2), port(1, 3), port(1, 4)])
        .unwrap();
    TableVerifier::new(bed.switch.learning_table())
        .assert_binding(S1, mac(HOST_A), Some(port(1, 1)))
        .unwrap();
}

#[test]
fn test_flood_skips_down_ports() {
    let bed = TestBed::new().with_switch(1, [1, 2, 3]);
    bed.fabric.set_port(port(1, 3), PortState::Down);

    let result = bed
        .switch
        .receive_data_packet(&FrameBuilder::broadcast(HOST_C).arrive_on(port(1, 2)));

    assert_eq!(result, PacketResult::KeepProcessing);
    FabricVerifier::new(&bed.fabric)
        .assert_transmitted(&[port(1, 1)])
        .unwrap();
}

#[test]
fn test_install_failure_consumes_without_forward() {
    let bed = bed_with_host_b();
    bed.fabric.fail_installs_on(S1);
    let before = bed.switch.learning_table().entries(S1);

    let outcome = bed
        .switch
        .process_packet(&FrameBuilder::new(HOST_B, HOST_B).arrive_on(port(1, 2)))
        .unwrap();

    assert!(matches!(outcome, PacketOutcome::InstallFailed { .. }));
    assert_eq!(outcome.result(), PacketResult::Consumed);
    FabricVerifier::new(&bed.fabric).assert_nothing_sent().unwrap();
    assert_eq!(bed.switch.learning_table().entries(S1), before);
}

#[test]
fn test_install_failure_counted() {
    let bed = bed_with_host_b();
    bed.fabric.fail_installs_on(S1);

    let result = bed
        .switch
        .receive_data_packet(&FrameBuilder::new(HOST_A, HOST_B).arrive_on(port(1, 1)));

    assert_eq!(result, PacketResult::Consumed);
    let stats = bed.switch.stats();
    assert_eq!(stats.install_failures, 1);
    assert_eq!(stats.flows_installed, 0);
    assert_eq!(stats.packets_consumed, 1);
    FabricVerifier::new(&bed.fabric).assert_nothing_sent().unwrap();
    // learning happens before the install attempt and is not rolled back
    TableVerifier::new(bed.switch.learning_table())
        .assert_binding(S1, mac(HOST_A), Some(port(1, 1)))
        .unwrap();
}

#[test]
fn test_forward_failure_keeps_installed_flow() {
    let bed = bed_with_host_b();
    bed.fabric.fail_transmits_on(port(1, 2));

    let outcome = bed
        .switch
        .process_packet(&FrameBuilder::new(HOST_A, HOST_B).arrive_on(port(1, 1)))
        .unwrap();

    assert!(matches!(
        outcome,
        PacketOutcome::InstalledForwardFailed { port: p, .. } if p == port(1, 2)
    ));
    assert_eq!(outcome.result(), PacketResult::Consumed);
    FabricVerifier::new(&bed.fabric).assert_flow_count(1).unwrap();
}

#[test]
fn test_flood_continues_past_failed_port() {
    let bed = TestBed::new().with_switch(1, [1, 2, 3, 4]);
    bed.fabric.fail_transmits_on(port(1, 3));

    let result = bed
        .switch
        .receive_data_packet(&FrameBuilder::broadcast(HOST_A).arrive_on(port(1, 1)));

    assert_eq!(result, PacketResult::KeepProcessing);
    FabricVerifier::new(&bed.fabric)
        .assert_transmitted(&[port(1, 2), port(1, 4)])
        .unwrap();
    assert_eq!(bed.switch.stats().transmit_failures, 1);
}

#[test]
fn test_filtered_ether_types_never_touch_table() {
    let bed = bed_with_host_b();

    for ether_type in [EtherType::LLDP, EtherType::IPV6] {
        let packet = FrameBuilder::new(HOST_A, HOST_B)
            .ether_type(ether_type)
            .arrive_on(port(1, 1));
        let outcome = bed.switch.process_packet(&packet).unwrap();
        assert_eq!(
            outcome,
            PacketOutcome::Ignored(RejectReason::FilteredType(ether_type))
        );
    }

    FabricVerifier::new(&bed.fabric).assert_nothing_sent().unwrap();
    FabricVerifier::new(&bed.fabric).assert_flow_count(0).unwrap();
    TableVerifier::new(bed.switch.learning_table())
        .assert_binding(S1, mac(HOST_A), None)
        .unwrap();
    assert_eq!(bed.switch.learning_table().entry_count(S1), 1);
}

#[test]
fn test_filtered_frame_from_new_switch_creates_no_table() {
    let bed = TestBed::new().with_switch(7, [1, 2]);

    let result = bed.switch.receive_data_packet(
        &FrameBuilder::new(HOST_A, HOST_B)
            .ether_type(EtherType::LLDP)
            .arrive_on(port(7, 1)),
    );

    assert_eq!(result, PacketResult::Ignored);
    assert_eq!(bed.switch.learning_table().switch_count(), 0);
}

#[test]
fn test_non_ethernet_payload_ignored() {
    let bed = TestBed::new().with_switch(1, [1, 2]);
    let runt = l2switch::RawPacket::new(port(1, 1), vec![0x00, 0x11, 0x22]);

    let outcome = bed.switch.process_packet(&runt).unwrap();

    assert_eq!(outcome, PacketOutcome::Ignored(RejectReason::NotEthernet));
    assert_eq!(bed.switch.learning_table().switch_count(), 0);
}

#[test]
fn test_tagged_frame_is_classified_by_inner_type() {
    let bed = bed_with_host_b();

    let result = bed.switch.receive_data_packet(
        &FrameBuilder::new(HOST_A, HOST_B)
            .vlan(100)
            .arrive_on(port(1, 1)),
    );

    assert_eq!(result, PacketResult::Consumed);
    FabricVerifier::new(&bed.fabric).assert_flow_count(1).unwrap();
}

#[test]
fn test_unknown_destination_flooded_by_default() {
    let bed = TestBed::new().with_switch(1, [1, 2, 3]);

    let outcome = bed
        .switch
        .process_packet(&FrameBuilder::new(HOST_A, HOST_C).arrive_on(port(1, 1)))
        .unwrap();

    assert_eq!(outcome.result(), PacketResult::KeepProcessing);
    FabricVerifier::new(&bed.fabric).assert_flow_count(0).unwrap();
    FabricVerifier::new(&bed.fabric)
        .assert_transmitted(&[port(1, 2), port(1, 3)])
        .unwrap();
}

#[test]
fn test_unknown_destination_drop_policy() {
    let mut config = L2SwitchConfig::default();
    config.forwarding.unknown_destination = UnknownDestinationPolicy::Drop;
    let bed = TestBed::with_config(&config).with_switch(1, [1, 2, 3]);

    let result = bed
        .switch
        .receive_data_packet(&FrameBuilder::new(HOST_A, HOST_C).arrive_on(port(1, 1)));

    // a recognized frame that reaches the decision engine is consumed
    // unless it is flooded
    assert_eq!(result, PacketResult::Consumed);
    assert_eq!(bed.switch.stats().packets_consumed, 1);
    let fabric = FabricVerifier::new(&bed.fabric);
    fabric.assert_flow_count(0).unwrap();
    fabric.assert_nothing_sent().unwrap();
    assert_eq!(bed.switch.stats().unknown_destinations, 1);
    // the source is still learned
    TableVerifier::new(bed.switch.learning_table())
        .assert_binding(S1, mac(HOST_A), Some(port(1, 1)))
        .unwrap();
}

#[test]
fn test_reply_installs_reverse_flow() {
    let bed = TestBed::new().with_switch(1, [1, 2, 3]);

    // A broadcasts, B answers A, A then reaches B
    bed.switch
        .receive_data_packet(&FrameBuilder::broadcast(HOST_A).arrive_on(port(1, 1)));
    let reply = bed
        .switch
        .receive_data_packet(&FrameBuilder::new(HOST_B, HOST_A).arrive_on(port(1, 2)));
    let forward = bed
        .switch
        .receive_data_packet(&FrameBuilder::new(HOST_A, HOST_B).arrive_on(port(1, 1)));

    assert_eq!(reply, PacketResult::Consumed);
    assert_eq!(forward, PacketResult::Consumed);
    let fabric = FabricVerifier::new(&bed.fabric);
    fabric
        .assert_unicast_flow(S1, mac(HOST_B), mac(HOST_A), port(1, 1))
        .unwrap();
    fabric
        .assert_unicast_flow(S1, mac(HOST_A), mac(HOST_B), port(1, 2))
        .unwrap();
    fabric.assert_flow_count(2).unwrap();
}

#[test]
fn test_flow_match_is_ipv4_for_arp_unicast() {
    let bed = bed_with_host_b();

    bed.switch.receive_data_packet(
        &FrameBuilder::new(HOST_A, HOST_B)
            .ether_type(EtherType::ARP)
            .arrive_on(port(1, 1)),
    );

    let flows = bed.fabric.installed_flows_on(S1);
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].flow_match.ether_type, EtherType::IPV4);
}

#[test]
fn test_switches_keep_separate_tables() {
    let bed = TestBed::new().with_switch(1, [1, 2]).with_switch(2, [1, 2]);

    bed.switch
        .receive_data_packet(&FrameBuilder::broadcast(HOST_B).arrive_on(port(1, 2)));
    let result = bed
        .switch
        .receive_data_packet(&FrameBuilder::new(HOST_A, HOST_B).arrive_on(port(2, 1)));

    // HOST_B is unknown on S2, so the frame is flooded there
    assert_eq!(result, PacketResult::KeepProcessing);
    FabricVerifier::new(&bed.fabric).assert_flow_count(0).unwrap();
    assert_eq!(bed.switch.learning_table().switches(), vec![S1, SwitchId::new(2)]);
}

#[test]
fn test_unbound_service_ignores_packet() {
    let bed = bed_with_host_b();
    let programmer: Arc<dyn l2switch::FlowProgrammer> = bed.fabric.clone();
    assert!(bed.switch.services().unset_flow_programmer(&programmer));

    let result = bed
        .switch
        .receive_data_packet(&FrameBuilder::new(HOST_A, HOST_B).arrive_on(port(1, 1)));

    assert_eq!(result, PacketResult::Ignored);
    assert_eq!(bed.switch.stats().unexpected_errors, 1);
    FabricVerifier::new(&bed.fabric).assert_nothing_sent().unwrap();
    // nothing was learned either
    TableVerifier::new(bed.switch.learning_table())
        .assert_binding(S1, mac(HOST_A), None)
        .unwrap();
}

#[test]
fn test_unset_of_replaced_service_is_noop() {
    let bed = TestBed::new().with_switch(1, [1, 2]);
    let stale: Arc<dyn l2switch::FlowProgrammer> = Arc::new(l2switch::InMemoryFabric::new());

    assert!(!bed.switch.services().unset_flow_programmer(&stale));
    assert!(bed.switch.services().bound().is_ok());
}

#[test]
fn test_unknown_switch_inventory_failure_ignores() {
    let bed = TestBed::new().with_switch(1, [1, 2]);

    // switch 9 is not in the inventory, so flooding cannot enumerate ports
    let result = bed
        .switch
        .receive_data_packet(&FrameBuilder::broadcast(HOST_A).arrive_on(port(9, 1)));

    assert_eq!(result, PacketResult::Ignored);
    assert_eq!(bed.switch.stats().unexpected_errors, 1);
}

#[test]
fn test_explicit_forward_only_decision() {
    let bed = TestBed::new().with_switch(1, [1, 2, 3]);
    let packet = FrameBuilder::new(HOST_A, HOST_B).arrive_on(port(1, 1));

    let outcome = bed
        .switch
        .apply_decision(Decision::ForwardOnly(port(1, 3)), &packet)
        .unwrap();

    assert_eq!(outcome.result(), PacketResult::Consumed);
    FabricVerifier::new(&bed.fabric).assert_flow_count(0).unwrap();
    FabricVerifier::new(&bed.fabric)
        .assert_transmitted(&[port(1, 3)])
        .unwrap();
}

#[test]
fn test_explicit_decision_on_unseen_switch_creates_no_table() {
    let bed = TestBed::new().with_switch(5, [1, 2]);
    let packet = FrameBuilder::new(HOST_A, HOST_B).arrive_on(port(5, 1));

    bed.switch
        .apply_decision(Decision::ForwardOnly(port(5, 2)), &packet)
        .unwrap();

    let table = bed.switch.learning_table();
    assert_eq!(table.switch_count(), 0);
    assert_eq!(table.stats().tables_created, 0);
}

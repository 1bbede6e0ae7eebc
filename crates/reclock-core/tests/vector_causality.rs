//! Vector-clock causality: concurrent advancement, convergence, and the
//! strict-partial-order laws of happens-before.

use reclock_core::crypto::hash;
use reclock_core::prelude::*;

fn node(name: &str) -> NodeId {
    NodeId::new(name.as_bytes()).unwrap()
}

fn vector_uuid(parts: &[&[u8; 32]]) -> [u8; 32] {
    let mut input = Vec::new();
    for part in parts {
        input.extend_from_slice(*part);
    }
    hash::digest(&input)
}

#[test]
fn concurrent_advancements_converge() {
    // Two nodes with lifetimes 1 and 3, one vector replica per owner.
    let updater0 = HashClockUpdater::from_seed(&[0xA0u8; 16], 1).unwrap();
    let updater1 = HashClockUpdater::from_seed(&[0xA1u8; 16], 3).unwrap();
    let uuid = vector_uuid(&[updater0.uuid(), updater1.uuid()]);
    let (node0, node1) = (node("node0"), node("node1"));

    let mut replica_a = VectorHashClock::setup(uuid, [node0.clone(), node1.clone()]).unwrap();
    let mut replica_b = replica_a.clone();

    // Both nodes initialize at time 0 and the updates reach both replicas.
    let init0 = replica_a
        .advance(&node0, updater0.advance(0).unwrap())
        .unwrap();
    let init1 = replica_b
        .advance(&node1, updater1.advance(0).unwrap())
        .unwrap();
    for replica in [&mut replica_a, &mut replica_b] {
        replica.update(&init0).unwrap();
        replica.update(&init1).unwrap();
    }
    let initial = replica_a.read();
    assert_eq!(initial, replica_b.read());

    // Each node advances to 1 independently: the updates are concurrent.
    let from_node0 = replica_a
        .advance(&node0, updater0.advance(1).unwrap())
        .unwrap();
    let from_node1 = replica_b
        .advance(&node1, updater1.advance(1).unwrap())
        .unwrap();
    assert!(from_node0.are_concurrent(&from_node1));
    assert!(VectorHashClock::are_concurrent(&from_node0, &from_node1));
    assert!(!from_node0.happens_before(&from_node1));
    assert!(!from_node1.happens_before(&from_node0));

    // After both replicas fold both updates their timestamps are equal,
    // and the initial snapshot happens-before the final one.
    replica_a.update(&from_node0).unwrap();
    replica_a.update(&from_node1).unwrap();
    replica_b.update(&from_node1).unwrap();
    replica_b.update(&from_node0).unwrap();

    let final_a = replica_a.read();
    let final_b = replica_b.read();
    assert_eq!(final_a, final_b);
    assert!(initial.happens_before(&final_a));
    assert!(VectorHashClock::happens_before(&initial, &final_a));
    assert!(!final_a.are_concurrent(&final_b));

    // node0 hit its lifetime; its sub-clock has terminated.
    assert!(replica_a.node_clock(&node0).unwrap().verify());
    assert_eq!(replica_a.node_clock(&node0).unwrap().time(), 1);
    assert!(replica_a.verify());
}

#[test]
fn happens_before_is_a_strict_partial_order() {
    let updater0 = HashClockUpdater::from_seed(&[0xB0u8; 16], 6).unwrap();
    let updater1 = HashClockUpdater::from_seed(&[0xB1u8; 16], 6).unwrap();
    let uuid = vector_uuid(&[updater0.uuid(), updater1.uuid()]);
    let (node0, node1) = (node("n0"), node("n1"));
    let mut vector = VectorHashClock::setup(uuid, [node0.clone(), node1.clone()]).unwrap();

    // Build a totally ordered run of snapshots.
    let mut snapshots = vec![vector.read()];
    for t in 0..=2 {
        let u0 = vector.advance(&node0, updater0.advance(t).unwrap()).unwrap();
        vector.update(&u0).unwrap();
        let u1 = vector.advance(&node1, updater1.advance(t).unwrap()).unwrap();
        vector.update(&u1).unwrap();
        snapshots.push(vector.read());
    }

    // Irreflexive.
    for snapshot in &snapshots {
        assert!(!snapshot.happens_before(snapshot));
    }
    // Antisymmetric and transitive over every ordered pair/triple.
    for i in 0..snapshots.len() {
        for j in (i + 1)..snapshots.len() {
            assert!(snapshots[i].happens_before(&snapshots[j]));
            assert!(!snapshots[j].happens_before(&snapshots[i]));
            for k in (j + 1)..snapshots.len() {
                if snapshots[i].happens_before(&snapshots[j])
                    && snapshots[j].happens_before(&snapshots[k])
                {
                    assert!(snapshots[i].happens_before(&snapshots[k]));
                }
            }
        }
    }
}

#[test]
fn timestamps_from_different_vectors_never_compare() {
    let updater = HashClockUpdater::from_seed(&[0xC0u8; 16], 3).unwrap();
    let node0 = node("n0");

    let mut left = VectorHashClock::setup([1u8; 32], [node0.clone()]).unwrap();
    let mut right = VectorHashClock::setup([2u8; 32], [node0.clone()]).unwrap();
    let left_update = left.advance(&node0, updater.advance(0).unwrap()).unwrap();
    let right_update = right.advance(&node0, updater.advance(1).unwrap()).unwrap();
    left.update(&left_update).unwrap();
    right.update(&right_update).unwrap();

    let a = left.read();
    let b = right.read();
    assert!(!a.happens_before(&b));
    assert!(!b.happens_before(&a));
    assert!(!a.are_concurrent(&b));
}

#[test]
fn vector_pack_roundtrips_through_partial_priming() {
    let updater0 = HashClockUpdater::from_seed(&[0xD0u8; 16], 2).unwrap();
    let uuid = vector_uuid(&[updater0.uuid()]);
    let (node0, node1) = (node("primed"), node("dormant"));
    let mut vector = VectorHashClock::setup(uuid, [node0.clone(), node1.clone()]).unwrap();
    let update = vector.advance(&node0, updater0.advance(1).unwrap()).unwrap();
    vector.update(&update).unwrap();

    let unpacked = VectorHashClock::unpack(&vector.pack()).unwrap();
    assert_eq!(unpacked, vector);
    assert!(unpacked.verify());
    assert!(unpacked.node_clock(&node1).is_none());
    assert_eq!(unpacked.read(), vector.read());
}

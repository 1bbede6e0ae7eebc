//! Vector clocks over per-node reverse-entropy chains.
//!
//! A vector clock keys one sub-clock per node id and aggregates their
//! certificates into vector timestamps that support the standard
//! happens-before and concurrency checks. Node ids are compared as
//! unsigned big-endian byte strings, which is exactly the ordering a
//! `BTreeMap` over raw bytes provides, so every read-out and encoding is
//! canonical by construction.
//!
//! Sub-clocks start *unprimed*: the vector knows the node id but not the
//! node's chain. A node is primed either at setup (when its chain uuid is
//! already known, e.g. when federating independent clocks) or by the first
//! certificate seen for it, whose one-way fold defines the chain uuid.

use std::collections::BTreeMap;
use std::fmt;

use bytes::BufMut;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::clock::{Clock, HashClock, PointClock, Timestamp};
use crate::codec::{expect_tag, Reader};
use crate::error::ClockError;

/// Vector of SHA-256 hash-chain clocks.
pub type VectorHashClock = VectorClock<HashClock>;

/// Vector of Ed25519 point-chain clocks.
pub type VectorPointClock = VectorClock<PointClock>;

/// Most nodes a single vector may hold.
pub const MAX_NODES: usize = 1024;

/// Largest node id, in bytes (the wire prefixes ids with a `u16`).
pub const MAX_NODE_ID_SIZE: usize = u16::MAX as usize;

/// A validated node identifier: non-empty bytes, bounded for the wire.
///
/// Ordering is unsigned lexicographic over the raw bytes. The JSON form
/// is a hex string so node ids can key maps in diagnostic output.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(Vec<u8>);

impl NodeId {
    /// Creates a node id.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] for empty or oversized
    /// input.
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self, ClockError> {
        let bytes = bytes.as_ref();
        if bytes.is_empty() || bytes.len() > MAX_NODE_ID_SIZE {
            return Err(ClockError::invalid_argument(format!(
                "node id must be 1..={MAX_NODE_ID_SIZE} bytes"
            )));
        }
        Ok(Self(bytes.to_vec()))
    }

    /// The raw id bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

fn is_displayable_ascii(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| (32..=126).contains(&b))
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_displayable_ascii(&self.0) {
            f.write_str(&String::from_utf8_lossy(&self.0))
        } else {
            f.write_str(&hex::encode(&self.0))
        }
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex::encode(&self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(D::Error::custom)?;
        Self::new(bytes).map_err(D::Error::custom)
    }
}

/// A vector timestamp: the vector's uuid plus per-node certificates in
/// canonical node-id order.
///
/// The same shape serves as both a targeted update (one entry, produced
/// by [`VectorClock::advance`]) and a full snapshot (produced by
/// [`VectorClock::read`]); [`VectorClock::update`] folds every entry it
/// carries. Nodes a timestamp does not mention are treated as being at
/// time `-1` for comparisons.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorTimestamp<T: Timestamp> {
    uuid: [u8; 32],
    entries: BTreeMap<NodeId, T>,
}

impl<T: Timestamp> VectorTimestamp<T> {
    /// The uuid of the vector this timestamp belongs to.
    #[must_use]
    pub fn uuid(&self) -> &[u8; 32] {
        &self.uuid
    }

    /// Per-node certificates, in canonical node-id order.
    #[must_use]
    pub fn entries(&self) -> &BTreeMap<NodeId, T> {
        &self.entries
    }

    /// The certificate for `node_id`, if present.
    #[must_use]
    pub fn get(&self, node_id: &NodeId) -> Option<&T> {
        self.entries.get(node_id)
    }

    /// The time recorded for `node_id`; `-1` when absent.
    #[must_use]
    pub fn time_of(&self, node_id: &NodeId) -> i64 {
        self.entries.get(node_id).map_or(-1, Timestamp::time)
    }

    /// Standard vector-clock partial order: every component of `self` is
    /// at most the matching component of `other`, and at least one is
    /// strictly less. Equal timestamps are not ordered, and timestamps
    /// from different vectors (mismatched uuids) are never ordered.
    #[must_use]
    pub fn happens_before(&self, other: &Self) -> bool {
        if self.uuid != other.uuid {
            return false;
        }
        let mut strictly_earlier = false;
        for node_id in self.entries.keys().chain(other.entries.keys()) {
            let ours = self.time_of(node_id);
            let theirs = other.time_of(node_id);
            if ours > theirs {
                return false;
            }
            if ours < theirs {
                strictly_earlier = true;
            }
        }
        strictly_earlier
    }

    /// Whether two timestamps are causally unrelated: same vector, not
    /// equal, and neither happens before the other.
    #[must_use]
    pub fn are_concurrent(&self, other: &Self) -> bool {
        self.uuid == other.uuid
            && !self.times_equal(other)
            && !self.happens_before(other)
            && !other.happens_before(self)
    }

    fn times_equal(&self, other: &Self) -> bool {
        self.entries
            .keys()
            .chain(other.entries.keys())
            .all(|node_id| self.time_of(node_id) == other.time_of(node_id))
    }

    /// Packs the timestamp into a tagged byte payload.
    #[must_use]
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_u8(T::VECTOR_TAG);
        buf.put_slice(&self.uuid);
        // Entries come from a vector clock, which bounds nodes at MAX_NODES.
        buf.put_u32(self.entries.len() as u32);
        for (node_id, entry) in &self.entries {
            buf.put_u16(node_id.as_bytes().len() as u16);
            buf.put_slice(node_id.as_bytes());
            entry.encode_entry(&mut buf);
        }
        buf
    }

    /// Unpacks a timestamp packed by [`VectorTimestamp::pack`].
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on any structural violation.
    pub fn unpack(data: &[u8]) -> Result<Self, ClockError> {
        let mut reader = Reader::new(data);
        expect_tag(&mut reader, T::VECTOR_TAG, "vector timestamp")?;
        let uuid = reader.array32("vector timestamp uuid")?;
        let count = reader.u32("vector timestamp entry count")? as usize;
        if count > MAX_NODES {
            return Err(ClockError::bad_format("vector timestamp has too many entries"));
        }
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let id_len = reader.u16("node id length")? as usize;
            let node_id = NodeId::new(reader.take(id_len, "node id")?)
                .map_err(|_| ClockError::bad_format("empty node id in vector timestamp"))?;
            let entry = T::decode_entry(&mut reader)?;
            if entries.insert(node_id, entry).is_some() {
                return Err(ClockError::bad_format("duplicate node id in vector timestamp"));
            }
        }
        reader.finish("vector timestamp")?;
        Ok(Self { uuid, entries })
    }
}

/// A vector of per-node reverse-entropy clocks sharing one vector uuid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorClock<C: Clock> {
    uuid: [u8; 32],
    nodes: BTreeMap<NodeId, Option<C>>,
}

impl<C: Clock> VectorClock<C> {
    /// Builds a vector with an unprimed sub-clock per node.
    ///
    /// The uuid is caller-supplied; conventionally the hash of the
    /// concatenated per-node chain uuids when those are known up front.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] for an empty node list,
    /// a duplicate node id, or too many nodes.
    pub fn setup(
        uuid: [u8; 32],
        node_ids: impl IntoIterator<Item = NodeId>,
    ) -> Result<Self, ClockError> {
        let mut nodes = BTreeMap::new();
        for node_id in node_ids {
            if nodes.insert(node_id.clone(), None).is_some() {
                return Err(ClockError::invalid_argument(format!(
                    "duplicate node id: {node_id}"
                )));
            }
        }
        if nodes.is_empty() {
            return Err(ClockError::invalid_argument(
                "a vector clock needs at least one node",
            ));
        }
        if nodes.len() > MAX_NODES {
            return Err(ClockError::invalid_argument(format!(
                "a vector clock holds at most {MAX_NODES} nodes"
            )));
        }
        Ok(Self { uuid, nodes })
    }

    /// Builds a vector and primes the named nodes with already-known
    /// chain uuids, so independently set-up clocks can be federated into
    /// one vector.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] as [`VectorClock::setup`]
    /// does, or when `uuids` names a node outside the vector.
    pub fn setup_with_uuids(
        uuid: [u8; 32],
        node_ids: impl IntoIterator<Item = NodeId>,
        uuids: BTreeMap<NodeId, [u8; 32]>,
    ) -> Result<Self, ClockError> {
        let mut vector = Self::setup(uuid, node_ids)?;
        for (node_id, chain_uuid) in uuids {
            let slot = vector.nodes.get_mut(&node_id).ok_or_else(|| {
                ClockError::invalid_argument(format!(
                    "uuids map names a node outside the vector: {node_id}"
                ))
            })?;
            *slot = Some(C::observer(chain_uuid));
        }
        Ok(vector)
    }

    /// The vector's uuid.
    #[must_use]
    pub fn uuid(&self) -> &[u8; 32] {
        &self.uuid
    }

    /// Member node ids, in canonical order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// The sub-clock for `node_id`, if that node has been primed.
    #[must_use]
    pub fn node_clock(&self, node_id: &NodeId) -> Option<&C> {
        self.nodes.get(node_id).and_then(Option::as_ref)
    }

    /// Wraps an inner certificate as a vector update targeting
    /// `node_id`.
    ///
    /// An unprimed target is primed by the certificate (its one-way fold
    /// defines the node's chain uuid); a primed target must verify the
    /// certificate against its chain. The local sub-clock is not
    /// advanced: callers fold the returned update into every replica,
    /// their own included.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::UnknownNode`] for a non-member node,
    /// [`ClockError::InvalidUpdate`] for a certificate off the node's
    /// chain, or [`ClockError::InvalidSignature`] for a bad attached
    /// proof.
    pub fn advance(
        &mut self,
        node_id: &NodeId,
        timestamp: C::Timestamp,
    ) -> Result<VectorTimestamp<C::Timestamp>, ClockError> {
        let slot = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| ClockError::unknown_node(node_id.as_bytes()))?;
        match slot {
            Some(clock) => clock.check_timestamp(&timestamp)?,
            None => *slot = Some(C::from_timestamp(&timestamp)?),
        }
        let mut entries = BTreeMap::new();
        entries.insert(node_id.clone(), timestamp);
        Ok(VectorTimestamp {
            uuid: self.uuid,
            entries,
        })
    }

    /// Folds a vector timestamp into this vector: primes unprimed nodes
    /// and merges every entry into its sub-clock. Stale entries are
    /// skipped, so folding the same update twice, or two replicas'
    /// updates in either order, converges to the same state.
    ///
    /// Atomic: on any error the vector is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::IncompatibleVector`] when the update carries
    /// a different vector uuid, [`ClockError::UnknownNode`] for an entry
    /// outside the vector, and chain or signature failures from the
    /// sub-clocks.
    pub fn update(&mut self, update: &VectorTimestamp<C::Timestamp>) -> Result<(), ClockError> {
        if update.uuid != self.uuid {
            tracing::debug!(
                expected = %hex::encode(self.uuid),
                got = %hex::encode(update.uuid),
                "rejected update for a different vector"
            );
            return Err(ClockError::IncompatibleVector {
                expected: hex::encode(self.uuid),
                got: hex::encode(update.uuid),
            });
        }
        let mut staged = self.nodes.clone();
        for (node_id, entry) in &update.entries {
            let slot = staged
                .get_mut(node_id)
                .ok_or_else(|| ClockError::unknown_node(node_id.as_bytes()))?;
            match slot {
                Some(clock) => {
                    clock.merge(entry)?;
                }
                None => *slot = Some(C::from_timestamp(entry)?),
            }
        }
        self.nodes = staged;
        Ok(())
    }

    /// Snapshot of the vector: one entry per primed node, in canonical
    /// node-id order.
    #[must_use]
    pub fn read(&self) -> VectorTimestamp<C::Timestamp> {
        let entries = self
            .nodes
            .iter()
            .filter_map(|(node_id, slot)| {
                slot.as_ref().map(|clock| (node_id.clone(), clock.read()))
            })
            .collect();
        VectorTimestamp {
            uuid: self.uuid,
            entries,
        }
    }

    /// Whether every primed sub-clock verifies against its chain uuid.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.nodes
            .values()
            .flatten()
            .all(Clock::verify)
    }

    /// Whether every entry of `timestamp` verifies against the matching
    /// primed sub-clock. Entries for unknown or unprimed nodes make the
    /// whole timestamp unverifiable.
    #[must_use]
    pub fn verify_timestamp(&self, timestamp: &VectorTimestamp<C::Timestamp>) -> bool {
        timestamp.uuid == self.uuid
            && timestamp.entries.iter().all(|(node_id, entry)| {
                self.node_clock(node_id)
                    .is_some_and(|clock| clock.verify_timestamp(entry))
            })
    }

    /// [`VectorTimestamp::happens_before`], exposed on the clock for
    /// symmetry with the other capabilities.
    #[must_use]
    pub fn happens_before(
        earlier: &VectorTimestamp<C::Timestamp>,
        later: &VectorTimestamp<C::Timestamp>,
    ) -> bool {
        earlier.happens_before(later)
    }

    /// [`VectorTimestamp::are_concurrent`], exposed on the clock for
    /// symmetry with the other capabilities.
    #[must_use]
    pub fn are_concurrent(
        a: &VectorTimestamp<C::Timestamp>,
        b: &VectorTimestamp<C::Timestamp>,
    ) -> bool {
        a.are_concurrent(b)
    }

    /// Packs the vector into a tagged byte payload. Unprimed nodes pack
    /// as empty-slot sentinels.
    #[must_use]
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_u8(C::VECTOR_WIRE_TAG);
        buf.put_slice(&self.uuid);
        // Setup bounds nodes at MAX_NODES.
        buf.put_u32(self.nodes.len() as u32);
        for (node_id, slot) in &self.nodes {
            buf.put_u16(node_id.as_bytes().len() as u16);
            buf.put_slice(node_id.as_bytes());
            let mut inner = Vec::new();
            match slot {
                Some(clock) => clock.encode(&mut inner),
                None => C::encode_empty_slot(&mut inner),
            }
            // Inner payloads are a tag, fixed header, and a bounded
            // chain state, far below the u16 ceiling.
            buf.put_u16(inner.len() as u16);
            buf.put_slice(&inner);
        }
        buf
    }

    /// Unpacks a vector packed by [`VectorClock::pack`].
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on any structural violation.
    pub fn unpack(data: &[u8]) -> Result<Self, ClockError> {
        let mut reader = Reader::new(data);
        expect_tag(&mut reader, C::VECTOR_WIRE_TAG, "vector clock")?;
        let uuid = reader.array32("vector uuid")?;
        let count = reader.u32("vector node count")? as usize;
        if count == 0 || count > MAX_NODES {
            return Err(ClockError::bad_format("vector node count out of bounds"));
        }
        let mut nodes = BTreeMap::new();
        for _ in 0..count {
            let id_len = reader.u16("node id length")? as usize;
            let node_id = NodeId::new(reader.take(id_len, "node id")?)
                .map_err(|_| ClockError::bad_format("empty node id in vector"))?;
            let inner_len = reader.u16("clock slot length")? as usize;
            let mut inner = Reader::new(reader.take(inner_len, "clock slot")?);
            let slot = C::decode(&mut inner)?;
            inner.finish("clock slot")?;
            if nodes.insert(node_id, slot).is_some() {
                return Err(ClockError::bad_format("duplicate node id in vector"));
            }
        }
        reader.finish("vector clock")?;
        Ok(Self { uuid, nodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockUpdater, HashClockUpdater, HashTimestamp};
    use crate::crypto::hash;

    fn node(name: &str) -> NodeId {
        NodeId::new(name.as_bytes()).unwrap()
    }

    fn two_node_setup() -> (
        VectorHashClock,
        HashClockUpdater,
        HashClockUpdater,
        NodeId,
        NodeId,
    ) {
        let updater0 = HashClockUpdater::from_seed(&[1u8; 16], 1).unwrap();
        let updater1 = HashClockUpdater::from_seed(&[2u8; 16], 3).unwrap();
        let mut uuid_input = Vec::new();
        uuid_input.extend_from_slice(updater0.uuid());
        uuid_input.extend_from_slice(updater1.uuid());
        let uuid = hash::digest(&uuid_input);
        let vector = VectorHashClock::setup(uuid, [node("node0"), node("node1")]).unwrap();
        (vector, updater0, updater1, node("node0"), node("node1"))
    }

    #[test]
    fn node_id_validation_and_ordering() {
        assert!(NodeId::new(b"").is_err());
        assert!(NodeId::new(b"a").is_ok());
        // Unsigned big-endian byte ordering.
        assert!(NodeId::new([0x00, 0xFF]).unwrap() < NodeId::new([0x01]).unwrap());
        assert_eq!(node("printable").to_string(), "printable");
        assert_eq!(NodeId::new([0x00, 0x01]).unwrap().to_string(), "0001");
    }

    #[test]
    fn setup_rejects_duplicates_and_empty_vectors() {
        let uuid = [9u8; 32];
        assert!(matches!(
            VectorHashClock::setup(uuid, [node("a"), node("a")]),
            Err(ClockError::InvalidArgument { .. })
        ));
        assert!(matches!(
            VectorHashClock::setup(uuid, Vec::new()),
            Err(ClockError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn setup_with_uuids_rejects_foreign_nodes() {
        let uuid = [9u8; 32];
        let mut uuids = BTreeMap::new();
        uuids.insert(node("stranger"), [1u8; 32]);
        assert!(matches!(
            VectorHashClock::setup_with_uuids(uuid, [node("a")], uuids),
            Err(ClockError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn advance_rejects_unknown_nodes() {
        let (mut vector, updater0, _, _, _) = two_node_setup();
        let err = vector
            .advance(&node("stranger"), updater0.advance(0).unwrap())
            .unwrap_err();
        assert!(matches!(err, ClockError::UnknownNode { .. }));
    }

    #[test]
    fn advance_primes_and_update_folds() {
        let (mut vector, updater0, updater1, node0, node1) = two_node_setup();

        let update0 = vector.advance(&node0, updater0.advance(0).unwrap()).unwrap();
        let update1 = vector.advance(&node1, updater1.advance(0).unwrap()).unwrap();
        vector.update(&update0).unwrap();
        vector.update(&update1).unwrap();

        let snapshot = vector.read();
        assert_eq!(snapshot.time_of(&node0), 0);
        assert_eq!(snapshot.time_of(&node1), 0);
        assert!(vector.verify());

        // Priming derived the real chain uuids from the certificates.
        assert_eq!(vector.node_clock(&node0).unwrap().uuid(), updater0.uuid());
        assert_eq!(vector.node_clock(&node1).unwrap().uuid(), updater1.uuid());
    }

    #[test]
    fn independent_advances_are_concurrent_and_converge() {
        let (vector, updater0, updater1, node0, node1) = two_node_setup();
        let mut replica_a = vector.clone();
        let mut replica_b = vector;

        let init0 = replica_a.advance(&node0, updater0.advance(0).unwrap()).unwrap();
        let init1 = replica_b.advance(&node1, updater1.advance(0).unwrap()).unwrap();
        for replica in [&mut replica_a, &mut replica_b] {
            replica.update(&init0).unwrap();
            replica.update(&init1).unwrap();
        }
        let initial = replica_a.read();
        assert_eq!(initial, replica_b.read());

        let update_a = replica_a.advance(&node0, updater0.advance(1).unwrap()).unwrap();
        let update_b = replica_b.advance(&node1, updater1.advance(1).unwrap()).unwrap();
        assert!(update_a.are_concurrent(&update_b));
        assert!(update_b.are_concurrent(&update_a));

        // Fold both updates on both replicas, in opposite orders.
        replica_a.update(&update_a).unwrap();
        replica_a.update(&update_b).unwrap();
        replica_b.update(&update_b).unwrap();
        replica_b.update(&update_a).unwrap();

        let final_a = replica_a.read();
        assert_eq!(final_a, replica_b.read());
        assert!(initial.happens_before(&final_a));
        assert!(!final_a.happens_before(&initial));
        assert!(!initial.are_concurrent(&final_a));
    }

    #[test]
    fn update_is_atomic_across_entries() {
        let (mut vector, updater0, updater1, node0, node1) = two_node_setup();
        let init0 = vector.advance(&node0, updater0.advance(0).unwrap()).unwrap();
        let init1 = vector.advance(&node1, updater1.advance(0).unwrap()).unwrap();
        vector.update(&init0).unwrap();
        vector.update(&init1).unwrap();
        let before = vector.read();

        // One good entry, one forged entry: nothing may be applied.
        let mut entries = BTreeMap::new();
        entries.insert(node0.clone(), updater0.advance(1).unwrap());
        entries.insert(
            node1.clone(),
            HashTimestamp::new(1, vec![0x55u8; 32]).unwrap(),
        );
        let mixed = VectorTimestamp {
            uuid: *vector.uuid(),
            entries,
        };
        assert!(vector.update(&mixed).is_err());
        assert_eq!(vector.read(), before);
    }

    #[test]
    fn update_rejects_foreign_vectors() {
        let (mut vector, updater0, _, node0, _) = two_node_setup();
        let update = vector.advance(&node0, updater0.advance(0).unwrap()).unwrap();

        let mut foreign = VectorHashClock::setup([7u8; 32], [node0.clone(), node("node1")]).unwrap();
        assert!(matches!(
            foreign.update(&update),
            Err(ClockError::IncompatibleVector { .. })
        ));

        // Comparisons across vectors are false, never an error.
        let foreign_read = foreign.read();
        assert!(!update.happens_before(&foreign_read));
        assert!(!update.are_concurrent(&foreign_read));
    }

    #[test]
    fn refolding_the_same_update_is_idempotent() {
        let (mut vector, updater0, _, node0, _) = two_node_setup();
        let update = vector.advance(&node0, updater0.advance(1).unwrap()).unwrap();
        vector.update(&update).unwrap();
        let once = vector.read();
        vector.update(&update).unwrap();
        assert_eq!(vector.read(), once);
    }

    #[test]
    fn verify_timestamp_requires_known_primed_nodes() {
        let (mut vector, updater0, _, node0, node1) = two_node_setup();
        let update = vector.advance(&node0, updater0.advance(0).unwrap()).unwrap();
        assert!(vector.verify_timestamp(&update));

        // node1 has never been primed: a timestamp naming it cannot be
        // verified yet.
        let mut entries = BTreeMap::new();
        entries.insert(node1, HashTimestamp::new(0, vec![0x11u8; 32]).unwrap());
        let unknown_chain = VectorTimestamp {
            uuid: *vector.uuid(),
            entries,
        };
        assert!(!vector.verify_timestamp(&unknown_chain));
    }

    #[test]
    fn pack_roundtrips_with_unprimed_slots() {
        let (mut vector, updater0, _, node0, node1) = two_node_setup();
        let update = vector.advance(&node0, updater0.advance(0).unwrap()).unwrap();
        vector.update(&update).unwrap();

        let unpacked = VectorHashClock::unpack(&vector.pack()).unwrap();
        assert_eq!(unpacked, vector);
        assert!(unpacked.verify());
        assert!(unpacked.node_clock(&node1).is_none());
        assert_eq!(unpacked.pack(), vector.pack());
    }

    #[test]
    fn vector_timestamp_pack_and_json_roundtrip() {
        let (mut vector, updater0, updater1, node0, node1) = two_node_setup();
        let u0 = vector.advance(&node0, updater0.advance(0).unwrap()).unwrap();
        let u1 = vector.advance(&node1, updater1.advance(2).unwrap()).unwrap();
        vector.update(&u0).unwrap();
        vector.update(&u1).unwrap();
        let snapshot = vector.read();

        let unpacked = VectorTimestamp::unpack(&snapshot.pack()).unwrap();
        assert_eq!(unpacked, snapshot);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: VectorTimestamp<HashTimestamp> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}

//! Connection graph between running instances
//!
//! A connection is a directed edge "sender may notify receiver". The edge
//! set never holds duplicates; new edges go to the front so iteration yields
//! the most recent connection first.

use std::collections::VecDeque;

use crate::domain::instance::InstanceId;

/// Kind of payload carried by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComType {
    /// Text, without terminator
    Char,
    /// Little-endian `i32` values
    Int,
    /// Text describing an event to log
    Log,
    /// Request for an action, payload ignored
    Trigger,
    /// Reserved, never delivered
    Invalid,
}

/// A message as seen by a receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    pub sender: InstanceId,
    pub kind: ComType,
    pub payload: &'a [u8],
}

impl Message<'_> {
    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Decodes an `Int` payload, ignoring a trailing partial value
    pub fn ints(&self) -> impl Iterator<Item = i32> + '_ {
        self.payload
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
    }
}

/// Directed edge between two instances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub sender: InstanceId,
    pub receiver: InstanceId,
}

/// Duplicate-free edge set
#[derive(Debug, Default)]
pub struct ConnectionGraph {
    edges: VecDeque<Connection>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the edge unless it already exists
    ///
    /// # Returns
    /// true if a new edge was inserted
    pub fn connect(&mut self, sender: InstanceId, receiver: InstanceId) -> bool {
        if self.has_edge(sender, receiver) {
            return false;
        }
        self.edges.push_front(Connection { sender, receiver });
        true
    }

    /// Removes every edge matching both filters, `None` matching anything
    ///
    /// # Returns
    /// Number of removed edges
    pub fn disconnect(&mut self, sender: Option<InstanceId>, receiver: Option<InstanceId>) -> usize {
        let before = self.edges.len();
        self.edges.retain(|c| {
            let sender_matches = sender.is_none_or(|s| c.sender == s);
            let receiver_matches = receiver.is_none_or(|r| c.receiver == r);
            !(sender_matches && receiver_matches)
        });
        before - self.edges.len()
    }

    pub fn has_edge(&self, sender: InstanceId, receiver: InstanceId) -> bool {
        self.edges
            .iter()
            .any(|c| c.sender == sender && c.receiver == receiver)
    }

    /// Receivers of `sender` in delivery order
    pub fn receivers_of(&self, sender: InstanceId) -> Vec<InstanceId> {
        self.edges
            .iter()
            .filter(|c| c.sender == sender)
            .map(|c| c.receiver)
            .collect()
    }

    /// True if any edge starts or ends at `id`
    pub fn touches(&self, id: InstanceId) -> bool {
        self.edges.iter().any(|c| c.sender == id || c.receiver == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

//! View history: recently viewed entities in access order.
//!
//! Each id appears at most once. Re-viewing an id moves it to the tail.
//! Nodes live in a slab and link to each other by slot index, and a map from
//! id to slot gives constant-time removal of any entry.

use std::collections::HashMap;

use tracing::debug;

use crate::task::{Entity, TaskId};

#[derive(Debug, Clone)]
struct Node {
    entity: Entity,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Deduplicated, access-ordered list of entity snapshots.
///
/// Head is the least recently viewed entry. With a limit set, recording a new
/// id into a full history evicts the head.
#[derive(Debug, Clone, Default)]
pub struct History {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    index: HashMap<TaskId, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    limit: Option<usize>,
}

impl History {
    /// Unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    /// History holding at most `limit` entries; `None` means unbounded.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    /// Append `entity` at the tail, dropping any older entry for its id.
    pub fn record(&mut self, entity: Entity) {
        let id = entity.id();
        if let Some(slot) = self.index.remove(&id) {
            self.unlink(slot);
        }

        if let Some(limit) = self.limit {
            while self.index.len() >= limit {
                let Some(evicted) = self.head.and_then(|head| self.unlink(head)) else {
                    break;
                };
                self.index.remove(&evicted.entity.id());
                debug!(id = evicted.entity.id(), "history entry evicted");
            }
            if limit == 0 {
                return;
            }
        }

        let slot = self.push_back(entity);
        self.index.insert(id, slot);
        debug!(id, "history recorded");
    }

    /// Drop the entry for `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: TaskId) -> bool {
        match self.index.remove(&id) {
            Some(slot) => {
                self.unlink(slot);
                debug!(id, "history entry removed");
                true
            }
            None => false,
        }
    }

    /// Replace the stored snapshot for `entity`'s id without moving it.
    pub fn refresh(&mut self, entity: &Entity) -> bool {
        let Some(&slot) = self.index.get(&entity.id()) else {
            return false;
        };
        match self.slots.get_mut(slot).and_then(Option::as_mut) {
            Some(node) => {
                node.entity = entity.clone();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Entries from least to most recently viewed
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            history: self,
            cursor: self.head,
        }
    }

    pub fn snapshot(&self) -> Vec<Entity> {
        self.iter().cloned().collect()
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.iter().map(Entity::id).collect()
    }

    fn node(&self, slot: usize) -> Option<&Node> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn push_back(&mut self, entity: Entity) -> usize {
        let node = Node {
            entity,
            prev: self.tail,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.tail.and_then(|tail| self.node_mut(tail)) {
            Some(tail) => tail.next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        slot
    }

    /// Detach the node in `slot`, relinking its neighbours. The map is left to the caller.
    fn unlink(&mut self, slot: usize) -> Option<Node> {
        let node = self.slots.get_mut(slot).and_then(Option::take)?;

        match node.prev.and_then(|prev| self.node_mut(prev)) {
            Some(prev) => prev.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|next| self.node_mut(next)) {
            Some(next) => next.prev = node.prev,
            None => self.tail = node.prev,
        }

        self.free.push(slot);
        Some(node)
    }
}

/// Iterator over history entries, oldest first
pub struct Iter<'a> {
    history: &'a History,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entity;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.history.node(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.entity)
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Entity;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

use crate::connection::{ConnectionId, ConnectionRecord};
use crate::error::{Error, HubErrorKind};
use log::*;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

type Members = HashMap<ConnectionId, Arc<ConnectionRecord>>;

#[derive(Default)]
struct Topology {
    /// Primary storage: every registered connection by id
    connections: Members,

    /// Secondary index: members of each non-empty group
    groups: HashMap<String, Members>,
}

/// Connection topology shared by the hub loop and its handles.
///
/// Both indices live behind one lock so a record is never visible in a
/// group without also being visible in the primary map. Mutation is
/// crate-private and only driven by the hub loop; lookups are open to
/// any caller and take the shared lock.
pub struct Registry {
    topology: RwLock<Topology>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            topology: RwLock::new(Topology::default()),
        }
    }

    /// Inserts a record into the primary map and, when grouped, its group.
    ///
    /// A live record with the same id is never overwritten.
    pub(crate) fn insert(&self, record: Arc<ConnectionRecord>) -> Result<(), Error> {
        let mut topology = self.topology.write();

        if topology.connections.contains_key(record.id()) {
            return Err(Error::new(
                HubErrorKind::DuplicateConnection,
                record.id().as_str(),
            ));
        }

        if let Some(group) = record.group() {
            topology
                .groups
                .entry(group.to_string())
                .or_default()
                .insert(record.id().clone(), Arc::clone(&record));
        }
        topology.connections.insert(record.id().clone(), record);

        Ok(())
    }

    /// Removes a record from both indices and closes its outbound queue.
    ///
    /// Returns `true` if the record was registered. Removing an absent record
    /// is a no-op apart from the (idempotent) queue close.
    pub(crate) fn remove(&self, record: &Arc<ConnectionRecord>) -> bool {
        let removed = {
            let mut topology = self.topology.write();

            // Only the exact record that was registered under this id may remove it
            let present = topology
                .connections
                .get(record.id())
                .is_some_and(|current| Arc::ptr_eq(current, record));

            if present {
                topology.connections.remove(record.id());

                if let Some(group) = record.group() {
                    if let Some(members) = topology.groups.get_mut(group) {
                        members.remove(record.id());

                        // Clean up empty groups
                        if members.is_empty() {
                            topology.groups.remove(group);
                        }
                    }
                }
            }

            present
        };

        if record.close() {
            trace!("Closed outbound queue of connection {}", record.id());
        }

        removed
    }

    pub fn find_by_id(&self, id: &ConnectionId) -> Option<Arc<ConnectionRecord>> {
        self.topology.read().connections.get(id).cloned()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.topology.read().connections.contains_key(id)
    }

    /// Point-in-time copy of every registered connection.
    pub fn snapshot_all(&self) -> Vec<Arc<ConnectionRecord>> {
        self.topology.read().connections.values().cloned().collect()
    }

    /// Point-in-time copy of one group's members; empty for unknown groups.
    pub fn snapshot_group(&self, group: &str) -> Vec<Arc<ConnectionRecord>> {
        self.topology
            .read()
            .groups
            .get(group)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, group: &str, id: &ConnectionId) -> bool {
        self.topology
            .read()
            .groups
            .get(group)
            .is_some_and(|members| members.contains_key(id))
    }

    pub fn len(&self) -> usize {
        self.topology.read().connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of groups with at least one member.
    pub fn group_count(&self) -> usize {
        self.topology.read().groups.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

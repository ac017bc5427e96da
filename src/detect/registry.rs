//! The shared server table.
//!
//! [`Registry`] is a plain single-owner structure; callers that drive it from
//! more than one task wrap it in one exclusive lock (see
//! [`crate::monitor::BeaconMonitor`]).

use std::collections::HashMap;

use tracing::debug;

use super::{elapsed_secs, AnomalyGroup, GroupId, ServerRecord, Timestamp};

/// Stable address of a group: owning server plus group id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub server: String,
    pub group: GroupId,
}

/// A group viewed together with the record that owns it.
#[derive(Debug, Clone, Copy)]
pub struct GroupRef<'a> {
    pub server: &'a ServerRecord,
    pub group: &'a AnomalyGroup,
}

impl GroupRef<'_> {
    pub fn key(&self) -> GroupKey {
        GroupKey {
            server: self.server.id().to_string(),
            group: self.group.id(),
        }
    }
}

fn next_group(counter: &mut u64, time: Timestamp) -> AnomalyGroup {
    let id = GroupId(*counter);
    *counter += 1;
    AnomalyGroup::new(id, time)
}

/// Map from server identifier to its [`ServerRecord`].
#[derive(Debug, Default)]
pub struct Registry {
    servers: HashMap<String, ServerRecord>,
    next_group: u64,
    next_server: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one beacon event into the table.
    ///
    /// An unseen server gets a record and a fresh group. A gap of more than
    /// `group_timeout` seconds since the open group's last event finishes
    /// that group and starts another.
    pub fn record_event(&mut self, id: &str, time: Timestamp, group_timeout: f64) {
        let record = match self.servers.get_mut(id) {
            Some(record) => record,
            None => {
                let group = next_group(&mut self.next_group, time);
                let seq = self.next_server;
                self.next_server += 1;
                debug!(server = id, group = group.id().0, "new server");
                self.servers
                    .insert(id.to_string(), ServerRecord::new(id, seq, group));
                return;
            }
        };

        record.touch(time);
        let gap = record
            .current_group()
            .map(|current| elapsed_secs(time, current.last_time()));

        match gap {
            Some(gap) if gap <= group_timeout => {
                if let Some(current) = record.current_group_mut() {
                    current.update(time);
                }
            }
            _ => {
                if let Some(gap) = gap {
                    debug!(server = id, gap, "gap exceeded group timeout, closing group");
                }
                record.close_current();
                let group = next_group(&mut self.next_group, time);
                debug!(server = id, group = group.id().0, "opening group");
                record.open_group(group);
            }
        }
    }

    /// Finish every open group idle for more than `group_timeout` seconds
    /// as of `now`. Returns the number of groups closed.
    pub fn close_idle(&mut self, now: Timestamp, group_timeout: f64) -> usize {
        let mut closed = 0;
        for record in self.servers.values_mut() {
            let idle = record
                .current_group()
                .map(|g| elapsed_secs(now, g.last_time()) > group_timeout)
                .unwrap_or(false);
            if idle {
                record.close_current();
                closed += 1;
            }
        }
        if closed > 0 {
            debug!(closed, "closed idle groups");
        }
        closed
    }

    /// Every group, or with `finished_as_of`, only groups that are finished
    /// once idle groups have been closed against that cutoff.
    ///
    /// The result is unordered.
    pub fn snapshot_groups(
        &mut self,
        finished_as_of: Option<Timestamp>,
        group_timeout: f64,
    ) -> Vec<GroupRef<'_>> {
        if let Some(now) = finished_as_of {
            self.close_idle(now, group_timeout);
        }
        let only_finished = finished_as_of.is_some();
        self.servers
            .values()
            .flat_map(|server| {
                server
                    .groups()
                    .iter()
                    .filter(move |g| !only_finished || g.is_finished())
                    .map(move |group| GroupRef { server, group })
            })
            .collect()
    }

    /// Detach a group from its server, dropping the server once it has no
    /// groups left. Unknown servers or groups are ignored.
    pub fn evict(&mut self, key: &GroupKey) -> bool {
        let Some(record) = self.servers.get_mut(&key.server) else {
            return false;
        };
        if !record.detach(key.group) {
            return false;
        }
        debug!(server = %key.server, group = key.group.0, "evicted group");
        if record.is_empty() {
            self.servers.remove(&key.server);
            debug!(server = %key.server, "removed server");
        }
        true
    }

    pub fn get(&self, id: &str) -> Option<&ServerRecord> {
        self.servers.get(id)
    }

    pub fn servers(&self) -> impl Iterator<Item = &ServerRecord> {
        self.servers.values()
    }

    /// Number of servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.servers.values().map(|s| s.groups().len()).sum()
    }
}

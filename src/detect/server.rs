use super::{AnomalyGroup, GroupId, Timestamp};

/// One server's history of anomaly groups.
///
/// `groups` is in creation order. The open group, when there is one, is
/// always the last element.
#[derive(Debug, Clone)]
pub struct ServerRecord {
    id: String,
    seq: u64,
    first_seen: Timestamp,
    last_seen: Timestamp,
    groups: Vec<AnomalyGroup>,
    current: Option<GroupId>,
}

impl ServerRecord {
    /// Create a record whose first group is `group`.
    pub(crate) fn new(id: &str, seq: u64, group: AnomalyGroup) -> Self {
        let time = group.first_time();
        let current = Some(group.id());
        Self {
            id: id.to_string(),
            seq,
            first_seen: time,
            last_seen: time,
            groups: vec![group],
            current,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation sequence number within the registry.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn first_seen(&self) -> Timestamp {
        self.first_seen
    }

    pub fn last_seen(&self) -> Timestamp {
        self.last_seen
    }

    pub fn groups(&self) -> &[AnomalyGroup] {
        &self.groups
    }

    pub fn current_group(&self) -> Option<&AnomalyGroup> {
        let id = self.current?;
        self.groups.last().filter(|g| g.id() == id)
    }

    pub(crate) fn current_group_mut(&mut self) -> Option<&mut AnomalyGroup> {
        let id = self.current?;
        self.groups.last_mut().filter(|g| g.id() == id)
    }

    pub(crate) fn touch(&mut self, time: Timestamp) {
        self.last_seen = time;
    }

    /// Append `group` and make it the open group.
    pub(crate) fn open_group(&mut self, group: AnomalyGroup) {
        self.current = Some(group.id());
        self.groups.push(group);
    }

    /// Mark the open group finished and forget it.
    pub(crate) fn close_current(&mut self) {
        if let Some(group) = self.current_group_mut() {
            group.mark_finished();
        }
        self.current = None;
    }

    /// Remove a group by id. Returns `false` if it was not present.
    pub(crate) fn detach(&mut self, id: GroupId) -> bool {
        let Some(pos) = self.groups.iter().position(|g| g.id() == id) else {
            return false;
        };
        self.groups.remove(pos);
        if self.current == Some(id) {
            self.current = None;
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// Association Store - relationships and topic references with reciprocal views
// Every edge is written through one store so the incoming view can never drift
// from the forward view.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::strong_types::TopicId;

/// The two kinds of named, reciprocal topic-to-topic edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Many-valued named set (e.g. `Categories`)
    Relationship,
    /// Single-valued named pointer (e.g. `BaseTopic`)
    Reference,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Relationship => "relationship",
            EdgeKind::Reference => "reference",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct NamedSet {
    name: String,
    members: Vec<TopicId>,
}

/// Ordered list of named sets; names compare case-insensitively, insertion order is kept.
#[derive(Debug, Clone, Default)]
struct NamedSets(Vec<NamedSet>);

impl NamedSets {
    fn get(&self, name: &str) -> Option<&NamedSet> {
        self.0.iter().find(|set| set.name.eq_ignore_ascii_case(name))
    }

    fn get_or_insert(&mut self, name: &str) -> &mut NamedSet {
        let position = self
            .0
            .iter()
            .position(|set| set.name.eq_ignore_ascii_case(name));
        match position {
            Some(index) => &mut self.0[index],
            None => {
                self.0.push(NamedSet {
                    name: name.to_string(),
                    members: Vec::new(),
                });
                let last = self.0.len() - 1;
                &mut self.0[last]
            }
        }
    }

    fn remove_member(&mut self, name: &str, member: TopicId) -> bool {
        let Some(index) = self
            .0
            .iter()
            .position(|set| set.name.eq_ignore_ascii_case(name))
        else {
            return false;
        };
        let set = &mut self.0[index];
        let before = set.members.len();
        set.members.retain(|id| *id != member);
        let removed = set.members.len() != before;
        if set.members.is_empty() {
            self.0.remove(index);
        }
        removed
    }
}

/// Owning multimap for relationship and reference edges.
///
/// The forward view is keyed by source topic, the incoming view by target topic.
/// Both are only ever mutated together inside this type.
#[derive(Debug, Clone, Default)]
pub struct AssociationStore {
    forward: HashMap<(TopicId, EdgeKind), NamedSets>,
    incoming: HashMap<(TopicId, EdgeKind), NamedSets>,
}

impl AssociationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `target` to the relationship `name` of `source`.
    /// Returns `false` when the edge already existed.
    pub fn relate(&mut self, source: TopicId, name: &str, target: TopicId) -> bool {
        let forward = self
            .forward
            .entry((source, EdgeKind::Relationship))
            .or_default()
            .get_or_insert(name);
        if forward.members.contains(&target) {
            return false;
        }
        forward.members.push(target);
        self.incoming
            .entry((target, EdgeKind::Relationship))
            .or_default()
            .get_or_insert(name)
            .members
            .push(source);
        true
    }

    /// Remove `target` from the relationship `name` of `source`.
    pub fn unrelate(&mut self, source: TopicId, name: &str, target: TopicId) -> bool {
        let removed = self
            .forward
            .get_mut(&(source, EdgeKind::Relationship))
            .map(|sets| sets.remove_member(name, target))
            .unwrap_or(false);
        if removed {
            if let Some(sets) = self.incoming.get_mut(&(target, EdgeKind::Relationship)) {
                sets.remove_member(name, source);
            }
        }
        removed
    }

    /// Point the reference `name` of `source` at `target`, or clear it with `None`.
    /// Returns the previous target.
    pub fn set_reference(
        &mut self,
        source: TopicId,
        name: &str,
        target: Option<TopicId>,
    ) -> Option<TopicId> {
        let previous = self.reference(source, name);
        if previous == target {
            return previous;
        }
        if let Some(old) = previous {
            if let Some(sets) = self.forward.get_mut(&(source, EdgeKind::Reference)) {
                sets.remove_member(name, old);
            }
            if let Some(sets) = self.incoming.get_mut(&(old, EdgeKind::Reference)) {
                sets.remove_member(name, source);
            }
        }
        if let Some(new_target) = target {
            self.forward
                .entry((source, EdgeKind::Reference))
                .or_default()
                .get_or_insert(name)
                .members
                .push(new_target);
            self.incoming
                .entry((new_target, EdgeKind::Reference))
                .or_default()
                .get_or_insert(name)
                .members
                .push(source);
        }
        previous
    }

    pub fn related(&self, source: TopicId, name: &str) -> &[TopicId] {
        self.members(&self.forward, source, EdgeKind::Relationship, name)
    }

    pub fn incoming_related(&self, target: TopicId, name: &str) -> &[TopicId] {
        self.members(&self.incoming, target, EdgeKind::Relationship, name)
    }

    pub fn reference(&self, source: TopicId, name: &str) -> Option<TopicId> {
        self.members(&self.forward, source, EdgeKind::Reference, name)
            .first()
            .copied()
    }

    pub fn incoming_references(&self, target: TopicId, name: &str) -> &[TopicId] {
        self.members(&self.incoming, target, EdgeKind::Reference, name)
    }

    /// Names of the outgoing edge sets of `kind` on `source`, in insertion order.
    pub fn names(&self, source: TopicId, kind: EdgeKind) -> Vec<&str> {
        Self::set_names(&self.forward, source, kind)
    }

    /// Every outgoing relationship target of `source`, distinct, in insertion order.
    pub fn all_related(&self, source: TopicId) -> Vec<TopicId> {
        Self::distinct_members(&self.forward, source, EdgeKind::Relationship)
    }

    pub fn all_incoming_related(&self, target: TopicId) -> Vec<TopicId> {
        Self::distinct_members(&self.incoming, target, EdgeKind::Relationship)
    }

    /// Drop every edge that touches `topic`, in either direction.
    pub fn detach(&mut self, topic: TopicId) {
        for kind in [EdgeKind::Relationship, EdgeKind::Reference] {
            if let Some(sets) = self.forward.remove(&(topic, kind)) {
                for set in sets.0 {
                    for target in set.members {
                        if let Some(incoming) = self.incoming.get_mut(&(target, kind)) {
                            incoming.remove_member(&set.name, topic);
                        }
                    }
                }
            }
            if let Some(sets) = self.incoming.remove(&(topic, kind)) {
                for set in sets.0 {
                    for source in set.members {
                        if let Some(forward) = self.forward.get_mut(&(source, kind)) {
                            forward.remove_member(&set.name, topic);
                        }
                    }
                }
            }
        }
    }

    fn members<'a>(
        &self,
        view: &'a HashMap<(TopicId, EdgeKind), NamedSets>,
        topic: TopicId,
        kind: EdgeKind,
        name: &str,
    ) -> &'a [TopicId] {
        view.get(&(topic, kind))
            .and_then(|sets| sets.get(name))
            .map(|set| set.members.as_slice())
            .unwrap_or(&[])
    }

    fn set_names(
        view: &HashMap<(TopicId, EdgeKind), NamedSets>,
        topic: TopicId,
        kind: EdgeKind,
    ) -> Vec<&str> {
        view.get(&(topic, kind))
            .map(|sets| sets.0.iter().map(|set| set.name.as_str()).collect())
            .unwrap_or_default()
    }

    fn distinct_members(
        view: &HashMap<(TopicId, EdgeKind), NamedSets>,
        topic: TopicId,
        kind: EdgeKind,
    ) -> Vec<TopicId> {
        let mut result: Vec<TopicId> = Vec::new();
        if let Some(sets) = view.get(&(topic, kind)) {
            for set in &sets.0 {
                for member in &set.members {
                    if !result.contains(member) {
                        result.push(*member);
                    }
                }
            }
        }
        result
    }
}

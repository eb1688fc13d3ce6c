// Topic Graph - arena-style store for the hierarchical content graph
// Topics live in one map keyed by id; parent/child links are ids, and all
// relationship/reference edges go through the shared AssociationStore.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::core::associations::AssociationStore;
use crate::core::strong_types::TopicId;
use crate::core::topic::Topic;
use crate::error::{AppError, AppResult};

/// Reference name used to derive attribute values from another topic.
pub const BASE_TOPIC_REFERENCE: &str = "BaseTopic";

#[derive(Debug, Clone)]
pub struct AttributeEntry {
    pub key: String,
    pub value: String,
}

/// Stored state of one topic
#[derive(Debug, Clone)]
pub struct TopicRecord {
    pub id: TopicId,
    pub key: String,
    pub content_type: String,
    pub parent: Option<TopicId>,
    pub children: Vec<TopicId>,
    pub(crate) attributes: HashMap<String, AttributeEntry>,
    pub last_modified: DateTime<Utc>,
    pub hidden: bool,
    pub disabled: bool,
}

impl TopicRecord {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(&key.to_ascii_lowercase())
            .map(|entry| entry.value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeEntry> {
        self.attributes.values()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopicGraph {
    topics: HashMap<TopicId, TopicRecord>,
    roots: Vec<TopicId>,
    associations: AssociationStore,
    next_id: i64,
}

impl TopicGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn roots(&self) -> &[TopicId] {
        &self.roots
    }

    pub fn record(&self, id: TopicId) -> Option<&TopicRecord> {
        self.topics.get(&id)
    }

    pub(crate) fn topics_index(&self) -> &HashMap<TopicId, TopicRecord> {
        &self.topics
    }

    pub fn contains(&self, id: TopicId) -> bool {
        self.topics.contains_key(&id)
    }

    pub fn associations(&self) -> &AssociationStore {
        &self.associations
    }

    /// Issue a handle for `id` on a shared graph snapshot.
    pub fn topic(self: &Arc<Self>, id: TopicId) -> Option<Topic> {
        if self.contains(id) {
            Some(Topic::new(Arc::clone(self), id))
        } else {
            None
        }
    }

    pub fn find(self: &Arc<Self>, unique_key: &str) -> Option<Topic> {
        self.find_id(unique_key).and_then(|id| self.topic(id))
    }

    /// Resolve a colon-delimited unique key (`Root:Web:About`), case-insensitively.
    pub fn find_id(&self, unique_key: &str) -> Option<TopicId> {
        let mut segments = unique_key.split(':').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut current = self.roots.iter().copied().find(|id| {
            self.topics
                .get(id)
                .map(|t| t.key.eq_ignore_ascii_case(first))
                .unwrap_or(false)
        })?;
        for segment in segments {
            current = self.child_by_key(current, segment)?;
        }
        Some(current)
    }

    pub fn child_by_key(&self, parent: TopicId, key: &str) -> Option<TopicId> {
        let record = self.topics.get(&parent)?;
        record.children.iter().copied().find(|id| {
            self.topics
                .get(id)
                .map(|t| t.key.eq_ignore_ascii_case(key))
                .unwrap_or(false)
        })
    }

    /// Create a topic under `parent` (or as a root). Keys must be unique among siblings.
    pub fn create_topic(
        &mut self,
        key: &str,
        content_type: &str,
        parent: Option<TopicId>,
    ) -> AppResult<TopicId> {
        validate_key(key)?;
        if content_type.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Topic '{}' requires a content type",
                key
            )));
        }
        self.ensure_unique_sibling_key(parent, key, None)?;

        self.next_id += 1;
        let id = TopicId::new(self.next_id);
        self.topics.insert(
            id,
            TopicRecord {
                id,
                key: key.to_string(),
                content_type: content_type.to_string(),
                parent,
                children: Vec::new(),
                attributes: HashMap::new(),
                last_modified: Utc::now(),
                hidden: false,
                disabled: false,
            },
        );
        match parent {
            Some(parent_id) => {
                if let Some(parent_record) = self.topics.get_mut(&parent_id) {
                    parent_record.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        debug!("Created topic {} '{}' ({})", id, key, content_type);
        Ok(id)
    }

    pub fn set_attribute(&mut self, id: TopicId, key: &str, value: &str) -> AppResult<()> {
        if key.trim().is_empty() {
            return Err(AppError::Validation(
                "Attribute key must not be empty".to_string(),
            ));
        }
        let record = self.record_mut(id)?;
        record.attributes.insert(
            key.to_ascii_lowercase(),
            AttributeEntry {
                key: key.to_string(),
                value: value.to_string(),
            },
        );
        record.last_modified = Utc::now();
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: TopicId, key: &str) -> AppResult<bool> {
        let record = self.record_mut(id)?;
        let removed = record.attributes.remove(&key.to_ascii_lowercase()).is_some();
        if removed {
            record.last_modified = Utc::now();
        }
        Ok(removed)
    }

    pub fn set_hidden(&mut self, id: TopicId, hidden: bool) -> AppResult<()> {
        self.record_mut(id)?.hidden = hidden;
        Ok(())
    }

    pub fn set_disabled(&mut self, id: TopicId, disabled: bool) -> AppResult<()> {
        self.record_mut(id)?.disabled = disabled;
        Ok(())
    }

    pub fn relate(&mut self, source: TopicId, name: &str, target: TopicId) -> AppResult<bool> {
        self.ensure_exists(source)?;
        self.ensure_exists(target)?;
        Ok(self.associations.relate(source, name, target))
    }

    pub fn unrelate(&mut self, source: TopicId, name: &str, target: TopicId) -> AppResult<bool> {
        self.ensure_exists(source)?;
        Ok(self.associations.unrelate(source, name, target))
    }

    /// Replace the whole relationship set `name` on `source`.
    pub fn replace_relationship(
        &mut self,
        source: TopicId,
        name: &str,
        targets: &[TopicId],
    ) -> AppResult<()> {
        self.ensure_exists(source)?;
        for target in targets {
            self.ensure_exists(*target)?;
        }
        let existing = self.associations.related(source, name).to_vec();
        for target in existing {
            self.associations.unrelate(source, name, target);
        }
        for target in targets {
            self.associations.relate(source, name, *target);
        }
        Ok(())
    }

    pub fn set_reference(
        &mut self,
        source: TopicId,
        name: &str,
        target: Option<TopicId>,
    ) -> AppResult<Option<TopicId>> {
        self.ensure_exists(source)?;
        if let Some(target_id) = target {
            self.ensure_exists(target_id)?;
        }
        Ok(self.associations.set_reference(source, name, target))
    }

    /// Re-parent `id`. Moving a topic beneath itself or one of its descendants is rejected.
    pub fn move_topic(&mut self, id: TopicId, new_parent: Option<TopicId>) -> AppResult<()> {
        self.ensure_exists(id)?;
        if let Some(parent_id) = new_parent {
            self.ensure_exists(parent_id)?;
            if self.is_self_or_ancestor(id, parent_id) {
                return Err(AppError::Validation(format!(
                    "Cannot move topic {} beneath its own descendant {}",
                    id, parent_id
                )));
            }
        }
        let key = self.record_mut(id)?.key.clone();
        self.ensure_unique_sibling_key(new_parent, &key, Some(id))?;

        let old_parent = self.record_mut(id)?.parent;
        self.detach_from_parent(id, old_parent);
        match new_parent {
            Some(parent_id) => {
                if let Some(parent_record) = self.topics.get_mut(&parent_id) {
                    parent_record.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.record_mut(id)?.parent = new_parent;
        Ok(())
    }

    /// Delete `id` and its whole subtree, dropping every association that touches them.
    pub fn delete_topic(&mut self, id: TopicId) -> AppResult<usize> {
        self.ensure_exists(id)?;
        let parent = self.record_mut(id)?.parent;
        self.detach_from_parent(id, parent);

        let mut pending = vec![id];
        let mut removed = 0;
        while let Some(current) = pending.pop() {
            if let Some(record) = self.topics.remove(&current) {
                pending.extend(record.children.iter().copied());
                self.associations.detach(current);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// True when `candidate` is `id` itself or lies somewhere beneath it.
    fn is_self_or_ancestor(&self, id: TopicId, candidate: TopicId) -> bool {
        let mut current = Some(candidate);
        while let Some(step) = current {
            if step == id {
                return true;
            }
            current = self.topics.get(&step).and_then(|t| t.parent);
        }
        false
    }

    fn detach_from_parent(&mut self, id: TopicId, parent: Option<TopicId>) {
        match parent {
            Some(parent_id) => {
                if let Some(parent_record) = self.topics.get_mut(&parent_id) {
                    parent_record.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
    }

    fn ensure_unique_sibling_key(
        &self,
        parent: Option<TopicId>,
        key: &str,
        except: Option<TopicId>,
    ) -> AppResult<()> {
        let siblings: &[TopicId] = match parent {
            Some(parent_id) => &self
                .topics
                .get(&parent_id)
                .ok_or_else(|| AppError::NotFound(format!("Parent topic {}", parent_id)))?
                .children,
            None => &self.roots,
        };
        let clash = siblings.iter().any(|sibling| {
            Some(*sibling) != except
                && self
                    .topics
                    .get(sibling)
                    .map(|t| t.key.eq_ignore_ascii_case(key))
                    .unwrap_or(false)
        });
        if clash {
            return Err(AppError::DuplicateKey(format!(
                "A sibling topic with key '{}' already exists",
                key
            )));
        }
        Ok(())
    }

    fn ensure_exists(&self, id: TopicId) -> AppResult<()> {
        if self.topics.contains_key(&id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Topic {}", id)))
        }
    }

    fn record_mut(&mut self, id: TopicId) -> AppResult<&mut TopicRecord> {
        self.topics
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Topic {}", id)))
    }
}

fn validate_key(key: &str) -> AppResult<()> {
    if key.is_empty() {
        return Err(AppError::Validation("Topic key must not be empty".to_string()));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(AppError::Validation(format!(
            "Topic key '{}' may only contain letters, numbers, '_', '-' and '.'",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (TopicGraph, TopicId, TopicId, TopicId) {
        let mut graph = TopicGraph::new();
        let root = graph.create_topic("Root", "Container", None).unwrap();
        let web = graph.create_topic("Web", "Page", Some(root)).unwrap();
        let about = graph.create_topic("About", "Page", Some(web)).unwrap();
        (graph, root, web, about)
    }

    #[test]
    fn test_find_by_unique_key() {
        let (graph, _, web, about) = sample();
        assert_eq!(graph.find_id("Root:Web"), Some(web));
        assert_eq!(graph.find_id("root:web:about"), Some(about));
        assert_eq!(graph.find_id("Root:Missing"), None);
    }

    #[test]
    fn test_duplicate_sibling_key_rejected() {
        let (mut graph, _, web, _) = sample();
        let result = graph.create_topic("about", "Page", Some(web));
        assert!(matches!(result, Err(AppError::DuplicateKey(_))));
    }

    #[test]
    fn test_invalid_key_rejected() {
        let mut graph = TopicGraph::new();
        assert!(matches!(
            graph.create_topic("Bad Key", "Page", None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            graph.create_topic("", "Page", None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_move_beneath_descendant_rejected() {
        let (mut graph, root, web, about) = sample();
        assert!(graph.move_topic(web, Some(about)).is_err());
        assert!(graph.move_topic(web, Some(web)).is_err());

        graph.move_topic(about, Some(root)).unwrap();
        assert_eq!(graph.find_id("Root:About"), Some(about));
        assert!(graph.record(web).unwrap().children.is_empty());
    }

    #[test]
    fn test_delete_subtree_detaches_associations() {
        let (mut graph, root, web, about) = sample();
        let other = graph.create_topic("Other", "Page", Some(root)).unwrap();
        graph.relate(other, "Related", about).unwrap();

        assert_eq!(graph.delete_topic(web).unwrap(), 2);
        assert!(!graph.contains(about));
        assert!(graph.associations().related(other, "Related").is_empty());
        assert_eq!(graph.record(root).unwrap().children, vec![other]);
    }

    #[test]
    fn test_relate_requires_existing_topics() {
        let (mut graph, root, _, _) = sample();
        let result = graph.relate(root, "Related", TopicId::new(999));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_replace_relationship() {
        let (mut graph, root, web, about) = sample();
        graph.relate(root, "Featured", web).unwrap();
        graph.replace_relationship(root, "Featured", &[about]).unwrap();
        assert_eq!(graph.associations().related(root, "Featured"), &[about]);
        assert!(graph.associations().incoming_related(web, "Featured").is_empty());
    }
}

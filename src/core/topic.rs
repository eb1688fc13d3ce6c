// Topic - read handle onto a node of a shared TopicGraph snapshot

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::core::strong_types::TopicId;
use crate::core::topic_graph::{TopicGraph, TopicRecord, BASE_TOPIC_REFERENCE};

/// Content type whose children form a named nested topic list.
pub const LIST_CONTENT_TYPE: &str = "List";

const MAX_BASE_TOPIC_HOPS: usize = 5;

/// Cheap, cloneable handle: a shared graph snapshot plus an id.
///
/// Handles are only issued by [`TopicGraph::topic`] for ids present in the
/// snapshot, and the snapshot behind the `Arc` is never mutated in place.
#[derive(Clone)]
pub struct Topic {
    graph: Arc<TopicGraph>,
    id: TopicId,
}

impl Topic {
    pub(crate) fn new(graph: Arc<TopicGraph>, id: TopicId) -> Self {
        Self { graph, id }
    }

    fn record(&self) -> &TopicRecord {
        self.graph_record(self.id)
    }

    fn graph_record(&self, id: TopicId) -> &TopicRecord {
        // Ids reachable from a handle always exist in the same snapshot.
        &self.graph.topics_index()[&id]
    }

    fn handle(&self, id: TopicId) -> Topic {
        Topic::new(Arc::clone(&self.graph), id)
    }

    fn handles(&self, ids: &[TopicId]) -> Vec<Topic> {
        ids.iter().map(|id| self.handle(*id)).collect()
    }

    pub fn graph(&self) -> &Arc<TopicGraph> {
        &self.graph
    }

    pub fn id(&self) -> TopicId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.record().key
    }

    pub fn content_type(&self) -> &str {
        &self.record().content_type
    }

    pub fn is_content_type(&self, content_type: &str) -> bool {
        self.content_type().eq_ignore_ascii_case(content_type)
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.record().last_modified
    }

    pub fn is_hidden(&self) -> bool {
        self.record().hidden
    }

    pub fn is_disabled(&self) -> bool {
        self.record().disabled
    }

    pub fn is_visible(&self) -> bool {
        !self.is_hidden() && !self.is_disabled()
    }

    pub fn parent(&self) -> Option<Topic> {
        self.record().parent.map(|id| self.handle(id))
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn ancestors(&self) -> Vec<Topic> {
        let mut result = Vec::new();
        let mut current = self.record().parent;
        while let Some(id) = current {
            result.push(self.handle(id));
            current = self.graph_record(id).parent;
        }
        result
    }

    pub fn children(&self) -> Vec<Topic> {
        self.handles(&self.record().children)
    }

    pub fn visible_children(&self) -> Vec<Topic> {
        self.children()
            .into_iter()
            .filter(|child| child.is_visible())
            .collect()
    }

    pub fn child(&self, key: &str) -> Option<Topic> {
        self.graph.child_by_key(self.id, key).map(|id| self.handle(id))
    }

    /// Colon-delimited key path from the root, e.g. `Root:Web:About`.
    pub fn unique_key(&self) -> String {
        let mut keys: Vec<&str> = vec![self.key()];
        let mut current = self.record().parent;
        while let Some(id) = current {
            let record = self.graph_record(id);
            keys.push(&record.key);
            current = record.parent;
        }
        keys.reverse();
        keys.join(":")
    }

    /// Routing path with the root key omitted, e.g. `/Web/About/`.
    pub fn web_path(&self) -> String {
        let unique_key = self.unique_key();
        let segments: Vec<&str> = unique_key.split(':').skip(1).collect();
        if segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", segments.join("/"))
        }
    }

    /// Title attribute, falling back to the key.
    pub fn title(&self) -> String {
        self.attribute_value("Title", false)
            .unwrap_or_else(|| self.key().to_string())
    }

    /// The topic's own attribute value, without derivation or inheritance.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.record().attribute(key)
    }

    /// Effective attribute value: own value, then the `BaseTopic` chain, then,
    /// when `inherit` is set, the same lookup on each ancestor.
    pub fn attribute_value(&self, key: &str, inherit: bool) -> Option<String> {
        let mut current = Some(self.id);
        while let Some(id) = current {
            if let Some(value) = self.derived_value(id, key) {
                return Some(value);
            }
            if !inherit {
                return None;
            }
            current = self.graph_record(id).parent;
        }
        None
    }

    fn derived_value(&self, id: TopicId, key: &str) -> Option<String> {
        let mut current = id;
        for _ in 0..=MAX_BASE_TOPIC_HOPS {
            if let Some(value) = self.graph_record(current).attribute(key) {
                return Some(value.to_string());
            }
            current = self
                .graph
                .associations()
                .reference(current, BASE_TOPIC_REFERENCE)?;
        }
        None
    }

    pub fn has_relationship(&self, name: &str) -> bool {
        !self.graph.associations().related(self.id, name).is_empty()
    }

    pub fn relationship(&self, name: &str) -> Vec<Topic> {
        self.handles(self.graph.associations().related(self.id, name))
    }

    pub fn has_incoming_relationship(&self, name: &str) -> bool {
        !self
            .graph
            .associations()
            .incoming_related(self.id, name)
            .is_empty()
    }

    pub fn incoming_relationship(&self, name: &str) -> Vec<Topic> {
        self.handles(self.graph.associations().incoming_related(self.id, name))
    }

    pub fn reference(&self, name: &str) -> Option<Topic> {
        self.graph
            .associations()
            .reference(self.id, name)
            .map(|id| self.handle(id))
    }

    pub fn incoming_references(&self, name: &str) -> Vec<Topic> {
        self.handles(self.graph.associations().incoming_references(self.id, name))
    }

    pub fn all_related(&self) -> Vec<Topic> {
        self.handles(&self.graph.associations().all_related(self.id))
    }

    pub fn all_incoming_related(&self) -> Vec<Topic> {
        self.handles(&self.graph.associations().all_incoming_related(self.id))
    }

    /// Children of the `List` child keyed `name`, if one exists.
    pub fn nested_topics(&self, name: &str) -> Option<Vec<Topic>> {
        self.child(name)
            .filter(|list| list.is_content_type(LIST_CONTENT_TYPE))
            .map(|list| list.children())
    }
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.graph, &other.graph)
    }
}

impl Eq for Topic {}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("id", &self.id)
            .field("key", &self.key())
            .field("content_type", &self.content_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Arc<TopicGraph> {
        let mut graph = TopicGraph::new();
        let root = graph.create_topic("Root", "Container", None).unwrap();
        let web = graph.create_topic("Web", "Page", Some(root)).unwrap();
        graph.set_attribute(web, "Title", "Web Home").unwrap();
        graph.set_attribute(web, "Theme", "Dark").unwrap();
        let about = graph.create_topic("About", "Page", Some(web)).unwrap();
        let contact = graph.create_topic("Contact", "Page", Some(web)).unwrap();
        graph.set_hidden(contact, true).unwrap();
        let template = graph.create_topic("Template", "Page", Some(root)).unwrap();
        graph.set_attribute(template, "Footer", "Shared footer").unwrap();
        graph.set_reference(about, BASE_TOPIC_REFERENCE, Some(template)).unwrap();
        let list = graph.create_topic("Links", LIST_CONTENT_TYPE, Some(about)).unwrap();
        graph.create_topic("First", "Link", Some(list)).unwrap();
        graph.relate(about, "Related", contact).unwrap();
        Arc::new(graph)
    }

    #[test]
    fn test_paths_and_title() {
        let graph = graph();
        let about = graph.find("Root:Web:About").unwrap();
        assert_eq!(about.unique_key(), "Root:Web:About");
        assert_eq!(about.web_path(), "/Web/About/");
        assert_eq!(about.title(), "About");
        assert_eq!(graph.find("Root").unwrap().web_path(), "/");
        assert_eq!(graph.find("Root:Web").unwrap().title(), "Web Home");
    }

    #[test]
    fn test_attribute_inheritance_and_derivation() {
        let graph = graph();
        let about = graph.find("Root:Web:About").unwrap();
        assert_eq!(about.attribute_value("Theme", false), None);
        assert_eq!(about.attribute_value("Theme", true).as_deref(), Some("Dark"));
        assert_eq!(
            about.attribute_value("Footer", false).as_deref(),
            Some("Shared footer")
        );
    }

    #[test]
    fn test_visibility_and_relationships() {
        let graph = graph();
        let web = graph.find("Root:Web").unwrap();
        let visible: Vec<String> = web
            .visible_children()
            .iter()
            .map(|t| t.key().to_string())
            .collect();
        assert_eq!(visible, vec!["About"]);

        let contact = graph.find("Root:Web:Contact").unwrap();
        let incoming = contact.incoming_relationship("Related");
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].key(), "About");
    }

    #[test]
    fn test_nested_topics_and_ancestors() {
        let graph = graph();
        let about = graph.find("Root:Web:About").unwrap();
        let links = about.nested_topics("Links").unwrap();
        assert_eq!(links.len(), 1);
        assert!(about.nested_topics("Missing").is_none());

        let ancestors: Vec<String> = about
            .ancestors()
            .iter()
            .map(|t| t.key().to_string())
            .collect();
        assert_eq!(ancestors, vec!["Web", "Root"]);
    }
}

// View Model - materialized presentation DTOs produced by the mapping engine

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::sync::Arc;

use crate::core::strong_types::TopicId;
use crate::core::topic::Topic;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

impl ScalarValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            ScalarValue::DateTime(value) => Some(*value),
            _ => None,
        }
    }
}

/// Ordered collection of mapped topics in which keys are unique.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct TopicViewModelCollection {
    items: Vec<Arc<ViewModel>>,
}

impl TopicViewModelCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item`; a second item with an already-used key is an error.
    pub fn try_push(&mut self, item: Arc<ViewModel>) -> AppResult<()> {
        if self.contains_key(&item.key) {
            return Err(AppError::DuplicateKey(format!(
                "Collection already contains a view model keyed '{}'",
                item.key
            )));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|i| i.key.eq_ignore_ascii_case(key))
    }

    pub fn get(&self, key: &str) -> Option<&Arc<ViewModel>> {
        self.items.iter().find(|i| i.key.eq_ignore_ascii_case(key))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ViewModel>> {
        self.items.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.key.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MappedValue {
    Scalar(ScalarValue),
    Topic(Arc<ViewModel>),
    Collection(TopicViewModelCollection),
}

/// Property values in declaration order
#[derive(Debug, Clone, Default)]
pub struct PropertyMap(Vec<(String, MappedValue)>);

impl PropertyMap {
    pub fn get(&self, name: &str) -> Option<&MappedValue> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn insert(&mut self, name: &str, value: MappedValue) {
        match self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A topic projected into a registered view-model shape.
#[derive(Debug, Clone, Serialize)]
pub struct ViewModel {
    pub view_model_type: String,
    pub id: TopicId,
    pub key: String,
    pub content_type: String,
    pub unique_key: String,
    pub web_path: String,
    pub properties: PropertyMap,
}

impl ViewModel {
    /// Identity-only view model for `topic`.
    pub fn shape(topic: &Topic, view_model_type: &str) -> Self {
        Self {
            view_model_type: view_model_type.to_string(),
            id: topic.id(),
            key: topic.key().to_string(),
            content_type: topic.content_type().to_string(),
            unique_key: topic.unique_key(),
            web_path: topic.web_path(),
            properties: PropertyMap::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MappedValue> {
        self.properties.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<&ScalarValue> {
        match self.properties.get(name) {
            Some(MappedValue::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.scalar(name).and_then(ScalarValue::as_str)
    }

    pub fn topic(&self, name: &str) -> Option<&Arc<ViewModel>> {
        match self.properties.get(name) {
            Some(MappedValue::Topic(value)) => Some(value),
            _ => None,
        }
    }

    pub fn collection(&self, name: &str) -> Option<&TopicViewModelCollection> {
        match self.properties.get(name) {
            Some(MappedValue::Collection(value)) => Some(value),
            _ => None,
        }
    }

    /// Title property when mapped, otherwise the key.
    pub fn title(&self) -> &str {
        self.string("Title").unwrap_or(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::topic_graph::TopicGraph;

    fn model(key: &str, id: i64) -> Arc<ViewModel> {
        Arc::new(ViewModel {
            view_model_type: "TopicViewModel".to_string(),
            id: TopicId::new(id),
            key: key.to_string(),
            content_type: "Page".to_string(),
            unique_key: format!("Root:{}", key),
            web_path: format!("/{}/", key),
            properties: PropertyMap::default(),
        })
    }

    #[test]
    fn test_collection_rejects_duplicate_keys() {
        let mut collection = TopicViewModelCollection::new();
        collection.try_push(model("About", 1)).unwrap();
        collection.try_push(model("Contact", 2)).unwrap();
        let result = collection.try_push(model("about", 3));
        assert!(matches!(result, Err(AppError::DuplicateKey(_))));
        assert_eq!(collection.keys(), vec!["About", "Contact"]);
    }

    #[test]
    fn test_properties_serialize_in_declaration_order() {
        let mut graph = TopicGraph::new();
        let root = graph.create_topic("Root", "Container", None).unwrap();
        let graph = Arc::new(graph);
        let topic = graph.topic(root).unwrap();

        let mut view_model = ViewModel::shape(&topic, "TopicViewModel");
        view_model
            .properties
            .insert("Title", MappedValue::Scalar(ScalarValue::String("Home".into())));
        view_model
            .properties
            .insert("Count", MappedValue::Scalar(ScalarValue::Int(3)));
        view_model
            .properties
            .insert("Children", MappedValue::Collection(TopicViewModelCollection::new()));

        let json = serde_json::to_value(&view_model).unwrap();
        assert_eq!(json["properties"]["Title"], "Home");
        assert_eq!(json["properties"]["Count"], 3);
        assert!(json["properties"]["Children"].as_array().unwrap().is_empty());
        assert_eq!(view_model.properties.names(), vec!["Title", "Count", "Children"]);
        assert_eq!(view_model.title(), "Home");
    }
}

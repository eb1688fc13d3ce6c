//! Registry of content-type descriptors.
//!
//! Effective attribute sets are inherited along the content-type parent chain
//! and memoized per content type. Any change to a content type's attributes or
//! parent link invalidates the memoized set of that content type and of every
//! content type that descends from it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::core::topic::Topic;
use crate::core::topic_graph::TopicGraph;
use crate::error::{AppError, AppResult};
use crate::schema::content_type::{AttributeDescriptor, ContentTypeDescriptor, StorageMode};

/// Content type of topics that describe content types.
pub const CONTENT_TYPE_DESCRIPTOR: &str = "ContentTypeDescriptor";

/// Reserved child grouping that holds a content type's attribute descriptors.
pub const ATTRIBUTES_GROUP: &str = "Attributes";

/// Relationship on a content-type topic listing the permitted child content types.
pub const PERMITTED_CONTENT_TYPES: &str = "ContentTypes";

pub type AttributeSet = Arc<[AttributeDescriptor]>;

#[derive(Debug, Default)]
pub struct ContentTypeRegistry {
    descriptors: HashMap<String, ContentTypeDescriptor>,
    resolved: RwLock<HashMap<String, AttributeSet>>,
}

fn normalize(key: &str) -> String {
    key.to_ascii_lowercase()
}

impl ContentTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Its parent, when named, must already be registered.
    pub fn register(&mut self, descriptor: ContentTypeDescriptor) -> AppResult<()> {
        let key = normalize(&descriptor.key);
        if self.descriptors.contains_key(&key) {
            return Err(AppError::DuplicateKey(format!(
                "Content type '{}' is already registered",
                descriptor.key
            )));
        }
        if let Some(parent) = &descriptor.parent {
            if !self.descriptors.contains_key(&normalize(parent)) {
                return Err(AppError::NotFound(format!(
                    "Parent content type '{}' of '{}'",
                    parent, descriptor.key
                )));
            }
        }
        debug!("Registered content type '{}'", descriptor.key);
        self.descriptors.insert(key, descriptor);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ContentTypeDescriptor> {
        self.descriptors.get(&normalize(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.descriptors.contains_key(&normalize(key))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.descriptors.values().map(|d| d.key.as_str())
    }

    /// Effective attributes of `content_type`: its own first, then inherited ones
    /// whose key is not already present.
    pub fn attribute_descriptors(&self, content_type: &str) -> AppResult<AttributeSet> {
        let key = normalize(content_type);
        if let Ok(cache) = self.resolved.read() {
            if let Some(set) = cache.get(&key) {
                return Ok(Arc::clone(set));
            }
        }

        let mut collected: Vec<AttributeDescriptor> = Vec::new();
        for descriptor in self.chain(content_type)? {
            for attribute in &descriptor.attributes {
                if !collected
                    .iter()
                    .any(|existing| existing.key.eq_ignore_ascii_case(&attribute.key))
                {
                    collected.push(attribute.clone());
                }
            }
        }

        let set: AttributeSet = collected.into();
        if let Ok(mut cache) = self.resolved.write() {
            cache.insert(key, Arc::clone(&set));
        }
        Ok(set)
    }

    pub fn attribute_descriptor(
        &self,
        content_type: &str,
        attribute_key: &str,
    ) -> AppResult<Option<AttributeDescriptor>> {
        Ok(self
            .attribute_descriptors(content_type)?
            .iter()
            .find(|attribute| attribute.key.eq_ignore_ascii_case(attribute_key))
            .cloned())
    }

    pub fn add_attribute(
        &mut self,
        content_type: &str,
        attribute: AttributeDescriptor,
    ) -> AppResult<()> {
        let descriptor = self.descriptor_mut(content_type)?;
        if descriptor.own_attribute(&attribute.key).is_some() {
            return Err(AppError::DuplicateKey(format!(
                "Attribute '{}' already defined on '{}'",
                attribute.key, content_type
            )));
        }
        descriptor.upsert_attribute(attribute);
        self.invalidate(content_type);
        Ok(())
    }

    pub fn remove_attribute(&mut self, content_type: &str, attribute_key: &str) -> AppResult<bool> {
        let descriptor = self.descriptor_mut(content_type)?;
        let before = descriptor.attributes.len();
        descriptor
            .attributes
            .retain(|attribute| !attribute.key.eq_ignore_ascii_case(attribute_key));
        let removed = descriptor.attributes.len() != before;
        if removed {
            self.invalidate(content_type);
        }
        Ok(removed)
    }

    /// Re-link `content_type` under `parent`. Links that would form a cycle are rejected.
    pub fn set_parent(&mut self, content_type: &str, parent: Option<&str>) -> AppResult<()> {
        if !self.contains(content_type) {
            return Err(AppError::NotFound(format!("Content type '{}'", content_type)));
        }
        if let Some(parent_key) = parent {
            if !self.contains(parent_key) {
                return Err(AppError::NotFound(format!(
                    "Parent content type '{}'",
                    parent_key
                )));
            }
            if self.is_type_of(parent_key, content_type) {
                return Err(AppError::Validation(format!(
                    "Content type '{}' cannot derive from its own descendant '{}'",
                    content_type, parent_key
                )));
            }
        }
        self.descriptor_mut(content_type)?.parent = parent.map(str::to_string);
        self.invalidate(content_type);
        Ok(())
    }

    /// True when `content_type` is `name` or derives from it.
    pub fn is_type_of(&self, content_type: &str, name: &str) -> bool {
        let mut current = self.get(content_type);
        let mut hops = 0;
        while let Some(descriptor) = current {
            if descriptor.key.eq_ignore_ascii_case(name) {
                return true;
            }
            hops += 1;
            if hops > self.descriptors.len() {
                break;
            }
            current = descriptor.parent.as_deref().and_then(|p| self.get(p));
        }
        false
    }

    /// Every registered content type deriving from `content_type`, excluding itself.
    pub fn descendants(&self, content_type: &str) -> Vec<String> {
        self.descriptors
            .values()
            .filter(|d| !d.key.eq_ignore_ascii_case(content_type))
            .filter(|d| self.is_type_of(&d.key, content_type))
            .map(|d| d.key.clone())
            .collect()
    }

    pub fn permits_child(&self, parent_type: &str, child_type: &str) -> bool {
        self.get(parent_type)
            .map(|descriptor| descriptor.permits_child(child_type))
            .unwrap_or(false)
    }

    /// Drop the memoized attribute set of `content_type` and its descendants.
    pub fn invalidate(&self, content_type: &str) {
        let mut keys = self.descendants(content_type);
        keys.push(content_type.to_string());
        if let Ok(mut cache) = self.resolved.write() {
            for key in &keys {
                cache.remove(&normalize(key));
            }
        }
        debug!("Invalidated attribute descriptors for {:?}", keys);
    }

    pub fn cached_len(&self) -> usize {
        self.resolved.read().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_cached(&self, content_type: &str) -> bool {
        self.resolved
            .read()
            .map(|cache| cache.contains_key(&normalize(content_type)))
            .unwrap_or(false)
    }

    /// Build a registry from content-type topics in `graph`.
    ///
    /// Content types are topics of type `ContentTypeDescriptor`; the parent content type
    /// is the nearest ancestor topic of the same type. Attribute descriptors are the
    /// children of the reserved `Attributes` child grouping.
    pub fn from_graph(graph: &Arc<TopicGraph>) -> AppResult<Self> {
        let mut registry = Self::new();
        let mut pending: Vec<Topic> = graph
            .roots()
            .iter()
            .rev()
            .filter_map(|id| graph.topic(*id))
            .collect();

        // Pre-order so parent content types are registered before their children.
        while let Some(topic) = pending.pop() {
            if topic.is_content_type(CONTENT_TYPE_DESCRIPTOR) {
                let descriptor = descriptor_from_topic(&topic);
                registry.register(descriptor)?;
            }
            let mut children = topic.children();
            children.reverse();
            pending.extend(children);
        }
        Ok(registry)
    }

    fn chain(&self, content_type: &str) -> AppResult<Vec<&ContentTypeDescriptor>> {
        let mut chain = Vec::new();
        let mut current = Some(
            self.get(content_type)
                .ok_or_else(|| AppError::NotFound(format!("Content type '{}'", content_type)))?,
        );
        while let Some(descriptor) = current {
            if chain.len() > self.descriptors.len() {
                warn!("Content type chain of '{}' does not terminate", content_type);
                break;
            }
            chain.push(descriptor);
            current = descriptor.parent.as_deref().and_then(|p| self.get(p));
        }
        Ok(chain)
    }

    fn descriptor_mut(&mut self, content_type: &str) -> AppResult<&mut ContentTypeDescriptor> {
        self.descriptors
            .get_mut(&normalize(content_type))
            .ok_or_else(|| AppError::NotFound(format!("Content type '{}'", content_type)))
    }
}

fn flag(topic: &Topic, key: &str) -> bool {
    matches!(
        topic.attribute(key).map(str::to_ascii_lowercase).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

fn descriptor_from_topic(topic: &Topic) -> ContentTypeDescriptor {
    let mut descriptor = ContentTypeDescriptor::new(topic.key());
    descriptor.parent = topic
        .ancestors()
        .into_iter()
        .find(|ancestor| ancestor.is_content_type(CONTENT_TYPE_DESCRIPTOR))
        .map(|ancestor| ancestor.key().to_string());
    descriptor.description = topic.attribute("Description").map(str::to_string);

    if let Some(group) = topic.child(ATTRIBUTES_GROUP) {
        for attribute_topic in group.children() {
            descriptor.upsert_attribute(attribute_from_topic(&attribute_topic));
        }
    }
    for permitted in topic.relationship(PERMITTED_CONTENT_TYPES) {
        descriptor = descriptor.permit_child(permitted.key());
    }
    descriptor
}

fn attribute_from_topic(topic: &Topic) -> AttributeDescriptor {
    AttributeDescriptor {
        key: topic.key().to_string(),
        editor_type: topic.content_type().to_string(),
        display_group: topic
            .attribute("DisplayGroup")
            .unwrap_or("Content")
            .to_string(),
        description: topic.attribute("Description").map(str::to_string),
        is_required: flag(topic, "IsRequired"),
        default_value: topic.attribute("DefaultValue").map(str::to_string),
        sort_order: topic
            .attribute("SortOrder")
            .and_then(|v| v.parse().ok())
            .unwrap_or(25),
        storage: if flag(topic, "IsExtendedAttribute") {
            StorageMode::Extended
        } else {
            StorageMode::Indexed
        },
    }
}

// Content Type Schema - declarative descriptors for content types and their attributes

use serde::{Deserialize, Serialize};

/// Where an attribute's value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StorageMode {
    /// Always loaded with the topic.
    #[default]
    Indexed,
    /// Stored out-of-band; not guaranteed to be present without an explicit fetch.
    Extended,
}

/// Describes one schema attribute of a content type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub key: String,
    pub editor_type: String,
    pub display_group: String,
    pub description: Option<String>,
    pub is_required: bool,
    pub default_value: Option<String>,
    pub sort_order: i32,
    pub storage: StorageMode,
}

impl AttributeDescriptor {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            editor_type: "TextAttribute".to_string(),
            display_group: "Content".to_string(),
            description: None,
            is_required: false,
            default_value: None,
            sort_order: 25,
            storage: StorageMode::Indexed,
        }
    }

    pub fn editor(mut self, editor_type: &str) -> Self {
        self.editor_type = editor_type.to_string();
        self
    }

    pub fn group(mut self, display_group: &str) -> Self {
        self.display_group = display_group.to_string();
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn extended(mut self) -> Self {
        self.storage = StorageMode::Extended;
        self
    }

    pub fn is_extended(&self) -> bool {
        self.storage == StorageMode::Extended
    }

    /// Indexed attributes are always loaded, extended ones need an explicit fetch.
    pub fn is_always_available(&self) -> bool {
        self.storage == StorageMode::Indexed
    }
}

/// Schema for one content type. Only directly-defined attributes are held here;
/// inherited attributes are resolved by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeDescriptor {
    pub key: String,
    pub parent: Option<String>,
    pub attributes: Vec<AttributeDescriptor>,
    pub permitted_children: Vec<String>,
    pub description: Option<String>,
}

impl ContentTypeDescriptor {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            parent: None,
            attributes: Vec::new(),
            permitted_children: Vec::new(),
            description: None,
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// Add an attribute; an existing attribute with the same key is replaced in place.
    pub fn with_attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.upsert_attribute(attribute);
        self
    }

    pub fn permit_child(mut self, content_type: &str) -> Self {
        if !self
            .permitted_children
            .iter()
            .any(|c| c.eq_ignore_ascii_case(content_type))
        {
            self.permitted_children.push(content_type.to_string());
        }
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn own_attribute(&self, key: &str) -> Option<&AttributeDescriptor> {
        self.attributes
            .iter()
            .find(|attribute| attribute.key.eq_ignore_ascii_case(key))
    }

    pub(crate) fn upsert_attribute(&mut self, attribute: AttributeDescriptor) {
        match self
            .attributes
            .iter_mut()
            .find(|existing| existing.key.eq_ignore_ascii_case(&attribute.key))
        {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    pub fn permits_child(&self, content_type: &str) -> bool {
        self.permitted_children
            .iter()
            .any(|c| c.eq_ignore_ascii_case(content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_attribute_replaces_same_key() {
        let descriptor = ContentTypeDescriptor::new("Page")
            .with_attribute(AttributeDescriptor::new("Title"))
            .with_attribute(AttributeDescriptor::new("Body").extended())
            .with_attribute(AttributeDescriptor::new("title").required());

        assert_eq!(descriptor.attributes.len(), 2);
        assert!(descriptor.own_attribute("TITLE").unwrap().is_required);
        assert!(descriptor.own_attribute("Body").unwrap().is_extended());
        assert!(!descriptor.own_attribute("Body").unwrap().is_always_available());
    }

    #[test]
    fn test_permitted_children_are_deduplicated() {
        let descriptor = ContentTypeDescriptor::new("Page")
            .permit_child("Page")
            .permit_child("page")
            .permit_child("Video");
        assert_eq!(descriptor.permitted_children.len(), 2);
        assert!(descriptor.permits_child("VIDEO"));
        assert!(!descriptor.permits_child("Slideshow"));
    }
}

// View Model Schema - registered mapping tables describing each view-model type
// Each property declares where its value comes from; the mapping engine reads
// these tables instead of inspecting types at runtime.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::framework::association_types::{AssociationCategory, AssociationTypes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Bool,
    DateTime,
}

/// Declared shape of a view-model property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    Scalar(ScalarType),
    /// A single associated topic (reference)
    Topic,
    /// An ordered, key-unique collection of associated topics
    Collection,
    /// The topic's parent, mapped recursively up to the root when followed
    Parent,
}

/// Attribute equality predicate applied to associated topics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMapping {
    pub name: String,
    pub kind: PropertyKind,
    pub attribute_key: Option<String>,
    pub default_value: Option<String>,
    pub inherit: bool,
    pub required: bool,
    pub association: Option<AssociationCategory>,
    pub association_key: Option<String>,
    pub map_as: Option<String>,
    pub element_type: Option<String>,
    pub attribute_filters: Vec<AttributeFilter>,
    pub content_type_filters: Vec<String>,
    pub flatten: bool,
    pub include: AssociationTypes,
}

impl PropertyMapping {
    fn new(name: &str, kind: PropertyKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            attribute_key: None,
            default_value: None,
            inherit: false,
            required: false,
            association: None,
            association_key: None,
            map_as: None,
            element_type: None,
            attribute_filters: Vec::new(),
            content_type_filters: Vec::new(),
            flatten: false,
            include: AssociationTypes::NONE,
        }
    }

    pub fn scalar(name: &str, scalar_type: ScalarType) -> Self {
        Self::new(name, PropertyKind::Scalar(scalar_type))
    }

    pub fn string(name: &str) -> Self {
        Self::scalar(name, ScalarType::String)
    }

    pub fn topic(name: &str) -> Self {
        Self::new(name, PropertyKind::Topic)
    }

    pub fn collection(name: &str) -> Self {
        Self::new(name, PropertyKind::Collection)
    }

    pub fn parent(name: &str) -> Self {
        Self::new(name, PropertyKind::Parent)
    }

    /// Read the scalar from a differently named attribute.
    pub fn attribute_key(mut self, key: &str) -> Self {
        self.attribute_key = Some(key.to_string());
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    /// Fall back to ancestors' values when the topic has none.
    pub fn inherit(mut self) -> Self {
        self.inherit = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Pin the association category instead of searching for one.
    pub fn association(mut self, category: AssociationCategory) -> Self {
        self.association = Some(category);
        self
    }

    /// Search for the association under `key` instead of the property name.
    pub fn key(mut self, key: &str) -> Self {
        self.association_key = Some(key.to_string());
        self
    }

    /// Map every element as `view_model` regardless of its content type.
    pub fn map_as(mut self, view_model: &str) -> Self {
        self.map_as = Some(view_model.to_string());
        self
    }

    /// Only accept elements whose view model is, or extends, `view_model`.
    pub fn of(mut self, view_model: &str) -> Self {
        self.element_type = Some(view_model.to_string());
        self
    }

    pub fn filter_by(mut self, key: &str, value: &str) -> Self {
        self.attribute_filters.push(AttributeFilter {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type_filters.push(content_type.to_string());
        self
    }

    pub fn flatten(mut self) -> Self {
        self.flatten = true;
        self
    }

    /// Associations to follow on each mapped element.
    pub fn include(mut self, associations: AssociationTypes) -> Self {
        self.include = associations;
        self
    }

    pub fn is_association(&self) -> bool {
        !matches!(self.kind, PropertyKind::Scalar(_))
    }

    /// Name used when searching the topic's associations.
    pub fn source_key(&self) -> &str {
        self.association_key
            .as_deref()
            .or(self.attribute_key.as_deref())
            .unwrap_or(&self.name)
    }

    /// Name used when reading the topic's attributes.
    pub fn attribute_source(&self) -> &str {
        self.attribute_key.as_deref().unwrap_or(&self.name)
    }
}

/// Registered mapping table for one view-model type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModelSchema {
    pub name: String,
    /// Content type this view model binds to, when it differs from the naming convention.
    pub content_type: Option<String>,
    /// This type's name followed by every base type's name.
    lineage: Vec<String>,
    properties: Vec<PropertyMapping>,
}

impl ViewModelSchema {
    pub fn builder(name: &str) -> ViewModelSchemaBuilder {
        ViewModelSchemaBuilder {
            name: name.to_string(),
            content_type: None,
            lineage: vec![name.to_string()],
            properties: Vec::new(),
        }
    }

    pub fn properties(&self) -> &[PropertyMapping] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyMapping> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn base(&self) -> Option<&str> {
        self.lineage.get(1).map(String::as_str)
    }

    /// True when this schema is `name` or extends it.
    pub fn is_assignable_to(&self, name: &str) -> bool {
        self.lineage.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

pub struct ViewModelSchemaBuilder {
    name: String,
    content_type: Option<String>,
    lineage: Vec<String>,
    properties: Vec<PropertyMapping>,
}

impl ViewModelSchemaBuilder {
    /// Inherit `base`'s properties; they keep their order and come first.
    pub fn extends(mut self, base: &ViewModelSchema) -> Self {
        self.lineage.truncate(1);
        self.lineage.extend(base.lineage.iter().cloned());
        let own = std::mem::take(&mut self.properties);
        self.properties = base.properties.clone();
        for property in own {
            self = self.property(property);
        }
        self
    }

    pub fn for_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Declare a property; redeclaring a name replaces the earlier mapping in place.
    pub fn property(mut self, property: PropertyMapping) -> Self {
        match self
            .properties
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&property.name))
        {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
        self
    }

    pub fn build(self) -> Arc<ViewModelSchema> {
        Arc::new(ViewModelSchema {
            name: self.name,
            content_type: self.content_type,
            lineage: self.lineage,
            properties: self.properties,
        })
    }
}

// Reverse Topic Mapping Service - binds submitted models back onto topics
// All validation happens before the first write so a rejected binding leaves
// the graph untouched.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::core::strong_types::TopicId;
use crate::core::topic_graph::TopicGraph;
use crate::error::{AppError, AppResult};
use crate::framework::type_lookup::TypeLookup;
use crate::schema::registry::ContentTypeRegistry;

/// Values submitted for one topic, addressed by attribute and association name.
#[derive(Debug, Clone, Default)]
pub struct BindingModel {
    pub type_name: String,
    pub attributes: Vec<(String, String)>,
    /// Relationship name to target unique keys; each listed set replaces the stored one.
    pub relationships: Vec<(String, Vec<String>)>,
    /// Reference name to target unique key, `None` clears the reference.
    pub references: Vec<(String, Option<String>)>,
}

impl BindingModel {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            ..Self::default()
        }
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    pub fn relationship(mut self, name: &str, targets: &[&str]) -> Self {
        let targets = targets.iter().map(|t| t.to_string()).collect();
        self.relationships.push((name.to_string(), targets));
        self
    }

    pub fn reference(mut self, name: &str, target: Option<&str>) -> Self {
        self.references
            .push((name.to_string(), target.map(str::to_string)));
        self
    }
}

enum PendingWrite {
    Attribute(String, String),
    Relationship(String, Vec<TopicId>),
    Reference(String, Option<TopicId>),
}

pub struct ReverseTopicMappingService {
    lookup: Arc<dyn TypeLookup>,
    content_types: Arc<ContentTypeRegistry>,
}

impl ReverseTopicMappingService {
    pub fn new(lookup: Arc<dyn TypeLookup>, content_types: Arc<ContentTypeRegistry>) -> Self {
        Self {
            lookup,
            content_types,
        }
    }

    #[instrument(skip(self, graph, binding), fields(binding = %binding.type_name))]
    pub fn bind(&self, graph: &mut TopicGraph, target: TopicId, binding: &BindingModel) -> AppResult<()> {
        let writes = self.plan(graph, target, binding)?;
        let count = writes.len();
        for write in writes {
            match write {
                PendingWrite::Attribute(key, value) => graph.set_attribute(target, &key, &value)?,
                PendingWrite::Relationship(name, targets) => {
                    graph.replace_relationship(target, &name, &targets)?
                }
                PendingWrite::Reference(name, reference) => {
                    graph.set_reference(target, &name, reference)?;
                }
            }
        }
        info!("Bound {} values onto topic {}", count, target);
        Ok(())
    }

    fn plan(&self, graph: &TopicGraph, target: TopicId, binding: &BindingModel) -> AppResult<Vec<PendingWrite>> {
        let record = graph
            .record(target)
            .ok_or_else(|| AppError::NotFound(format!("Topic {}", target)))?;

        let content_type = self
            .lookup
            .resolve_content_type(&binding.type_name)
            .ok_or_else(|| {
                AppError::TypeResolution(format!(
                    "Binding model '{}' does not name a content type",
                    binding.type_name
                ))
            })?;
        if !record.content_type.eq_ignore_ascii_case(&content_type)
            && !self.content_types.is_type_of(&record.content_type, &content_type)
        {
            return Err(AppError::Validation(format!(
                "Binding model '{}' targets {} but topic {} is a {}",
                binding.type_name, content_type, target, record.content_type
            )));
        }

        let descriptors = self.content_types.attribute_descriptors(&record.content_type)?;
        let mut writes = Vec::new();
        for (key, value) in &binding.attributes {
            let descriptor = descriptors
                .iter()
                .find(|d| d.key.eq_ignore_ascii_case(key))
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "Attribute '{}' is not defined on content type {}",
                        key, record.content_type
                    ))
                })?;
            if descriptor.is_required && value.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "Attribute '{}' is required",
                    descriptor.key
                )));
            }
            writes.push(PendingWrite::Attribute(descriptor.key.clone(), value.clone()));
        }

        for descriptor in descriptors.iter().filter(|d| d.is_required) {
            let bound = binding
                .attributes
                .iter()
                .any(|(key, _)| key.eq_ignore_ascii_case(&descriptor.key));
            let stored = record.attribute(&descriptor.key).is_some();
            if !bound && !stored && descriptor.default_value.is_none() {
                return Err(AppError::Validation(format!(
                    "Attribute '{}' is required",
                    descriptor.key
                )));
            }
        }

        for (name, keys) in &binding.relationships {
            let targets = keys
                .iter()
                .map(|key| resolve_key(graph, key))
                .collect::<AppResult<Vec<_>>>()?;
            writes.push(PendingWrite::Relationship(name.clone(), targets));
        }

        for (name, key) in &binding.references {
            let reference = key.as_deref().map(|k| resolve_key(graph, k)).transpose()?;
            writes.push(PendingWrite::Reference(name.clone(), reference));
        }
        Ok(writes)
    }
}

fn resolve_key(graph: &TopicGraph, unique_key: &str) -> AppResult<TopicId> {
    graph
        .find_id(unique_key)
        .ok_or_else(|| AppError::NotFound(format!("Topic '{}'", unique_key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::type_lookup::TypeLookupService;
    use crate::framework::view_model_schema::ViewModelSchema;
    use crate::schema::content_type::{AttributeDescriptor, ContentTypeDescriptor};

    fn service() -> ReverseTopicMappingService {
        let mut registry = ContentTypeRegistry::new();
        registry
            .register(
                ContentTypeDescriptor::new("Page")
                    .with_attribute(AttributeDescriptor::new("Title").required())
                    .with_attribute(AttributeDescriptor::new("Body")),
            )
            .unwrap();
        registry
            .register(ContentTypeDescriptor::new("LandingPage").with_parent("Page"))
            .unwrap();
        registry.register(ContentTypeDescriptor::new("Video")).unwrap();
        let lookup = TypeLookupService::new()
            .with(ViewModelSchema::builder("PageTopicBindingModel").build())
            .unwrap();
        ReverseTopicMappingService::new(Arc::new(lookup), Arc::new(registry))
    }

    fn graph() -> (TopicGraph, TopicId, TopicId) {
        let mut graph = TopicGraph::new();
        let root = graph.create_topic("Root", "Page", None).unwrap();
        let landing = graph.create_topic("Landing", "LandingPage", Some(root)).unwrap();
        graph.create_topic("Video", "Video", Some(root)).unwrap();
        graph.create_topic("Tags", "Page", Some(root)).unwrap();
        (graph, root, landing)
    }

    #[test]
    fn test_bind_writes_attributes_and_associations() {
        let service = service();
        let (mut graph, root, landing) = graph();
        let binding = BindingModel::new("PageTopicBindingModel")
            .attribute("title", "Landing")
            .attribute("Body", "Welcome")
            .relationship("Related", &["Root:Video", "Root:Tags"])
            .reference("Owner", Some("Root"));

        service.bind(&mut graph, landing, &binding).unwrap();

        let record = graph.record(landing).unwrap();
        assert_eq!(record.attribute("Title"), Some("Landing"));
        assert_eq!(record.attribute("Body"), Some("Welcome"));
        assert_eq!(graph.associations().related(landing, "Related").len(), 2);
        assert_eq!(graph.associations().reference(landing, "Owner"), Some(root));
        assert_eq!(graph.associations().incoming_references(root, "Owner"), &[landing]);
    }

    #[test]
    fn test_rebinding_replaces_relationships() {
        let service = service();
        let (mut graph, _, landing) = graph();
        let video = graph.find_id("Root:Video").unwrap();
        let first = BindingModel::new("PageTopicBindingModel")
            .attribute("Title", "Landing")
            .relationship("Related", &["Root:Video", "Root:Tags"]);
        service.bind(&mut graph, landing, &first).unwrap();

        let second = BindingModel::new("PageTopicBindingModel").relationship("Related", &["Root:Video"]);
        service.bind(&mut graph, landing, &second).unwrap();
        assert_eq!(graph.associations().related(landing, "Related"), &[video]);
        assert_eq!(graph.associations().incoming_related(video, "Related"), &[landing]);
    }

    #[test]
    fn test_validation_failures_leave_graph_untouched() {
        let service = service();
        let (mut graph, root, landing) = graph();

        let unknown = BindingModel::new("PageTopicBindingModel")
            .attribute("Title", "Landing")
            .attribute("Colour", "Blue");
        assert!(matches!(service.bind(&mut graph, landing, &unknown), Err(AppError::Validation(_))));
        assert!(graph.record(landing).unwrap().attribute("Title").is_none());

        let empty = BindingModel::new("PageTopicBindingModel").attribute("Title", " ");
        assert!(matches!(service.bind(&mut graph, landing, &empty), Err(AppError::Validation(_))));

        let missing = BindingModel::new("PageTopicBindingModel").attribute("Body", "Text");
        assert!(matches!(service.bind(&mut graph, root, &missing), Err(AppError::Validation(_))));

        let dangling = BindingModel::new("PageTopicBindingModel")
            .attribute("Title", "Landing")
            .relationship("Related", &["Root:Nowhere"]);
        assert!(matches!(service.bind(&mut graph, landing, &dangling), Err(AppError::NotFound(_))));
        assert!(graph.record(landing).unwrap().attribute("Title").is_none());
    }

    #[test]
    fn test_binding_type_must_match_target() {
        let service = service();
        let (mut graph, _, _) = graph();
        let video = graph.find_id("Root:Video").unwrap();
        let binding = BindingModel::new("PageTopicBindingModel").attribute("Title", "Clip");
        assert!(matches!(service.bind(&mut graph, video, &binding), Err(AppError::Validation(_))));

        let unnamed = BindingModel::new("Submission");
        assert!(matches!(service.bind(&mut graph, video, &unnamed), Err(AppError::TypeResolution(_))));
    }
}

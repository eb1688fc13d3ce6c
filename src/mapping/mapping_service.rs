// Topic Mapping Service - materializes view models from topics
// Properties are populated from the registered ViewModelSchema of the target
// type; association properties recurse according to include directives.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::config::MappingConfig;
use crate::core::strong_types::TopicId;
use crate::core::topic::Topic;
use crate::error::{AppError, AppResult};
use crate::framework::association_types::AssociationTypes;
use crate::framework::type_lookup::TypeLookup;
use crate::framework::view_model::{MappedValue, ScalarValue, TopicViewModelCollection, ViewModel};
use crate::framework::view_model_schema::{PropertyKind, PropertyMapping, ScalarType, ViewModelSchema};
use crate::mapping::coercion::coerce;
use crate::mapping::resolver::{AssociationResolver, AssociationSource};
use crate::schema::registry::ContentTypeRegistry;

type MappingKey = (TopicId, String, AssociationTypes);

const TITLE_ATTRIBUTE: &str = "Title";

/// Per-call state: finished view models are shared, in-progress ones break cycles.
#[derive(Default)]
struct MappingContext {
    completed: HashMap<MappingKey, Arc<ViewModel>>,
    in_progress: HashSet<MappingKey>,
}

pub struct TopicMappingService {
    lookup: Arc<dyn TypeLookup>,
    content_types: Option<Arc<ContentTypeRegistry>>,
    config: MappingConfig,
}

impl std::fmt::Debug for TopicMappingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicMappingService")
            .field("view_models", &self.lookup.names())
            .field("has_content_types", &self.content_types.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl TopicMappingService {
    pub fn new(lookup: Arc<dyn TypeLookup>, config: MappingConfig) -> Self {
        Self {
            lookup,
            content_types: None,
            config,
        }
    }

    /// Use `registry` for attribute defaults declared on content types.
    pub fn with_content_types(mut self, registry: Arc<ContentTypeRegistry>) -> Self {
        self.content_types = Some(registry);
        self
    }

    pub fn lookup(&self) -> &Arc<dyn TypeLookup> {
        &self.lookup
    }

    /// Map `topic` into `target` (or the view model registered for its content type),
    /// following `associations` on the top-level topic.
    ///
    /// An absent topic yields `Ok(None)`.
    #[instrument(skip_all, fields(topic = ?topic.map(|t| t.id()), target = ?target, associations = ?associations))]
    pub fn map(
        &self,
        topic: Option<&Topic>,
        target: Option<&str>,
        associations: AssociationTypes,
    ) -> AppResult<Option<Arc<ViewModel>>> {
        let Some(topic) = topic else {
            return Ok(None);
        };
        let schema = self.target_schema(topic, target)?;
        let mut context = MappingContext::default();
        self.map_topic(topic, &schema, associations, 0, &mut context)
            .map(Some)
    }

    /// Map every topic into one key-unique collection, in input order.
    #[instrument(skip_all, fields(count = topics.len(), target = ?target))]
    pub fn map_collection(
        &self,
        topics: &[Topic],
        target: Option<&str>,
        associations: AssociationTypes,
    ) -> AppResult<TopicViewModelCollection> {
        let mut context = MappingContext::default();
        let mut collection = TopicViewModelCollection::new();
        for topic in topics {
            let schema = self.target_schema(topic, target)?;
            let model = self.map_topic(topic, &schema, associations, 0, &mut context)?;
            collection.try_push(model)?;
        }
        Ok(collection)
    }

    fn target_schema(&self, topic: &Topic, target: Option<&str>) -> AppResult<Arc<ViewModelSchema>> {
        match target {
            Some(name) => self.lookup.resolve(name).ok_or_else(|| {
                AppError::TypeResolution(format!("View model '{}' is not registered", name))
            }),
            None => self
                .lookup
                .resolve_for_content_type(topic.content_type(), &self.config.default_view_model),
        }
    }

    fn map_topic(
        &self,
        topic: &Topic,
        schema: &Arc<ViewModelSchema>,
        follow: AssociationTypes,
        depth: usize,
        context: &mut MappingContext,
    ) -> AppResult<Arc<ViewModel>> {
        let mut follow = if depth >= self.config.max_depth {
            AssociationTypes::NONE
        } else {
            follow
        };
        let mut key: MappingKey = (topic.id(), schema.name.clone(), follow);
        if let Some(existing) = context.completed.get(&key) {
            return Ok(Arc::clone(existing));
        }
        if context.in_progress.contains(&key) {
            debug!("Cycle on topic {} as {}, mapping shape only", topic.id(), schema.name);
            follow = AssociationTypes::NONE;
            key.2 = follow;
            if let Some(existing) = context.completed.get(&key) {
                return Ok(Arc::clone(existing));
            }
        }

        context.in_progress.insert(key.clone());
        let mut model = ViewModel::shape(topic, &schema.name);
        for property in schema.properties() {
            match property.kind {
                PropertyKind::Scalar(scalar_type) => {
                    if let Some(value) = self.scalar_value(topic, property, scalar_type)? {
                        model.properties.insert(&property.name, MappedValue::Scalar(value));
                    }
                }
                PropertyKind::Collection => {
                    let collection = self
                        .collection_value(topic, property, follow, depth, context)?
                        .unwrap_or_default();
                    model
                        .properties
                        .insert(&property.name, MappedValue::Collection(collection));
                }
                PropertyKind::Topic | PropertyKind::Parent => {
                    if let Some(value) = self.topic_value(topic, property, follow, depth, context)? {
                        model.properties.insert(&property.name, MappedValue::Topic(value));
                    }
                }
            }
        }
        context.in_progress.remove(&key);

        let model = Arc::new(model);
        context.completed.insert(key, Arc::clone(&model));
        Ok(model)
    }

    fn scalar_value(
        &self,
        topic: &Topic,
        property: &PropertyMapping,
        scalar_type: ScalarType,
    ) -> AppResult<Option<ScalarValue>> {
        let source = property.attribute_source();
        // Title falls back to the key only after every attribute lookup.
        let raw = intrinsic_value(topic, source)
            .or_else(|| topic.attribute_value(source, property.inherit))
            .or_else(|| property.default_value.clone())
            .or_else(|| self.schema_default(topic, source))
            .or_else(|| {
                source
                    .eq_ignore_ascii_case(TITLE_ATTRIBUTE)
                    .then(|| topic.key().to_string())
            });

        let Some(raw) = raw else {
            if property.required {
                return Err(AppError::Validation(format!(
                    "Required property '{}' has no value on topic {}",
                    property.name,
                    topic.unique_key()
                )));
            }
            return Ok(None);
        };

        match coerce(&raw, scalar_type) {
            Some(value) => Ok(Some(value)),
            None => {
                warn!(
                    "Skipping property '{}': '{}' is not a valid {:?}",
                    property.name, raw, scalar_type
                );
                Ok(None)
            }
        }
    }

    fn schema_default(&self, topic: &Topic, attribute_key: &str) -> Option<String> {
        let registry = self.content_types.as_ref()?;
        match registry.attribute_descriptor(topic.content_type(), attribute_key) {
            Ok(descriptor) => descriptor.and_then(|d| d.default_value),
            Err(_) => None,
        }
    }

    fn collection_value(
        &self,
        topic: &Topic,
        property: &PropertyMapping,
        follow: AssociationTypes,
        depth: usize,
        context: &mut MappingContext,
    ) -> AppResult<Option<TopicViewModelCollection>> {
        let Some(resolved) = AssociationResolver::resolve(topic, property) else {
            return Ok(None);
        };
        if !follow.contains(resolved.category.flag()) {
            return Ok(None);
        }
        if !resolved.fits(property.kind) {
            warn!(
                "Skipping property '{}': {} association cannot populate a collection",
                property.name,
                resolved.category.as_str()
            );
            return Ok(None);
        }
        let AssociationSource::Many(topics) = resolved.source else {
            return Ok(None);
        };

        let mut collection = TopicViewModelCollection::new();
        for element in AssociationResolver::select(topics, property) {
            let Some(schema) = self.element_schema(&element, property)? else {
                continue;
            };
            let model = self.map_topic(&element, &schema, property.include, depth + 1, context)?;
            collection.try_push(model)?;
        }
        Ok(Some(collection))
    }

    fn topic_value(
        &self,
        topic: &Topic,
        property: &PropertyMapping,
        follow: AssociationTypes,
        depth: usize,
        context: &mut MappingContext,
    ) -> AppResult<Option<Arc<ViewModel>>> {
        let Some(resolved) = AssociationResolver::resolve(topic, property) else {
            return Ok(None);
        };
        if !follow.contains(resolved.category.flag()) {
            return Ok(None);
        }
        if !resolved.fits(property.kind) {
            warn!(
                "Skipping property '{}': {} association cannot populate a single topic",
                property.name,
                resolved.category.as_str()
            );
            return Ok(None);
        }
        let AssociationSource::Single(target) = resolved.source else {
            return Ok(None);
        };
        if !AssociationResolver::matches_filters(&target, property) {
            return Ok(None);
        }
        let Some(schema) = self.element_schema(&target, property)? else {
            return Ok(None);
        };

        // Ancestors keep following parents so the chain reaches the root.
        let element_follow = if property.kind == PropertyKind::Parent {
            AssociationTypes::PARENTS | property.include
        } else {
            property.include
        };
        self.map_topic(&target, &schema, element_follow, depth + 1, context)
            .map(Some)
    }

    /// Schema for one associated topic, or `None` when it cannot be placed in `property`.
    fn element_schema(
        &self,
        element: &Topic,
        property: &PropertyMapping,
    ) -> AppResult<Option<Arc<ViewModelSchema>>> {
        let schema = match &property.map_as {
            Some(name) => match self.lookup.resolve(name) {
                Some(schema) => schema,
                None => {
                    warn!(
                        "Skipping property '{}': map-as view model '{}' is not registered",
                        property.name, name
                    );
                    return Ok(None);
                }
            },
            None => self
                .lookup
                .resolve_for_content_type(element.content_type(), &self.config.default_view_model)?,
        };

        if let Some(declared) = &property.element_type {
            if !schema.is_assignable_to(declared) {
                debug!(
                    "Skipping topic {} in '{}': {} is not a {}",
                    element.unique_key(),
                    property.name,
                    schema.name,
                    declared
                );
                return Ok(None);
            }
        }
        Ok(Some(schema))
    }
}

/// Values derived from topic metadata rather than stored attributes.
fn intrinsic_value(topic: &Topic, name: &str) -> Option<String> {
    let value = match name.to_ascii_lowercase().as_str() {
        "id" => topic.id().to_string(),
        "key" => topic.key().to_string(),
        "contenttype" => topic.content_type().to_string(),
        "uniquekey" => topic.unique_key(),
        "webpath" => topic.web_path(),
        "lastmodified" => topic.last_modified().to_rfc3339(),
        "ishidden" => topic.is_hidden().to_string(),
        "isdisabled" => topic.is_disabled().to_string(),
        _ => return None,
    };
    Some(value)
}

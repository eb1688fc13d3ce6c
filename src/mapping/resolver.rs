//! Association resolution: which association a property reads, and which of
//! the associated topics survive filtering and flattening.

use crate::core::topic::Topic;
use crate::framework::association_types::AssociationCategory;
use crate::framework::view_model_schema::{PropertyKind, PropertyMapping};

/// Name of the child collection when no other association claims it.
pub const CHILDREN_COLLECTION: &str = "Children";

/// Intrinsic collection of every outgoing relationship target.
pub const RELATIONSHIPS_COLLECTION: &str = "Relationships";

/// Intrinsic collection of every incoming relationship source.
pub const INCOMING_RELATIONSHIPS_COLLECTION: &str = "IncomingRelationships";

#[derive(Debug, Clone)]
pub enum AssociationSource {
    Single(Topic),
    Many(Vec<Topic>),
}

#[derive(Debug, Clone)]
pub struct ResolvedAssociation {
    pub category: AssociationCategory,
    pub source: AssociationSource,
}

impl ResolvedAssociation {
    fn single(category: AssociationCategory, topic: Topic) -> Self {
        Self {
            category,
            source: AssociationSource::Single(topic),
        }
    }

    fn many(category: AssociationCategory, topics: Vec<Topic>) -> Self {
        Self {
            category,
            source: AssociationSource::Many(topics),
        }
    }

    /// Whether the resolved source can populate a property of `kind`.
    pub fn fits(&self, kind: PropertyKind) -> bool {
        match (&self.source, kind) {
            (AssociationSource::Many(_), PropertyKind::Collection) => true,
            (AssociationSource::Single(_), PropertyKind::Topic) => true,
            (AssociationSource::Single(_), PropertyKind::Parent) => {
                self.category == AssociationCategory::Parent
            }
            _ => false,
        }
    }
}

/// Categories tried for a single-topic property without an explicit category.
const TOPIC_CATEGORIES: &[AssociationCategory] = &[AssociationCategory::Reference];

/// Categories tried for a collection property without an explicit category.
const COLLECTION_CATEGORIES: &[AssociationCategory] = &[
    AssociationCategory::Relationship,
    AssociationCategory::NestedTopics,
    AssociationCategory::IncomingRelationship,
    AssociationCategory::Children,
    AssociationCategory::MappedCollection,
];

pub struct AssociationResolver;

impl AssociationResolver {
    /// Find the association `property` reads from on `topic`.
    ///
    /// An explicit category wins outright, even when it cannot fill the property.
    /// Otherwise only categories that fit the property kind are tried: a reference
    /// for a single topic; relationship, nested topics, incoming relationship,
    /// children and mapped collection, in that order, for a collection.
    pub fn resolve(topic: &Topic, property: &PropertyMapping) -> Option<ResolvedAssociation> {
        if property.kind == PropertyKind::Parent {
            return topic
                .parent()
                .map(|parent| ResolvedAssociation::single(AssociationCategory::Parent, parent));
        }

        let key = property.source_key();
        if let Some(category) = property.association {
            return Self::fetch(topic, category, key, true);
        }

        let candidates: &[AssociationCategory] = match property.kind {
            PropertyKind::Topic => TOPIC_CATEGORIES,
            PropertyKind::Collection => COLLECTION_CATEGORIES,
            PropertyKind::Scalar(_) | PropertyKind::Parent => &[],
        };
        candidates
            .iter()
            .find_map(|category| Self::fetch(topic, *category, key, false))
    }

    /// Read `category` named `key` from `topic`. With `explicit` set, an empty
    /// many-valued association still resolves.
    fn fetch(
        topic: &Topic,
        category: AssociationCategory,
        key: &str,
        explicit: bool,
    ) -> Option<ResolvedAssociation> {
        match category {
            AssociationCategory::Parent => topic
                .parent()
                .map(|parent| ResolvedAssociation::single(category, parent)),
            AssociationCategory::Reference => topic
                .reference(key)
                .map(|target| ResolvedAssociation::single(category, target)),
            AssociationCategory::Relationship => (explicit || topic.has_relationship(key))
                .then(|| ResolvedAssociation::many(category, topic.relationship(key))),
            AssociationCategory::IncomingRelationship => (explicit
                || topic.has_incoming_relationship(key))
            .then(|| ResolvedAssociation::many(category, topic.incoming_relationship(key))),
            AssociationCategory::NestedTopics => topic
                .nested_topics(key)
                .map(|topics| ResolvedAssociation::many(category, topics)),
            AssociationCategory::Children => (explicit
                || key.eq_ignore_ascii_case(CHILDREN_COLLECTION))
            .then(|| ResolvedAssociation::many(category, Self::published_children(topic))),
            AssociationCategory::MappedCollection => {
                Self::mapped_collection(topic, key).map(|topics| {
                    let category = if key.eq_ignore_ascii_case(CHILDREN_COLLECTION) {
                        AssociationCategory::Children
                    } else {
                        category
                    };
                    ResolvedAssociation::many(category, topics)
                })
            }
        }
    }

    fn published_children(topic: &Topic) -> Vec<Topic> {
        topic
            .children()
            .into_iter()
            .filter(|child| !child.is_disabled())
            .collect()
    }

    fn mapped_collection(topic: &Topic, key: &str) -> Option<Vec<Topic>> {
        if key.eq_ignore_ascii_case(CHILDREN_COLLECTION) {
            Some(Self::published_children(topic))
        } else if key.eq_ignore_ascii_case(RELATIONSHIPS_COLLECTION) {
            Some(topic.all_related())
        } else if key.eq_ignore_ascii_case(INCOMING_RELATIONSHIPS_COLLECTION) {
            Some(topic.all_incoming_related())
        } else {
            None
        }
    }

    /// Every attribute filter and every content-type filter must hold.
    pub fn matches_filters(topic: &Topic, property: &PropertyMapping) -> bool {
        let attributes_match = property.attribute_filters.iter().all(|filter| {
            topic
                .attribute_value(&filter.key, false)
                .map(|value| value.eq_ignore_ascii_case(&filter.value))
                .unwrap_or(false)
        });
        let content_types_match = property
            .content_type_filters
            .iter()
            .all(|content_type| topic.is_content_type(content_type));
        attributes_match && content_types_match
    }

    /// Apply filters, and with `flatten` expand each topic into itself followed by
    /// its descendants in pre-order. Filtered-out topics are still descended through.
    pub fn select(topics: Vec<Topic>, property: &PropertyMapping) -> Vec<Topic> {
        if !property.flatten {
            return topics
                .into_iter()
                .filter(|topic| Self::matches_filters(topic, property))
                .collect();
        }

        let mut selected = Vec::new();
        let mut pending: Vec<Topic> = topics.into_iter().rev().collect();
        while let Some(topic) = pending.pop() {
            let mut children = topic.children();
            if Self::matches_filters(&topic, property) {
                selected.push(topic);
            }
            children.reverse();
            pending.extend(children);
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::topic::LIST_CONTENT_TYPE;
    use crate::core::topic_graph::TopicGraph;
    use std::sync::Arc;

    fn graph() -> Arc<TopicGraph> {
        let mut graph = TopicGraph::new();
        let root = graph.create_topic("Root", "Container", None).unwrap();
        let page = graph.create_topic("Page", "Page", Some(root)).unwrap();
        let news = graph.create_topic("News", LIST_CONTENT_TYPE, Some(page)).unwrap();
        for (key, category) in [("A", "News"), ("B", "Events"), ("C", "News")] {
            let item = graph.create_topic(key, "ContentItem", Some(news)).unwrap();
            graph.set_attribute(item, "Category", category).unwrap();
        }
        let tags = graph.create_topic("Tags", "Container", Some(root)).unwrap();
        let rust = graph.create_topic("Rust", "Tag", Some(tags)).unwrap();
        let web = graph.create_topic("Web", "Tag", Some(tags)).unwrap();
        graph.relate(page, "Tags", rust).unwrap();
        graph.relate(page, "Tags", web).unwrap();
        graph.set_reference(page, "Owner", Some(rust)).unwrap();
        let deep = graph.create_topic("Deep", "Tag", Some(rust)).unwrap();
        graph.create_topic("Deeper", "Tag", Some(deep)).unwrap();
        Arc::new(graph)
    }

    fn keys(topics: &[Topic]) -> Vec<&str> {
        topics.iter().map(|t| t.key()).collect()
    }

    #[test]
    fn test_resolution_order() {
        let graph = graph();
        let page = graph.find("Root:Page").unwrap();

        let tags = AssociationResolver::resolve(&page, &PropertyMapping::collection("Tags")).unwrap();
        assert_eq!(tags.category, AssociationCategory::Relationship);

        let owner = AssociationResolver::resolve(&page, &PropertyMapping::topic("Owner")).unwrap();
        assert_eq!(owner.category, AssociationCategory::Reference);

        let news = AssociationResolver::resolve(&page, &PropertyMapping::collection("News")).unwrap();
        assert_eq!(news.category, AssociationCategory::NestedTopics);

        let rust = graph.find("Root:Tags:Rust").unwrap();
        let incoming = AssociationResolver::resolve(&rust, &PropertyMapping::collection("Tags")).unwrap();
        assert_eq!(incoming.category, AssociationCategory::IncomingRelationship);

        let children = AssociationResolver::resolve(&page, &PropertyMapping::collection("Children")).unwrap();
        assert_eq!(children.category, AssociationCategory::Children);

        let related = AssociationResolver::resolve(&page, &PropertyMapping::collection("Relationships")).unwrap();
        assert_eq!(related.category, AssociationCategory::MappedCollection);

        assert!(AssociationResolver::resolve(&page, &PropertyMapping::collection("Missing")).is_none());
    }

    #[test]
    fn test_explicit_category_and_key_override() {
        let graph = graph();
        let page = graph.find("Root:Page").unwrap();

        let property = PropertyMapping::collection("Labels")
            .key("Tags")
            .association(AssociationCategory::Relationship);
        let resolved = AssociationResolver::resolve(&page, &property).unwrap();
        assert!(matches!(resolved.source, AssociationSource::Many(ref t) if t.len() == 2));

        let empty = PropertyMapping::collection("Missing").association(AssociationCategory::Relationship);
        let resolved = AssociationResolver::resolve(&page, &empty).unwrap();
        assert!(matches!(resolved.source, AssociationSource::Many(ref t) if t.is_empty()));

        let renamed = PropertyMapping::collection("Labels").key("Tags");
        let resolved = AssociationResolver::resolve(&page, &renamed).unwrap();
        assert_eq!(resolved.category, AssociationCategory::Relationship);
    }

    #[test]
    fn test_reference_does_not_fit_collection() {
        let graph = graph();
        let page = graph.find("Root:Page").unwrap();
        assert!(AssociationResolver::resolve(&page, &PropertyMapping::collection("Owner")).is_none());

        let forced = PropertyMapping::collection("Owner").association(AssociationCategory::Reference);
        let resolved = AssociationResolver::resolve(&page, &forced).unwrap();
        assert!(!resolved.fits(forced.kind));
    }

    #[test]
    fn test_property_kind_picks_the_category() {
        let mut graph = TopicGraph::new();
        let root = graph.create_topic("Root", "Container", None).unwrap();
        let page = graph.create_topic("Page", "Page", Some(root)).unwrap();
        let alice = graph.create_topic("Alice", "Person", Some(root)).unwrap();
        let bob = graph.create_topic("Bob", "Person", Some(root)).unwrap();
        graph.set_reference(page, "Owner", Some(alice)).unwrap();
        graph.relate(page, "Owner", bob).unwrap();
        let graph = Arc::new(graph);
        let page = graph.find("Root:Page").unwrap();

        let single = AssociationResolver::resolve(&page, &PropertyMapping::topic("Owner")).unwrap();
        assert_eq!(single.category, AssociationCategory::Reference);
        assert!(matches!(single.source, AssociationSource::Single(ref t) if t.key() == "Alice"));

        let many = AssociationResolver::resolve(&page, &PropertyMapping::collection("Owner")).unwrap();
        assert_eq!(many.category, AssociationCategory::Relationship);
        assert!(matches!(many.source, AssociationSource::Many(ref t) if keys(t) == vec!["Bob"]));
    }

    #[test]
    fn test_filter_preserves_source_order() {
        let graph = graph();
        let page = graph.find("Root:Page").unwrap();
        let property = PropertyMapping::collection("News").filter_by("Category", "news");
        let items = page.nested_topics("News").unwrap();
        let selected = AssociationResolver::select(items, &property);
        assert_eq!(keys(&selected), vec!["A", "C"]);

        let by_type = PropertyMapping::collection("Tags")
            .content_type("Tag")
            .filter_by("Category", "News");
        assert!(AssociationResolver::select(page.relationship("Tags"), &by_type).is_empty());
    }

    #[test]
    fn test_flatten_is_preorder() {
        let graph = graph();
        let tags = graph.find("Root:Tags").unwrap();
        let property = PropertyMapping::collection("Children").flatten();
        let selected = AssociationResolver::select(tags.children(), &property);
        assert_eq!(keys(&selected), vec!["Rust", "Deep", "Deeper", "Web"]);

        let filtered = PropertyMapping::collection("Children")
            .flatten()
            .content_type("Tag")
            .filter_by("Category", "none");
        assert!(AssociationResolver::select(tags.children(), &filtered).is_empty());
    }
}

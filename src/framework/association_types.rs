// Association Types - which associations a mapping call follows

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of association categories to follow while mapping.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AssociationTypes: u8 {
        const NONE = 0;
        const CHILDREN = 1 << 0;
        const PARENTS = 1 << 1;
        const RELATIONSHIPS = 1 << 2;
        const INCOMING_RELATIONSHIPS = 1 << 3;
        const REFERENCES = 1 << 4;
        const MAPPED_COLLECTIONS = 1 << 5;

        const ALL = Self::CHILDREN.bits()
            | Self::PARENTS.bits()
            | Self::RELATIONSHIPS.bits()
            | Self::INCOMING_RELATIONSHIPS.bits()
            | Self::REFERENCES.bits()
            | Self::MAPPED_COLLECTIONS.bits();
    }
}

/// The concrete source an association-typed property reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationCategory {
    Parent,
    Children,
    /// Children of a `List` child topic keyed by the property name
    NestedTopics,
    Relationship,
    IncomingRelationship,
    Reference,
    /// Intrinsic topic collections such as `Relationships`
    MappedCollection,
}

impl AssociationCategory {
    /// The follow flag that gates this category.
    pub fn flag(&self) -> AssociationTypes {
        match self {
            AssociationCategory::Parent => AssociationTypes::PARENTS,
            AssociationCategory::Children | AssociationCategory::NestedTopics => {
                AssociationTypes::CHILDREN
            }
            AssociationCategory::Relationship => AssociationTypes::RELATIONSHIPS,
            AssociationCategory::IncomingRelationship => AssociationTypes::INCOMING_RELATIONSHIPS,
            AssociationCategory::Reference => AssociationTypes::REFERENCES,
            AssociationCategory::MappedCollection => AssociationTypes::MAPPED_COLLECTIONS,
        }
    }

    pub fn is_single_valued(&self) -> bool {
        matches!(
            self,
            AssociationCategory::Parent | AssociationCategory::Reference
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssociationCategory::Parent => "parent",
            AssociationCategory::Children => "children",
            AssociationCategory::NestedTopics => "nested_topics",
            AssociationCategory::Relationship => "relationship",
            AssociationCategory::IncomingRelationship => "incoming_relationship",
            AssociationCategory::Reference => "reference",
            AssociationCategory::MappedCollection => "mapped_collection",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_algebra() {
        let follow = AssociationTypes::CHILDREN | AssociationTypes::RELATIONSHIPS;
        assert!(follow.contains(AssociationTypes::CHILDREN));
        assert!(!follow.contains(AssociationTypes::PARENTS));
        assert!(AssociationTypes::ALL.contains(follow));
        assert!(AssociationTypes::NONE.is_empty());
        assert_eq!(follow & AssociationTypes::CHILDREN, AssociationTypes::CHILDREN);
        assert_eq!(AssociationTypes::ALL, AssociationTypes::all());
        assert!(format!("{:?}", follow).contains("CHILDREN | RELATIONSHIPS"));
    }

    #[test]
    fn test_categories_map_to_flags() {
        assert_eq!(
            AssociationCategory::NestedTopics.flag(),
            AssociationTypes::CHILDREN
        );
        assert!(AssociationCategory::Reference.is_single_valued());
        assert!(!AssociationCategory::IncomingRelationship.is_single_valued());
    }
}

// Framework - view-model schemas, mapped values and type lookup

pub mod association_types;
pub mod type_lookup;
pub mod view_model;
pub mod view_model_schema;

// Re-export all framework types for convenience
pub use association_types::{AssociationCategory, AssociationTypes};
pub use type_lookup::{CompositeTypeLookupService, TypeLookup, TypeLookupService};
pub use view_model::{MappedValue, ScalarValue, TopicViewModelCollection, ViewModel};
pub use view_model_schema::{PropertyKind, PropertyMapping, ScalarType, ViewModelSchema};

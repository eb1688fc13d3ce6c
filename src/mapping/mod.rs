// Mapping - topic to view-model projection and the reverse binding path

pub mod coercion;
pub mod mapping_service;
pub mod resolver;
pub mod reverse;

pub use mapping_service::TopicMappingService;
pub use resolver::{AssociationResolver, AssociationSource, ResolvedAssociation};
pub use reverse::{BindingModel, ReverseTopicMappingService};

// Core types - topic identity, the topic graph and its associations

pub mod associations;
pub mod strong_types;
pub mod topic;
pub mod topic_graph;

// Re-export commonly used types
pub use associations::{AssociationStore, EdgeKind};
pub use strong_types::{TopicId, TopicLocator};
pub use topic::Topic;
pub use topic_graph::TopicGraph;

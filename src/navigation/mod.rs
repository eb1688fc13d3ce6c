// Navigation - tiered navigation trees and the root-level cache

pub mod builder;
pub mod cache;
pub mod node;

pub use builder::{HierarchicalNavigationBuilder, NavigationService, PAGE_GROUP};
pub use cache::{CacheMetrics, CachedNavigationService};
pub use node::NavigationNode;

// Infrastructure - topic storage behind the repository trait

pub mod repository;
pub mod traits;

pub use repository::InMemoryTopicRepository;
pub use traits::TopicRepository;

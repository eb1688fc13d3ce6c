use crate::core::strong_types::TopicLocator;
use crate::core::topic::Topic;
use crate::error::AppResult;
use async_trait::async_trait;

#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Load a topic by id or unique key. Children and associations are reachable
    /// from the returned handle.
    async fn load(&self, locator: &TopicLocator) -> AppResult<Option<Topic>>;
}

// In-Memory Topic Repository - copy-on-write topic graph store
// Readers get an immutable snapshot; writers build the next snapshot and swap it in.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::core::strong_types::TopicLocator;
use crate::core::topic::Topic;
use crate::core::topic_graph::TopicGraph;
use crate::error::AppResult;
use crate::infrastructure::traits::TopicRepository;
use crate::schema::registry::ContentTypeRegistry;

#[derive(Debug, Default)]
pub struct InMemoryTopicRepository {
    graph: RwLock<Arc<TopicGraph>>,
}

impl InMemoryTopicRepository {
    pub fn new(graph: TopicGraph) -> Self {
        Self {
            graph: RwLock::new(Arc::new(graph)),
        }
    }

    pub async fn snapshot(&self) -> Arc<TopicGraph> {
        Arc::clone(&*self.graph.read().await)
    }

    /// Apply `change` to a copy of the current graph. The copy replaces the stored
    /// graph only when `change` succeeds; earlier snapshots are unaffected.
    pub async fn update<F, T>(&self, change: F) -> AppResult<T>
    where
        F: FnOnce(&mut TopicGraph) -> AppResult<T> + Send,
        T: Send,
    {
        let mut guard = self.graph.write().await;
        let mut next = TopicGraph::clone(&guard);
        let result = change(&mut next)?;
        *guard = Arc::new(next);
        debug!("Published topic graph with {} topics", guard.len());
        Ok(result)
    }

    /// Content types described by `ContentTypeDescriptor` topics in the current graph.
    pub async fn content_types(&self) -> AppResult<ContentTypeRegistry> {
        let graph = self.snapshot().await;
        ContentTypeRegistry::from_graph(&graph)
    }
}

#[async_trait]
impl TopicRepository for InMemoryTopicRepository {
    #[instrument(skip(self), fields(locator = %locator))]
    async fn load(&self, locator: &TopicLocator) -> AppResult<Option<Topic>> {
        let graph = self.snapshot().await;
        let topic = match locator {
            TopicLocator::Id(id) => graph.topic(*id),
            TopicLocator::UniqueKey(key) => graph.find(key),
        };
        if topic.is_none() {
            debug!("No topic at {}", locator);
        }
        Ok(topic)
    }
}

// Hierarchical Navigation Builder - concurrent tiered navigation trees
// Each node is mapped shape-only, then its visible children are built as
// independent futures and attached in completion order.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::config::NavigationConfig;
use crate::core::topic::Topic;
use crate::error::{AppError, AppResult};
use crate::framework::association_types::AssociationTypes;
use crate::mapping::TopicMappingService;
use crate::navigation::node::NavigationNode;

/// Content type of topics that group pages without being navigable themselves.
pub const PAGE_GROUP: &str = "PageGroup";

#[async_trait]
pub trait NavigationService: Send + Sync {
    /// Build the navigation tree below `topic`, descending `tiers` levels of children.
    async fn build_root(
        &self,
        topic: Option<Topic>,
        allow_page_groups: bool,
        tiers: i32,
    ) -> AppResult<Option<Arc<NavigationNode>>>;
}

#[derive(Clone)]
pub struct HierarchicalNavigationBuilder {
    mapping: Arc<TopicMappingService>,
    view_model: String,
    limiter: Option<Arc<Semaphore>>,
    cancellation: CancellationToken,
}

impl HierarchicalNavigationBuilder {
    pub fn new(mapping: Arc<TopicMappingService>, config: &NavigationConfig) -> Self {
        Self {
            mapping,
            view_model: config.view_model.clone(),
            limiter: config.max_concurrency.map(|n| Arc::new(Semaphore::new(n))),
            cancellation: CancellationToken::new(),
        }
    }

    /// Abandon pending work and fail builds once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    async fn map_node(&self, topic: &Topic) -> AppResult<Option<NavigationNode>> {
        // Permit covers mapping only; holding it across child builds could starve them.
        let _permit = match &self.limiter {
            Some(limiter) => Some(
                Arc::clone(limiter)
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Internal(format!("Navigation limiter closed: {}", e)))?,
            ),
            None => None,
        };
        let model = self
            .mapping
            .map(Some(topic), Some(&self.view_model), AssociationTypes::NONE)?;
        Ok(model.map(NavigationNode::new))
    }

    fn build(
        &self,
        topic: Topic,
        allow_page_groups: bool,
        tiers: i32,
    ) -> BoxFuture<'_, AppResult<Option<Arc<NavigationNode>>>> {
        Box::pin(async move {
            if self.cancellation.is_cancelled() {
                return Err(cancelled());
            }
            let tiers = tiers.saturating_sub(1);
            let Some(node) = self.map_node(&topic).await? else {
                return Ok(None);
            };
            let node = Arc::new(node);

            let descend = tiers >= 0
                && (allow_page_groups || !topic.is_content_type(PAGE_GROUP))
                && !node.is_populated();
            if !descend {
                return Ok(Some(node));
            }

            let mut pending: FuturesUnordered<_> = topic
                .visible_children()
                .into_iter()
                .map(|child| self.build(child, allow_page_groups, tiers))
                .collect();

            let mut children = Vec::with_capacity(pending.len());
            loop {
                tokio::select! {
                    biased;
                    _ = self.cancellation.cancelled() => return Err(cancelled()),
                    next = pending.next() => match next {
                        Some(result) => {
                            if let Some(child) = result? {
                                children.push(child);
                            }
                        }
                        None => break,
                    },
                }
            }

            if !node.populate(children) {
                debug!("Children of {} were already populated", topic.unique_key());
            }
            Ok(Some(node))
        })
    }
}

fn cancelled() -> AppError {
    AppError::Cancelled("Navigation build was cancelled".to_string())
}

#[async_trait]
impl NavigationService for HierarchicalNavigationBuilder {
    #[instrument(skip(self, topic), fields(topic = ?topic.as_ref().map(|t| t.id())))]
    async fn build_root(
        &self,
        topic: Option<Topic>,
        allow_page_groups: bool,
        tiers: i32,
    ) -> AppResult<Option<Arc<NavigationNode>>> {
        let Some(topic) = topic else {
            return Ok(None);
        };
        let root = self.build(topic, allow_page_groups, tiers).await?;
        if let Some(node) = &root {
            debug!("Built navigation for {} with {} nodes", node.key(), node.node_count());
        }
        Ok(root)
    }
}

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use ontopic::{
    config::{MappingConfig, NavigationConfig},
    core::{Topic, TopicGraph},
    data_seeder::seed_sample_graph,
    mapping::TopicMappingService,
    navigation::{
        CachedNavigationService, HierarchicalNavigationBuilder, NavigationNode, NavigationService,
    },
    schemas::create_view_model_registry,
    AppError, AppResult,
};

fn builder(config: &NavigationConfig) -> HierarchicalNavigationBuilder {
    let lookup = Arc::new(create_view_model_registry().unwrap());
    let mapping = Arc::new(TopicMappingService::new(lookup, MappingConfig::default()));
    HierarchicalNavigationBuilder::new(mapping, config)
}

fn sorted_keys(node: &NavigationNode) -> Vec<String> {
    let mut keys: Vec<String> = node.children().iter().map(|c| c.key().to_string()).collect();
    keys.sort();
    keys
}

/// Counts the builds that reach the wrapped service.
struct CountingNavigation {
    inner: HierarchicalNavigationBuilder,
    builds: AtomicUsize,
}

#[async_trait]
impl NavigationService for CountingNavigation {
    async fn build_root(
        &self,
        topic: Option<Topic>,
        allow_page_groups: bool,
        tiers: i32,
    ) -> AppResult<Option<Arc<NavigationNode>>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.build_root(topic, allow_page_groups, tiers).await
    }
}

#[tokio::test]
async fn test_single_tier_example() {
    let mut graph = TopicGraph::new();
    let root = graph.create_topic("Root", "Container", None).unwrap();
    let web = graph.create_topic("Web", "Page", Some(root)).unwrap();
    graph.set_attribute(web, "Title", "Welcome").unwrap();
    graph.create_topic("About", "Page", Some(web)).unwrap();
    graph.create_topic("Contact", "Page", Some(web)).unwrap();
    let graph = Arc::new(graph);

    let navigation = builder(&NavigationConfig::default());
    let node = navigation
        .build_root(graph.topic(web), false, 1)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(node.title(), "Welcome");
    assert_eq!(node.model.view_model_type, "NavigationTopicViewModel");
    assert_eq!(sorted_keys(&node), vec!["About", "Contact"]);
    assert!(node.children().iter().all(|c| c.children().is_empty()));

    let flat = navigation.build_root(graph.topic(web), false, 0).await.unwrap().unwrap();
    assert!(flat.children().is_empty());
}

#[tokio::test]
async fn test_sample_site_navigation() {
    let graph = Arc::new(seed_sample_graph().unwrap());
    let navigation = builder(&NavigationConfig::default());

    let tree = navigation
        .build_root(graph.find("Root:Web"), false, 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sorted_keys(&tree), vec!["About", "Contact", "News", "Services"]);
    assert!(tree.child("Archive").is_none());
    assert_eq!(sorted_keys(tree.child("About").unwrap()), vec!["Team"]);
    assert!(tree.child("Services").unwrap().children().is_empty());

    let with_groups = navigation
        .build_root(graph.find("Root:Web"), true, 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        sorted_keys(with_groups.child("Services").unwrap()),
        vec!["Consulting", "Training"]
    );

    let json = serde_json::to_value(tree.as_ref()).unwrap();
    assert_eq!(json["key"], "Web");
    assert_eq!(json["children"].as_array().unwrap().len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_build() {
    let graph = Arc::new(seed_sample_graph().unwrap());
    let counting = Arc::new(CountingNavigation {
        inner: builder(&NavigationConfig::default()),
        builds: AtomicUsize::new(0),
    });
    let cache = Arc::new(CachedNavigationService::new(counting.clone()));
    let web = graph.find("Root:Web");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let web = web.clone();
            tokio::spawn(async move { cache.build_root(web, false, 3).await })
        })
        .collect();
    let mut trees = Vec::new();
    for handle in handles {
        trees.push(handle.await.unwrap().unwrap().unwrap());
    }

    assert_eq!(counting.builds.load(Ordering::SeqCst), 1);
    assert!(trees.iter().all(|t| Arc::ptr_eq(t, &trees[0])));
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_bounded_concurrency_builds_every_visible_node() {
    fn expected(topic: &Topic) -> usize {
        1 + topic.visible_children().iter().map(expected).sum::<usize>()
    }

    let graph = Arc::new(seed_sample_graph().unwrap());
    let config = NavigationConfig {
        max_concurrency: Some(2),
        ..NavigationConfig::default()
    };
    let navigation = builder(&config);
    let root = graph.find("Root").unwrap();

    let tree = navigation
        .build_root(Some(root.clone()), true, 16)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tree.node_count(), expected(&root));
}

#[tokio::test]
async fn test_cancellation_is_not_cached() {
    let graph = Arc::new(seed_sample_graph().unwrap());
    let token = CancellationToken::new();
    let cancelled = builder(&NavigationConfig::default()).with_cancellation(token.clone());
    token.cancel();

    let cache = CachedNavigationService::new(Arc::new(cancelled));
    let result = cache.build_root(graph.find("Root:Web"), false, 2).await;
    assert!(matches!(result, Err(AppError::Cancelled(_))));
    assert!(cache.is_empty().await);
}

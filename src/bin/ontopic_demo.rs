// OnTopic Demo - maps a sample site and prints a page and its navigation as JSON

use std::sync::Arc;
use tracing::info;

use ontopic::{
    config::Config,
    core::strong_types::TopicLocator,
    data_seeder::seed_repository,
    framework::association_types::AssociationTypes,
    infrastructure::TopicRepository,
    mapping::TopicMappingService,
    navigation::{CachedNavigationService, HierarchicalNavigationBuilder, NavigationService},
    schemas::create_view_model_registry,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let repository = seed_repository()?;
    let content_types = Arc::new(repository.content_types().await?);

    let mapping = Arc::new(
        TopicMappingService::new(Arc::new(create_view_model_registry()?), config.mapping.clone())
            .with_content_types(content_types),
    );
    let builder = HierarchicalNavigationBuilder::new(Arc::clone(&mapping), &config.navigation);
    let navigation = CachedNavigationService::new(Arc::new(builder));

    let page_key = std::env::args().nth(1).unwrap_or_else(|| "Root:Web:About".to_string());
    let page = repository.load(&TopicLocator::from(page_key.as_str())).await?;
    match mapping.map(page.as_ref(), None, AssociationTypes::ALL)? {
        Some(view_model) => println!("{}", serde_json::to_string_pretty(&view_model)?),
        None => println!("No topic at {}", page_key),
    }

    let web = repository.load(&TopicLocator::from("Root:Web")).await?;
    let tree = navigation
        .build_root(
            web,
            config.navigation.allow_page_groups,
            config.navigation.default_tiers,
        )
        .await?;
    if let Some(tree) = tree {
        println!("{}", serde_json::to_string_pretty(tree.as_ref())?);
    }
    info!(
        "Navigation cache hit rate {:.2}",
        navigation.metrics().hit_rate()
    );
    Ok(())
}

// View model definitions - registered mapping tables for the built-in view models

pub mod content_list_view_model;
pub mod navigation_view_model;
pub mod page_view_model;
pub mod topic_view_model;

use crate::error::AppResult;
use crate::framework::type_lookup::TypeLookupService;

pub use content_list_view_model::{ContentItemTopicViewModel, ContentListTopicViewModel};
pub use navigation_view_model::NavigationTopicViewModel;
pub use page_view_model::{PageGroupTopicViewModel, PageTopicViewModel};
pub use topic_view_model::TopicViewModel;

/// Register every built-in view model
pub fn create_view_model_registry() -> AppResult<TypeLookupService> {
    let topic = TopicViewModel::schema();
    let page = PageTopicViewModel::schema(&topic);
    let page_group = PageGroupTopicViewModel::schema(&page);
    let content_item = ContentItemTopicViewModel::schema(&topic);
    let content_list = ContentListTopicViewModel::schema(&page);

    TypeLookupService::new()
        .with(topic)?
        .with(page)?
        .with(page_group)?
        .with(NavigationTopicViewModel::schema())?
        .with(content_item)?
        .with(content_list)
}

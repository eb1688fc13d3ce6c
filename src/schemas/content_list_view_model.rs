// Content list view models - pages carrying a nested list of content items

use std::sync::Arc;

use crate::framework::association_types::AssociationCategory;
use crate::framework::view_model_schema::{PropertyMapping, ViewModelSchema};

pub struct ContentItemTopicViewModel;

impl ContentItemTopicViewModel {
    pub const NAME: &'static str = "ContentItemTopicViewModel";

    pub fn schema(base: &ViewModelSchema) -> Arc<ViewModelSchema> {
        ViewModelSchema::builder(Self::NAME)
            .extends(base)
            .for_content_type("ContentItem")
            .property(PropertyMapping::string("Description"))
            .property(PropertyMapping::string("LearnMoreUrl"))
            .property(PropertyMapping::string("Category"))
            .build()
    }
}

pub struct ContentListTopicViewModel;

impl ContentListTopicViewModel {
    pub const NAME: &'static str = "ContentListTopicViewModel";

    /// Items come from the nested `ContentItems` list, categories from the `Categories`
    /// relationship.
    pub fn schema(page: &ViewModelSchema) -> Arc<ViewModelSchema> {
        ViewModelSchema::builder(Self::NAME)
            .extends(page)
            .for_content_type("ContentList")
            .property(
                PropertyMapping::collection("ContentItems")
                    .association(AssociationCategory::NestedTopics)
                    .map_as(ContentItemTopicViewModel::NAME),
            )
            .property(
                PropertyMapping::collection("Categories")
                    .association(AssociationCategory::Relationship),
            )
            .build()
    }
}

// Page view models - navigable pages, their children and their ancestry

use std::sync::Arc;

use crate::framework::association_types::AssociationCategory;
use crate::framework::view_model_schema::{PropertyMapping, ScalarType, ViewModelSchema};

pub struct PageTopicViewModel;

impl PageTopicViewModel {
    pub const NAME: &'static str = "PageTopicViewModel";

    pub fn schema(base: &ViewModelSchema) -> Arc<ViewModelSchema> {
        ViewModelSchema::builder(Self::NAME)
            .extends(base)
            .for_content_type("Page")
            .property(PropertyMapping::string("ShortTitle"))
            .property(PropertyMapping::string("Subtitle"))
            .property(PropertyMapping::string("MetaTitle").attribute_key("Title"))
            .property(PropertyMapping::string("MetaDescription"))
            .property(PropertyMapping::string("MetaKeywords").inherit())
            .property(PropertyMapping::string("Body"))
            .property(PropertyMapping::scalar("SortOrder", ScalarType::Int).default_value("0"))
            .property(PropertyMapping::scalar("NoIndex", ScalarType::Bool).inherit())
            .property(PropertyMapping::parent("Parent"))
            .property(
                PropertyMapping::collection("Children")
                    .association(AssociationCategory::Children)
                    .of(base.name.as_str()),
            )
            .property(PropertyMapping::collection("Related").association(AssociationCategory::Relationship))
            .build()
    }
}

/// Pages grouped under a non-navigable container.
pub struct PageGroupTopicViewModel;

impl PageGroupTopicViewModel {
    pub const NAME: &'static str = "PageGroupTopicViewModel";

    pub fn schema(page: &ViewModelSchema) -> Arc<ViewModelSchema> {
        ViewModelSchema::builder(Self::NAME)
            .extends(page)
            .for_content_type("PageGroup")
            .build()
    }
}

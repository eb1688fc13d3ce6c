// Navigation view model - the shape of each node in a navigation tree

use std::sync::Arc;

use crate::framework::view_model_schema::{PropertyMapping, ScalarType, ViewModelSchema};

pub struct NavigationTopicViewModel;

impl NavigationTopicViewModel {
    pub const NAME: &'static str = "NavigationTopicViewModel";

    pub fn schema() -> Arc<ViewModelSchema> {
        ViewModelSchema::builder(Self::NAME)
            .property(PropertyMapping::string("Title"))
            .property(PropertyMapping::string("ShortTitle"))
            .property(PropertyMapping::string("WebPath"))
            .property(PropertyMapping::scalar("SortOrder", ScalarType::Int).default_value("0"))
            .build()
    }
}

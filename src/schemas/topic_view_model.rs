// Topic view model - identity and metadata shared by every mapped topic

use std::sync::Arc;

use crate::framework::view_model_schema::{PropertyMapping, ScalarType, ViewModelSchema};

/// Fallback view model for content types without a dedicated one.
pub struct TopicViewModel;

impl TopicViewModel {
    pub const NAME: &'static str = "TopicViewModel";

    pub fn schema() -> Arc<ViewModelSchema> {
        ViewModelSchema::builder(Self::NAME)
            .property(PropertyMapping::scalar("Id", ScalarType::Int))
            .property(PropertyMapping::string("Key"))
            .property(PropertyMapping::string("ContentType"))
            .property(PropertyMapping::string("UniqueKey"))
            .property(PropertyMapping::string("WebPath"))
            .property(PropertyMapping::string("Title"))
            .property(PropertyMapping::string("View"))
            .property(PropertyMapping::scalar("IsHidden", ScalarType::Bool))
            .property(PropertyMapping::scalar("LastModified", ScalarType::DateTime))
            .build()
    }
}

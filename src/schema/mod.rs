// Schema Model - content types and their inherited attribute descriptors

pub mod content_type;
pub mod registry;

pub use content_type::{AttributeDescriptor, ContentTypeDescriptor, StorageMode};
pub use registry::ContentTypeRegistry;

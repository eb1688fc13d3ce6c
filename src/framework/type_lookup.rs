//! Type lookup: resolves view-model schemas by name or content type, and
//! view-model names back to the content type they bind to.
//!
//! Lookups are built once and are read-only afterwards; consumers receive them
//! as `Arc<dyn TypeLookup>`.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::framework::view_model_schema::ViewModelSchema;

const VIEW_MODEL_SUFFIXES: [&str; 4] = [
    "TopicBindingModel",
    "TopicViewModel",
    "BindingModel",
    "ViewModel",
];

pub trait TypeLookup: Send + Sync {
    /// Schema registered under `name`, compared case-insensitively.
    fn lookup(&self, name: &str) -> Option<Arc<ViewModelSchema>>;

    fn names(&self) -> Vec<String>;

    fn resolve(&self, name: &str) -> Option<Arc<ViewModelSchema>> {
        self.lookup(name)
    }

    /// `{ContentType}TopicViewModel`, then `{ContentType}ViewModel`, then `default`.
    fn resolve_for_content_type(
        &self,
        content_type: &str,
        default: &str,
    ) -> AppResult<Arc<ViewModelSchema>> {
        self.lookup(&format!("{}TopicViewModel", content_type))
            .or_else(|| self.lookup(&format!("{}ViewModel", content_type)))
            .or_else(|| {
                debug!(
                    "No view model registered for content type '{}', using '{}'",
                    content_type, default
                );
                self.lookup(default)
            })
            .ok_or_else(|| {
                AppError::TypeResolution(format!(
                    "No view model for content type '{}' and no default '{}' registered",
                    content_type, default
                ))
            })
    }

    /// Content type a view or binding model name maps back to.
    fn resolve_content_type(&self, view_model: &str) -> Option<String> {
        if let Some(content_type) = self.lookup(view_model).and_then(|s| s.content_type.clone()) {
            return Some(content_type);
        }
        VIEW_MODEL_SUFFIXES
            .iter()
            .find_map(|suffix| view_model.strip_suffix(suffix))
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
    }
}

/// Static registry of view-model schemas
#[derive(Debug, Default, Clone)]
pub struct TypeLookupService {
    schemas: HashMap<String, Arc<ViewModelSchema>>,
}

impl TypeLookupService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: Arc<ViewModelSchema>) -> AppResult<()> {
        let key = schema.name.to_ascii_lowercase();
        if self.schemas.contains_key(&key) {
            return Err(AppError::DuplicateKey(format!(
                "View model '{}' is already registered",
                schema.name
            )));
        }
        self.schemas.insert(key, schema);
        Ok(())
    }

    pub fn with(mut self, schema: Arc<ViewModelSchema>) -> AppResult<Self> {
        self.register(schema)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl TypeLookup for TypeLookupService {
    fn lookup(&self, name: &str) -> Option<Arc<ViewModelSchema>> {
        self.schemas.get(&name.to_ascii_lowercase()).cloned()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.values().map(|s| s.name.clone()).collect();
        names.sort();
        names
    }
}

/// Chains lookups; the first one that knows a name wins.
#[derive(Default, Clone)]
pub struct CompositeTypeLookupService {
    lookups: Vec<Arc<dyn TypeLookup>>,
}

impl CompositeTypeLookupService {
    pub fn new(lookups: Vec<Arc<dyn TypeLookup>>) -> Self {
        Self { lookups }
    }

    pub fn push(&mut self, lookup: Arc<dyn TypeLookup>) {
        self.lookups.push(lookup);
    }
}

impl TypeLookup for CompositeTypeLookupService {
    fn lookup(&self, name: &str) -> Option<Arc<ViewModelSchema>> {
        self.lookups.iter().find_map(|lookup| lookup.lookup(name))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for lookup in &self.lookups {
            for name in lookup.names() {
                if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                    names.push(name);
                }
            }
        }
        names
    }
}

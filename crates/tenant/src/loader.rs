use crate::error::{Result, TenancyError};
use mtapp_models::{Attributes, ModelRef, Tenant};

/// Turns a cached attribute bag into a tenant entity.
pub trait EntityLoader: Send + Sync {
    fn hydrate(&self, model: &ModelRef, attributes: Attributes) -> Result<Tenant>;
}

/// Default loader: the bag's `id` becomes the identifier and every other
/// field is kept as an attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeLoader;

impl EntityLoader for AttributeLoader {
    fn hydrate(&self, model: &ModelRef, attributes: Attributes) -> Result<Tenant> {
        Tenant::from_attributes(attributes).ok_or_else(|| {
            TenancyError::Hydration(format!("{} attributes carry no usable id", model))
        })
    }
}

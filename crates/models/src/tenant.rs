use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Raw tenant attributes as stored in the tenant cache (field name -> value).
pub type Attributes = serde_json::Map<String, Value>;

/// Attribute name carrying the tenant identifier inside an attribute bag.
pub const ID_FIELD: &str = "id";

/// Opaque, comparable tenant identifier.
///
/// Identifiers coming from a session or a cached attribute bag may be
/// strings or integers; both are normalised to their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an identifier out of a JSON scalar. Objects, arrays, null and
    /// empty strings are not identifiers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for TenantId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TenantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A hydrated tenant entity.
///
/// `attributes` never contains the `id` field; the identifier lives in
/// `id` and is merged back in by [`Tenant::to_attributes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Tenant {
    pub fn new(id: impl Into<TenantId>, mut attributes: Attributes) -> Self {
        attributes.remove(ID_FIELD);
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Builder-style attribute setter. Setting `id` is ignored.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != ID_FIELD {
            self.attributes.insert(key, value.into());
        }
        self
    }

    /// Rebuild a tenant from a bag carrying its `id`. Returns `None` when
    /// the bag has no usable identifier.
    pub fn from_attributes(mut attributes: Attributes) -> Option<Self> {
        let id = attributes.remove(ID_FIELD).as_ref().and_then(TenantId::from_value)?;
        Some(Self { id, attributes })
    }

    /// Attribute bag including the identifier, as written to the tenant cache.
    pub fn to_attributes(&self) -> Attributes {
        let mut attributes = self.attributes.clone();
        attributes.insert(ID_FIELD.to_string(), self.id.to_value());
        attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// Names the entity model a tenant attribute bag is hydrated into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRef(String);

impl ModelRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for ModelRef {
    fn default() -> Self {
        Self("Tenants".to_string())
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_tenant_id_from_value() {
        assert_eq!(TenantId::from_value(&json!("acme")), Some(TenantId::new("acme")));
        assert_eq!(TenantId::from_value(&json!(42)), Some(TenantId::new("42")));
        assert_eq!(TenantId::from_value(&json!("")), None);
        assert_eq!(TenantId::from_value(&json!(null)), None);
        assert_eq!(TenantId::from_value(&json!({"id": 1})), None);
    }

    #[test]
    fn test_from_attributes_strips_id() {
        let tenant = Tenant::from_attributes(bag(json!({"id": 7, "name": "Acme"}))).unwrap();

        assert_eq!(tenant.id.as_str(), "7");
        assert_eq!(tenant.get("name"), Some(&json!("Acme")));
        assert!(tenant.get("id").is_none());
    }

    #[test]
    fn test_from_attributes_requires_id() {
        assert!(Tenant::from_attributes(bag(json!({"name": "Acme"}))).is_none());
    }

    #[test]
    fn test_to_attributes_includes_id() {
        let tenant = Tenant::new("acme", Attributes::new()).with_attribute("plan", "pro");
        let attributes = tenant.to_attributes();

        assert_eq!(attributes.get("id"), Some(&json!("acme")));
        assert_eq!(attributes.get("plan"), Some(&json!("pro")));
    }

    #[test]
    fn test_new_ignores_id_attribute() {
        let tenant = Tenant::new("acme", bag(json!({"id": "other", "name": "Acme"})))
            .with_attribute("id", "ignored");

        assert_eq!(tenant.id.as_str(), "acme");
        assert!(tenant.get("id").is_none());
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let tenant = Tenant::new("acme", Attributes::new()).with_attribute("name", "Acme");
        let value = serde_json::to_value(&tenant).unwrap();

        assert_eq!(value, json!({"id": "acme", "name": "Acme"}));
    }
}

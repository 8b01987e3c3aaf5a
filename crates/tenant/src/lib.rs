// Tenant resolution for request handling
// Works out which tenant a request belongs to and keeps that answer in a
// per-request context object.

pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod guard;
pub mod loader;
pub mod qualifier;
pub mod tenancy;

pub use crate::config::{RedirectTarget, Strategy, TenancyConfig};
pub use context::{Context, TenantContext};
pub use environment::{Environment, RequestEnv, SessionState};
pub use error::{Result, TenancyError};
pub use guard::{GuardDecision, RequestGuard, RequestTarget, StaticTarget};
pub use loader::{AttributeLoader, EntityLoader};
pub use qualifier::{resolve_qualifier, Qualifier};
pub use tenancy::Tenancy;

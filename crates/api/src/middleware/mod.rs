pub mod tenancy;

pub use tenancy::{tenancy_guard, TenancyState};

use crate::error::{Result, TenancyError};
use mtapp_models::ModelRef;
use serde::Deserialize;
use std::fmt;

/// How the tenant qualifier is derived from a request. Fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Qualifier is the request host; `primary_domain` is the global host.
    Domain { primary_domain: String },
    /// Qualifier comes from the tenant id stored under `session_key`.
    Session { session_key: String },
    /// No tenancy; every request is global.
    None,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Domain { .. } => "domain",
            Strategy::Session { .. } => "session",
            Strategy::None => "none",
        }
    }
}

/// Where the request guard sends requests that need a tenant but have none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget(String);

impl RedirectTarget {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RedirectTarget {
    fn default() -> Self {
        Self("/".to_string())
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct TenancyConfig {
    pub strategy: Strategy,
    pub redirect: RedirectTarget,
    pub model: ModelRef,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StrategyKind {
    Domain,
    Session,
    None,
}

/// Flat settings as read from the environment (`TENANCY_*`).
#[derive(Debug, Default, Deserialize)]
struct RawTenancyConfig {
    strategy: Option<StrategyKind>,
    primary_domain: Option<String>,
    session_key: Option<String>,
    redirect: Option<String>,
    model: Option<String>,
}

impl TenancyConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            redirect: RedirectTarget::default(),
            model: ModelRef::default(),
        }
    }

    pub fn domain(primary_domain: impl Into<String>) -> Self {
        Self::new(Strategy::Domain {
            primary_domain: primary_domain.into(),
        })
    }

    pub fn session(session_key: impl Into<String>) -> Self {
        Self::new(Strategy::Session {
            session_key: session_key.into(),
        })
    }

    pub fn none() -> Self {
        Self::new(Strategy::None)
    }

    pub fn with_redirect(mut self, redirect: RedirectTarget) -> Self {
        self.redirect = redirect;
        self
    }

    /// Load from `TENANCY_STRATEGY`, `TENANCY_PRIMARY_DOMAIN`,
    /// `TENANCY_SESSION_KEY`, `TENANCY_REDIRECT` and `TENANCY_MODEL`.
    pub fn from_env() -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix("TENANCY"))
            .build()?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: ::config::Config) -> Result<Self> {
        let raw: RawTenancyConfig = settings.try_deserialize()?;

        let strategy = match raw.strategy.unwrap_or(StrategyKind::None) {
            StrategyKind::Domain => Strategy::Domain {
                primary_domain: raw.primary_domain.ok_or_else(|| {
                    TenancyError::Config("TENANCY_PRIMARY_DOMAIN is required for the domain strategy".into())
                })?,
            },
            StrategyKind::Session => Strategy::Session {
                session_key: raw.session_key.ok_or_else(|| {
                    TenancyError::Config("TENANCY_SESSION_KEY is required for the session strategy".into())
                })?,
            },
            StrategyKind::None => Strategy::None,
        };

        let config = Self {
            strategy,
            redirect: raw.redirect.map(RedirectTarget::new).unwrap_or_default(),
            model: raw.model.map(ModelRef::new).unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match &self.strategy {
            Strategy::Domain { primary_domain } if primary_domain.trim().is_empty() => Err(
                TenancyError::Config("primary domain must not be empty".into()),
            ),
            Strategy::Session { session_key } if session_key.trim().is_empty() => Err(
                TenancyError::Config("session key must not be empty".into()),
            ),
            _ if self.redirect.as_str().is_empty() => Err(TenancyError::Config(
                "redirect target must not be empty".into(),
            )),
            _ => Ok(()),
        }
    }
}

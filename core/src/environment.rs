//! Deployment targets and their base URLs.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;

pub const PRODUCTION_URL: &str = "https://dummyjson.com";
pub const LOCAL_URL: &str = "http://localhost:8080";

/// A named deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// The public demo API.
    Production,
    /// The mock server on the loopback interface.
    Local,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Local => "local",
        }
    }

    /// Whether requests against this target carry authentication.
    pub fn requires_auth(self) -> bool {
        match self {
            Environment::Production | Environment::Local => true,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "local" => Ok(Environment::Local),
            other => Err(ApiError::Configuration(format!(
                "unknown environment '{other}'"
            ))),
        }
    }
}

/// Maps environments to URL templates.
///
/// Resolution is a pure lookup plus parse, so a resolver can be shared and
/// called concurrently without synchronization.
#[derive(Debug, Clone)]
pub struct EnvironmentResolver {
    templates: HashMap<Environment, String>,
}

impl Default for EnvironmentResolver {
    fn default() -> Self {
        Self::empty()
            .register(Environment::Production, PRODUCTION_URL)
            .register(Environment::Local, LOCAL_URL)
    }
}

impl EnvironmentResolver {
    /// A resolver with no registered environments.
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::empty()
            .register(Environment::Production, config.production_url.as_str())
            .register(Environment::Local, config.local_url.as_str())
    }

    pub fn register(mut self, environment: Environment, template: impl Into<String>) -> Self {
        self.templates.insert(environment, template.into());
        self
    }

    pub fn resolve(&self, environment: Environment) -> Result<Url, ApiError> {
        let template = self.templates.get(&environment).ok_or_else(|| {
            ApiError::Configuration(format!("no URL registered for environment '{environment}'"))
        })?;
        let url = Url::parse(template.trim()).map_err(|e| {
            ApiError::Configuration(format!(
                "invalid URL '{template}' for environment '{environment}': {e}"
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ApiError::Configuration(format!(
                "URL '{template}' for environment '{environment}' is not an http(s) base URL"
            )));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ApiError::Configuration(format!(
                "URL '{template}' for environment '{environment}' must not carry a query or fragment"
            )));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_resolver_knows_both_environments() {
        let resolver = EnvironmentResolver::default();
        assert_eq!(
            resolver.resolve(Environment::Production).unwrap().as_str(),
            "https://dummyjson.com/"
        );
        assert_eq!(
            resolver.resolve(Environment::Local).unwrap().as_str(),
            "http://localhost:8080/"
        );
    }

    #[test]
    fn unregistered_environment_is_configuration_error() {
        let resolver = EnvironmentResolver::empty().register(Environment::Local, LOCAL_URL);
        let err = resolver.resolve(Environment::Production).unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[test]
    fn malformed_template_is_configuration_error() {
        for template in ["not a url", "ftp://example.com", "mailto:someone@example.com"] {
            let resolver = EnvironmentResolver::empty().register(Environment::Local, template);
            let err = resolver.resolve(Environment::Local).unwrap_err();
            assert!(matches!(err, ApiError::Configuration(_)), "{template}");
        }
    }

    #[test]
    fn query_or_fragment_in_template_is_configuration_error() {
        for template in [
            "http://localhost:8080/?x=1",
            "http://localhost:8080?x=1",
            "http://localhost:8080/#frag",
            "https://dummyjson.com/api?",
        ] {
            let resolver = EnvironmentResolver::empty().register(Environment::Local, template);
            let err = resolver.resolve(Environment::Local).unwrap_err();
            assert!(matches!(err, ApiError::Configuration(_)), "{template}");
        }
    }

    #[test]
    fn templates_with_a_path_still_resolve() {
        let resolver =
            EnvironmentResolver::empty().register(Environment::Local, "http://localhost:8080/api/");
        let url = resolver.resolve(Environment::Local).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/");
    }

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!(" local ".parse::<Environment>().unwrap(), Environment::Local);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn every_environment_requires_auth() {
        assert!(Environment::Production.requires_auth());
        assert!(Environment::Local.requires_auth());
    }
}

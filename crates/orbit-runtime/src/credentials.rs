//! Resolution of credential placeholders carried by plan instructions.

use std::collections::BTreeMap;

use orbit_plan::CredentialRef;

use crate::TransportError;

pub const GITHUB_TOKEN_ENV: &str = "ORBIT_GITHUB_TOKEN";

pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, reference: &CredentialRef) -> Result<String, TransportError>;
}

/// Maps placeholders to environment variables, with optional fixed secrets
/// that take precedence.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialResolver {
    variables: BTreeMap<String, String>,
    secrets: BTreeMap<String, String>,
}

impl EnvCredentialResolver {
    /// GitHub user token read from `ORBIT_GITHUB_TOKEN`.
    pub fn new() -> Self {
        Self::default().with_variable(CredentialRef::GITHUB_USER_TOKEN, GITHUB_TOKEN_ENV)
    }

    pub fn with_variable(mut self, reference: &str, variable: &str) -> Self {
        self.variables
            .insert(reference.to_string(), variable.to_string());
        self
    }

    pub fn with_secret(mut self, reference: &str, secret: &str) -> Self {
        self.secrets
            .insert(reference.to_string(), secret.trim().to_string());
        self
    }
}

impl CredentialResolver for EnvCredentialResolver {
    fn resolve(&self, reference: &CredentialRef) -> Result<String, TransportError> {
        let unavailable = |detail: String| TransportError::Credential {
            reference: reference.as_str().to_string(),
            detail,
        };
        if let Some(secret) = self
            .secrets
            .get(reference.as_str())
            .filter(|secret| !secret.is_empty())
        {
            return Ok(secret.clone());
        }
        let Some(variable) = self.variables.get(reference.as_str()) else {
            return Err(unavailable("no source configured".to_string()));
        };
        match std::env::var(variable) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(unavailable(format!("environment variable {variable} is not set"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use orbit_plan::CredentialRef;

    use super::{CredentialResolver, EnvCredentialResolver};
    use crate::TransportError;

    #[test]
    fn unit_fixed_secret_wins_over_environment() {
        let resolver = EnvCredentialResolver::new()
            .with_secret(CredentialRef::GITHUB_USER_TOKEN, " ghp-fixed ");
        assert_eq!(
            resolver.resolve(&CredentialRef::github_user_token()),
            Ok("ghp-fixed".to_string())
        );
    }

    #[test]
    fn regression_unknown_reference_and_missing_variable_are_errors() {
        let resolver = EnvCredentialResolver::default()
            .with_variable("slack://bot", "ORBIT_TEST_VARIABLE_THAT_IS_NEVER_SET");
        assert!(matches!(
            resolver.resolve(&CredentialRef::new("vault://other")),
            Err(TransportError::Credential { .. })
        ));
        let error = resolver
            .resolve(&CredentialRef::new("slack://bot"))
            .expect_err("unset");
        assert!(error
            .to_string()
            .contains("ORBIT_TEST_VARIABLE_THAT_IS_NEVER_SET"));
    }
}

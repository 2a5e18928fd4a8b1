use serde::{Deserialize, Serialize};
use std::env;

use crate::build::vars;
use crate::error::PrBuilderError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub region: String,
    pub codebuild_project_name: String,
    pub enforce_approval: bool,
    pub source_email_param: Option<String>,
    pub cc_email_param: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub endpoints: ServiceEndpoints,
}

/// Base URLs of the external services.
///
/// Requests go out unsigned, so each URL must be a gateway that signs
/// them. Public service endpoints would reject every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    pub codecommit: String,
    pub codebuild: String,
    pub logs: String,
    pub ses: String,
    pub ssm: String,
}

/// Shared gateway used by every service without its own override.
pub const SERVICE_GATEWAY: &str = "SERVICE_GATEWAY_ENDPOINT";

impl AppConfig {
    pub fn load() -> Result<Self, PrBuilderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the process
    /// environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PrBuilderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let region = non_empty("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string());

        let codebuild_project_name = non_empty(vars::PROJECT_NAME).ok_or_else(|| {
            PrBuilderError::ConfigError("CODEBUILD_PROJECT_NAME must be set".to_string())
        })?;

        let enforce_approval = match non_empty("ENFORCE_APPROVAL") {
            Some(value) => parse_bool("ENFORCE_APPROVAL", &value)?,
            None => true,
        };

        let server_host = non_empty("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let server_port = non_empty("SERVER_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| PrBuilderError::ConfigError(format!("Invalid SERVER_PORT: {}", e)))?;

        let endpoint = |key: &str| {
            non_empty(key).or_else(|| non_empty(SERVICE_GATEWAY)).ok_or_else(|| {
                PrBuilderError::ConfigError(format!(
                    "{} or {} must name a signing gateway",
                    key, SERVICE_GATEWAY
                ))
            })
        };
        let endpoints = ServiceEndpoints {
            codecommit: endpoint("CODECOMMIT_ENDPOINT")?,
            codebuild: endpoint("CODEBUILD_ENDPOINT")?,
            logs: endpoint("LOGS_ENDPOINT")?,
            ses: endpoint("SES_ENDPOINT")?,
            ssm: endpoint("SSM_ENDPOINT")?,
        };

        Ok(AppConfig {
            region,
            codebuild_project_name,
            enforce_approval,
            source_email_param: non_empty("SOURCE_EMAIL_ADDR_PARAM"),
            cc_email_param: non_empty("CC_EMAIL_ADDR_PARAM"),
            server_host,
            server_port,
            endpoints,
        })
    }

    /// The notifier runs only when a source address parameter is named.
    pub fn notifier_enabled(&self) -> bool {
        self.source_email_param.is_some()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, PrBuilderError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PrBuilderError::ConfigError(format!(
            "Invalid {}: {}",
            key, other
        ))),
    }
}

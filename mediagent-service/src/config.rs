use clap::Parser;
use mediagent_core::{
    CatalogLoadError, GenerationError, OpenRouterBackend, StaticDoctorTypeCatalog,
    backend::openrouter::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL},
};

/// Runtime configuration, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "mediagent-service")]
#[command(about = "Pre-consultation precautions service")]
pub struct ServiceConfig {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub openrouter_api_key: String,

    /// Model used for both precautions and follow-up answers
    #[arg(long, env = "MEDIAGENT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Completion budget for requests that carry a report
    #[arg(long, env = "MEDIAGENT_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Replace the built-in doctor type list (comma-separated)
    #[arg(long, env = "MEDIAGENT_DOCTOR_TYPES", value_delimiter = ',')]
    pub doctor_types: Option<Vec<String>>,
}

impl ServiceConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn backend(&self) -> Result<OpenRouterBackend, GenerationError> {
        Ok(OpenRouterBackend::new(&self.openrouter_api_key)?
            .with_model(&self.model)
            .with_max_tokens(self.max_tokens))
    }

    pub fn catalog(&self) -> Result<StaticDoctorTypeCatalog, CatalogLoadError> {
        match &self.doctor_types {
            Some(names) => StaticDoctorTypeCatalog::from_names(names),
            None => Ok(StaticDoctorTypeCatalog::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = ServiceConfig::try_parse_from([
            "mediagent-service",
            "--openrouter-api-key",
            "test-key",
            "--port",
            "8080",
            "--doctor-types",
            "Cardiologist,Neurologist",
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert!(config.bind_address().ends_with(":8080"));

        let catalog = config.catalog().unwrap();
        assert!(catalog.contains("Cardiologist"));
        assert!(!catalog.contains("Dermatologist"));
    }

    #[test]
    fn duplicate_configured_doctor_types_are_rejected() {
        let config = ServiceConfig::try_parse_from([
            "mediagent-service",
            "--openrouter-api-key",
            "test-key",
            "--doctor-types",
            "Cardiologist,Cardiologist",
        ])
        .unwrap();

        assert!(matches!(
            config.catalog(),
            Err(CatalogLoadError::Duplicate(_))
        ));
    }
}

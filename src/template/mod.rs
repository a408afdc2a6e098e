//! Deployment artifact generation
//!
//! Turns a `DeploymentConfig` into the files the containers consume: the
//! compose manifest and, in nginx mode, the edge proxy configuration.

mod processor;

pub use processor::TemplateProcessor;

use crate::docker::DockerComposeGenerator;
use crate::error::Result;
use starter_common::DeploymentConfig;
use std::path::PathBuf;

/// Regenerates files derived from the configuration
pub trait ArtifactRegenerator {
    fn regenerate_proxy_config(&self, config: &DeploymentConfig) -> Result<PathBuf>;

    fn regenerate_compose_config(&self, config: &DeploymentConfig) -> Result<PathBuf>;
}

/// Writes artifacts to the paths derived from `environment.path`
#[derive(Default)]
pub struct DeploymentArtifacts {
    processor: TemplateProcessor,
}

impl DeploymentArtifacts {
    pub fn new(processor: TemplateProcessor) -> Self {
        Self { processor }
    }
}

impl ArtifactRegenerator for DeploymentArtifacts {
    fn regenerate_proxy_config(&self, config: &DeploymentConfig) -> Result<PathBuf> {
        let path = config.proxy_config_file();
        self.processor.generate_config(config, &path)?;
        Ok(path)
    }

    fn regenerate_compose_config(&self, config: &DeploymentConfig) -> Result<PathBuf> {
        let path = config.compose_file();
        DockerComposeGenerator::new(config).save_to_file(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starter_common::DeploymentMode;

    #[test]
    fn test_artifacts_land_under_project_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DeploymentConfig::default();
        config.set_project_path(dir.path());
        config.mode = DeploymentMode::Proxied;

        let artifacts = DeploymentArtifacts::default();
        let proxy = artifacts.regenerate_proxy_config(&config).unwrap();
        let compose = artifacts.regenerate_compose_config(&config).unwrap();

        assert_eq!(proxy, dir.path().join("data/configurations/nginx-edge.conf"));
        assert_eq!(compose, dir.path().join("data/docker-compose.yml"));
        assert!(proxy.is_file());
        assert!(std::fs::read_to_string(compose).unwrap().contains("nginx-edge"));
    }

    #[test]
    fn test_custom_processor_renders_proxy_config() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("edge.template");
        std::fs::write(&template, "# {{SERVER_NAME}}\n").unwrap();
        let mut config = DeploymentConfig::default();
        config.set_project_path(dir.path());
        config.mode = DeploymentMode::Proxied;
        config.nginx.domain = "box.example.org".to_string();

        let artifacts = DeploymentArtifacts::new(TemplateProcessor::with_template_path(template));
        let proxy = artifacts.regenerate_proxy_config(&config).unwrap();

        assert_eq!(std::fs::read_to_string(proxy).unwrap(), "# box.example.org\n");
    }
}

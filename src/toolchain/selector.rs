//! Environment → toolchain mapping

use super::{
    ArduinoToolchain, CmakeToolchain, DotnetToolchain, EnvironmentId, SelectError, Toolchain,
    ToolchainConfig, ToolchainSettings,
};
use crate::process::ProcessRunner;
use std::sync::Arc;
use tracing::debug;

/// Builds the adapter for a request. Holds only immutable settings and the shared
/// runner, so one selector serves concurrent requests.
#[derive(Clone)]
pub struct ToolchainSelector {
    settings: ToolchainSettings,
    runner: Arc<dyn ProcessRunner>,
}

impl ToolchainSelector {
    pub fn new(settings: ToolchainSettings, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { settings, runner }
    }

    pub fn settings(&self) -> &ToolchainSettings {
        &self.settings
    }

    /// Microcontroller environments receive `config`; a missing config becomes an
    /// empty one, which the adapter rejects at build time.
    pub fn select(
        &self,
        environment: EnvironmentId,
        config: Option<&ToolchainConfig>,
    ) -> Box<dyn Toolchain> {
        debug!("Selecting toolchain for environment: {}", environment);

        match environment {
            EnvironmentId::CSharp => Box::new(DotnetToolchain::new(
                &self.settings.dotnet_program,
                self.runner.clone(),
            )),
            EnvironmentId::Cpp => Box::new(
                CmakeToolchain::new(&self.settings.cmake_program, self.runner.clone())
                    .with_target(self.settings.cpp_target.clone()),
            ),
            EnvironmentId::Arduino | EnvironmentId::Esp32 => Box::new(ArduinoToolchain::new(
                environment,
                config.cloned().unwrap_or_default(),
                &self.settings.arduino_cli_program,
                self.runner.clone(),
            )),
        }
    }

    pub fn select_by_name(
        &self,
        environment: &str,
        config: Option<&ToolchainConfig>,
    ) -> Result<Box<dyn Toolchain>, SelectError> {
        let id: EnvironmentId = environment.parse()?;
        Ok(self.select(id, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MockProcessRunner;
    use tempfile::TempDir;

    fn selector() -> ToolchainSelector {
        ToolchainSelector::new(ToolchainSettings::default(), Arc::new(MockProcessRunner::new()))
    }

    #[test]
    fn test_every_environment_has_a_toolchain() {
        let selector = selector();
        for id in EnvironmentId::all_variants() {
            let toolchain = selector.select(*id, None);
            assert_eq!(toolchain.environment(), *id);
        }
    }

    #[test]
    fn test_select_by_name_case_insensitive() {
        let toolchain = selector().select_by_name("CPP", None).unwrap();
        assert_eq!(toolchain.environment(), EnvironmentId::Cpp);
    }

    #[test]
    fn test_unsupported_environment() {
        match selector().select_by_name("python", None) {
            Err(SelectError::UnsupportedEnvironment(name)) => assert_eq!(name, "python"),
            Ok(_) => panic!("Expected UnsupportedEnvironment"),
        }
    }

    #[tokio::test]
    async fn test_microcontroller_ids_share_adapter_and_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = ToolchainConfig::new("", "COM3");

        for name in ["arduino", "esp32"] {
            let toolchain = selector().select_by_name(name, Some(&config)).unwrap();
            assert!(toolchain.environment().is_microcontroller());

            let output = toolchain.build(temp_dir.path()).await.unwrap();
            assert_eq!(output, "Error: Arduino board not specified.");
        }
    }
}

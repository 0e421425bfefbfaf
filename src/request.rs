//! Inbound build requests and their validation
//!
//! [`RequestEnvelope`] is the wire shape delivered by the UI transport; a
//! [`BuildRequest`] only exists once every field has been checked and the payload
//! decoded, so nothing downstream touches the filesystem for a bad request.

use crate::archive;
use crate::toolchain::{EnvironmentId, SelectError, ToolchainConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{0} cannot be empty")]
    MissingField(&'static str),

    #[error("Invalid Base64 string in payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),

    #[error("Unknown action: {0}. Valid options: build, run, build_and_run")]
    UnknownAction(String),

    #[error(transparent)]
    Environment(#[from] SelectError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Build,
    Run,
    BuildAndRun,
}

impl Action {
    /// `run` still builds first; it only differs from `build` in what follows.
    pub fn runs(&self) -> bool {
        matches!(self, Action::Run | Action::BuildAndRun)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Build => "build",
            Action::Run => "run",
            Action::BuildAndRun => "build_and_run",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "build" => Ok(Action::Build),
            "run" => Ok(Action::Run),
            "build_and_run" => Ok(Action::BuildAndRun),
            _ => Err(RequestError::UnknownAction(s.to_string())),
        }
    }
}

/// Message as sent by the UI: base64 zip in `payload`, board settings in
/// `arduinoConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub action: String,

    #[serde(default)]
    pub environment: String,

    #[serde(default)]
    pub payload: String,

    #[serde(rename = "arduinoConfig", default, skip_serializing_if = "Option::is_none")]
    pub arduino_config: Option<ToolchainConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub action: Action,
    pub environment: EnvironmentId,
    pub archive: Vec<u8>,
    pub tool_config: Option<ToolchainConfig>,
}

impl BuildRequest {
    pub fn new(action: Action, environment: EnvironmentId, archive: Vec<u8>) -> Self {
        Self {
            action,
            environment,
            archive,
            tool_config: None,
        }
    }

    pub fn with_tool_config(mut self, config: ToolchainConfig) -> Self {
        self.tool_config = Some(config);
        self
    }
}

impl TryFrom<RequestEnvelope> for BuildRequest {
    type Error = RequestError;

    fn try_from(envelope: RequestEnvelope) -> Result<Self, Self::Error> {
        if envelope.payload.trim().is_empty() {
            return Err(RequestError::MissingField("payload"));
        }
        if envelope.environment.trim().is_empty() {
            return Err(RequestError::MissingField("environment"));
        }
        if envelope.action.trim().is_empty() {
            return Err(RequestError::MissingField("action"));
        }

        let archive = archive::decode_payload(&envelope.payload)?;
        if archive.is_empty() {
            return Err(RequestError::MissingField("payload"));
        }

        let action: Action = envelope.action.parse()?;
        let environment: EnvironmentId = envelope.environment.parse()?;

        Ok(Self {
            action,
            environment,
            archive,
            tool_config: envelope.arduino_config,
        })
    }
}

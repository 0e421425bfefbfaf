//! Environment identifiers accepted from callers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SelectError;

/// Closed set of supported target environments.
///
/// `Arduino` and `Esp32` are distinct identifiers served by the same
/// microcontroller toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentId {
    CSharp,
    Cpp,
    Arduino,
    Esp32,
}

impl EnvironmentId {
    pub fn name(&self) -> &'static str {
        match self {
            EnvironmentId::CSharp => "csharp",
            EnvironmentId::Cpp => "cpp",
            EnvironmentId::Arduino => "arduino",
            EnvironmentId::Esp32 => "esp32",
        }
    }

    /// Case-insensitive lookup including the generic aliases
    /// (`native`, `cross-compiled`, `microcontroller`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "csharp" | "c#" | "dotnet" | "native" => Some(EnvironmentId::CSharp),
            "cpp" | "c++" | "cmake" | "cross-compiled" | "cross_compiled" => Some(EnvironmentId::Cpp),
            "arduino" | "microcontroller" => Some(EnvironmentId::Arduino),
            "esp32" => Some(EnvironmentId::Esp32),
            _ => None,
        }
    }

    pub fn all_variants() -> &'static [Self] {
        &[
            EnvironmentId::CSharp,
            EnvironmentId::Cpp,
            EnvironmentId::Arduino,
            EnvironmentId::Esp32,
        ]
    }

    pub fn is_microcontroller(&self) -> bool {
        matches!(self, EnvironmentId::Arduino | EnvironmentId::Esp32)
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EnvironmentId {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| SelectError::UnsupportedEnvironment(s.to_string()))
    }
}

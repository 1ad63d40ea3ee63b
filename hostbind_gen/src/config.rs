use crate::naming::is_identifier;
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Native handle type; the registry keys on `i64`.
pub const NATIVE_HANDLE_TYPE: &str = "i64";

/// Shim-side handle types with the same width as the registry key.
const SHIM_HANDLE_TYPES: &[&str] = &["c_longlong", "i64"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("native handle type must be `i64`, got `{0}`")]
    NativeHandleType(String),

    #[error("shim handle type `{0}` is not a 64-bit integer type (use c_longlong or i64)")]
    ShimHandleType(String),

    #[error("{field} `{value}` is not a valid identifier")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// How a handle is spelled on each side of the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HandleRepr {
    pub native: String,
    pub shim: String,
    pub host: String,
}

impl Default for HandleRepr {
    fn default() -> Self {
        Self {
            native: NATIVE_HANDLE_TYPE.to_string(),
            shim: "c_longlong".to_string(),
            host: "int64_t".to_string(),
        }
    }
}

/// Generator configuration, loadable from YAML and overridable from the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GenConfig {
    pub handle: HandleRepr,
    /// Host interpreter used by the Makefile and the regenerate command.
    pub vm: String,
    /// Shared-library extension for built artifacts.
    pub lib_ext: String,
    /// Overrides the native path from the description.
    pub package_path: Option<String>,
    /// Overrides the host module name from the description.
    pub package_name: Option<String>,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            handle: HandleRepr::default(),
            vm: "python3".to_string(),
            lib_ext: ".so".to_string(),
            package_path: None,
            package_name: None,
        }
    }
}

impl GenConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.handle.native != NATIVE_HANDLE_TYPE {
            return Err(ConfigError::NativeHandleType(self.handle.native.clone()));
        }
        if !SHIM_HANDLE_TYPES.contains(&self.handle.shim.as_str()) {
            return Err(ConfigError::ShimHandleType(self.handle.shim.clone()));
        }
        if !is_identifier(&self.handle.host) {
            return Err(ConfigError::InvalidIdentifier {
                field: "host handle type",
                value: self.handle.host.clone(),
            });
        }
        if self.vm.trim().is_empty() {
            return Err(ConfigError::Empty { field: "vm" });
        }
        if let Some(name) = &self.package_name {
            if !is_identifier(name) {
                return Err(ConfigError::InvalidIdentifier {
                    field: "package name",
                    value: name.clone(),
                });
            }
        }
        if let Some(path) = &self.package_path {
            if !path.split("::").all(is_identifier) {
                return Err(ConfigError::InvalidIdentifier {
                    field: "package path",
                    value: path.clone(),
                });
            }
        }
        Ok(())
    }

    /// Command line that regenerates the bindings, recorded in every preamble.
    pub fn regenerate_command(&self, description: &str) -> String {
        let vm = Path::new(&self.vm)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.vm.clone());
        format!("hostbind gen --vm={} -f {}", vm, description)
    }
}

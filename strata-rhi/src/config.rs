use crate::{RhiError, RhiResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which graphics API backs the device. Resolved once, when the `RhiApi` is created.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RhiBackendType {
    /// Headless device that executes command lists against host memory
    None,
    OpenGl,
    Vulkan,
    D3d12,
}

impl Default for RhiBackendType {
    fn default() -> Self {
        RhiBackendType::None
    }
}

impl RhiBackendType {
    /// True if a device for this backend can be created by this build
    pub fn is_available(self) -> bool {
        match self {
            RhiBackendType::None => true,
            RhiBackendType::Vulkan => cfg!(feature = "rhi-vulkan"),
            RhiBackendType::OpenGl | RhiBackendType::D3d12 => false,
        }
    }
}

/// Controls if validation is enabled or not. The requirements/behaviors of validation is
/// API-specific.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhiValidationMode {
    /// Do not enable validation. Even if validation is turned on through external means, do not
    /// intentionally fail initialization
    Disabled,

    /// Enable validation if possible. (Details on requirements to enable at runtime are
    /// API-specific)
    EnabledIfAvailable,

    /// Enable validation, and fail if we cannot enable it or detect that it is not enabled through
    /// external means. (Details on this are API-specific)
    Enabled,
}

impl Default for RhiValidationMode {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        let validation_mode = RhiValidationMode::EnabledIfAvailable;
        #[cfg(not(debug_assertions))]
        let validation_mode = RhiValidationMode::Disabled;

        validation_mode
    }
}

/// Number of frames the CPU may record ahead of the GPU. Also the number of swapchain images
/// requested.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RhiSwapchainBuffering {
    Double,
    Triple,
}

impl Default for RhiSwapchainBuffering {
    fn default() -> Self {
        RhiSwapchainBuffering::Double
    }
}

impl RhiSwapchainBuffering {
    pub fn frame_count(self) -> usize {
        match self {
            RhiSwapchainBuffering::Double => 2,
            RhiSwapchainBuffering::Triple => 3,
        }
    }
}

/// Capacity of the descriptor pool the renderer creates. Allocation past these limits fails, the
/// pool is never grown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhiDescriptorPoolConfig {
    pub max_sets: u32,
    pub uniform_buffers: u32,
    pub storage_buffers: u32,
    pub sampled_textures: u32,
    pub storage_textures: u32,
    pub samplers: u32,
    pub combined_texture_samplers: u32,
    pub acceleration_structures: u32,
}

impl Default for RhiDescriptorPoolConfig {
    fn default() -> Self {
        RhiDescriptorPoolConfig {
            max_sets: 256,
            uniform_buffers: 256,
            storage_buffers: 64,
            sampled_textures: 256,
            storage_textures: 32,
            samplers: 64,
            combined_texture_samplers: 256,
            acceleration_structures: 0,
        }
    }
}

/// General configuration that all APIs will make best effort to respect. Usually loaded from a
/// TOML file:
///
/// ```toml
/// backend = "vulkan"
/// application_name = "editor"
/// buffering = "triple"
/// enable_vsync = true
/// validation_mode = "enabled_if_available"
///
/// [shader_defines]
/// MAX_LIGHTS = "16"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhiApiDef {
    pub backend: RhiBackendType,
    pub application_name: String,
    pub buffering: RhiSwapchainBuffering,
    pub enable_vsync: bool,
    pub validation_mode: RhiValidationMode,
    /// Upper bound on any single fence wait. A fence that does not signal within this time is
    /// treated as a lost device.
    pub fence_timeout_ms: u64,
    pub shader_include_dirs: Vec<PathBuf>,
    pub shader_defines: std::collections::BTreeMap<String, String>,
    pub descriptor_pool: RhiDescriptorPoolConfig,
}

impl Default for RhiApiDef {
    fn default() -> Self {
        RhiApiDef {
            backend: RhiBackendType::None,
            application_name: "strata".to_string(),
            buffering: RhiSwapchainBuffering::Double,
            enable_vsync: true,
            validation_mode: RhiValidationMode::default(),
            fence_timeout_ms: 5_000,
            shader_include_dirs: Vec::default(),
            shader_defines: Default::default(),
            descriptor_pool: Default::default(),
        }
    }
}

impl RhiApiDef {
    pub fn from_toml_str(toml_str: &str) -> RhiResult<Self> {
        let api_def: RhiApiDef = toml::from_str(toml_str)?;
        api_def.validate()?;
        Ok(api_def)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> RhiResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading RHI configuration from {:?}", path);
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str)
    }

    pub fn to_toml_string(&self) -> RhiResult<String> {
        toml::to_string(self).map_err(|e| RhiError::ConfigError(e.to_string()))
    }

    pub fn validate(&self) -> RhiResult<()> {
        if self.fence_timeout_ms == 0 {
            return Err(RhiError::ConfigError(
                "fence_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.descriptor_pool.max_sets == 0 {
            return Err(RhiError::ConfigError(
                "descriptor_pool.max_sets must be greater than zero".to_string(),
            ));
        }

        for key in self.shader_defines.keys() {
            let valid_identifier = key
                .chars()
                .next()
                .map(|c| c.is_ascii_alphabetic() || c == '_')
                .unwrap_or(false)
                && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid_identifier {
                return Err(RhiError::ConfigError(format!(
                    "shader define {:?} is not a valid identifier",
                    key
                )));
            }
        }

        Ok(())
    }

    pub fn fence_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.fence_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let api_def = RhiApiDef::from_toml_str(
            r#"
            backend = "vulkan"
            application_name = "editor"
            buffering = "triple"
            enable_vsync = false
            validation_mode = "enabled"
            fence_timeout_ms = 250

            [shader_defines]
            MAX_LIGHTS = "16"

            [descriptor_pool]
            max_sets = 8
            "#,
        )
        .unwrap();

        assert_eq!(api_def.backend, RhiBackendType::Vulkan);
        assert_eq!(api_def.buffering.frame_count(), 3);
        assert!(!api_def.enable_vsync);
        assert_eq!(api_def.validation_mode, RhiValidationMode::Enabled);
        assert_eq!(api_def.fence_timeout_ms, 250);
        assert_eq!(api_def.shader_defines["MAX_LIGHTS"], "16");
        assert_eq!(api_def.descriptor_pool.max_sets, 8);
        // Unspecified fields keep their defaults
        assert_eq!(api_def.descriptor_pool.uniform_buffers, 256);
    }

    #[test]
    fn empty_config_is_headless() {
        let api_def = RhiApiDef::from_toml_str("").unwrap();
        assert_eq!(api_def.backend, RhiBackendType::None);
        assert_eq!(api_def.buffering, RhiSwapchainBuffering::Double);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(RhiApiDef::from_toml_str("backend = \"metal\"").is_err());
        assert!(RhiApiDef::from_toml_str("fence_timeout_ms = 0").is_err());
        assert!(RhiApiDef::from_toml_str("[shader_defines]\n\"1BAD\" = \"x\"").is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut api_def = RhiApiDef::default();
        api_def.backend = RhiBackendType::D3d12;
        let toml_str = api_def.to_toml_string().unwrap();
        assert_eq!(RhiApiDef::from_toml_str(&toml_str).unwrap(), api_def);
    }

    #[test]
    fn backend_availability() {
        assert!(RhiBackendType::None.is_available());
        assert!(!RhiBackendType::D3d12.is_available());
        assert!(!RhiBackendType::OpenGl.is_available());
    }
}

use std::path::Path;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::{EError, Result};
use crate::typeyd3d12 as t12;

// -- Everything the engine reads at startup. Missing keys take the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SRenderConfig {
    pub min_feature_level: t12::EFeatureLevel,
    pub debug_layer: bool,
    pub sync_interval: u32,

    pub clear_colour: [f32; 4],
    pub depth_clear_value: f32,

    pub srv_heap_capacity: usize,

    // -- None waits forever
    pub fence_wait_timeout_ms: Option<u64>,

    pub back_buffer_format: t12::EDXGIFormat,
    pub depth_format: t12::EDXGIFormat,
}

impl Default for SRenderConfig {
    fn default() -> Self {
        Self {
            min_feature_level: t12::EFeatureLevel::Level12_0,
            debug_layer: false,
            sync_interval: 1,
            clear_colour: [0.1, 0.25, 0.5, 1.0],
            depth_clear_value: 1.0,
            srv_heap_capacity: 128,
            fence_wait_timeout_ms: None,
            back_buffer_format: t12::EDXGIFormat::R8G8B8A8UNorm,
            depth_format: t12::EDXGIFormat::D32Float,
        }
    }
}

impl SRenderConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json_str = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(json_str.as_str())?;
        info!("Loaded render config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_json_str(json_str: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn fence_wait_timeout(&self) -> Option<Duration> {
        self.fence_wait_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync_interval > 4 {
            return Err(EError::InvalidConfig("sync_interval must be between 0 and 4"));
        }
        if self.srv_heap_capacity == 0 {
            return Err(EError::InvalidConfig("srv_heap_capacity must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.depth_clear_value) {
            return Err(EError::InvalidConfig("depth_clear_value must be within [0, 1]"));
        }
        if self.back_buffer_format.is_depth() || self.back_buffer_format == t12::EDXGIFormat::Unknown {
            return Err(EError::InvalidConfig("back_buffer_format must be a colour format"));
        }
        if !self.depth_format.is_depth() {
            return Err(EError::InvalidConfig("depth_format must be a depth format"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = SRenderConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SRenderConfig::default());
        assert_eq!(config.fence_wait_timeout(), None);
    }

    #[test]
    fn test_partial_override() {
        let config = SRenderConfig::from_json_str(
            r#"{ "sync_interval": 0, "fence_wait_timeout_ms": 250, "min_feature_level": "Level12_1" }"#,
        )
        .unwrap();

        assert_eq!(config.sync_interval, 0);
        assert_eq!(config.fence_wait_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.min_feature_level, t12::EFeatureLevel::Level12_1);
        assert_eq!(config.srv_heap_capacity, 128);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        assert!(matches!(
            SRenderConfig::from_json_str("{ sync_interval: "),
            Err(EError::Config(_))
        ));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            SRenderConfig::from_json_str(r#"{ "depth_format": "R8G8B8A8UNorm" }"#),
            Err(EError::InvalidConfig(_))
        ));
        assert!(matches!(
            SRenderConfig::from_json_str(r#"{ "srv_heap_capacity": 0 }"#),
            Err(EError::InvalidConfig(_))
        ));
        assert!(matches!(
            SRenderConfig::from_json_str(r#"{ "depth_clear_value": 2.0 }"#),
            Err(EError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            SRenderConfig::load("does/not/exist.json"),
            Err(EError::Io(_))
        ));
    }
}

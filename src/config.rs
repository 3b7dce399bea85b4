use crate::error::{ConvertError, Result};
use std::path::PathBuf;

/// Pipeline configuration with environment-variable overrides.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Number of pool workers; bounds how many tasks run concurrently.
    pub worker_count: usize,
    /// Simulated work steps per task. Each step maps onto one percent
    /// point, so values above 100 are rejected by `validate`.
    pub step_count: u32,
    /// Delay per simulated step in milliseconds.
    pub step_delay_ms: u64,
    /// Capacity of the status event channel.
    pub event_buffer_size: usize,
    /// Explicit output directory; `None` resolves to the user's Downloads.
    pub output_dir: Option<PathBuf>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            step_count: 100,
            step_delay_ms: 50,
            event_buffer_size: 1024,
            output_dir: None,
        }
    }
}

impl ConvertConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(workers) = std::env::var("CONVERT_WORKER_COUNT") {
            config.worker_count = workers.parse().map_err(|e| {
                ConvertError::Configuration(format!("invalid CONVERT_WORKER_COUNT: {e}"))
            })?;
        }

        if let Ok(steps) = std::env::var("CONVERT_STEP_COUNT") {
            config.step_count = steps.parse().map_err(|e| {
                ConvertError::Configuration(format!("invalid CONVERT_STEP_COUNT: {e}"))
            })?;
        }

        if let Ok(delay) = std::env::var("CONVERT_STEP_DELAY_MS") {
            config.step_delay_ms = delay.parse().map_err(|e| {
                ConvertError::Configuration(format!("invalid CONVERT_STEP_DELAY_MS: {e}"))
            })?;
        }

        if let Ok(buffer) = std::env::var("CONVERT_EVENT_BUFFER_SIZE") {
            config.event_buffer_size = buffer.parse().map_err(|e| {
                ConvertError::Configuration(format!("invalid CONVERT_EVENT_BUFFER_SIZE: {e}"))
            })?;
        }

        if let Ok(dir) = std::env::var("CONVERT_OUTPUT_DIR") {
            config.output_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(ConvertError::Configuration(
                "worker_count must be greater than 0".to_string(),
            ));
        }
        if self.step_count == 0 || self.step_count > 100 {
            return Err(ConvertError::Configuration(
                "step_count must be in 1..=100".to_string(),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(ConvertError::Configuration(
                "event_buffer_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the directory converted files are written to.
    ///
    /// An explicit `output_dir` wins; otherwise the platform download
    /// directory, falling back to `<home>/Downloads`.
    pub fn output_root(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Ok(dir.clone());
        }
        dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
            .ok_or_else(|| {
                ConvertError::Configuration(
                    "could not resolve an output directory; set CONVERT_OUTPUT_DIR".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_values() {
        let config = ConvertConfig::default();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.step_count, 100);
        assert_eq!(config.step_delay_ms, 50);
        assert_eq!(config.event_buffer_size, 1024);
        assert!(config.output_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = ConvertConfig {
            worker_count: 0,
            ..ConvertConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_steps() {
        let config = ConvertConfig {
            step_count: 0,
            ..ConvertConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ConvertConfig {
            step_count: 101,
            ..ConvertConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_rejects_unparseable_values() {
        std::env::set_var("CONVERT_WORKER_COUNT", "lots");
        let result = ConvertConfig::from_env();
        std::env::remove_var("CONVERT_WORKER_COUNT");
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_output_dir_wins() {
        let config = ConvertConfig {
            output_dir: Some(PathBuf::from("/tmp/converted")),
            ..ConvertConfig::default()
        };
        assert_eq!(
            config.output_root().unwrap(),
            PathBuf::from("/tmp/converted")
        );
    }
}

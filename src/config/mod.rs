mod request;
mod types;

pub use request::{normalize_extension, ConversionRequest};
pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./fieldconv.toml", "~/.config/fieldconv/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    config.convert.check()?;

    if let Some(dir) = &config.convert.input_dir {
        if !dir.exists() {
            tracing::warn!("Input directory does not exist: {:?}", dir);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fieldconv.toml");
        std::fs::write(
            &path,
            r#"
[convert]
extension = ".jpg"
image_frame_rate = 10
poll_interval_secs = 60
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.convert.extension, ".jpg");
        assert_eq!(config.convert.image_frame_rate, 10);
        assert_eq!(config.convert.poll_interval_secs, Some(60));
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fieldconv.toml");
        std::fs::write(&path, "[convert]\npool_size = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("pool size"), "{err}");
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[convert\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_missing_custom_path_is_error() {
        assert!(load_config_or_default(Some(Path::new("/nonexistent/fieldconv.toml"))).is_err());
    }
}

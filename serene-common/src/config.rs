//! Configuration file discovery and root folder resolution

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "SERENE_CONFIG";

/// Environment variable naming the data root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "SERENE_ROOT_FOLDER";

/// Locate the TOML configuration file.
///
/// Priority order:
/// 1. Explicit path (command-line argument)
/// 2. `SERENE_CONFIG` environment variable
/// 3. `<config_dir>/serene/config.toml` if it exists
///
/// Returns `None` when no file is found; callers fall back to built-in defaults.
pub fn locate_config_file(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let found = dirs::config_dir()
        .map(|d| d.join("serene").join("config.toml"))
        .filter(|p| p.exists());
    if found.is_none() {
        debug!("No config file found, using built-in defaults");
    }
    found
}

/// Read and deserialize a TOML file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Loading config from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok(toml::from_str(&content)?)
}

/// Root folder resolution.
///
/// Priority order:
/// 1. Command-line argument (highest priority)
/// 2. `SERENE_ROOT_FOLDER` environment variable
/// 3. `root_folder` value from the TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_value: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
        return PathBuf::from(path);
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    let path = default_root_folder();
    info!("Root folder not configured, using default {}", path.display());
    path
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/serene
        dirs::data_local_dir()
            .map(|d| d.join("serene"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/serene"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/serene
        dirs::data_dir()
            .map(|d| d.join("serene"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/serene"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("serene"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\serene"))
    } else {
        PathBuf::from("./serene_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serial_test::serial;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Debug, Deserialize)]
    struct Sample {
        port: u16,
        #[serde(default)]
        name: Option<String>,
    }

    #[test]
    #[serial]
    fn test_cli_root_folder_wins() {
        std::env::set_var(ROOT_FOLDER_ENV_VAR, "/from/env");
        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), Some(Path::new("/from/toml")));
        std::env::remove_var(ROOT_FOLDER_ENV_VAR);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    #[serial]
    fn test_env_root_folder_beats_toml() {
        std::env::set_var(ROOT_FOLDER_ENV_VAR, "/from/env");
        let resolved = resolve_root_folder(None, Some(Path::new("/from/toml")));
        std::env::remove_var(ROOT_FOLDER_ENV_VAR);
        assert_eq!(resolved, PathBuf::from("/from/env"));
    }

    #[test]
    #[serial]
    fn test_toml_root_folder_used_without_env() {
        std::env::remove_var(ROOT_FOLDER_ENV_VAR);
        let resolved = resolve_root_folder(None, Some(Path::new("/from/toml")));
        assert_eq!(resolved, PathBuf::from("/from/toml"));
    }

    #[test]
    #[serial]
    fn test_default_root_folder_is_named_serene() {
        std::env::remove_var(ROOT_FOLDER_ENV_VAR);
        let resolved = resolve_root_folder(None, None);
        assert!(resolved.to_string_lossy().contains("serene"));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    #[serial]
    fn test_default_root_folder_fallback_is_logged() {
        std::env::remove_var(ROOT_FOLDER_ENV_VAR);
        let captured = CapturedLogs::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let resolved = tracing::subscriber::with_default(subscriber, || resolve_root_folder(None, None));

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("Root folder not configured"));
        assert!(logs.contains(&resolved.display().to_string()));
    }

    #[test]
    #[serial]
    fn test_explicit_config_path_is_returned() {
        let path = Path::new("/tmp/explicit.toml");
        assert_eq!(locate_config_file(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn test_load_toml_parses_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = 5740\nname = \"dev\"\n").unwrap();

        let sample: Sample = load_toml(&path).unwrap();
        assert_eq!(sample.port, 5740);
        assert_eq!(sample.name.as_deref(), Some("dev"));
    }

    #[test]
    fn test_load_toml_reports_bad_syntax_as_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = = 1").unwrap();

        let err = load_toml::<Sample>(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_toml_missing_file_is_config_error() {
        let err = load_toml::<Sample>(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

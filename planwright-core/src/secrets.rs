//! API key storage
//!
//! The key lives outside `config.toml` so the config file can be checked in or
//! shared. On disk it is `secrets.toml` next to the config, readable by its
//! owner only. `PLANWRIGHT_API_KEY` takes precedence over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "PLANWRIGHT_API_KEY";

const SECRETS_FILE: &str = "secrets.toml";

const TEMPLATE: &str = r#"# Planwright credentials
# Keep this file private: owner read/write only (mode 600).
# Setting PLANWRIGHT_API_KEY in the environment overrides the key below.

[model]
api_key = ""
"#;

/// Contents of `secrets.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    pub model: ModelSecrets,
}

/// `[model]` table
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSecrets {
    /// Key sent to the text-generation service
    pub api_key: Option<String>,
}

impl Secrets {
    /// Read `secrets.toml` from the config directory, or nothing if absent
    pub fn load() -> Result<Self> {
        match Self::default_secrets_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Read secrets from `path`, refusing files other users can access
    pub fn load_from_file(path: &Path) -> Result<Self> {
        ensure_private(path)?;

        let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        secrets.model.api_key = secrets
            .model
            .api_key
            .map(|key| key.trim().to_string());
        Ok(secrets)
    }

    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("planwright").join(SECRETS_FILE))
    }

    /// Key from the environment, falling back to the file
    pub fn api_key(&self) -> Option<String> {
        Self::pick_api_key(std::env::var(API_KEY_ENV).ok(), self.model.api_key.as_deref())
    }

    fn pick_api_key(from_env: Option<String>, from_file: Option<&str>) -> Option<String> {
        let env_key = from_env
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        if env_key.is_some() {
            debug!(var = API_KEY_ENV, "API key taken from environment");
            return env_key;
        }
        from_file.filter(|key| !key.is_empty()).map(|key| {
            debug!("API key taken from secrets file");
            key.to_string()
        })
    }

    /// Write an empty `secrets.toml` to the config directory
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("no config directory on this platform".to_string()))?;
        Self::create_template_at(&path)?;
        Ok(path)
    }

    /// Write an empty secrets file at `path`; an existing file is left alone
    pub fn create_template_at(path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(Error::Io)?;
        }

        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(Error::Config(format!(
                    "{} exists, not overwriting it",
                    path.display()
                )));
            }
            Err(e) => return Err(Error::Io(e)),
        };
        restrict_to_owner(path)?;
        std::io::Write::write_all(&mut file, TEMPLATE.as_bytes()).map_err(Error::Io)?;

        info!(path = %path.display(), "Wrote secrets template, fill in api_key");
        Ok(())
    }
}

#[cfg(unix)]
fn ensure_private(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path).map_err(Error::Io)?.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        return Err(Error::Config(format!(
            "{} is readable by other users (mode {:o}); restrict it with `chmod 600 {}`",
            path.display(),
            mode,
            path.display()
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_private(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(Error::Io)
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}

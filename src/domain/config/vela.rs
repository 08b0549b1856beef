// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::wait::PollSettings;
use crate::infrastructure::constants::{
    CONFIG_FILE_NAME, DEFAULT_FIELD_MANAGER, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_POLL_TIMEOUT_SECS, DEFAULT_VELA_NAMESPACE, ENV_VELA_HOME, VELA_HOME_DIR,
};
use crate::shared::error::VelaError;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// CLI settings read from `$VELA_HOME/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VelaConfig {
    pub namespace: String,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
    pub field_manager: String,
}

impl Default for VelaConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_VELA_NAMESPACE.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }
}

impl VelaConfig {
    /// `VELA_HOME`, falling back to `~/.vela`.
    pub fn vela_home() -> Result<PathBuf, VelaError> {
        if let Ok(home) = std::env::var(ENV_VELA_HOME) {
            if !home.trim().is_empty() {
                return Ok(PathBuf::from(home));
            }
        }

        dirs_next::home_dir()
            .map(|home| home.join(VELA_HOME_DIR))
            .ok_or_else(|| {
                VelaError::config_error("cannot determine home directory, set VELA_HOME")
            })
    }

    pub fn load() -> Result<Self, VelaError> {
        Self::from_path(Self::vela_home()?.join(CONFIG_FILE_NAME))
    }

    /// A missing file yields the defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, VelaError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = read_to_string(path)?;
        let conf: Self = toml::from_str(&content)?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn validate(&self) -> Result<(), VelaError> {
        if self.namespace.trim().is_empty() {
            return Err(VelaError::config_error("namespace must not be empty"));
        }
        if self.poll_interval_secs == 0 {
            return Err(VelaError::config_error("poll_interval_secs must be > 0"));
        }
        if self.poll_timeout_secs < self.poll_interval_secs {
            return Err(VelaError::config_error(
                "poll_timeout_secs must not be shorter than poll_interval_secs",
            ));
        }
        Ok(())
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings::new(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.poll_timeout_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_uses_defaults() {
        let conf = VelaConfig::from_path("/definitely/not/here/config.toml").unwrap();
        assert_eq!(conf, VelaConfig::default());
        assert_eq!(conf.poll_settings().interval, Duration::from_secs(5));
        assert_eq!(conf.poll_settings().timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "namespace = \"addons\"\npoll_interval_secs = 2").unwrap();

        let conf = VelaConfig::from_path(file.path()).unwrap();
        assert_eq!(conf.namespace, "addons");
        assert_eq!(conf.poll_interval_secs, 2);
        assert_eq!(conf.poll_timeout_secs, DEFAULT_POLL_TIMEOUT_SECS);
        assert_eq!(conf.field_manager, DEFAULT_FIELD_MANAGER);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_secs = 0").unwrap();
        assert!(VelaConfig::from_path(file.path()).is_err());
    }
}

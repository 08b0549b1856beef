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

//! Addon registries kept in a local YAML file.

use crate::domain::config::VelaConfig;
use crate::infrastructure::constants::{
    DEFAULT_REGISTRY_NAME, DEFAULT_REGISTRY_URL, REGISTRY_FILE_NAME,
};
use crate::shared::error::VelaError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const REGISTRY_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_-]*$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    Helm,
    Git,
    Oss,
}

impl RegistryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Helm => "helm",
            Self::Git => "git",
            Self::Oss => "oss",
        }
    }
}

impl FromStr for RegistryKind {
    type Err = VelaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "helm" => Ok(Self::Helm),
            "git" => Ok(Self::Git),
            "oss" => Ok(Self::Oss),
            other => Err(VelaError::validation(format!(
                "unsupported registry type {}, expected helm, git or oss",
                other
            ))),
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RegistryKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

impl Registry {
    pub fn new(
        name: impl Into<String>,
        kind: RegistryKind,
        url: impl Into<String>,
    ) -> Result<Self, VelaError> {
        let name = name.into();
        let url = url.into();
        if name.trim().is_empty() {
            return Err(VelaError::validation("must specify the registry name"));
        }
        let re = Regex::new(REGISTRY_NAME_PATTERN)
            .map_err(|e| VelaError::validation(e.to_string()))?;
        if !re.is_match(&name) {
            return Err(VelaError::validation(format!(
                "invalid registry name {}, only letters, digits, '-' and '_' are allowed",
                name
            )));
        }
        if url.trim().is_empty() {
            return Err(VelaError::validation("addon registry must set --endpoint flag"));
        }
        Ok(Self {
            name,
            kind,
            url,
            path: None,
            bucket: None,
        })
    }

    pub fn with_path(mut self, path: Option<String>) -> Self {
        self.path = path.filter(|p| !p.is_empty());
        self
    }

    pub fn with_bucket(mut self, bucket: Option<String>) -> Self {
        self.bucket = bucket.filter(|b| !b.is_empty());
        self
    }

    pub fn builtin() -> Self {
        Self {
            name: DEFAULT_REGISTRY_NAME.to_string(),
            kind: RegistryKind::Helm,
            url: DEFAULT_REGISTRY_URL.to_string(),
            path: None,
            bucket: None,
        }
    }

    /// The address shown in listings.
    pub fn display_url(&self) -> String {
        match self.kind {
            RegistryKind::Helm => self.url.clone(),
            RegistryKind::Git => format!(
                "{}/tree/master/{}",
                self.url.trim_end_matches('/'),
                self.path.as_deref().unwrap_or_default()
            ),
            RegistryKind::Oss => match &self.bucket {
                None => self.url.clone(),
                Some(bucket) => {
                    let (scheme, rest) = self
                        .url
                        .split_once("://")
                        .unwrap_or(("https", self.url.as_str()));
                    let host = rest.split('/').next().unwrap_or_default();
                    format!("{}://{}.{}", scheme, bucket, host)
                }
            },
        }
    }
}

/// Registries persisted as a YAML list.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `$VELA_HOME/registries.yaml`
    pub fn open_default() -> Result<Self, VelaError> {
        Ok(Self::new(VelaConfig::vela_home()?.join(REGISTRY_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Registry>, VelaError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn save(&self, registries: &[Registry]) -> Result<(), VelaError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_yaml::to_string(registries)?)?;
        debug!("Saved {} registries to {}", registries.len(), self.path.display());
        Ok(())
    }

    /// Stored registries, or the built-in one when none are configured.
    pub fn list(&self) -> Result<Vec<Registry>, VelaError> {
        let registries = self.load()?;
        if registries.is_empty() {
            return Ok(vec![Registry::builtin()]);
        }
        Ok(registries)
    }

    pub fn get(&self, name: &str) -> Result<Registry, VelaError> {
        self.list()?
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| self.not_found(name))
    }

    pub fn add(&self, registry: Registry) -> Result<(), VelaError> {
        let mut registries = self.load()?;
        if registries.iter().any(|r| r.name == registry.name) {
            return Err(VelaError::already_exists(
                "registry",
                registry.name,
                self.path.display().to_string(),
            ));
        }
        registries.push(registry);
        self.save(&registries)
    }

    pub fn update(&self, registry: Registry) -> Result<(), VelaError> {
        let mut registries = self.load()?;
        let slot = registries
            .iter_mut()
            .find(|r| r.name == registry.name)
            .ok_or_else(|| self.not_found(&registry.name))?;
        *slot = registry;
        self.save(&registries)
    }

    /// Add or update. Returns `true` when the registry was created.
    pub fn config(&self, registry: Registry) -> Result<bool, VelaError> {
        match self.update(registry.clone()) {
            Ok(()) => Ok(false),
            Err(e) if e.is_not_found() => self.add(registry).map(|_| true),
            Err(e) => Err(e),
        }
    }

    pub fn remove(&self, name: &str) -> Result<(), VelaError> {
        let mut registries = self.load()?;
        let before = registries.len();
        registries.retain(|r| r.name != name);
        if registries.len() == before {
            return Err(self.not_found(name));
        }
        self.save(&registries)
    }

    fn not_found(&self, name: &str) -> VelaError {
        VelaError::not_found("registry", name, self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, RegistryStore) {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path().join("nested").join(REGISTRY_FILE_NAME));
        (dir, store)
    }

    #[test]
    fn test_builtin_listed_when_empty() {
        let (_dir, store) = store();
        let registries = store.list().unwrap();
        assert_eq!(registries, vec![Registry::builtin()]);
        assert_eq!(store.get(DEFAULT_REGISTRY_NAME).unwrap().url, DEFAULT_REGISTRY_URL);
    }

    #[test]
    fn test_crud() {
        let (_dir, store) = store();
        let helm =
            Registry::new("charts", RegistryKind::Helm, "https://charts.example.com").unwrap();

        store.add(helm.clone()).unwrap();
        assert!(matches!(
            store.add(helm.clone()).unwrap_err(),
            VelaError::AlreadyExists { .. }
        ));
        assert_eq!(store.list().unwrap(), vec![helm.clone()]);

        let moved =
            Registry::new("charts", RegistryKind::Helm, "https://mirror.example.com").unwrap();
        store.update(moved.clone()).unwrap();
        assert_eq!(store.get("charts").unwrap(), moved);

        let ghost = Registry::new("ghost", RegistryKind::Helm, "https://x").unwrap();
        assert!(store.update(ghost).unwrap_err().is_not_found());

        store.remove("charts").unwrap();
        assert!(store.remove("charts").unwrap_err().is_not_found());
    }

    #[test]
    fn test_config_upserts() {
        let (_dir, store) = store();
        let git = Registry::new("community", RegistryKind::Git, "https://github.com/o/r").unwrap();
        assert!(store.config(git.clone()).unwrap());
        assert!(!store.config(git.with_path(Some("addons".into()))).unwrap());
        assert_eq!(store.get("community").unwrap().path.as_deref(), Some("addons"));
    }

    #[test]
    fn test_display_url() {
        let git = Registry::new("g", RegistryKind::Git, "https://github.com/o/r")
            .unwrap()
            .with_path(Some("addons".into()));
        assert_eq!(git.display_url(), "https://github.com/o/r/tree/master/addons");

        let oss = Registry::new("o", RegistryKind::Oss, "oss-cn-hangzhou.aliyuncs.com")
            .unwrap()
            .with_bucket(Some("kubevela".into()));
        assert_eq!(oss.display_url(), "https://kubevela.oss-cn-hangzhou.aliyuncs.com");

        let plain = Registry::new("p", RegistryKind::Oss, "http://minio:9000").unwrap();
        assert_eq!(plain.display_url(), "http://minio:9000");
    }

    #[test]
    fn test_registry_requires_url() {
        assert!(Registry::new("x", RegistryKind::Helm, "").is_err());
        assert!(Registry::new("my registry", RegistryKind::Helm, "https://x").is_err());
        assert!(Registry::new("my_registry-2", RegistryKind::Helm, "https://x").is_ok());
        assert!("svn".parse::<RegistryKind>().is_err());
        assert_eq!("OSS".parse::<RegistryKind>().unwrap(), RegistryKind::Oss);
    }
}

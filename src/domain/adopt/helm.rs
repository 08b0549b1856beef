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

//! Reading Helm release records straight from their storage objects.

use super::reference::AdoptedResource;
use crate::infrastructure::constants::{
    ENV_HELM_DRIVER, HELM_DRIVER_CONFIGMAP, HELM_DRIVER_SECRET, HELM_NAME_LABEL, HELM_OWNER_LABEL,
    HELM_OWNER_VALUE, HELM_RELEASE_KEY, HELM_VERSION_LABEL,
};
use crate::infrastructure::kubernetes::resources::{
    configmap_resource, is_namespaced, secret_resource,
};
use crate::infrastructure::kubernetes::VelaKubeClient;
use crate::shared::error::VelaError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use kube::api::{ApiResource, DynamicObject};
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelmDriver {
    Secret,
    ConfigMap,
}

impl HelmDriver {
    /// Resolve the storage driver from the flag, then `HELM_DRIVER`, then
    /// the secret default.
    pub fn resolve(flag: Option<&str>) -> Result<Self, VelaError> {
        let env = std::env::var(ENV_HELM_DRIVER).ok();
        let driver = flag.map(str::to_string).or(env).unwrap_or_default();
        match driver.trim().to_ascii_lowercase().as_str() {
            "" | "secret" | "secrets" => Ok(Self::Secret),
            "configmap" | "configmaps" => Ok(Self::ConfigMap),
            other => Err(VelaError::validation(format!(
                "unsupported helm driver {}, expected {} or {}",
                other, HELM_DRIVER_SECRET, HELM_DRIVER_CONFIGMAP
            ))),
        }
    }

    fn resource(&self) -> ApiResource {
        match self {
            Self::Secret => secret_resource(),
            Self::ConfigMap => configmap_resource(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelmRelease {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub manifest: String,
}

impl HelmRelease {
    /// Split the rendered manifest into objects. Namespaced objects without
    /// a namespace land in the release namespace.
    pub fn resources(&self) -> Result<Vec<AdoptedResource>, VelaError> {
        let mut resources = Vec::new();
        for document in serde_yaml::Deserializer::from_str(&self.manifest) {
            let mut value = Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }

            let api_version = value.get("apiVersion").and_then(Value::as_str).unwrap_or_default();
            let kind = value.get("kind").and_then(Value::as_str).unwrap_or_default();
            let namespaced = is_namespaced(api_version, kind);
            if let Some(metadata) = value.get_mut("metadata").and_then(Value::as_object_mut) {
                if namespaced && !metadata.contains_key("namespace") {
                    metadata.insert("namespace".into(), Value::String(self.namespace.clone()));
                }
            }
            resources.push(AdoptedResource::from_value(value)?);
        }
        Ok(resources)
    }
}

/// Decode a release payload: base64, optionally gzip, then JSON.
pub fn decode_release(encoded: &str) -> Result<HelmRelease, VelaError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    let json = if bytes.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut out)
            .map_err(|e| VelaError::HelmRelease(format!("failed to decompress release: {}", e)))?;
        out
    } else {
        bytes
    };
    Ok(serde_json::from_slice(&json)?)
}

/// The newest revision of a release and the names of every storage record
/// it owns.
#[derive(Debug, Clone)]
pub struct StoredRelease {
    pub release: HelmRelease,
    pub records: Vec<String>,
}

pub struct HelmStorage<'a> {
    client: &'a dyn VelaKubeClient,
    driver: HelmDriver,
}

impl<'a> HelmStorage<'a> {
    pub fn new(client: &'a dyn VelaKubeClient, driver: HelmDriver) -> Self {
        Self { client, driver }
    }

    pub async fn latest(&self, namespace: &str, release: &str) -> Result<StoredRelease, VelaError> {
        let selector = format!(
            "{}={},{}={}",
            HELM_OWNER_LABEL, HELM_OWNER_VALUE, HELM_NAME_LABEL, release
        );
        let records = self
            .client
            .list_objects(&self.driver.resource(), Some(namespace), &selector)
            .await?;
        debug!("Found {} storage records for release {}", records.len(), release);

        let newest = records
            .iter()
            .max_by_key(|r| record_version(r))
            .ok_or_else(|| {
                VelaError::HelmRelease(format!(
                    "release {} not found in namespace {}",
                    release, namespace
                ))
            })?;

        let payload = self.payload(newest)?;
        let mut decoded = decode_release(&payload)?;
        if decoded.namespace.is_empty() {
            decoded.namespace = namespace.to_string();
        }

        let mut names: Vec<String> = records
            .iter()
            .filter_map(|r| r.metadata.name.clone())
            .collect();
        names.sort();
        Ok(StoredRelease {
            release: decoded,
            records: names,
        })
    }

    /// Secrets carry the payload base64 encoded once more by the API.
    fn payload(&self, record: &DynamicObject) -> Result<String, VelaError> {
        let raw = record
            .data
            .get("data")
            .and_then(|d| d.get(HELM_RELEASE_KEY))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VelaError::HelmRelease(format!(
                    "storage record {} has no release payload",
                    record.metadata.name.as_deref().unwrap_or_default()
                ))
            })?;

        match self.driver {
            HelmDriver::ConfigMap => Ok(raw.to_string()),
            HelmDriver::Secret => {
                let inner = STANDARD.decode(raw)?;
                String::from_utf8(inner)
                    .map_err(|e| VelaError::HelmRelease(format!("invalid release payload: {}", e)))
            }
        }
    }

    pub async fn delete_records(
        &self,
        namespace: &str,
        records: &[String],
    ) -> Result<(), VelaError> {
        let resource = self.driver.resource();
        for name in records {
            match self.client.delete_object(&resource, Some(namespace), name).await {
                Ok(()) => debug!("Deleted helm storage record {}/{}", namespace, name),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

fn record_version(record: &DynamicObject) -> i64 {
    record
        .metadata
        .labels
        .as_ref()
        .and_then(|l| l.get(HELM_VERSION_LABEL))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

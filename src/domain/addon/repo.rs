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

use super::addon::Addon;
use crate::infrastructure::constants::ADDON_MARK_LABEL;
use crate::infrastructure::kubernetes::VelaKubeClient;
use crate::shared::error::VelaError;
use k8s_openapi::api::core::v1::ConfigMap;
use tracing::debug;

/// A read-only catalog of addons.
pub trait AddonRepo: Send + Sync {
    fn get_addon(&self, name: &str) -> Result<Addon, VelaError>;

    fn list_addons(&self) -> Vec<Addon>;
}

/// Addons discovered from ConfigMaps carrying the addon marker label. The
/// catalog is a snapshot taken by [`ConfigMapAddonRepo::load`].
#[derive(Debug, Clone, Default)]
pub struct ConfigMapAddonRepo {
    addons: Vec<Addon>,
}

impl ConfigMapAddonRepo {
    pub async fn load(
        client: &dyn VelaKubeClient,
        namespace: Option<&str>,
        default_namespace: &str,
    ) -> Result<Self, VelaError> {
        let configmaps = client.list_configmaps(namespace, ADDON_MARK_LABEL).await?;
        debug!("Found {} addon configmaps", configmaps.len());
        Ok(Self::from_configmaps(&configmaps, default_namespace))
    }

    pub fn from_configmaps(configmaps: &[ConfigMap], default_namespace: &str) -> Self {
        let mut addons: Vec<Addon> = configmaps
            .iter()
            .map(|cm| Addon::from_configmap(cm, default_namespace))
            .filter(|addon| !addon.name().is_empty())
            .collect();
        addons.sort_by(|a, b| a.name().cmp(b.name()));
        Self { addons }
    }

    pub fn from_addons(addons: Vec<Addon>) -> Self {
        Self { addons }
    }
}

impl AddonRepo for ConfigMapAddonRepo {
    fn get_addon(&self, name: &str) -> Result<Addon, VelaError> {
        self.addons
            .iter()
            .find(|a| a.name() == name)
            .or_else(|| self.addons.iter().find(|a| a.matches(name)))
            .cloned()
            .ok_or_else(|| VelaError::AddonNotFound(name.to_string()))
    }

    fn list_addons(&self) -> Vec<Addon> {
        self.addons.clone()
    }
}

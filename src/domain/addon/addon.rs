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

use super::parameter::{AddonArgs, AddonParameters};
use super::template;
use crate::infrastructure::constants::{
    ADDON_DESC_ANNOTATION, ADDON_NAME_ANNOTATION, ADDON_PARAMETERS_KEY, ADDON_TEMPLATE_KEY,
    STATUS_INSTALLED, STATUS_UNINSTALLED, STATUS_UNKNOWN,
};
use crate::infrastructure::kubernetes::{Application, VelaKubeClient};
use crate::shared::error::VelaError;
use k8s_openapi::api::core::v1::ConfigMap;
use std::fmt;
use tera::Context;

/// Addon names may contain `/`; Kubernetes object names may not.
pub fn trans_addon_name(name: &str) -> String {
    name.replace('/', "-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonStatus {
    Installed,
    Uninstalled,
    Unknown,
}

impl AddonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installed => STATUS_INSTALLED,
            Self::Uninstalled => STATUS_UNINSTALLED,
            Self::Unknown => STATUS_UNKNOWN,
        }
    }
}

impl fmt::Display for AddonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An installable addon: a templated Application plus the arguments it will
/// be rendered with.
#[derive(Debug, Clone)]
pub struct Addon {
    name: String,
    description: String,
    template: String,
    parameters: AddonParameters,
    parameters_error: Option<String>,
    args: AddonArgs,
    default_namespace: String,
}

impl Addon {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        template: impl Into<String>,
        default_namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            template: template.into(),
            parameters: AddonParameters::default(),
            parameters_error: None,
            args: AddonArgs::new(),
            default_namespace: default_namespace.into(),
        }
    }

    /// Build an addon from a marked ConfigMap. A malformed parameter schema
    /// does not hide the addon; it surfaces once the addon is rendered.
    pub fn from_configmap(configmap: &ConfigMap, default_namespace: &str) -> Self {
        let annotations = configmap.metadata.annotations.as_ref();
        let annotation = |key: &str| annotations.and_then(|a| a.get(key)).cloned();
        let data = configmap.data.as_ref();
        let entry = |key: &str| data.and_then(|d| d.get(key)).cloned().unwrap_or_default();

        let name = annotation(ADDON_NAME_ANNOTATION)
            .or_else(|| configmap.metadata.name.clone())
            .unwrap_or_default();
        let description = annotation(ADDON_DESC_ANNOTATION).unwrap_or_default();

        let mut addon = Self::new(name, description, entry(ADDON_TEMPLATE_KEY), default_namespace);
        match AddonParameters::from_yaml(&entry(ADDON_PARAMETERS_KEY)) {
            Ok(parameters) => addon.parameters = parameters,
            Err(e) => addon.parameters_error = Some(e.to_string()),
        }
        addon
    }

    pub fn with_args(mut self, args: AddonArgs) -> Self {
        self.args = args;
        self
    }

    /// Attach arguments inherited from a dependent addon, dropping the ones
    /// this addon does not declare.
    pub fn with_inherited_args(self, args: &AddonArgs) -> Self {
        let args = self.parameters.filter_known(args);
        self.with_args(args)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &AddonParameters {
        &self.parameters
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name == name || trans_addon_name(&self.name) == trans_addon_name(name)
    }

    /// Render the template into an Application. Pure: the same addon and
    /// arguments always produce the same object.
    pub fn render_application(&self) -> Result<Application, VelaError> {
        if let Some(err) = &self.parameters_error {
            return Err(VelaError::config_error(format!(
                "addon {} has an invalid parameter schema: {}",
                self.name, err
            )));
        }

        let args = self.parameters.resolve(&self.args)?;
        let mut context = Context::new();
        context.insert("Args", &args);
        context.insert("Name", &self.name);

        let rendered = template::render(&self.template, &context)?;
        let value: serde_json::Value = serde_yaml::from_str(&rendered)
            .map_err(|e| VelaError::TemplateDecode(e.to_string()))?;

        let kind = value.get("kind").and_then(|k| k.as_str()).unwrap_or_default();
        let api_version = value
            .get("apiVersion")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if kind != "Application" || !api_version.starts_with("core.oam.dev/") {
            return Err(VelaError::TemplateDecode(format!(
                "addon {} must render a core.oam.dev Application, got kind '{}' apiVersion '{}'",
                self.name, kind, api_version
            )));
        }

        let mut application: Application = serde_json::from_value(value)
            .map_err(|e| VelaError::TemplateDecode(e.to_string()))?;
        if application.metadata.name.as_deref().unwrap_or_default().is_empty() {
            application.metadata.name = Some(trans_addon_name(&self.name));
        }
        if application.metadata.namespace.is_none() {
            application.metadata.namespace = Some(self.default_namespace.clone());
        }
        Ok(application)
    }

    /// Installed when the rendered Application exists in the cluster.
    pub async fn status(&self, client: &dyn VelaKubeClient) -> Result<AddonStatus, VelaError> {
        let application = self.render_application()?;
        application_status(client, &application).await
    }
}

pub(crate) async fn application_status(
    client: &dyn VelaKubeClient,
    application: &Application,
) -> Result<AddonStatus, VelaError> {
    let namespace = application.metadata.namespace.as_deref().unwrap_or_default();
    let name = application.metadata.name.as_deref().unwrap_or_default();
    match client.get_application(namespace, name).await? {
        Some(_) => Ok(AddonStatus::Installed),
        None => Ok(AddonStatus::Uninstalled),
    }
}

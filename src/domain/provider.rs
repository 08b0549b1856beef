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

//! Terraform cloud providers installed through addons.

use crate::domain::addon::AddonArgs;
use crate::infrastructure::constants::{
    TERRAFORM_PROVIDER_APP_PREFIX, TERRAFORM_PROVIDER_TYPE_LABEL, TERRAFORM_PROVIDER_TYPE_VALUE,
};
use crate::infrastructure::kubernetes::resources::{
    component_definition_resource, terraform_provider_resource,
};
use crate::infrastructure::kubernetes::{
    Application, ApplicationComponent, ApplicationSpec, VelaKubeClient,
};
use crate::shared::error::VelaError;
use kube::api::DynamicObject;
use serde_json::Value;
use tracing::{debug, info};

const NO_PROVIDER_HINT: &str =
    "no Terraform Cloud Provider found, please run `vela addon enable` first";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub name: String,
    pub namespace: String,
    pub provider: String,
    pub region: String,
    pub state: String,
    pub created: String,
}

impl ProviderInfo {
    fn from_object(object: &DynamicObject) -> Self {
        let field = |pointer: &str| {
            object
                .data
                .pointer(pointer)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            name: object.metadata.name.clone().unwrap_or_default(),
            namespace: object.metadata.namespace.clone().unwrap_or_default(),
            provider: field("/spec/provider"),
            region: field("/spec/region"),
            state: field("/status/state"),
            created: object
                .metadata
                .creation_timestamp
                .as_ref()
                .map(|t| {
                    t.0.with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                })
                .unwrap_or_default(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.eq_ignore_ascii_case("ready")
    }
}

/// Every Terraform `Provider` across namespaces, sorted by namespace and
/// name. An empty cluster is an error pointing at `vela addon enable`.
pub async fn list_providers(client: &dyn VelaKubeClient) -> Result<Vec<ProviderInfo>, VelaError> {
    let objects = match client
        .list_objects(&terraform_provider_resource(), None, "")
        .await
    {
        Ok(objects) => objects,
        Err(e) if e.is_not_found() => {
            debug!("Provider CRD is not installed: {}", e);
            return Err(VelaError::validation(NO_PROVIDER_HINT));
        }
        Err(e) => return Err(e),
    };

    if objects.is_empty() {
        return Err(VelaError::validation(NO_PROVIDER_HINT));
    }

    let mut providers: Vec<ProviderInfo> = objects.iter().map(ProviderInfo::from_object).collect();
    providers.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
    Ok(providers)
}

/// The Application that carries the credentials of provider `name`.
pub fn provider_app_name(name: &str) -> String {
    format!("{}{}", TERRAFORM_PROVIDER_APP_PREFIX, name)
}

/// Provider types are ComponentDefinitions shipped by the Terraform provider
/// addons, sorted by name.
pub async fn list_provider_types(
    client: &dyn VelaKubeClient,
    namespace: &str,
) -> Result<Vec<String>, VelaError> {
    let selector = format!("{}={}", TERRAFORM_PROVIDER_TYPE_LABEL, TERRAFORM_PROVIDER_TYPE_VALUE);
    let mut types: Vec<String> = client
        .list_objects(&component_definition_resource(), Some(namespace), &selector)
        .await?
        .into_iter()
        .filter_map(|def| def.metadata.name)
        .collect();
    types.sort();
    Ok(types)
}

/// Create the Application holding the credentials of a new provider. An
/// existing provider of the same name is never overwritten.
pub async fn add_provider(
    client: &dyn VelaKubeClient,
    namespace: &str,
    provider_type: &str,
    name: &str,
    properties: &AddonArgs,
) -> Result<Application, VelaError> {
    if name.trim().is_empty() {
        return Err(VelaError::validation(
            "must specify a name for the Terraform Cloud Provider",
        ));
    }

    let types = list_provider_types(client, namespace).await?;
    if types.is_empty() {
        return Err(VelaError::validation(NO_PROVIDER_HINT));
    }
    if !types.iter().any(|t| t == provider_type) {
        return Err(VelaError::validation(format!(
            "provider type: {} is invalid, select one from {}",
            provider_type,
            types.join(", ")
        )));
    }
    if properties.is_empty() {
        return Err(VelaError::validation(format!(
            "must set properties for the Terraform Cloud Provider {}",
            provider_type
        )));
    }

    let app_name = provider_app_name(name);
    if client.get_application(namespace, &app_name).await?.is_some() {
        return Err(VelaError::already_exists(
            format!("{} provider", provider_type),
            name,
            namespace,
        ));
    }

    let spec = ApplicationSpec {
        components: vec![ApplicationComponent {
            name: app_name.clone(),
            component_type: provider_type.to_string(),
            properties: Some(serde_json::to_value(properties)?),
            ..Default::default()
        }],
        ..Default::default()
    };
    let mut application = Application::new(&app_name, spec);
    application.metadata.namespace = Some(namespace.to_string());

    client.apply_application(&application).await?;
    info!("Created Terraform provider {} of type {}", name, provider_type);
    Ok(application)
}

pub async fn delete_provider(
    client: &dyn VelaKubeClient,
    namespace: &str,
    name: &str,
) -> Result<(), VelaError> {
    let app_name = provider_app_name(name);
    if client.get_application(namespace, &app_name).await?.is_none() {
        return Err(VelaError::not_found("Terraform provider", name, namespace));
    }
    client.delete_application(namespace, &app_name).await?;
    info!("Deleted Terraform provider {}", name);
    Ok(())
}

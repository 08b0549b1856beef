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

use crate::infrastructure::constants::{RETRY_MAX_TIMES, RETRY_MIN_DELAY_MILLIS};
use crate::infrastructure::kubernetes::application::Application;
use crate::shared::error::VelaError;
use backon::{ExponentialBuilder, Retryable};
use k8s_openapi::api::core::v1::{ConfigMap, Namespace};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{
    ApiResource, DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams,
};
use kube::{Api, Client};
use std::time::Duration;
use tracing::debug;

#[async_trait::async_trait]
pub trait VelaKubeClient: Send + Sync {
    /// List ConfigMaps; `None` lists across all namespaces.
    async fn list_configmaps(
        &self,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<ConfigMap>, VelaError>;

    async fn get_application(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Application>, VelaError>;

    async fn apply_application(&self, application: &Application) -> Result<(), VelaError>;

    async fn delete_application(&self, namespace: &str, name: &str) -> Result<(), VelaError>;

    /// Returns `true` when the namespace had to be created.
    async fn ensure_namespace(&self, name: &str) -> Result<bool, VelaError>;

    /// `namespace == None` addresses a cluster-scoped object.
    async fn get_object(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>, VelaError>;

    async fn list_objects(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<DynamicObject>, VelaError>;

    async fn delete_object(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<(), VelaError>;
}

pub struct VelaKubeClientImpl {
    client: Client,
    field_manager: String,
}

impl VelaKubeClientImpl {
    pub async fn new(field_manager: impl Into<String>) -> Result<Self, VelaError> {
        let client = Client::try_default().await.map_err(|e| {
            VelaError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self {
            client,
            field_manager: field_manager.into(),
        })
    }

    pub async fn new_with_config(
        kubeconfig_path: Option<String>,
        context: Option<String>,
        field_manager: impl Into<String>,
    ) -> Result<Self, VelaError> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        if kubeconfig_path.is_none() && context.is_none() {
            return Self::new(field_manager).await;
        }

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path)
                .map_err(|e| VelaError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        } else {
            Kubeconfig::read()
                .map_err(|e| VelaError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                VelaError::KubeError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            VelaError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self {
            client,
            field_manager: field_manager.into(),
        })
    }

    fn dynamic_api(&self, resource: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::all_with(self.client.clone(), resource),
        }
    }
}

fn retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(RETRY_MIN_DELAY_MILLIS))
        .with_max_times(RETRY_MAX_TIMES)
}

/// Throttling, server-side failures and connection problems are worth another attempt.
fn is_transient(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(ae) => ae.code == 429 || ae.code >= 500,
        kube::Error::HyperError(_) | kube::Error::Service(_) => true,
        _ => false,
    }
}

fn map_api_error(err: kube::Error, resource_type: &str, name: &str, namespace: &str) -> VelaError {
    if let kube::Error::Api(ae) = err {
        if ae.code == 404 {
            VelaError::not_found(resource_type, name, namespace)
        } else {
            VelaError::KubeError(ae.message)
        }
    } else {
        VelaError::KubeError(err.to_string())
    }
}

fn list_params(label_selector: &str) -> ListParams {
    if label_selector.is_empty() {
        ListParams::default()
    } else {
        ListParams::default().labels(label_selector)
    }
}

#[async_trait::async_trait]
impl VelaKubeClient for VelaKubeClientImpl {
    async fn list_configmaps(
        &self,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<ConfigMap>, VelaError> {
        let api: Api<ConfigMap> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let lp = list_params(label_selector);

        (|| async { api.list(&lp).await })
            .retry(retry_policy())
            .when(is_transient)
            .await
            .map(|list| list.items)
            .map_err(|e| VelaError::KubeError(e.to_string()))
    }

    async fn get_application(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Application>, VelaError> {
        let api: Api<Application> = Api::namespaced(self.client.clone(), namespace);

        (|| async { api.get_opt(name).await })
            .retry(retry_policy())
            .when(is_transient)
            .await
            .map_err(|e| map_api_error(e, "Application", name, namespace))
    }

    async fn apply_application(&self, application: &Application) -> Result<(), VelaError> {
        let name = application
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| VelaError::config_error("Application name is required"))?;
        let namespace = application
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| VelaError::config_error("Application namespace is required"))?;

        let api: Api<Application> = Api::namespaced(self.client.clone(), namespace);
        let patch_params = PatchParams::apply(&self.field_manager).force();
        let mut patch = serde_json::to_value(application).map_err(|e| {
            VelaError::KubeError(format!("Failed to serialize Application: {}", e))
        })?;
        // status belongs to the controller
        if let Some(obj) = patch.as_object_mut() {
            obj.remove("status");
        }

        debug!(name, namespace, "server-side applying Application");
        (|| async { api.patch(name, &patch_params, &Patch::Apply(&patch)).await })
            .retry(retry_policy())
            .when(is_transient)
            .await
            .map_err(|e| map_api_error(e, "Application", name, namespace))?;
        Ok(())
    }

    async fn delete_application(&self, namespace: &str, name: &str) -> Result<(), VelaError> {
        let api: Api<Application> = Api::namespaced(self.client.clone(), namespace);

        match api.delete(name, &DeleteParams::foreground()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                debug!(name, namespace, "Application already deleted");
                Ok(())
            }
            Err(e) => Err(VelaError::KubeError(e.to_string())),
        }
    }

    async fn ensure_namespace(&self, name: &str) -> Result<bool, VelaError> {
        let api: Api<Namespace> = Api::all(self.client.clone());

        let existing = (|| async { api.get_opt(name).await })
            .retry(retry_policy())
            .when(is_transient)
            .await
            .map_err(|e| VelaError::KubeError(e.to_string()))?;
        if existing.is_some() {
            return Ok(false);
        }

        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        match api.create(&PostParams::default(), &namespace).await {
            Ok(_) => Ok(true),
            // lost a race with another creator
            Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(false),
            Err(e) => Err(VelaError::KubeError(format!(
                "Create namespace {} error: {}",
                name, e
            ))),
        }
    }

    async fn get_object(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>, VelaError> {
        let api = self.dynamic_api(resource, namespace);

        (|| async { api.get_opt(name).await })
            .retry(retry_policy())
            .when(is_transient)
            .await
            .map_err(|e| map_api_error(e, &resource.kind, name, namespace.unwrap_or_default()))
    }

    async fn list_objects(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<DynamicObject>, VelaError> {
        let api = self.dynamic_api(resource, namespace);
        let lp = list_params(label_selector);

        (|| async { api.list(&lp).await })
            .retry(retry_policy())
            .when(is_transient)
            .await
            .map(|list| list.items)
            .map_err(|e| VelaError::KubeError(e.to_string()))
    }

    async fn delete_object(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<(), VelaError> {
        let api = self.dynamic_api(resource, namespace);

        api.delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| map_api_error(e, &resource.kind, name, namespace.unwrap_or_default()))
    }
}

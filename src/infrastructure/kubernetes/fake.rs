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

//! In-memory client used by unit tests in place of a cluster.

use crate::infrastructure::kubernetes::application::{Application, ApplicationStatus};
use crate::infrastructure::kubernetes::client::VelaKubeClient;
use crate::shared::error::VelaError;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{ApiResource, DynamicObject};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

type ObjectKey = (String, String, String);

#[derive(Default)]
struct FakeState {
    configmaps: Vec<ConfigMap>,
    applications: BTreeMap<(String, String), Application>,
    objects: BTreeMap<ObjectKey, DynamicObject>,
    namespaces: BTreeSet<String>,
    applied: Vec<String>,
    deleted: Vec<String>,
    phase_on_apply: Option<String>,
    phase_overrides: BTreeMap<String, String>,
    rejected: BTreeSet<String>,
    vanishing: BTreeSet<String>,
}

#[derive(Default)]
pub struct FakeKubeClient {
    state: Mutex<FakeState>,
}

fn object_key(resource: &ApiResource, namespace: Option<&str>, name: &str) -> ObjectKey {
    (
        resource.kind.clone(),
        namespace.unwrap_or_default().to_string(),
        name.to_string(),
    )
}

pub fn matches_selector(labels: Option<&BTreeMap<String, String>>, selector: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .all(|requirement| match requirement.split_once('=') {
            Some((key, value)) => {
                labels.and_then(|l| l.get(key.trim())) == Some(&value.trim().to_string())
            }
            None => labels.map(|l| l.contains_key(requirement)).unwrap_or(false),
        })
}

impl FakeKubeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every applied Application immediately reports `phase`.
    pub fn with_phase_on_apply(self, phase: &str) -> Self {
        self.state.lock().unwrap().phase_on_apply = Some(phase.to_string());
        self
    }

    pub fn with_configmap(self, configmap: ConfigMap) -> Self {
        self.state.lock().unwrap().configmaps.push(configmap);
        self
    }

    pub fn set_phase_for(&self, app_name: &str, phase: &str) {
        self.state
            .lock()
            .unwrap()
            .phase_overrides
            .insert(app_name.to_string(), phase.to_string());
    }

    pub fn reject_apply(&self, app_name: &str) {
        self.state.lock().unwrap().rejected.insert(app_name.to_string());
    }

    /// Applies succeed but the object is never readable afterwards.
    pub fn vanish_on_apply(&self, app_name: &str) {
        self.state.lock().unwrap().vanishing.insert(app_name.to_string());
    }

    pub fn insert_application(&self, application: Application) {
        let key = (
            application.metadata.namespace.clone().unwrap_or_default(),
            application.metadata.name.clone().unwrap_or_default(),
        );
        self.state.lock().unwrap().applications.insert(key, application);
    }

    pub fn set_phase(&self, namespace: &str, name: &str, phase: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(app) = state
            .applications
            .get_mut(&(namespace.to_string(), name.to_string()))
        {
            app.status = Some(ApplicationStatus {
                phase: Some(phase.to_string()),
            });
        }
    }

    pub fn insert_object(&self, resource: &ApiResource, object: DynamicObject) {
        let key = object_key(
            resource,
            object.metadata.namespace.as_deref(),
            object.metadata.name.as_deref().unwrap_or_default(),
        );
        self.state.lock().unwrap().objects.insert(key, object);
    }

    pub fn has_object(&self, resource: &ApiResource, namespace: Option<&str>, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .objects
            .contains_key(&object_key(resource, namespace, name))
    }

    pub fn application(&self, namespace: &str, name: &str) -> Option<Application> {
        self.state
            .lock()
            .unwrap()
            .applications
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn applied(&self) -> Vec<String> {
        self.state.lock().unwrap().applied.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn namespaces(&self) -> BTreeSet<String> {
        self.state.lock().unwrap().namespaces.clone()
    }
}

#[async_trait::async_trait]
impl VelaKubeClient for FakeKubeClient {
    async fn list_configmaps(
        &self,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<ConfigMap>, VelaError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .configmaps
            .iter()
            .filter(|cm| namespace.is_none() || cm.metadata.namespace.as_deref() == namespace)
            .filter(|cm| matches_selector(cm.metadata.labels.as_ref(), label_selector))
            .cloned()
            .collect())
    }

    async fn get_application(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Application>, VelaError> {
        Ok(self.application(namespace, name))
    }

    async fn apply_application(&self, application: &Application) -> Result<(), VelaError> {
        let mut state = self.state.lock().unwrap();
        let name = application.metadata.name.clone().unwrap_or_default();
        let namespace = application.metadata.namespace.clone().unwrap_or_default();

        if state.rejected.contains(&name) {
            return Err(VelaError::KubeError(format!("admission webhook denied {}", name)));
        }
        state.applied.push(name.clone());
        if state.vanishing.contains(&name) {
            return Ok(());
        }

        let mut stored = application.clone();
        let phase = state
            .phase_overrides
            .get(&name)
            .cloned()
            .or_else(|| state.phase_on_apply.clone());
        let previous_status = state
            .applications
            .get(&(namespace.clone(), name.clone()))
            .and_then(|existing| existing.status.clone());
        stored.status = match phase {
            Some(phase) => Some(ApplicationStatus { phase: Some(phase) }),
            None => previous_status,
        };
        state.applications.insert((namespace, name), stored);
        Ok(())
    }

    async fn delete_application(&self, namespace: &str, name: &str) -> Result<(), VelaError> {
        let mut state = self.state.lock().unwrap();
        state
            .applications
            .remove(&(namespace.to_string(), name.to_string()));
        state.deleted.push(name.to_string());
        Ok(())
    }

    async fn ensure_namespace(&self, name: &str) -> Result<bool, VelaError> {
        Ok(self.state.lock().unwrap().namespaces.insert(name.to_string()))
    }

    async fn get_object(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>, VelaError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .objects
            .get(&object_key(resource, namespace, name))
            .cloned())
    }

    async fn list_objects(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<DynamicObject>, VelaError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .objects
            .iter()
            .filter(|((kind, ns, _), _)| {
                kind == &resource.kind && namespace.map(|n| n == ns).unwrap_or(true)
            })
            .filter(|(_, obj)| matches_selector(obj.metadata.labels.as_ref(), label_selector))
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn delete_object(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<(), VelaError> {
        let mut state = self.state.lock().unwrap();
        match state.objects.remove(&object_key(resource, namespace, name)) {
            Some(_) => {
                state.deleted.push(name.to_string());
                Ok(())
            }
            None => Err(VelaError::not_found(
                &resource.kind,
                name,
                namespace.unwrap_or_default(),
            )),
        }
    }
}

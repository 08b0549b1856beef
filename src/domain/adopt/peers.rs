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

//! Grouping unmanaged workloads with the objects they use.
//!
//! Each Deployment, StatefulSet or DaemonSet that has no owner and is not
//! already part of an Application starts a group. A group also takes the
//! Services selecting its pods, the ConfigMaps, Secrets and PVCs its pod
//! spec references, and a non-default ServiceAccount. An object is adopted
//! into at most one group.

use super::reference::AdoptedResource;
use crate::infrastructure::constants::LABEL_APP_NAME;
use crate::infrastructure::kubernetes::resources::known_kind;
use crate::infrastructure::kubernetes::VelaKubeClient;
use crate::shared::error::VelaError;
use kube::api::{ApiResource, DynamicObject};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

const WORKLOAD_KINDS: &[&str] = &["Deployment", "StatefulSet", "DaemonSet"];

/// Resources adopted together into one Application.
#[derive(Debug, Clone)]
pub struct ResourceGroup {
    pub app_name: String,
    pub resources: Vec<AdoptedResource>,
}

fn resource_of(kind: &str) -> Result<ApiResource, VelaError> {
    known_kind(kind)
        .map(|k| k.api_resource())
        .ok_or_else(|| VelaError::validation(format!("unknown resource kind: {}", kind)))
}

fn is_unmanaged(object: &DynamicObject) -> bool {
    let owned = object
        .metadata
        .owner_references
        .as_ref()
        .map(|o| !o.is_empty())
        .unwrap_or(false);
    let managed = object
        .metadata
        .labels
        .as_ref()
        .map(|l| l.contains_key(LABEL_APP_NAME))
        .unwrap_or(false);
    !owned && !managed
}

/// Objects a pod spec points at, as `(kind, name)` pairs.
pub fn pod_references(pod_spec: &Value) -> BTreeSet<(&'static str, String)> {
    let mut refs = BTreeSet::new();
    let mut add = |kind: &'static str, name: Option<&Value>| {
        if let Some(name) = name.and_then(Value::as_str).filter(|n| !n.is_empty()) {
            refs.insert((kind, name.to_string()));
        }
    };

    for volume in array(pod_spec.get("volumes")) {
        add("ConfigMap", volume.pointer("/configMap/name"));
        add("Secret", volume.pointer("/secret/secretName"));
        add("PersistentVolumeClaim", volume.pointer("/persistentVolumeClaim/claimName"));
        for source in array(volume.pointer("/projected/sources")) {
            add("ConfigMap", source.pointer("/configMap/name"));
            add("Secret", source.pointer("/secret/name"));
        }
    }

    let containers = array(pod_spec.get("containers"))
        .into_iter()
        .chain(array(pod_spec.get("initContainers")));
    for container in containers {
        for env_from in array(container.get("envFrom")) {
            add("ConfigMap", env_from.pointer("/configMapRef/name"));
            add("Secret", env_from.pointer("/secretRef/name"));
        }
        for env in array(container.get("env")) {
            add("ConfigMap", env.pointer("/valueFrom/configMapKeyRef/name"));
            add("Secret", env.pointer("/valueFrom/secretKeyRef/name"));
        }
    }

    for secret in array(pod_spec.get("imagePullSecrets")) {
        add("Secret", secret.get("name"));
    }

    let service_account = pod_spec
        .get("serviceAccountName")
        .or_else(|| pod_spec.get("serviceAccount"));
    if service_account.and_then(Value::as_str) != Some("default") {
        add("ServiceAccount", service_account);
    }

    refs
}

fn array(value: Option<&Value>) -> Vec<&Value> {
    value
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default()
}

fn selector_matches(service: &DynamicObject, pod_labels: &serde_json::Map<String, Value>) -> bool {
    match service.data.pointer("/spec/selector").and_then(Value::as_object) {
        Some(selector) if !selector.is_empty() => selector
            .iter()
            .all(|(k, v)| pod_labels.get(k) == Some(v)),
        _ => false,
    }
}

pub async fn discover_groups(
    client: &dyn VelaKubeClient,
    namespace: &str,
) -> Result<Vec<ResourceGroup>, VelaError> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut groups = Vec::new();

    let service_resource = resource_of("Service")?;
    let mut services = client.list_objects(&service_resource, Some(namespace), "").await?;
    services.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));

    for kind in WORKLOAD_KINDS {
        let workload_resource = resource_of(kind)?;
        let mut workloads = client.list_objects(&workload_resource, Some(namespace), "").await?;
        workloads.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));

        for workload in workloads.iter().filter(|w| is_unmanaged(w)) {
            let adopted = AdoptedResource::from_dynamic(&workload_resource, workload)?;
            if !visited.insert(adopted.identifier()) {
                continue;
            }
            let app_name = adopted.name.clone();
            let mut resources = vec![adopted];

            let empty = serde_json::Map::new();
            let pod_labels = workload
                .data
                .pointer("/spec/template/metadata/labels")
                .and_then(Value::as_object)
                .unwrap_or(&empty);
            for service in services.iter().filter(|s| is_unmanaged(s)) {
                if selector_matches(service, pod_labels) {
                    let peer = AdoptedResource::from_dynamic(&service_resource, service)?;
                    if visited.insert(peer.identifier()) {
                        resources.push(peer);
                    }
                }
            }

            let pod_spec = workload
                .data
                .pointer("/spec/template/spec")
                .cloned()
                .unwrap_or(Value::Null);
            for (peer_kind, name) in pod_references(&pod_spec) {
                let resource = resource_of(peer_kind)?;
                let found = client.get_object(&resource, Some(namespace), &name).await?;
                let Some(object) = found else {
                    debug!("Referenced {} {} does not exist, skipping", peer_kind, name);
                    continue;
                };
                let peer = AdoptedResource::from_dynamic(&resource, &object)?;
                if visited.insert(peer.identifier()) {
                    resources.push(peer);
                }
            }

            debug!("Workload {} {} groups {} resources", kind, app_name, resources.len());
            groups.push(ResourceGroup { app_name, resources });
        }
    }

    Ok(groups)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::fake::FakeKubeClient;
    use serde_json::json;
    use std::collections::BTreeMap;

    pub(crate) fn object(kind: &str, name: &str, data: Value) -> (ApiResource, DynamicObject) {
        let resource = resource_of(kind).unwrap();
        let mut obj = DynamicObject::new(name, &resource).within("web");
        obj.data = data;
        (resource, obj)
    }

    pub(crate) fn deployment(
        name: &str,
        app_label: &str,
        pod_spec: Value,
    ) -> (ApiResource, DynamicObject) {
        let template = json!({"metadata": {"labels": {"app": app_label}}, "spec": pod_spec});
        object("Deployment", name, json!({"spec": {"template": template}}))
    }

    fn seed(client: &FakeKubeClient, items: Vec<(ApiResource, DynamicObject)>) {
        for (resource, obj) in items {
            client.insert_object(&resource, obj);
        }
    }

    #[test]
    fn test_pod_references() {
        let refs = pod_references(&json!({
            "serviceAccountName": "runner",
            "volumes": [
                {"name": "a", "configMap": {"name": "conf"}},
                {"name": "b", "secret": {"secretName": "tls"}},
                {"name": "c", "persistentVolumeClaim": {"claimName": "data"}}
            ],
            "containers": [{
                "name": "main",
                "envFrom": [{"secretRef": {"name": "creds"}}],
                "env": [{
                    "name": "X",
                    "valueFrom": {"configMapKeyRef": {"name": "conf", "key": "x"}}
                }]
            }]
        }));

        let expected: BTreeSet<(&str, String)> = [
            ("ConfigMap", "conf"),
            ("PersistentVolumeClaim", "data"),
            ("Secret", "creds"),
            ("Secret", "tls"),
            ("ServiceAccount", "runner"),
        ]
        .into_iter()
        .map(|(k, n)| (k, n.to_string()))
        .collect();
        assert_eq!(refs, expected);

        let refs = pod_references(&json!({"serviceAccountName": "default"}));
        assert!(refs.is_empty());
    }

    #[tokio::test]
    async fn test_discover_groups_claims_each_peer_once() {
        let client = FakeKubeClient::new();
        let shared_env = json!({
            "containers": [{"name": "c", "envFrom": [{"configMapRef": {"name": "shared"}}]}]
        });
        seed(
            &client,
            vec![
                deployment("api", "api", shared_env.clone()),
                deployment("worker", "worker", shared_env),
                object("Service", "api", json!({"spec": {"selector": {"app": "api"}}})),
                object("Service", "headless", json!({"spec": {}})),
                object("ConfigMap", "shared", json!({"data": {"k": "v"}})),
            ],
        );

        let mut managed = deployment("managed", "managed", json!({}));
        managed.1.metadata.labels = Some(BTreeMap::from([(
            LABEL_APP_NAME.to_string(),
            "app".to_string(),
        )]));
        seed(&client, vec![managed]);

        let groups = discover_groups(&client, "web").await.unwrap();
        assert_eq!(groups.len(), 2);

        let api: Vec<String> = groups[0]
            .resources
            .iter()
            .map(|r| format!("{}/{}", r.kind, r.name))
            .collect();
        assert_eq!(groups[0].app_name, "api");
        assert_eq!(api, vec!["Deployment/api", "Service/api", "ConfigMap/shared"]);

        assert_eq!(groups[1].app_name, "worker");
        assert_eq!(groups[1].resources.len(), 1);
    }
}

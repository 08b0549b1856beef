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

use crate::infrastructure::constants::LOCAL_CLUSTER;
use crate::infrastructure::kubernetes::resources::{resolve_kind, KnownKind};
use crate::shared::error::VelaError;
use kube::api::{ApiResource, DynamicObject};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A native resource named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: &'static KnownKind,
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceRef {
    /// Parse `kind/name`, `kind/namespace/name` or
    /// `kind/cluster/namespace/name`. Only the local cluster is accepted.
    pub fn parse(raw: &str, default_namespace: &str) -> Result<Self, VelaError> {
        let parts: Vec<&str> = raw.split('/').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(VelaError::validation(format!("invalid resource reference: {}", raw)));
        }

        let (kind, namespace, name) = match parts.as_slice() {
            [kind, name] => (*kind, None, *name),
            [kind, namespace, name] => (*kind, Some(*namespace), *name),
            [kind, cluster, namespace, name] => {
                if *cluster != LOCAL_CLUSTER {
                    return Err(VelaError::validation(format!(
                        "resource {} is in cluster {}, only the {} cluster is supported",
                        raw, cluster, LOCAL_CLUSTER
                    )));
                }
                (*kind, Some(*namespace), *name)
            }
            _ => {
                return Err(VelaError::validation(format!(
                    "invalid resource reference {}, expected kind/name, kind/namespace/name or kind/cluster/namespace/name",
                    raw
                )))
            }
        };

        let kind = resolve_kind(kind)
            .ok_or_else(|| VelaError::validation(format!("unknown resource kind: {}", kind)))?;
        let namespace = if kind.namespaced {
            Some(namespace.unwrap_or(default_namespace).to_string())
        } else {
            None
        };

        Ok(Self {
            kind,
            namespace,
            name: name.to_string(),
        })
    }

    pub fn api_resource(&self) -> ApiResource {
        self.kind.api_resource()
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind.kind, ns, self.name),
            None => write!(f, "{}/{}", self.kind.kind, self.name),
        }
    }
}

/// A cluster object selected for adoption.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptedResource {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub object: Value,
}

const PRUNED_METADATA: &[&str] = &[
    "managedFields",
    "resourceVersion",
    "uid",
    "creationTimestamp",
    "generation",
    "selfLink",
];

impl AdoptedResource {
    pub fn from_dynamic(resource: &ApiResource, object: &DynamicObject) -> Result<Self, VelaError> {
        let mut value = serde_json::to_value(object)?;
        if let Some(map) = value.as_object_mut() {
            map.insert("apiVersion".into(), Value::String(resource.api_version.clone()));
            map.insert("kind".into(), Value::String(resource.kind.clone()));
        }
        Self::from_value(value)
    }

    /// Build from a full object. Server-populated metadata and status are
    /// dropped.
    pub fn from_value(mut object: Value) -> Result<Self, VelaError> {
        let field = |obj: &Value, path: &[&str]| {
            path.iter()
                .try_fold(obj, |v, key| v.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let api_version = field(&object, &["apiVersion"])
            .ok_or_else(|| VelaError::validation("object without apiVersion"))?;
        let kind =
            field(&object, &["kind"]).ok_or_else(|| VelaError::validation("object without kind"))?;
        let name = field(&object, &["metadata", "name"])
            .ok_or_else(|| VelaError::validation(format!("{} object without a name", kind)))?;
        let namespace = field(&object, &["metadata", "namespace"]);

        if let Some(map) = object.as_object_mut() {
            map.remove("status");
        }
        if let Some(metadata) = object.get_mut("metadata").and_then(Value::as_object_mut) {
            for key in PRUNED_METADATA {
                metadata.remove(*key);
            }
        }

        Ok(Self {
            api_version,
            kind,
            name,
            namespace,
            object,
        })
    }

    /// Identity used to avoid adopting one object into two applications.
    pub fn identifier(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_version,
            self.kind,
            self.namespace.as_deref().unwrap_or_default(),
            self.name
        )
    }
}

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

//! Resolution of user-facing kind names to API resources

use crate::infrastructure::constants::{
    TERRAFORM_GROUP, TERRAFORM_PROVIDER_KIND, TERRAFORM_PROVIDER_PLURAL, TERRAFORM_VERSION,
};
use kube::api::{ApiResource, GroupVersionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub short_names: &'static [&'static str],
    pub namespaced: bool,
}

pub const KNOWN_KINDS: &[KnownKind] = &[
    KnownKind {
        group: "apps",
        version: "v1",
        kind: "Deployment",
        plural: "deployments",
        short_names: &["deploy"],
        namespaced: true,
    },
    KnownKind {
        group: "apps",
        version: "v1",
        kind: "StatefulSet",
        plural: "statefulsets",
        short_names: &["sts"],
        namespaced: true,
    },
    KnownKind {
        group: "apps",
        version: "v1",
        kind: "DaemonSet",
        plural: "daemonsets",
        short_names: &["ds"],
        namespaced: true,
    },
    KnownKind {
        group: "",
        version: "v1",
        kind: "Service",
        plural: "services",
        short_names: &["svc"],
        namespaced: true,
    },
    KnownKind {
        group: "",
        version: "v1",
        kind: "ConfigMap",
        plural: "configmaps",
        short_names: &["cm"],
        namespaced: true,
    },
    KnownKind {
        group: "",
        version: "v1",
        kind: "Secret",
        plural: "secrets",
        short_names: &[],
        namespaced: true,
    },
    KnownKind {
        group: "",
        version: "v1",
        kind: "PersistentVolumeClaim",
        plural: "persistentvolumeclaims",
        short_names: &["pvc"],
        namespaced: true,
    },
    KnownKind {
        group: "",
        version: "v1",
        kind: "ServiceAccount",
        plural: "serviceaccounts",
        short_names: &["sa"],
        namespaced: true,
    },
    KnownKind {
        group: "",
        version: "v1",
        kind: "Namespace",
        plural: "namespaces",
        short_names: &["ns"],
        namespaced: false,
    },
    KnownKind {
        group: "batch",
        version: "v1",
        kind: "Job",
        plural: "jobs",
        short_names: &[],
        namespaced: true,
    },
    KnownKind {
        group: "batch",
        version: "v1",
        kind: "CronJob",
        plural: "cronjobs",
        short_names: &["cj"],
        namespaced: true,
    },
    KnownKind {
        group: "networking.k8s.io",
        version: "v1",
        kind: "Ingress",
        plural: "ingresses",
        short_names: &["ing"],
        namespaced: true,
    },
    KnownKind {
        group: "rbac.authorization.k8s.io",
        version: "v1",
        kind: "Role",
        plural: "roles",
        short_names: &[],
        namespaced: true,
    },
    KnownKind {
        group: "rbac.authorization.k8s.io",
        version: "v1",
        kind: "RoleBinding",
        plural: "rolebindings",
        short_names: &[],
        namespaced: true,
    },
    KnownKind {
        group: "rbac.authorization.k8s.io",
        version: "v1",
        kind: "ClusterRole",
        plural: "clusterroles",
        short_names: &[],
        namespaced: false,
    },
    KnownKind {
        group: "rbac.authorization.k8s.io",
        version: "v1",
        kind: "ClusterRoleBinding",
        plural: "clusterrolebindings",
        short_names: &[],
        namespaced: false,
    },
    KnownKind {
        group: "autoscaling",
        version: "v2",
        kind: "HorizontalPodAutoscaler",
        plural: "horizontalpodautoscalers",
        short_names: &["hpa"],
        namespaced: true,
    },
];

impl KnownKind {
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.to_string(),
            version: self.version.to_string(),
            api_version: self.api_version(),
            kind: self.kind.to_string(),
            plural: self.plural.to_string(),
        }
    }

    fn matches(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.kind.to_ascii_lowercase() == name
            || self.plural == name
            || self.short_names.contains(&name.as_str())
    }
}

/// Look up a kind by its name, plural or short name (case-insensitive).
pub fn resolve_kind(name: &str) -> Option<&'static KnownKind> {
    KNOWN_KINDS.iter().find(|k| k.matches(name))
}

pub fn known_kind(kind: &str) -> Option<&'static KnownKind> {
    KNOWN_KINDS.iter().find(|k| k.kind == kind)
}

/// Build an `ApiResource` for an arbitrary `apiVersion`/`kind` pair, preferring
/// the built-in table and falling back to kube's plural guessing.
pub fn api_resource_for(api_version: &str, kind: &str) -> ApiResource {
    if let Some(known) = KNOWN_KINDS
        .iter()
        .find(|k| k.kind == kind && k.api_version() == api_version)
    {
        return known.api_resource();
    }

    let (group, version) = match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    };
    ApiResource::from_gvk(&GroupVersionKind::gvk(group, version, kind))
}

pub fn is_namespaced(api_version: &str, kind: &str) -> bool {
    KNOWN_KINDS
        .iter()
        .find(|k| k.kind == kind && k.api_version() == api_version)
        .map(|k| k.namespaced)
        .unwrap_or(true)
}

pub fn terraform_provider_resource() -> ApiResource {
    ApiResource {
        group: TERRAFORM_GROUP.to_string(),
        version: TERRAFORM_VERSION.to_string(),
        api_version: format!("{}/{}", TERRAFORM_GROUP, TERRAFORM_VERSION),
        kind: TERRAFORM_PROVIDER_KIND.to_string(),
        plural: TERRAFORM_PROVIDER_PLURAL.to_string(),
    }
}

pub fn component_definition_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(
        "core.oam.dev",
        "v1beta1",
        "ComponentDefinition",
    ))
}

pub fn secret_resource() -> ApiResource {
    known_resource("Secret")
}

pub fn configmap_resource() -> ApiResource {
    known_resource("ConfigMap")
}

fn known_resource(kind: &str) -> ApiResource {
    match known_kind(kind) {
        Some(known) => known.api_resource(),
        None => ApiResource::from_gvk(&GroupVersionKind::gvk("", "v1", kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_kind_aliases() {
        assert_eq!(resolve_kind("deployment").map(|k| k.kind), Some("Deployment"));
        assert_eq!(resolve_kind("deploy").map(|k| k.kind), Some("Deployment"));
        assert_eq!(resolve_kind("Services").map(|k| k.kind), Some("Service"));
        assert_eq!(resolve_kind("cm").map(|k| k.kind), Some("ConfigMap"));
        assert!(resolve_kind("unicorn").is_none());
    }

    #[test]
    fn test_api_resource_for_core_and_custom() {
        let svc = api_resource_for("v1", "Service");
        assert_eq!(svc.plural, "services");
        assert_eq!(svc.group, "");

        let custom = api_resource_for("example.com/v1alpha1", "Widget");
        assert_eq!(custom.group, "example.com");
        assert_eq!(custom.version, "v1alpha1");
        assert_eq!(custom.kind, "Widget");
    }

    #[test]
    fn test_component_definition_resource() {
        let cd = component_definition_resource();
        assert_eq!(cd.api_version, "core.oam.dev/v1beta1");
        assert_eq!(cd.plural, "componentdefinitions");
    }

    #[test]
    fn test_namespaced_lookup() {
        assert!(!is_namespaced("rbac.authorization.k8s.io/v1", "ClusterRole"));
        assert!(is_namespaced("apps/v1", "Deployment"));
        assert!(is_namespaced("example.com/v1", "Widget"));
    }
}

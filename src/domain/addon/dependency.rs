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

//! Addon dependency planning.
//!
//! Dependencies are declared as `depends-on-app` workflow steps inside the
//! rendered Application. The whole graph is walked and rendered before any
//! cluster mutation, so a cycle or a missing addon fails fast.

use super::addon::Addon;
use super::parameter::AddonArgs;
use super::repo::AddonRepo;
use crate::infrastructure::kubernetes::Application;
use crate::shared::error::VelaError;
use std::collections::HashSet;
use tracing::debug;

/// One addon ready to be installed.
#[derive(Debug, Clone)]
pub struct PlannedAddon {
    pub addon: Addon,
    pub application: Application,
    /// Canonical names of the addons this one depends on directly.
    pub dependencies: Vec<String>,
}

impl PlannedAddon {
    pub fn name(&self) -> &str {
        self.addon.name()
    }
}

/// Addons in install order: every dependency precedes its dependents and the
/// requested addon comes last. Each addon appears once.
#[derive(Debug, Clone, Default)]
pub struct InstallPlan {
    pub steps: Vec<PlannedAddon>,
}

impl InstallPlan {
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(PlannedAddon::name).collect()
    }
}

pub struct DependencyResolver<'a> {
    repo: &'a dyn AddonRepo,
}

#[derive(Default)]
struct Walk {
    on_stack: Vec<String>,
    visited: HashSet<String>,
    steps: Vec<PlannedAddon>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(repo: &'a dyn AddonRepo) -> Self {
        Self { repo }
    }

    /// Plan the installation of `root` with `args`. Dependencies receive the
    /// arguments their own schema declares.
    pub fn plan(&self, root: &str, args: &AddonArgs) -> Result<InstallPlan, VelaError> {
        let mut walk = Walk::default();
        let addon = self.repo.get_addon(root)?.with_args(args.clone());
        self.visit(addon, args, &mut walk)?;
        Ok(InstallPlan { steps: walk.steps })
    }

    fn visit(&self, addon: Addon, args: &AddonArgs, walk: &mut Walk) -> Result<String, VelaError> {
        let name = addon.name().to_string();
        if walk.visited.contains(&name) {
            return Ok(name);
        }
        if let Some(pos) = walk.on_stack.iter().position(|n| n == &name) {
            let mut cycle = walk.on_stack[pos..].to_vec();
            cycle.push(name);
            return Err(VelaError::DependencyCycle(cycle));
        }

        walk.on_stack.push(name.clone());
        let application = addon.render_application()?;

        let mut dependencies = Vec::new();
        for dep in application.depends_on_apps() {
            debug!("Addon {} depends on {}", name, dep);
            let dep_addon = self.repo.get_addon(&dep)?.with_inherited_args(args);
            let dep_name = self.visit(dep_addon, args, walk)?;
            if !dependencies.contains(&dep_name) {
                dependencies.push(dep_name);
            }
        }
        walk.on_stack.pop();

        walk.visited.insert(name.clone());
        walk.steps.push(PlannedAddon {
            addon,
            application,
            dependencies,
        });
        Ok(name)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::addon::parameter::parse_to_map;
    use crate::domain::addon::repo::ConfigMapAddonRepo;
    use crate::infrastructure::constants::{
        ADDON_NAME_ANNOTATION, ADDON_PARAMETERS_KEY, ADDON_TEMPLATE_KEY,
    };
    use k8s_openapi::api::core::v1::ConfigMap;
    use std::collections::BTreeMap;

    /// An addon whose Application depends on `deps` via workflow steps.
    pub(crate) fn addon_with_deps(name: &str, deps: &[&str]) -> Addon {
        let mut template = format!(
            "apiVersion: core.oam.dev/v1beta1\nkind: Application\nmetadata:\n  name: addon-[[ .Name ]]\n  namespace: vela-system\nspec:\n  components:\n    - name: {name}\n      type: raw\n"
        );
        if !deps.is_empty() {
            template.push_str("  workflow:\n    steps:\n");
            for dep in deps {
                template.push_str(&format!(
                    "      - name: dep-{dep}\n        type: depends-on-app\n        properties:\n          name: {dep}\n"
                ));
            }
        }
        Addon::new(name, "", template, "vela-system")
    }

    pub(crate) fn repo(addons: Vec<Addon>) -> ConfigMapAddonRepo {
        ConfigMapAddonRepo::from_addons(addons)
    }

    /// An addon echoing `image` and `extra`, optionally with a parameter schema.
    fn image_addon(name: &str, parameters: Option<&str>) -> Addon {
        let template = format!(
            "apiVersion: core.oam.dev/v1beta1\nkind: Application\nmetadata:\n  name: addon-{name}\nspec:\n  components:\n    - name: {name}\n      type: webservice\n      properties:\n        image: \"[[ .Args.image ]]\"\n        extra: \"[[ .Args.extra ]]\"\n"
        );
        let mut data = BTreeMap::from([(ADDON_TEMPLATE_KEY.to_string(), template)]);
        if let Some(p) = parameters {
            data.insert(ADDON_PARAMETERS_KEY.to_string(), p.to_string());
        }
        let mut cm = ConfigMap::default();
        cm.metadata.name = Some(name.to_string());
        cm.metadata.annotations = Some(BTreeMap::from([(
            ADDON_NAME_ANNOTATION.to_string(),
            name.to_string(),
        )]));
        cm.data = Some(data);
        Addon::from_configmap(&cm, "vela-system")
    }

    fn property(step: &PlannedAddon, key: &str) -> String {
        step.application.spec.components[0]
            .properties
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_diamond_orders_each_addon_once() {
        let repo = repo(vec![
            addon_with_deps("a", &["b", "c"]),
            addon_with_deps("b", &["d"]),
            addon_with_deps("c", &["d"]),
            addon_with_deps("d", &[]),
        ]);

        let plan = DependencyResolver::new(&repo).plan("a", &AddonArgs::new()).unwrap();
        assert_eq!(plan.names(), vec!["d", "b", "c", "a"]);
        assert_eq!(plan.steps[3].dependencies, vec!["b", "c"]);
    }

    #[test]
    fn test_dependencies_inherit_parent_args() {
        let repo = repo(vec![
            addon_with_deps("app", &["plain", "typed"]),
            image_addon("plain", None),
            image_addon("typed", Some("- name: image\n")),
        ]);
        let args = parse_to_map(&["image=x", "extra=y"]).unwrap();

        let plan = DependencyResolver::new(&repo).plan("app", &args).unwrap();
        assert_eq!(plan.names(), vec!["plain", "typed", "app"]);

        assert_eq!(property(&plan.steps[0], "image"), "x");
        assert_eq!(property(&plan.steps[0], "extra"), "y");

        // undeclared arguments are dropped instead of failing the schema check
        assert_eq!(property(&plan.steps[1], "image"), "x");
        assert_eq!(property(&plan.steps[1], "extra"), "");
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        let repo = repo(vec![
            addon_with_deps("a", &["b"]),
            addon_with_deps("b", &["c"]),
            addon_with_deps("c", &["a"]),
        ]);

        let err = DependencyResolver::new(&repo).plan("a", &AddonArgs::new()).unwrap_err();
        match err {
            VelaError::DependencyCycle(path) => assert_eq!(path, vec!["a", "b", "c", "a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let repo = repo(vec![addon_with_deps("a", &["a"])]);
        assert!(matches!(
            DependencyResolver::new(&repo).plan("a", &AddonArgs::new()),
            Err(VelaError::DependencyCycle(_))
        ));
    }

    #[test]
    fn test_missing_dependency() {
        let repo = repo(vec![addon_with_deps("a", &["ghost"])]);
        let err = DependencyResolver::new(&repo).plan("a", &AddonArgs::new()).unwrap_err();
        assert_eq!(err.to_string(), "addon: ghost not found");
    }

    #[test]
    fn test_dependency_named_by_translated_name() {
        let repo = repo(vec![
            addon_with_deps("a", &["kruise-rollout"]),
            addon_with_deps("kruise/rollout", &[]),
        ]);
        let plan = DependencyResolver::new(&repo).plan("a", &AddonArgs::new()).unwrap();
        assert_eq!(plan.names(), vec!["kruise/rollout", "a"]);
    }
}

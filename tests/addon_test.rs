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

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use vela_kube::domain::addon::{
        template, AddonParameters, DependencyResolver, ParameterSpec, ParameterType,
        ParameterValue,
    };
    use vela_kube::*;

    const PROVIDER_TEMPLATE: &str = r#"apiVersion: core.oam.dev/v1beta1
kind: Application
metadata:
  labels:
    addons.oam.dev/name: [[ .Name ]]
spec:
  components:
    - name: provider
      type: raw
      properties:
        region: [[ .Args.region | default "cn-hangzhou" ]]
[[- if .Args.verbose ]]
        logLevel: debug
[[- end ]]
"#;

    fn with_deps(name: &str, deps: &[&str]) -> Addon {
        let mut template = format!(
            "apiVersion: core.oam.dev/v1beta1\nkind: Application\nmetadata:\n  name: addon-{name}\n  namespace: vela-system\nspec:\n  components:\n    - name: {name}\n      type: raw\n"
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

    #[test]
    fn test_parse_to_map_rejects_bad_entries() {
        let args = parse_to_map(&["region=us-west-1", "zone= ", " =x"]).unwrap();
        assert_eq!(args.len(), 1);
        assert!(parse_to_map(&["region"]).is_err());
        assert!(parse_to_map(&["a=b=c"]).is_err());
    }

    #[test]
    fn test_rendered_addon_gets_translated_name_and_default_namespace() {
        let addon = Addon::new(
            "terraform/alibaba",
            "Alibaba cloud provider",
            PROVIDER_TEMPLATE,
            "vela-system",
        )
        .with_args(parse_to_map(&["region=us-west-1"]).unwrap());

        let app = addon.render_application().unwrap();
        assert_eq!(
            app.metadata.name.as_deref(),
            Some(trans_addon_name("terraform/alibaba").as_str())
        );
        assert_eq!(app.metadata.namespace.as_deref(), Some("vela-system"));

        let properties = app.spec.components[0].properties.clone().unwrap();
        assert_eq!(properties["region"], "us-west-1");
        assert!(properties.get("logLevel").is_none());
    }

    #[test]
    fn test_conditional_block() {
        let addon = Addon::new("terraform/alibaba", "", PROVIDER_TEMPLATE, "vela-system")
            .with_args(parse_to_map(&["verbose=true"]).unwrap());
        let properties = addon.render_application().unwrap().spec.components[0]
            .properties
            .clone()
            .unwrap();
        assert_eq!(properties["region"], "cn-hangzhou");
        assert_eq!(properties["logLevel"], "debug");
    }

    #[test]
    fn test_typed_parameters() {
        let parameters = AddonParameters::new(vec![
            ParameterSpec {
                name: "replicas".into(),
                param_type: ParameterType::Int,
                default: Some("1".into()),
                required: false,
                usage: None,
            },
            ParameterSpec {
                name: "token".into(),
                param_type: ParameterType::String,
                default: None,
                required: true,
                usage: Some("API token".into()),
            },
        ]);

        let resolved = parameters
            .resolve(&parse_to_map(&["token=abc"]).unwrap())
            .unwrap();
        assert_eq!(resolved.get("replicas"), Some(&ParameterValue::Int(1)));

        assert!(parameters.resolve(&BTreeMap::new()).is_err());
        assert!(parameters
            .resolve(&parse_to_map(&["token=abc", "replicas=many"]).unwrap())
            .is_err());
        assert!(parameters
            .resolve(&parse_to_map(&["token=abc", "color=red"]).unwrap())
            .is_err());
    }

    #[test]
    fn test_template_render() {
        let mut context = tera::Context::new();
        context.insert("Name", "demo");
        let out = template::render("name: [[ .Name | upper ]] {{ literal }}", &context).unwrap();
        assert_eq!(out, "name: DEMO {{ literal }}");

        assert!(matches!(
            template::render("[[ range .Args ]]x[[ end ]]", &context).unwrap_err(),
            VelaError::TemplateParse(_)
        ));
    }

    #[test]
    fn test_dependency_plan_orders_dependencies_first() {
        let repo = ConfigMapAddonRepo::from_addons(vec![
            with_deps("a", &["b", "c"]),
            with_deps("b", &["d"]),
            with_deps("c", &["d"]),
            with_deps("d", &[]),
        ]);
        let plan = DependencyResolver::new(&repo).plan("a", &BTreeMap::new()).unwrap();
        assert_eq!(plan.names(), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_dependency_cycle_reports_path() {
        let repo = ConfigMapAddonRepo::from_addons(vec![
            with_deps("a", &["b"]),
            with_deps("b", &["a"]),
        ]);
        let err = DependencyResolver::new(&repo).plan("a", &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_missing_addon_is_typed() {
        let repo = ConfigMapAddonRepo::from_addons(vec![]);
        assert!(matches!(
            repo.get_addon("nope").unwrap_err(),
            VelaError::AddonNotFound(_)
        ));
    }
}

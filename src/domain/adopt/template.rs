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

use super::reference::AdoptedResource;
use crate::infrastructure::constants::{ADOPT_COMPONENT_TYPE, LABEL_ADOPT};
use crate::infrastructure::kubernetes::Application;
use crate::shared::error::VelaError;
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "adopt";

/// Builds one `ref-objects` component over every adopted object and a policy
/// that keeps the controller from mutating (`read-only`) or lets it manage
/// (`take-over`) them.
pub const DEFAULT_ADOPT_TEMPLATE: &str = r#"apiVersion: core.oam.dev/v1beta1
kind: Application
metadata:
  name: {{ appName }}
  namespace: {{ appNamespace }}
  labels:
    {{ adoptLabel }}: {{ adoptType }}
spec:
  components:
    - name: {{ componentName }}
      type: {{ componentType }}
      properties:
        objects:
{%- for r in resources %}
          - apiVersion: {{ r.apiVersion }}
            kind: {{ r.kind }}
            name: {{ r.name }}
{%- if r.namespace %}
            namespace: {{ r.namespace }}
{%- endif %}
{%- endfor %}
  policies:
    - name: {{ mode }}
      type: {{ mode }}
      properties:
        rules:
          - selector:
              componentNames:
                - {{ componentName }}
"#;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptContext<'a> {
    pub app_name: &'a str,
    pub app_namespace: &'a str,
    pub adopt_type: &'a str,
    pub mode: &'a str,
    pub component_name: String,
    pub resources: &'a [AdoptedResource],
}

impl<'a> AdoptContext<'a> {
    pub fn new(
        app_name: &'a str,
        app_namespace: &'a str,
        adopt_type: &'a str,
        mode: &'a str,
        resources: &'a [AdoptedResource],
    ) -> Self {
        Self {
            app_name,
            app_namespace,
            adopt_type,
            mode,
            component_name: format!("{}.{}.resources", app_name, adopt_type),
            resources,
        }
    }
}

pub fn render_adoption(template: &str, ctx: &AdoptContext<'_>) -> Result<Application, VelaError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_template(TEMPLATE_NAME, template)
        .map_err(|e| VelaError::TemplateParse(e.to_string()))?;

    let mut context =
        Context::from_serialize(ctx).map_err(|e| VelaError::TemplateRender(e.to_string()))?;
    context.insert("adoptLabel", LABEL_ADOPT);
    context.insert("componentType", ADOPT_COMPONENT_TYPE);

    let rendered = tera
        .render(TEMPLATE_NAME, &context)
        .map_err(|e| VelaError::TemplateRender(render_error(&e)))?;

    let value: serde_json::Value =
        serde_yaml::from_str(&rendered).map_err(|e| VelaError::TemplateDecode(e.to_string()))?;
    if value.get("kind").and_then(|k| k.as_str()) != Some("Application") {
        return Err(VelaError::TemplateDecode(
            "adoption template must produce an Application".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| VelaError::TemplateDecode(e.to_string()))
}

fn render_error(err: &tera::Error) -> String {
    match std::error::Error::source(err) {
        Some(cause) => format!("{}: {}", err, cause),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resources() -> Vec<AdoptedResource> {
        vec![
            AdoptedResource::from_value(json!({
                "apiVersion": "apps/v1", "kind": "Deployment",
                "metadata": {"name": "web", "namespace": "prod"}
            }))
            .unwrap(),
            AdoptedResource::from_value(json!({
                "apiVersion": "rbac.authorization.k8s.io/v1", "kind": "ClusterRole",
                "metadata": {"name": "web-reader"}
            }))
            .unwrap(),
        ]
    }

    #[test]
    fn test_default_template() {
        let resources = resources();
        let ctx = AdoptContext::new("web", "prod", "native", "read-only", &resources);
        let app = render_adoption(DEFAULT_ADOPT_TEMPLATE, &ctx).unwrap();

        assert_eq!(app.metadata.name.as_deref(), Some("web"));
        assert_eq!(app.metadata.namespace.as_deref(), Some("prod"));
        assert_eq!(
            app.metadata.labels.as_ref().and_then(|l| l.get(LABEL_ADOPT)).map(String::as_str),
            Some("native")
        );

        let component = &app.spec.components[0];
        assert_eq!(component.name, "web.native.resources");
        assert_eq!(component.component_type, "ref-objects");
        let objects = component.properties.as_ref().unwrap()["objects"].as_array().unwrap().clone();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0]["namespace"], "prod");
        assert!(objects[1].get("namespace").is_none());

        let policy = &app.spec.policies[0];
        assert_eq!(policy.policy_type, "read-only");
        assert_eq!(
            policy.properties.as_ref().unwrap()["rules"][0]["selector"]["componentNames"][0],
            "web.native.resources"
        );
    }

    #[test]
    fn test_custom_template_must_produce_application() {
        let resources = resources();
        let ctx = AdoptContext::new("web", "prod", "helm", "take-over", &resources);
        let err = render_adoption("apiVersion: v1\nkind: ConfigMap\n", &ctx).unwrap_err();
        assert!(matches!(err, VelaError::TemplateDecode(_)));

        let err = render_adoption("{{ missing }}", &ctx).unwrap_err();
        assert!(matches!(err, VelaError::TemplateRender(_)));
    }
}

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

//! KubeVela `Application` custom resource (core.oam.dev/v1beta1)

use crate::infrastructure::constants::{STEP_PROPERTY_NAME, STEP_TYPE_DEPENDS_ON_APP};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(CustomResource, Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
#[kube(
    group = "core.oam.dev",
    version = "v1beta1",
    kind = "Application",
    namespaced,
    status = "ApplicationStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    #[serde(default)]
    pub components: Vec<ApplicationComponent>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<AppPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Workflow>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationComponent {
    pub name: String,

    #[serde(rename = "type")]
    pub component_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
pub struct AppPolicy {
    pub name: String,

    #[serde(rename = "type")]
    pub policy_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
pub struct Workflow {
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub name: String,

    #[serde(rename = "type")]
    pub step_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// The controller reports the phase under `status.status`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema, PartialEq)]
pub struct ApplicationStatus {
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationPhase {
    Starting,
    Rendering,
    PolicyGenerating,
    RunningWorkflow,
    WorkflowSuspending,
    WorkflowTerminated,
    WorkflowFailed,
    Running,
    Unhealthy,
    Deleting,
    Other(String),
}

impl ApplicationPhase {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "starting" => Self::Starting,
            "rendering" => Self::Rendering,
            "generatingPolicy" => Self::PolicyGenerating,
            "runningWorkflow" => Self::RunningWorkflow,
            "workflowSuspending" => Self::WorkflowSuspending,
            "workflowTerminated" => Self::WorkflowTerminated,
            "workflowFailed" => Self::WorkflowFailed,
            "running" => Self::Running,
            "unhealthy" => Self::Unhealthy,
            "deleting" => Self::Deleting,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Starting => "starting",
            Self::Rendering => "rendering",
            Self::PolicyGenerating => "generatingPolicy",
            Self::RunningWorkflow => "runningWorkflow",
            Self::WorkflowSuspending => "workflowSuspending",
            Self::WorkflowTerminated => "workflowTerminated",
            Self::WorkflowFailed => "workflowFailed",
            Self::Running => "running",
            Self::Unhealthy => "unhealthy",
            Self::Deleting => "deleting",
            Self::Other(raw) => raw,
        }
    }

    /// Phases the controller never leaves without a spec change.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::WorkflowFailed | Self::WorkflowTerminated)
    }
}

impl fmt::Display for ApplicationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Application {
    pub fn phase(&self) -> Option<ApplicationPhase> {
        self.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .filter(|p| !p.is_empty())
            .map(ApplicationPhase::parse)
    }

    /// Addon names referenced by `depends-on-app` workflow steps, in step order.
    pub fn depends_on_apps(&self) -> Vec<String> {
        let Some(workflow) = &self.spec.workflow else {
            return Vec::new();
        };

        workflow
            .steps
            .iter()
            .filter(|step| step.step_type == STEP_TYPE_DEPENDS_ON_APP)
            .filter_map(|step| {
                step.properties
                    .as_ref()
                    .and_then(|p| p.get(STEP_PROPERTY_NAME))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect()
    }
}

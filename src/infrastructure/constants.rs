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

/// Environment variables
pub const ENV_VELA_HOME: &str = "VELA_HOME";
pub const ENV_HELM_DRIVER: &str = "HELM_DRIVER";

/// Local state under VELA_HOME
pub const VELA_HOME_DIR: &str = ".vela";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const REGISTRY_FILE_NAME: &str = "registries.yaml";

/// Defaults
pub const DEFAULT_VELA_NAMESPACE: &str = "vela-system";
pub const DEFAULT_FIELD_MANAGER: &str = "vela-cli";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 600;

/// Retry settings for transient API failures
pub const RETRY_MAX_TIMES: usize = 3;
pub const RETRY_MIN_DELAY_MILLIS: u64 = 200;

/// Addon ConfigMap markers
pub const ADDON_MARK_LABEL: &str = "addons.oam.dev/type";
pub const ADDON_NAME_ANNOTATION: &str = "addons.oam.dev/name";
pub const ADDON_DESC_ANNOTATION: &str = "addons.oam.dev/description";
pub const ADDON_TEMPLATE_KEY: &str = "application";
pub const ADDON_PARAMETERS_KEY: &str = "parameters";

/// Addon status values
pub const STATUS_INSTALLED: &str = "installed";
pub const STATUS_UNINSTALLED: &str = "uninstalled";
pub const STATUS_UNKNOWN: &str = "unknown";

/// Template delimiters
pub const TEMPLATE_LEFT_DELIM: &str = "[[";
pub const TEMPLATE_RIGHT_DELIM: &str = "]]";

/// Workflow step type encoding an addon dependency edge
pub const STEP_TYPE_DEPENDS_ON_APP: &str = "depends-on-app";
pub const STEP_PROPERTY_NAME: &str = "name";

/// Application labels
pub const LABEL_APP_NAME: &str = "app.oam.dev/name";
pub const LABEL_ADOPT: &str = "app.oam.dev/adopt";

/// Adoption
pub const ADOPT_COMPONENT_TYPE: &str = "ref-objects";
pub const LOCAL_CLUSTER: &str = "local";

/// Helm release storage
pub const HELM_OWNER_LABEL: &str = "owner";
pub const HELM_OWNER_VALUE: &str = "helm";
pub const HELM_NAME_LABEL: &str = "name";
pub const HELM_VERSION_LABEL: &str = "version";
pub const HELM_RELEASE_KEY: &str = "release";
pub const HELM_DRIVER_SECRET: &str = "secret";
pub const HELM_DRIVER_CONFIGMAP: &str = "configmap";

/// Terraform controller providers
pub const TERRAFORM_GROUP: &str = "terraform.core.oam.dev";
pub const TERRAFORM_VERSION: &str = "v1beta1";
pub const TERRAFORM_PROVIDER_KIND: &str = "Provider";
pub const TERRAFORM_PROVIDER_PLURAL: &str = "providers";
pub const TERRAFORM_PROVIDER_APP_PREFIX: &str = "config-terraform-provider-";
/// Marks the ComponentDefinitions that act as provider types
pub const TERRAFORM_PROVIDER_TYPE_LABEL: &str = "custom.definition.oam.dev/type.config.oam.dev";
pub const TERRAFORM_PROVIDER_TYPE_VALUE: &str = "terraform-provider";

/// Built-in addon registry
pub const DEFAULT_REGISTRY_NAME: &str = "KubeVela";
pub const DEFAULT_REGISTRY_URL: &str = "https://addons.kubevela.net";

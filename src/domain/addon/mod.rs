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

//! Addons: templated KubeVela Applications stored in marked ConfigMaps,
//! installed together with the addons they depend on.

#[allow(clippy::module_inception)]
pub mod addon;
pub mod dependency;
pub mod installer;
pub mod parameter;
pub mod repo;
pub mod template;

pub use addon::{trans_addon_name, Addon, AddonStatus};
pub use dependency::{DependencyResolver, InstallPlan, PlannedAddon};
pub use installer::{enable_addon, AddonInstaller, InstallReport};
pub use parameter::{
    parse_to_map, AddonArgs, AddonParameters, ParameterSpec, ParameterType, ParameterValue,
};
pub use repo::{AddonRepo, ConfigMapAddonRepo};

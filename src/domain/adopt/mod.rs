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

//! Adopting resources that already run in the cluster into KubeVela
//! Applications, from native references or a Helm release.

pub mod helm;
pub mod options;
pub mod peers;
pub mod reference;
pub mod template;

pub use helm::{decode_release, HelmDriver, HelmRelease, HelmStorage};
pub use options::{to_yaml, AdoptMode, AdoptOptions, AdoptType};
pub use peers::{discover_groups, pod_references, ResourceGroup};
pub use reference::{AdoptedResource, ResourceRef};
pub use template::{render_adoption, AdoptContext, DEFAULT_ADOPT_TEMPLATE};

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

use super::helm::{HelmDriver, HelmStorage};
use super::peers::{discover_groups, ResourceGroup};
use super::reference::{AdoptedResource, ResourceRef};
use super::template::{render_adoption, AdoptContext, DEFAULT_ADOPT_TEMPLATE};
use crate::domain::wait::{wait_application_running, PollOutcome, PollSettings};
use crate::infrastructure::kubernetes::{Application, VelaKubeClient};
use crate::shared::error::VelaError;
use colored::Colorize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdoptType {
    #[default]
    Native,
    Helm,
}

impl AdoptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Helm => "helm",
        }
    }
}

impl FromStr for AdoptType {
    type Err = VelaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Self::Native),
            "helm" => Ok(Self::Helm),
            other => Err(VelaError::validation(format!(
                "invalid adopt type {}, expected native or helm",
                other
            ))),
        }
    }
}

impl fmt::Display for AdoptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdoptMode {
    #[default]
    ReadOnly,
    TakeOver,
}

impl AdoptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "read-only",
            Self::TakeOver => "take-over",
        }
    }
}

impl FromStr for AdoptMode {
    type Err = VelaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read-only" => Ok(Self::ReadOnly),
            "take-over" => Ok(Self::TakeOver),
            other => Err(VelaError::validation(format!(
                "invalid adopt mode {}, expected read-only or take-over",
                other
            ))),
        }
    }
}

impl fmt::Display for AdoptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adoption of existing resources into Applications.
///
/// The phases run in order: [`init`](Self::init) loads the template,
/// [`validate`](Self::validate) checks flags without touching the cluster,
/// [`complete`](Self::complete) fetches the objects, and
/// [`run`](Self::run) prints or applies the rendered Applications.
#[derive(Debug, Clone, Default)]
pub struct AdoptOptions {
    pub adopt_type: AdoptType,
    pub mode: AdoptMode,
    pub app_name: Option<String>,
    pub namespace: String,
    pub resource_args: Vec<String>,
    pub helm_driver: Option<String>,
    pub apply: bool,
    pub recycle: bool,
    pub all: bool,
    pub wait: bool,
    pub template_path: Option<PathBuf>,

    template: String,
    refs: Vec<ResourceRef>,
    groups: Vec<ResourceGroup>,
    helm_storage: Option<(HelmDriver, Vec<String>)>,
}

impl AdoptOptions {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn init(&mut self) -> Result<(), VelaError> {
        self.template = match &self.template_path {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                VelaError::config_error(format!(
                    "failed to read adopt template {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => DEFAULT_ADOPT_TEMPLATE.to_string(),
        };
        Ok(())
    }

    pub fn validate(&mut self) -> Result<(), VelaError> {
        if self.recycle && !self.apply {
            return Err(VelaError::validation("--recycle requires --apply"));
        }
        if self.wait && !self.apply {
            return Err(VelaError::validation("--wait requires --apply"));
        }
        if matches!(&self.app_name, Some(name) if name.trim().is_empty()) {
            return Err(VelaError::validation("--app-name can not be empty"));
        }

        match self.adopt_type {
            AdoptType::Helm => {
                if self.all {
                    return Err(VelaError::validation(
                        "--all is only supported for native resources",
                    ));
                }
                let release = match self.resource_args.as_slice() {
                    [release] if !release.trim().is_empty() => release.trim().to_string(),
                    _ => {
                        return Err(VelaError::validation(
                            "helm adoption requires exactly one release name",
                        ))
                    }
                };
                if self.app_name.is_none() {
                    self.app_name = Some(release);
                }
            }
            AdoptType::Native if self.all => {
                if !self.resource_args.is_empty() {
                    return Err(VelaError::validation(
                        "--all can not be combined with explicit resources",
                    ));
                }
                if self.app_name.is_some() {
                    return Err(VelaError::validation(
                        "--app-name can not be used with --all, every workload becomes its own application",
                    ));
                }
            }
            AdoptType::Native => {
                if self.resource_args.is_empty() {
                    return Err(VelaError::validation(
                        "at least one resource is required for native adoption",
                    ));
                }
                self.refs = self
                    .resource_args
                    .iter()
                    .map(|raw| ResourceRef::parse(raw, &self.namespace))
                    .collect::<Result<_, _>>()?;

                if self.app_name.is_none() {
                    let names: BTreeSet<&str> = self.refs.iter().map(|r| r.name.as_str()).collect();
                    if names.len() > 1 {
                        let names: Vec<&str> = names.into_iter().collect();
                        return Err(VelaError::validation(format!(
                            "resources have different names ({}), please specify --app-name",
                            names.join(", ")
                        )));
                    }
                    self.app_name = names.into_iter().next().map(str::to_string);
                }
            }
        }
        Ok(())
    }

    /// Resolve references into concrete objects.
    pub async fn complete(&mut self, client: &dyn VelaKubeClient) -> Result<(), VelaError> {
        let app_name = self.app_name.clone().unwrap_or_default();

        self.groups = match self.adopt_type {
            AdoptType::Native if self.all => discover_groups(client, &self.namespace).await?,
            AdoptType::Native => {
                let mut resources = Vec::with_capacity(self.refs.len());
                for r in &self.refs {
                    let resource = r.api_resource();
                    let object = client
                        .get_object(&resource, r.namespace.as_deref(), &r.name)
                        .await?
                        .ok_or_else(|| {
                            VelaError::not_found(
                                r.kind.kind,
                                &r.name,
                                r.namespace.as_deref().unwrap_or_default(),
                            )
                        })?;
                    resources.push(AdoptedResource::from_dynamic(&resource, &object)?);
                }
                vec![ResourceGroup { app_name, resources }]
            }
            AdoptType::Helm => {
                let release = self.resource_args.first().map(|r| r.trim()).unwrap_or_default();
                let driver = HelmDriver::resolve(self.helm_driver.as_deref())?;
                let stored = HelmStorage::new(client, driver)
                    .latest(&self.namespace, release)
                    .await?;
                debug!(
                    "Release {} revision {} has {} storage records",
                    release,
                    stored.release.version,
                    stored.records.len()
                );
                let resources = stored.release.resources()?;
                self.helm_storage = Some((driver, stored.records));
                vec![ResourceGroup { app_name, resources }]
            }
        };
        Ok(())
    }

    pub fn groups(&self) -> &[ResourceGroup] {
        &self.groups
    }

    pub fn render(&self) -> Result<Vec<Application>, VelaError> {
        let template = if self.template.is_empty() {
            DEFAULT_ADOPT_TEMPLATE
        } else {
            self.template.as_str()
        };

        self.groups
            .iter()
            .map(|group| {
                let ctx = AdoptContext::new(
                    &group.app_name,
                    &self.namespace,
                    self.adopt_type.as_str(),
                    self.mode.as_str(),
                    &group.resources,
                );
                render_adoption(template, &ctx)
            })
            .collect()
    }

    /// Print the Applications, or apply them and optionally wait and
    /// recycle the Helm release storage.
    pub async fn run(
        &self,
        client: &dyn VelaKubeClient,
        settings: PollSettings,
        cancel: &CancellationToken,
    ) -> Result<(), VelaError> {
        let applications = self.render()?;
        if applications.is_empty() {
            println!("No resources found to adopt in namespace {}", self.namespace);
            return Ok(());
        }

        if !self.apply {
            print!("{}", to_yaml(&applications)?);
            return Ok(());
        }

        for application in &applications {
            let namespace = application.metadata.namespace.as_deref().unwrap_or(&self.namespace);
            let name = application.metadata.name.as_deref().unwrap_or_default();

            client.ensure_namespace(namespace).await?;
            client.apply_application(application).await?;
            println!("{} Application {}/{} applied", "✓".green(), namespace, name);

            if self.wait || self.recycle {
                match wait_application_running(client, namespace, name, settings, cancel).await {
                    PollOutcome::Succeeded => {
                        println!("{} Application {} is running", "✓".green(), name)
                    }
                    PollOutcome::Vanished => {
                        warn!("Application {}/{} disappeared while waiting", namespace, name)
                    }
                    PollOutcome::TimedOut { last_detail } => {
                        return Err(VelaError::Timeout(format!(
                            "application {} not running after {:?}: {}",
                            name,
                            settings.timeout,
                            last_detail.unwrap_or_default()
                        )))
                    }
                    PollOutcome::Failed(reason) => return Err(VelaError::KubeError(reason)),
                    PollOutcome::Cancelled => return Err(VelaError::Cancelled),
                }
            }
        }

        if self.recycle {
            if let Some((driver, records)) = &self.helm_storage {
                HelmStorage::new(client, *driver)
                    .delete_records(&self.namespace, records)
                    .await?;
                println!(
                    "{} Recycled {} helm storage record(s) for release {}",
                    "✓".green(),
                    records.len(),
                    self.resource_args.first().map(String::as_str).unwrap_or_default()
                );
            }
        }
        Ok(())
    }
}

/// Multi-document YAML, one document per Application.
pub fn to_yaml(applications: &[Application]) -> Result<String, VelaError> {
    let docs = applications
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs.join("---\n"))
}

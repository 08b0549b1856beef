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

use super::addon::{application_status, Addon, AddonStatus};
use super::dependency::{DependencyResolver, PlannedAddon};
use super::parameter::AddonArgs;
use super::repo::{AddonRepo, ConfigMapAddonRepo};
use crate::domain::wait::{
    wait_application_deleted, wait_application_running, PollOutcome, PollSettings,
};
use crate::infrastructure::kubernetes::VelaKubeClient;
use crate::shared::error::VelaError;
use colored::Colorize;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Per-addon result of an enable run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub already_installed: Vec<String>,
    /// Addon name and the reason it failed.
    pub failed: Vec<(String, String)>,
    /// Addons skipped because a dependency failed.
    pub blocked: Vec<String>,
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.blocked.is_empty()
    }
}

pub struct AddonInstaller<'a> {
    client: &'a dyn VelaKubeClient,
    repo: &'a dyn AddonRepo,
    settings: PollSettings,
    cancel: CancellationToken,
}

impl<'a> AddonInstaller<'a> {
    pub fn new(
        client: &'a dyn VelaKubeClient,
        repo: &'a dyn AddonRepo,
        settings: PollSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            repo,
            settings,
            cancel,
        }
    }

    /// Install `name` and everything it depends on. Planning errors (missing
    /// addon, cycle, bad template) abort before the cluster is touched;
    /// per-addon failures are collected in the report. Installed dependencies
    /// are left alone, the requested addon itself is always applied.
    pub async fn enable(&self, name: &str, args: &AddonArgs) -> Result<InstallReport, VelaError> {
        let plan = DependencyResolver::new(self.repo).plan(name, args)?;
        info!("Install plan for {}: {:?}", name, plan.names());

        let mut report = InstallReport::default();
        let mut unavailable: HashSet<String> = HashSet::new();

        for (index, step) in plan.steps.iter().enumerate() {
            let is_root = index + 1 == plan.steps.len();
            let addon_name = step.name().to_string();

            if let Some(dep) = step.dependencies.iter().find(|d| unavailable.contains(*d)) {
                warn!("Skipping addon {}: dependency {} is not available", addon_name, dep);
                report.blocked.push(addon_name.clone());
                unavailable.insert(addon_name);
                continue;
            }

            if self.cancel.is_cancelled() {
                return Err(VelaError::Cancelled);
            }

            match self.install_one(step, is_root).await {
                Ok(true) => report.installed.push(addon_name),
                Ok(false) => report.already_installed.push(addon_name),
                Err(VelaError::Cancelled) => return Err(VelaError::Cancelled),
                Err(e) => {
                    println!("  {} addon {} failed: {}", "✗".red(), addon_name, e);
                    report.failed.push((addon_name.clone(), e.to_string()));
                    unavailable.insert(addon_name);
                }
            }
        }

        Ok(report)
    }

    /// Returns `false` when a dependency was already installed.
    async fn install_one(&self, step: &PlannedAddon, is_root: bool) -> Result<bool, VelaError> {
        let application = &step.application;
        let namespace = application.metadata.namespace.as_deref().unwrap_or_default();
        let app_name = application.metadata.name.as_deref().unwrap_or_default();

        let installed =
            application_status(self.client, application).await? == AddonStatus::Installed;
        if installed && !is_root {
            println!("  {} addon {} is already installed", "✓".green(), step.name());
            return Ok(false);
        }

        if self.client.ensure_namespace(namespace).await? {
            println!("  {} Created namespace: {}", "✓".green(), namespace);
        }

        let verb = if installed { "Updating" } else { "Installing" };
        println!("  {} addon {}...", verb, step.name().bold());
        self.client.apply_application(application).await?;

        let outcome =
            wait_application_running(self.client, namespace, app_name, self.settings, &self.cancel)
                .await;
        match outcome {
            PollOutcome::Succeeded => {
                println!("  {} addon {} is running", "✓".green(), step.name());
                Ok(true)
            }
            PollOutcome::Vanished => {
                warn!("Application {}/{} disappeared while waiting", namespace, app_name);
                println!(
                    "  {} application {} is no longer visible, assuming addon {} installed",
                    "⚠".yellow(),
                    app_name,
                    step.name()
                );
                Ok(true)
            }
            PollOutcome::TimedOut { last_detail } => Err(VelaError::Timeout(format!(
                "addon {} not running after {:?}{}",
                step.name(),
                self.settings.timeout,
                last_detail.map(|d| format!(" (last seen: {})", d)).unwrap_or_default()
            ))),
            PollOutcome::Failed(reason) => Err(VelaError::KubeError(format!(
                "addon {} failed: {}",
                step.name(),
                reason
            ))),
            PollOutcome::Cancelled => Err(VelaError::Cancelled),
        }
    }

    /// Delete the addon's Application. Returns `false` when it was not
    /// installed. Dependencies are left in place.
    pub async fn disable(&self, name: &str, wait: bool) -> Result<bool, VelaError> {
        let addon = self.repo.get_addon(name)?;
        let application = addon.render_application()?;
        let namespace = application.metadata.namespace.as_deref().unwrap_or_default();
        let app_name = application.metadata.name.as_deref().unwrap_or_default();

        if application_status(self.client, &application).await? == AddonStatus::Uninstalled {
            return Ok(false);
        }

        self.client.delete_application(namespace, app_name).await?;
        if !wait {
            return Ok(true);
        }

        let outcome =
            wait_application_deleted(self.client, namespace, app_name, self.settings, &self.cancel)
                .await;
        match outcome {
            PollOutcome::Succeeded | PollOutcome::Vanished => Ok(true),
            PollOutcome::Cancelled => Err(VelaError::Cancelled),
            PollOutcome::TimedOut { .. } => Err(VelaError::Timeout(format!(
                "addon {} still present after {:?}",
                addon.name(),
                self.settings.timeout
            ))),
            PollOutcome::Failed(reason) => Err(VelaError::KubeError(reason)),
        }
    }

    pub async fn status(&self, name: &str) -> Result<(Addon, AddonStatus), VelaError> {
        let addon = self.repo.get_addon(name)?;
        let status = addon.status(self.client).await?;
        Ok((addon, status))
    }
}

/// Load the addon catalog from the cluster and enable `name`.
pub async fn enable_addon(
    client: &dyn VelaKubeClient,
    name: &str,
    args: &AddonArgs,
    default_namespace: &str,
    settings: PollSettings,
    cancel: CancellationToken,
) -> Result<InstallReport, VelaError> {
    let repo =
        ConfigMapAddonRepo::load(client, Some(default_namespace), default_namespace).await?;
    AddonInstaller::new(client, &repo, settings, cancel).enable(name, args).await
}

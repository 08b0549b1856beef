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

//! `vela addon` commands

use super::context::CommandContext;
use super::display::colors::table_color_to_colored_str;
use super::display::{AddonRow, ColorTheme, StatusIcon, TableRenderer};
use crate::domain::addon::addon::application_status;
use crate::domain::addon::{
    parse_to_map, AddonInstaller, AddonRepo, AddonStatus, ConfigMapAddonRepo,
};
use crate::infrastructure::kubernetes::VelaKubeClientImpl;
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures::future::join_all;
use tracing::debug;

#[derive(Parser, Debug)]
pub struct AddonCommand {
    #[command(subcommand)]
    pub action: AddonAction,
}

#[derive(Subcommand, Debug)]
pub enum AddonAction {
    /// List addons and whether they are installed
    #[command(alias = "ls")]
    List(AddonListCommand),

    /// Enable an addon and everything it depends on
    Enable(AddonEnableCommand),

    /// Disable an addon, its dependencies stay installed
    Disable(AddonDisableCommand),

    /// Show the status of an addon
    Status(AddonStatusCommand),
}

#[derive(Parser, Debug)]
pub struct AddonListCommand {}

#[derive(Parser, Debug)]
pub struct AddonEnableCommand {
    /// Addon name, `provider/name` forms are accepted
    pub name: String,

    /// Addon parameters as key=value
    #[arg(value_name = "KEY=VALUE")]
    pub args: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct AddonDisableCommand {
    pub name: String,

    /// Wait until the addon application is deleted
    #[arg(long)]
    pub wait: bool,
}

#[derive(Parser, Debug)]
pub struct AddonStatusCommand {
    pub name: String,
}

impl AddonCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        match &self.action {
            AddonAction::List(cmd) => cmd.execute(ctx).await,
            AddonAction::Enable(cmd) => cmd.execute(ctx).await,
            AddonAction::Disable(cmd) => cmd.execute(ctx).await,
            AddonAction::Status(cmd) => cmd.execute(ctx).await,
        }
    }
}

async fn load_repo(
    client: &VelaKubeClientImpl,
    ctx: &CommandContext,
) -> anyhow::Result<ConfigMapAddonRepo> {
    ConfigMapAddonRepo::load(client, Some(&ctx.namespace), &ctx.namespace)
        .await
        .context("Failed to load addons")
}

impl AddonListCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let client = ctx.client().await?;
        let repo = load_repo(&client, ctx).await?;

        let addons = repo.list_addons();
        let statuses = join_all(addons.iter().map(|addon| {
            let client = &client;
            async move {
                match addon.render_application() {
                    Ok(application) => application_status(client, &application)
                        .await
                        .with_context(|| format!("Failed to get status of addon {}", addon.name())),
                    Err(e) => {
                        debug!("Addon {} does not render: {}", addon.name(), e);
                        Ok(AddonStatus::Unknown)
                    }
                }
            }
        }))
        .await;

        let mut rows = Vec::with_capacity(addons.len());
        for (addon, status) in addons.iter().zip(statuses) {
            rows.push(AddonRow {
                name: addon.name().to_string(),
                description: addon.description().to_string(),
                status: status?,
            });
        }

        println!("{}", TableRenderer::new().render_addons(&rows));
        Ok(())
    }
}

impl AddonEnableCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let args = parse_to_map(&self.args)?;
        let client = ctx.client().await?;
        let repo = load_repo(&client, ctx).await?;

        let installer =
            AddonInstaller::new(&client, &repo, ctx.poll_settings(), ctx.cancel.clone());
        let report = installer
            .enable(&self.name, &args)
            .await
            .with_context(|| format!("Failed to enable addon {}", self.name))?;

        println!("{}", TableRenderer::new().render_install_report(&self.name, &report));

        if !report.is_success() {
            return Err(anyhow!(
                "addon {} was not enabled: {} failed, {} blocked",
                self.name,
                report.failed.len(),
                report.blocked.len()
            ));
        }
        println!("{} Addon {} enabled successfully", StatusIcon::SUCCESS.green(), self.name.bold());
        Ok(())
    }
}

impl AddonDisableCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let client = ctx.client().await?;
        let repo = load_repo(&client, ctx).await?;

        let installer =
            AddonInstaller::new(&client, &repo, ctx.poll_settings(), ctx.cancel.clone());
        let deleted = installer
            .disable(&self.name, self.wait)
            .await
            .with_context(|| format!("Failed to disable addon {}", self.name))?;

        if deleted {
            println!("{} Addon {} disabled", StatusIcon::SUCCESS.green(), self.name.bold());
        } else {
            println!("Addon {} is not installed", self.name);
        }
        Ok(())
    }
}

impl AddonStatusCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let client = ctx.client().await?;
        let repo = load_repo(&client, ctx).await?;

        let installer =
            AddonInstaller::new(&client, &repo, ctx.poll_settings(), ctx.cancel.clone());
        let (addon, status) = installer
            .status(&self.name)
            .await
            .with_context(|| format!("Failed to get status of addon {}", self.name))?;

        let color = table_color_to_colored_str(ColorTheme::default().addon_status_color(status));
        println!(
            "addon {} status is {}",
            addon.name().bold(),
            format!("{} {}", StatusIcon::addon_icon(status), status).color(color)
        );
        if !addon.parameters().is_empty() {
            println!("{}", TableRenderer::new().render_parameters(addon.parameters()));
        }
        Ok(())
    }
}

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

//! `vela adopt` command

use super::context::CommandContext;
use crate::domain::adopt::{AdoptMode, AdoptOptions, AdoptType};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug, Clone)]
#[command(after_help = "Examples:
  vela adopt deployment/my-app configmap/my-app
  vela adopt deployment/my-app service/my-app --app-name shop --apply
  vela adopt my-chart -n default --type helm --mode take-over --apply --recycle
  vela adopt --all --apply")]
pub struct AdoptCommand {
    /// Resources to adopt: kind/name, kind/namespace/name or kind/cluster/namespace/name.
    /// For helm adoption, the release name
    pub resources: Vec<String>,

    /// Adoption type
    #[arg(long = "type", short = 't', default_value = "native", value_parser = ["native", "helm"])]
    pub adopt_type: String,

    /// Policy applied to the adopted resources
    #[arg(long, default_value = "read-only", value_parser = ["read-only", "take-over"])]
    pub mode: String,

    /// Name of the application, defaults to the name shared by the resources
    #[arg(long)]
    pub app_name: Option<String>,

    /// Apply the application instead of printing it
    #[arg(long)]
    pub apply: bool,

    /// Delete the helm release storage once the application is running
    #[arg(long)]
    pub recycle: bool,

    /// Adopt every unmanaged workload in the namespace together with its peers
    #[arg(long)]
    pub all: bool,

    /// Wait until the applied application is running
    #[arg(long)]
    pub wait: bool,

    /// Adoption template file (tera), replaces the built-in template
    #[arg(long, value_name = "PATH")]
    pub adopt_template: Option<PathBuf>,

    /// Helm storage driver (secret or configmap), defaults to $HELM_DRIVER
    #[arg(long)]
    pub driver: Option<String>,
}

impl AdoptCommand {
    pub fn to_options(&self, namespace: &str) -> anyhow::Result<AdoptOptions> {
        let mut opts = AdoptOptions::new(namespace);
        opts.adopt_type = self.adopt_type.parse::<AdoptType>()?;
        opts.mode = self.mode.parse::<AdoptMode>()?;
        opts.app_name = self.app_name.clone();
        opts.resource_args = self.resources.clone();
        opts.helm_driver = self.driver.clone();
        opts.apply = self.apply;
        opts.recycle = self.recycle;
        opts.all = self.all;
        opts.wait = self.wait;
        opts.template_path = self.adopt_template.clone();
        Ok(opts)
    }

    pub async fn execute(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let mut opts = self.to_options(&ctx.namespace)?;
        opts.init()?;
        opts.validate()?;

        let client = ctx.client().await?;
        opts.complete(&client)
            .await
            .context("Failed to collect resources to adopt")?;
        info!(
            "Adopting {} group(s) in namespace {} as {}",
            opts.groups().len(),
            ctx.namespace,
            opts.adopt_type
        );

        opts.run(&client, ctx.poll_settings(), &ctx.cancel)
            .await
            .context("Failed to adopt resources")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_options() {
        let cmd = AdoptCommand::parse_from([
            "adopt",
            "my-chart",
            "--type",
            "helm",
            "--mode",
            "take-over",
            "--apply",
            "--recycle",
        ]);
        let mut opts = cmd.to_options("default").unwrap();
        assert_eq!(opts.adopt_type, AdoptType::Helm);
        assert_eq!(opts.mode, AdoptMode::TakeOver);
        opts.validate().unwrap();
        assert_eq!(opts.app_name.as_deref(), Some("my-chart"));
    }

    #[test]
    fn test_recycle_without_apply_fails_validation() {
        let cmd = AdoptCommand::parse_from(["adopt", "deploy/web", "--recycle"]);
        let mut opts = cmd.to_options("default").unwrap();
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_unknown_type_rejected_by_parser() {
        assert!(AdoptCommand::try_parse_from(["adopt", "x", "--type", "kustomize"]).is_err());
    }
}

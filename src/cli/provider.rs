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

//! `vela provider` commands

use super::context::CommandContext;
use super::display::{StatusIcon, TableRenderer};
use crate::domain::addon::parse_to_map;
use crate::domain::provider::{add_provider, delete_provider, list_providers, provider_app_name};
use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

#[derive(Parser, Debug)]
pub struct ProviderCommand {
    #[command(subcommand)]
    pub action: ProviderAction,
}

#[derive(Subcommand, Debug)]
pub enum ProviderAction {
    /// List Terraform cloud providers
    #[command(alias = "ls")]
    List,

    /// Authenticate a Terraform cloud provider
    Add(ProviderAddArgs),

    /// Delete a Terraform cloud provider
    #[command(alias = "rm")]
    Delete {
        /// Provider name given to `vela provider add`
        name: String,
    },
}

#[derive(Parser, Debug)]
pub struct ProviderAddArgs {
    /// Provider type, e.g. terraform-aws
    #[arg(value_name = "TYPE")]
    pub provider_type: String,

    /// Name of the new provider
    #[arg(long)]
    pub name: String,

    /// Provider properties as key=value
    #[arg(value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

impl ProviderCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        let client = ctx.client().await?;
        match &self.action {
            ProviderAction::List => {
                let providers = list_providers(&client).await?;
                println!("{}", TableRenderer::new().render_providers(&providers));
            }
            ProviderAction::Add(args) => {
                let properties = parse_to_map(&args.properties)?;
                add_provider(&client, &ctx.namespace, &args.provider_type, &args.name, &properties)
                    .await
                    .with_context(|| format!("Failed to add provider {}", args.name))?;
                println!(
                    "{} Terraform provider {} ({}) added as application {}/{}",
                    StatusIcon::SUCCESS.green(),
                    args.name.bold(),
                    args.provider_type,
                    ctx.namespace,
                    provider_app_name(&args.name)
                );
            }
            ProviderAction::Delete { name } => {
                delete_provider(&client, &ctx.namespace, name)
                    .await
                    .with_context(|| format!("Failed to delete provider {}", name))?;
                println!(
                    "{} Terraform provider {} deleted",
                    StatusIcon::SUCCESS.green(),
                    name.bold()
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{CliArgs, Commands};

    #[test]
    fn test_parse_provider_add() {
        let cli = CliArgs::try_parse_from([
            "vela",
            "provider",
            "add",
            "terraform-aws",
            "--name",
            "prod",
            "AWS_ACCESS_KEY_ID=ak",
            "AWS_SECRET_ACCESS_KEY=sk",
        ])
        .unwrap();
        let Commands::Provider(cmd) = cli.command else {
            panic!("expected provider command");
        };
        match cmd.action {
            ProviderAction::Add(args) => {
                assert_eq!(args.provider_type, "terraform-aws");
                assert_eq!(args.name, "prod");
                assert_eq!(args.properties.len(), 2);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_parse_provider_delete_requires_name() {
        assert!(CliArgs::try_parse_from(["vela", "provider", "delete"]).is_err());
        let cli = CliArgs::try_parse_from(["vela", "provider", "rm", "prod"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Provider(ProviderCommand {
                action: ProviderAction::Delete { .. }
            })
        ));
    }
}

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

//! `vela registry` commands

use super::display::{StatusIcon, TableRenderer};
use crate::domain::registry::{Registry, RegistryKind, RegistryStore};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

#[derive(Parser, Debug)]
pub struct RegistryCommand {
    #[command(subcommand)]
    pub action: RegistryAction,
}

#[derive(Subcommand, Debug)]
pub enum RegistryAction {
    /// Add a registry, or update it when the name is taken
    Config(RegistryArgs),

    /// Add a new registry
    Add(RegistryArgs),

    /// Update an existing registry
    Update(RegistryArgs),

    /// Show one registry
    Get {
        name: String,
    },

    /// List registries
    #[command(alias = "list")]
    Ls,

    /// Remove a registry
    #[command(alias = "rm")]
    Remove {
        name: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    pub name: String,

    /// Registry type: helm, git or oss
    #[arg(long = "type", default_value = "helm")]
    pub kind: String,

    /// Registry address
    #[arg(long)]
    pub endpoint: String,

    /// Directory of addons inside a git registry
    #[arg(long)]
    pub path: Option<String>,

    /// Bucket of an oss registry
    #[arg(long)]
    pub bucket: Option<String>,
}

impl RegistryArgs {
    pub fn to_registry(&self) -> anyhow::Result<Registry> {
        let kind: RegistryKind = self.kind.parse()?;
        Ok(Registry::new(&self.name, kind, &self.endpoint)?
            .with_path(self.path.clone())
            .with_bucket(self.bucket.clone()))
    }
}

impl RegistryCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let store = RegistryStore::open_default().context("Failed to open registry store")?;
        self.execute_with(&store)
    }

    pub fn execute_with(&self, store: &RegistryStore) -> anyhow::Result<()> {
        let renderer = TableRenderer::new();
        match &self.action {
            RegistryAction::Config(args) => {
                let created = store.config(args.to_registry()?)?;
                let verb = if created { "added" } else { "updated" };
                println!("{} Registry {} {}", StatusIcon::SUCCESS.green(), args.name.bold(), verb);
            }
            RegistryAction::Add(args) => {
                store.add(args.to_registry()?)?;
                println!("{} Registry {} added", StatusIcon::SUCCESS.green(), args.name.bold());
            }
            RegistryAction::Update(args) => {
                store.update(args.to_registry()?)?;
                println!("{} Registry {} updated", StatusIcon::SUCCESS.green(), args.name.bold());
            }
            RegistryAction::Get { name } => {
                let registry = store.get(name)?;
                println!("{}", renderer.render_registries(&[registry]));
            }
            RegistryAction::Ls => {
                println!("{}", renderer.render_registries(&store.list()?));
            }
            RegistryAction::Remove { name } => {
                store.remove(name)?;
                println!("{} Registry {} removed", StatusIcon::SUCCESS.green(), name.bold());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_then_remove() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path().join("registries.yaml"));

        let cmd = RegistryCommand::parse_from([
            "registry",
            "config",
            "community",
            "--type",
            "git",
            "--endpoint",
            "https://github.com/kubevela/catalog",
            "--path",
            "addons",
        ]);
        cmd.execute_with(&store).unwrap();
        assert_eq!(store.get("community").unwrap().kind, RegistryKind::Git);

        let cmd = RegistryCommand::parse_from(["registry", "remove", "community"]);
        cmd.execute_with(&store).unwrap();
        assert!(cmd.execute_with(&store).is_err());
    }

    #[test]
    fn test_invalid_type() {
        let args = RegistryArgs {
            name: "x".into(),
            kind: "svn".into(),
            endpoint: "https://x".into(),
            path: None,
            bucket: None,
        };
        assert!(args.to_registry().is_err());
    }
}

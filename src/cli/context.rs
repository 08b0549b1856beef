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

//! State shared by every subcommand of one invocation.

use crate::domain::config::VelaConfig;
use crate::domain::wait::PollSettings;
use crate::infrastructure::kubernetes::VelaKubeClientImpl;
use anyhow::Context;
use clap::Args;
use tokio_util::sync::CancellationToken;

/// Flags accepted before or after any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to kubeconfig file
    /// If not specified, uses default kubeconfig resolution (KUBECONFIG env or ~/.kube/config)
    #[arg(long, global = true)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    /// If not specified, uses current context from kubeconfig
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Namespace, overrides the one in $VELA_HOME/config.toml
    #[arg(long, short = 'n', global = true)]
    pub namespace: Option<String>,
}

impl GlobalOpts {
    /// Default `tracing` directive for the chosen verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub struct CommandContext {
    pub config: VelaConfig,
    pub namespace: String,
    kubeconfig: Option<String>,
    context: Option<String>,
    pub cancel: CancellationToken,
}

impl CommandContext {
    pub fn new(opts: &GlobalOpts, config: VelaConfig, cancel: CancellationToken) -> Self {
        let namespace = opts
            .namespace
            .clone()
            .filter(|ns| !ns.trim().is_empty())
            .unwrap_or_else(|| config.namespace.clone());
        Self {
            config,
            namespace,
            kubeconfig: opts.kubeconfig.clone(),
            context: opts.context.clone(),
            cancel,
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        self.config.poll_settings()
    }

    pub async fn client(&self) -> anyhow::Result<VelaKubeClientImpl> {
        VelaKubeClientImpl::new_with_config(
            self.kubeconfig.clone(),
            self.context.clone(),
            self.config.field_manager.clone(),
        )
        .await
        .context("Failed to create Kubernetes client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_flag_overrides_config() {
        let config = VelaConfig::default();
        let opts = GlobalOpts {
            namespace: Some("addons".into()),
            ..Default::default()
        };
        let ctx = CommandContext::new(&opts, config.clone(), CancellationToken::new());
        assert_eq!(ctx.namespace, "addons");

        let ctx = CommandContext::new(&GlobalOpts::default(), config, CancellationToken::new());
        assert_eq!(ctx.namespace, "vela-system");
    }

    #[test]
    fn test_log_level() {
        let mut opts = GlobalOpts::default();
        assert_eq!(opts.log_level(), "warn");
        opts.verbose = 2;
        assert_eq!(opts.log_level(), "trace");
    }
}

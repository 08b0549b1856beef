// CLI command definitions

use super::addon::AddonCommand;
use super::adopt::AdoptCommand;
use super::context::GlobalOpts;
use super::provider::ProviderCommand;
use super::registry::RegistryCommand;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "vela",
    version,
    about = "KubeVela command line for addons and resource adoption",
    long_about = "A standalone CLI for enabling KubeVela addons, adopting existing resources into Applications and managing Terraform providers and addon registries"
)]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Manage addons (list, enable, disable, status)
    Addon(AddonCommand),

    /// Adopt existing resources into an Application
    Adopt(AdoptCommand),

    /// Manage Terraform cloud providers
    Provider(ProviderCommand),

    /// Manage addon registries
    Registry(RegistryCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::addon::AddonAction;

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from([
            "vela", "addon", "enable", "fluxcd", "only=true", "-n", "flux", "-v",
        ]);
        assert_eq!(args.global.namespace.as_deref(), Some("flux"));
        assert_eq!(args.global.verbose, 1);
        match args.command {
            Commands::Addon(cmd) => match cmd.action {
                AddonAction::Enable(enable) => {
                    assert_eq!(enable.name, "fluxcd");
                    assert_eq!(enable.args, vec!["only=true".to_string()]);
                }
                other => panic!("unexpected action {:?}", other),
            },
            other => panic!("unexpected command {:?}", other),
        }
    }
}

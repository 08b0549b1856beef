//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use crate::domain::addon::{AddonParameters, AddonStatus, InstallReport};
use crate::domain::provider::ProviderInfo;
use crate::domain::registry::Registry;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};

/// Addon information for list display
#[derive(Debug, Clone)]
pub struct AddonRow {
    pub name: String,
    pub description: String,
    pub status: AddonStatus,
}

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn table_with_header(columns: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            columns
                .iter()
                .map(|c| Cell::new(c).set_alignment(CellAlignment::Left))
                .collect::<Vec<_>>(),
        );
    table
}

fn titled(title: &str, count: usize, unit: &str, table: &Table) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "╭─ {} {} ─╮\n",
        title,
        format!("[{} {}]", count, unit).bright_black()
    ));
    output.push_str(&table.to_string());
    output.push('\n');
    output
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    pub fn render_addons(&self, addons: &[AddonRow]) -> String {
        if addons.is_empty() {
            return "No addons found".to_string();
        }

        let mut table = table_with_header(&["NAME", "DESCRIPTION", "STATUS"]);
        for addon in addons {
            table.add_row(vec![
                Cell::new(&addon.name),
                Cell::new(&addon.description),
                Cell::new(format!(
                    "{} {}",
                    StatusIcon::addon_icon(addon.status),
                    addon.status
                ))
                .fg(self.theme.addon_status_color(addon.status)),
            ]);
        }

        let mut output = titled("Addons", addons.len(), "addons", &table);
        output.push_str(&format!(
            "Legend: {} Installed  {} Uninstalled  {} Unknown\n",
            StatusIcon::SUCCESS.green(),
            StatusIcon::ABSENT.bright_black(),
            StatusIcon::WARNING.yellow()
        ));
        output
    }

    pub fn render_parameters(&self, parameters: &AddonParameters) -> String {
        let mut table = table_with_header(&["NAME", "TYPE", "DEFAULT", "REQUIRED", "USAGE"]);
        for spec in parameters.specs() {
            table.add_row(vec![
                Cell::new(&spec.name),
                Cell::new(spec.param_type.to_string()).fg(self.theme.info),
                Cell::new(spec.default.as_deref().unwrap_or("-")),
                if spec.required {
                    Cell::new("yes").fg(self.theme.warning)
                } else {
                    Cell::new("no").fg(self.theme.muted)
                },
                Cell::new(spec.usage.as_deref().unwrap_or_default()),
            ]);
        }
        titled("Parameters", parameters.specs().len(), "parameters", &table)
    }

    pub fn render_providers(&self, providers: &[ProviderInfo]) -> String {
        let mut table =
            table_with_header(&["NAME", "NAMESPACE", "TYPE", "REGION", "STATE", "CREATED-TIME"]);
        for provider in providers {
            let state = if provider.state.is_empty() {
                "-"
            } else {
                provider.state.as_str()
            };
            table.add_row(vec![
                Cell::new(&provider.name),
                Cell::new(&provider.namespace),
                Cell::new(&provider.provider),
                Cell::new(&provider.region),
                Cell::new(format!("{} {}", StatusIcon::provider_icon(&provider.state), state))
                    .fg(self.theme.provider_state_color(&provider.state)),
                Cell::new(&provider.created).fg(self.theme.muted),
            ]);
        }
        titled("Terraform Providers", providers.len(), "providers", &table)
    }

    pub fn render_registries(&self, registries: &[Registry]) -> String {
        let mut table = table_with_header(&["NAME", "TYPE", "URL"]);
        for registry in registries {
            table.add_row(vec![
                Cell::new(&registry.name),
                Cell::new(registry.kind.as_str()).fg(self.theme.info),
                Cell::new(registry.display_url()),
            ]);
        }
        titled("Addon Registries", registries.len(), "registries", &table)
    }

    pub fn render_install_report(&self, addon: &str, report: &InstallReport) -> String {
        let mut table = table_with_header(&["ADDON", "RESULT"]);
        for name in &report.installed {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(format!("{} installed", StatusIcon::SUCCESS)).fg(self.theme.success),
            ]);
        }
        for name in &report.already_installed {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(format!("{} already installed", StatusIcon::SUCCESS))
                    .fg(self.theme.muted),
            ]);
        }
        for (name, reason) in &report.failed {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(format!("{} {}", StatusIcon::ERROR, reason)).fg(self.theme.error),
            ]);
        }
        for name in &report.blocked {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(format!("{} blocked by a failed dependency", StatusIcon::WARNING))
                    .fg(Color::Yellow),
            ]);
        }

        let total = report.installed.len()
            + report.already_installed.len()
            + report.failed.len()
            + report.blocked.len();
        titled(&format!("Enable {}", addon), total, "addons", &table)
    }
}

//! Color theme for CLI output

use crate::domain::addon::AddonStatus;
use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    pub fn addon_status_color(&self, status: AddonStatus) -> TableColor {
        match status {
            AddonStatus::Installed => self.success,
            AddonStatus::Uninstalled => self.muted,
            AddonStatus::Unknown => self.warning,
        }
    }

    /// Terraform provider state; an empty state means not yet reconciled
    pub fn provider_state_color(&self, state: &str) -> TableColor {
        if state.eq_ignore_ascii_case("ready") {
            self.success
        } else if state.is_empty() {
            self.muted
        } else {
            self.warning
        }
    }
}

/// Convert comfy_table::Color to colored::Color string representation
pub fn table_color_to_colored_str(color: TableColor) -> &'static str {
    match color {
        TableColor::Green => "green",
        TableColor::Yellow => "yellow",
        TableColor::Red => "red",
        TableColor::Cyan => "cyan",
        TableColor::DarkGrey => "bright black",
        _ => "white",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        let theme = ColorTheme::default();
        assert_eq!(theme.success, TableColor::Green);
        assert_eq!(theme.warning, TableColor::Yellow);
        assert_eq!(theme.error, TableColor::Red);
    }

    #[test]
    fn test_addon_status_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.addon_status_color(AddonStatus::Installed), TableColor::Green);
        assert_eq!(theme.addon_status_color(AddonStatus::Uninstalled), TableColor::DarkGrey);
        assert_eq!(theme.addon_status_color(AddonStatus::Unknown), TableColor::Yellow);
        assert_eq!(table_color_to_colored_str(TableColor::DarkGrey), "bright black");
    }

    #[test]
    fn test_provider_state_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.provider_state_color("Ready"), TableColor::Green);
        assert_eq!(theme.provider_state_color(""), TableColor::DarkGrey);
        assert_eq!(theme.provider_state_color("ProvisioningAndChecking"), TableColor::Yellow);
    }
}

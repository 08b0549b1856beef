//! Status icons for CLI output

use crate::domain::addon::AddonStatus;

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    /// Success icon (installed, ready)
    pub const SUCCESS: &'static str = "✓";

    /// Warning icon (status could not be determined)
    pub const WARNING: &'static str = "⚠";

    /// Error icon (failed)
    pub const ERROR: &'static str = "✗";

    /// Pending icon (waiting)
    pub const PENDING: &'static str = "⏳";

    /// Unknown icon
    pub const UNKNOWN: &'static str = "?";

    /// Not installed
    pub const ABSENT: &'static str = "○";

    pub fn addon_icon(status: AddonStatus) -> &'static str {
        match status {
            AddonStatus::Installed => Self::SUCCESS,
            AddonStatus::Uninstalled => Self::ABSENT,
            AddonStatus::Unknown => Self::WARNING,
        }
    }

    pub fn provider_icon(state: &str) -> &'static str {
        if state.eq_ignore_ascii_case("ready") {
            Self::SUCCESS
        } else if state.is_empty() {
            Self::UNKNOWN
        } else {
            Self::PENDING
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addon_icon() {
        assert_eq!(StatusIcon::addon_icon(AddonStatus::Installed), StatusIcon::SUCCESS);
        assert_eq!(StatusIcon::addon_icon(AddonStatus::Uninstalled), StatusIcon::ABSENT);
        assert_eq!(StatusIcon::addon_icon(AddonStatus::Unknown), StatusIcon::WARNING);
    }

    #[test]
    fn test_provider_icon() {
        assert_eq!(StatusIcon::provider_icon("Ready"), StatusIcon::SUCCESS);
        assert_eq!(StatusIcon::provider_icon("Provisioning"), StatusIcon::PENDING);
        assert_eq!(StatusIcon::provider_icon(""), StatusIcon::UNKNOWN);
    }
}

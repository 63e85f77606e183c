//! Broker publishing settings loaded from environment variables.

/// Publishing settings with sensible defaults.
///
/// Reads from environment variables:
/// - `SALES_BROKER_EXCHANGE`: exchange name (default: `"sales.events"`)
/// - `SALES_BROKER_APP_ID`: app id stamped on envelopes (default: `"sales-service"`)
/// - `SALES_BROKER_ENABLED`: `false`/`0`/`no`/`off` disables publishing (default: enabled)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub exchange_name: String,
    pub app_id: String,
    pub enabled: bool,
}

impl BrokerSettings {
    /// Loads settings from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            exchange_name: lookup("SALES_BROKER_EXCHANGE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.exchange_name),
            app_id: lookup("SALES_BROKER_APP_ID")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.app_id),
            enabled: lookup("SALES_BROKER_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.enabled),
        }
    }

    /// Returns settings with publishing turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            exchange_name: "sales.events".to_string(),
            app_id: "sales-service".to_string(),
            enabled: true,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

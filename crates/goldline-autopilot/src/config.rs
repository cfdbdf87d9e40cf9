//! # Autopilot Configuration
//!
//! Configuration management for the autopilot job and its data files.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GOLDLINE_GOLD_RATE=7650                                            │
//! │     GOLDLINE_GRACE_HOURS=48                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/goldline/autopilot.toml (Linux)                          │
//! │     ~/Library/Application Support/com.goldline.goldline/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     24 h grace, 3 day follow-up, 4 h warning spacing                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # autopilot.toml
//! [settings]               # same keys as the back office settings JSON
//! currentGoldRate24k = 7650.0
//! purityFactor22k = 0.916
//! purityFactor18k = 0.75
//! defaultTaxRate = 3.0
//! gracePeriodHours = 24
//! followUpIntervalDays = 3
//! warningSpacingHours = 4
//!
//! [autopilot]
//! cycle_interval_secs = 3600
//! run_once = false
//!
//! [storage]
//! orders_dir = "/var/lib/goldline/orders"
//! messages_path = "/var/lib/goldline/messages.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use goldline_core::StoreSettings;

use crate::error::{AutopilotError, AutopilotResult};

// =============================================================================
// Autopilot Settings
// =============================================================================

/// How the autopilot job is scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutopilotSettings {
    /// Seconds between two cycles when running as a periodic job.
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,

    /// Run a single cycle after loading and exit.
    #[serde(default)]
    pub run_once: bool,
}

fn default_cycle_interval() -> u64 {
    3600
}

impl Default for AutopilotSettings {
    fn default() -> Self {
        AutopilotSettings {
            cycle_interval_secs: default_cycle_interval(),
            run_once: false,
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Where orders and the message log are kept.
///
/// Unset paths fall back to the platform data directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding one `<order id>.json` file per order.
    #[serde(default)]
    pub orders_dir: Option<PathBuf>,

    /// JSON file holding the outbound message log.
    #[serde(default)]
    pub messages_path: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete autopilot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutopilotConfig {
    /// Store settings consumed by pricing, protection and decisions.
    #[serde(default)]
    pub settings: StoreSettings,

    /// Job scheduling.
    #[serde(default)]
    pub autopilot: AutopilotSettings,

    /// Data file locations.
    #[serde(default)]
    pub storage: StorageSettings,
}

impl AutopilotConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (autopilot.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> AutopilotResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading autopilot config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| AutopilotError::ConfigLoadFailed(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load autopilot config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> AutopilotResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| AutopilotError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AutopilotError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .map_err(|e| AutopilotError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Autopilot config saved");
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// A zero gold rate is allowed (settings may not be loaded yet) but
    /// nothing can be priced or quoted until it is set.
    pub fn validate(&self) -> AutopilotResult<()> {
        let s = &self.settings;

        if !s.current_gold_rate_24k.is_finite() || s.current_gold_rate_24k < 0.0 {
            return Err(AutopilotError::InvalidConfig(format!(
                "currentGoldRate24k must be a non-negative number, got {}",
                s.current_gold_rate_24k
            )));
        }

        for (name, factor) in [
            ("purityFactor22k", s.purity_factor_22k),
            ("purityFactor18k", s.purity_factor_18k),
        ] {
            if !factor.is_finite() || factor <= 0.0 || factor > 1.0 {
                return Err(AutopilotError::InvalidConfig(format!(
                    "{} must be in (0, 1], got {}",
                    name, factor
                )));
            }
        }

        if !s.default_tax_rate.is_finite() || s.default_tax_rate < 0.0 {
            return Err(AutopilotError::InvalidConfig(
                "defaultTaxRate must not be negative".into(),
            ));
        }

        if s.follow_up_interval_days == 0 {
            return Err(AutopilotError::InvalidConfig(
                "followUpIntervalDays must be greater than 0".into(),
            ));
        }

        if self.autopilot.cycle_interval_secs == 0 {
            return Err(AutopilotError::InvalidConfig(
                "cycle_interval_secs must be greater than 0".into(),
            ));
        }

        if s.current_gold_rate_24k == 0.0 {
            warn!("Gold rate is not set; repricing and quotes will be refused");
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(rate) = std::env::var("GOLDLINE_GOLD_RATE") {
            match rate.parse::<f64>() {
                Ok(r) => {
                    debug!(rate = r, "Overriding gold rate from environment");
                    self.settings.current_gold_rate_24k = r;
                }
                Err(_) => warn!(value = %rate, "Ignoring unparsable GOLDLINE_GOLD_RATE"),
            }
        }

        if let Ok(hours) = std::env::var("GOLDLINE_GRACE_HOURS") {
            if let Ok(h) = hours.parse::<u32>() {
                self.settings.grace_period_hours = h;
            }
        }

        if let Ok(days) = std::env::var("GOLDLINE_FOLLOW_UP_DAYS") {
            if let Ok(d) = days.parse::<u32>() {
                self.settings.follow_up_interval_days = d;
            }
        }

        if let Ok(secs) = std::env::var("GOLDLINE_CYCLE_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                debug!(secs = s, "Overriding cycle interval from environment");
                self.autopilot.cycle_interval_secs = s;
            }
        }

        if let Ok(flag) = std::env::var("GOLDLINE_RUN_ONCE") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.autopilot.run_once = true,
                "0" | "false" | "no" => self.autopilot.run_once = false,
                _ => warn!(value = %flag, "Unknown GOLDLINE_RUN_ONCE value"),
            }
        }

        if let Ok(dir) = std::env::var("GOLDLINE_ORDERS_PATH") {
            self.storage.orders_dir = Some(PathBuf::from(dir));
        }

        if let Ok(path) = std::env::var("GOLDLINE_MESSAGES_PATH") {
            self.storage.messages_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "goldline", "goldline")
            .map(|dirs| dirs.config_dir().join("autopilot.toml"))
    }

    fn data_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "goldline", "goldline")
            .map(|dirs| dirs.data_dir().to_path_buf())
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Directory holding order files.
    pub fn orders_dir(&self) -> AutopilotResult<PathBuf> {
        self.storage
            .orders_dir
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("orders")))
            .ok_or_else(|| AutopilotError::InvalidConfig("No orders directory available".into()))
    }

    /// Path of the message log file.
    pub fn messages_path(&self) -> AutopilotResult<PathBuf> {
        self.storage
            .messages_path
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("messages.json")))
            .ok_or_else(|| AutopilotError::InvalidConfig("No message log path available".into()))
    }

    /// Interval between periodic cycles.
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.autopilot.cycle_interval_secs)
    }
}

// Operator settings
// Loaded from ~/.config/prefile/settings.toml

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use prefile_engine::ColumnProfile;

use crate::error::ConfigError;

pub const RATE_URL_DEFAULT: &str =
    "https://www.nbs.rs/static/nbs_site/gen/english/30/kurs/Indikativni_Kurs_20.html";

/// Declared-value caps driving the limiter stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Caps {
    /// Per-buyer cap for the perturbation pass.
    pub buyer_cap: f64,
    /// Per-unit price; multiplied by the fetched exchange rate to form
    /// the proportional-shrink cap.
    pub unit_price: f64,
}

impl Default for Caps {
    fn default() -> Self {
        Caps {
            buyer_cap: 150.0,
            unit_price: 49.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Smtp {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Appended to the station code to form the sender display name.
    pub from_label_suffix: String,
    /// Name of the environment variable holding the account password.
    /// The password itself never lives in this file.
    pub password_env: String,
}

impl Default for Smtp {
    fn default() -> Self {
        Smtp {
            host: "smtp.exmail.qq.com".to_string(),
            port: 465,
            username: String::new(),
            from_label_suffix: "_Prealert".to_string(),
            password_env: "PREFILE_SMTP_PASSWORD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipients {
    pub to: Vec<String>,
    pub cc: Vec<String>,
}

/// Partial column-layout override. Unset fields keep the built-in
/// station layout; a feed change becomes a settings edit instead of a
/// release.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverride {
    pub order_number: Option<usize>,
    pub declared_value: Option<usize>,
    pub trailing_probe: Option<usize>,
    pub buyer_name: Option<usize>,
    pub buyer_address: Option<usize>,
    pub net_weight: Option<usize>,
    pub proration: Option<usize>,
    pub hs_code: Option<usize>,
    pub description: Option<usize>,
    pub box_number: Option<usize>,
    pub routing: Option<usize>,
    pub consignee_id: Option<usize>,
    pub unlocode: Option<usize>,
    pub origin_city: Option<usize>,
    pub origin_postcode: Option<usize>,
    pub sequence: Option<usize>,
    pub package_number: Option<usize>,
    pub admin_column: Option<usize>,
    pub admin_header: Option<String>,
}

impl ProfileOverride {
    /// Overlay the set fields onto a built-in station layout.
    pub fn apply(&self, profile: &mut ColumnProfile) {
        if let Some(v) = self.order_number {
            profile.order_number = v;
        }
        if let Some(v) = self.declared_value {
            profile.declared_value = v;
        }
        if let Some(v) = self.trailing_probe {
            profile.trailing_probe = v;
        }
        if self.buyer_name.is_some() {
            profile.buyer_name = self.buyer_name;
        }
        if self.buyer_address.is_some() {
            profile.buyer_address = self.buyer_address;
        }
        if self.net_weight.is_some() {
            profile.net_weight = self.net_weight;
        }
        if self.proration.is_some() {
            profile.proration = self.proration;
        }
        if self.hs_code.is_some() {
            profile.hs_code = self.hs_code;
        }
        if self.description.is_some() {
            profile.description = self.description;
        }
        if self.box_number.is_some() {
            profile.box_number = self.box_number;
        }
        if self.routing.is_some() {
            profile.routing = self.routing;
        }
        if self.consignee_id.is_some() {
            profile.consignee_id = self.consignee_id;
        }
        if self.unlocode.is_some() {
            profile.unlocode = self.unlocode;
        }
        if self.origin_city.is_some() {
            profile.origin_city = self.origin_city;
        }
        if self.origin_postcode.is_some() {
            profile.origin_postcode = self.origin_postcode;
        }
        if self.sequence.is_some() {
            profile.sequence = self.sequence;
        }
        if self.package_number.is_some() {
            profile.package_number = self.package_number;
        }
        if self.admin_column.is_some() {
            profile.admin_column = self.admin_column;
        }
        if let Some(header) = &self.admin_header {
            profile.admin_header = Some(header.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Waybill register workbooks, probed in order; the first that
    /// exists wins.
    pub register_paths: Vec<PathBuf>,
    /// Commodity catalog workbook or CSV extract.
    pub catalog_path: PathBuf,
    /// Directory holding `{awb}.xlsx` manifests; outputs land beside
    /// them.
    pub manifest_dir: PathBuf,
    /// Exchange-rate page scraped for the shrink cap.
    pub rate_url: String,
    pub caps: Caps,
    pub smtp: Smtp,
    /// Pre-alert recipient lists keyed by station code.
    pub recipients: BTreeMap<String, Recipients>,
    /// Per-station column overrides on top of the built-in layouts.
    pub profiles: BTreeMap<String, ProfileOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            register_paths: Vec::new(),
            catalog_path: PathBuf::new(),
            manifest_dir: PathBuf::from("."),
            rate_url: RATE_URL_DEFAULT.to_string(),
            caps: Caps::default(),
            smtp: Smtp::default(),
            recipients: BTreeMap::new(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Settings file location under the platform config dir.
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prefile")
            .join("settings.toml")
    }

    /// Load settings from disk. A missing file means defaults; a file
    /// that exists but does not parse is an error, not a silent
    /// fallback.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
        }
        let rendered = self.to_toml()?;
        fs::write(path, rendered).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.register_paths.is_empty() {
            return Err(ConfigError::Validation(
                "register_paths must list at least one workbook".into(),
            ));
        }
        if self.catalog_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("catalog_path is not set".into()));
        }
        if self.rate_url.is_empty() {
            return Err(ConfigError::Validation("rate_url is not set".into()));
        }
        if self.caps.buyer_cap <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "caps.buyer_cap must be positive, got {}",
                self.caps.buyer_cap
            )));
        }
        if self.caps.unit_price <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "caps.unit_price must be positive, got {}",
                self.caps.unit_price
            )));
        }
        if self.smtp.host.is_empty() {
            return Err(ConfigError::Validation("smtp.host is not set".into()));
        }
        if self.smtp.port == 0 {
            return Err(ConfigError::Validation("smtp.port must be nonzero".into()));
        }
        Ok(())
    }

    /// SMTP password from the configured environment variable, resolved
    /// at send time.
    pub fn smtp_password(&self) -> Result<String, ConfigError> {
        env::var(&self.smtp.password_env).map_err(|_| ConfigError::MissingSecret {
            var: self.smtp.password_env.clone(),
        })
    }

    pub fn recipients_for(&self, station: &str) -> Option<&Recipients> {
        self.recipients.get(station)
    }

    /// Built-in station layout with any configured overrides applied.
    pub fn profile_for(&self, station: &str, base: ColumnProfile) -> ColumnProfile {
        let mut profile = base;
        if let Some(overlay) = self.profiles.get(station) {
            overlay.apply(&mut profile);
        }
        profile
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

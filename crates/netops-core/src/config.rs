//! Environment Configuration Loader
//!
//! Loads environment variables from `/etc/netops-agent/environment` (or
//! `.env` during development) and builds typed [`Settings`] from them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use netops_core::config::{load_environment, Settings};
//!
//! if let Some(env_file) = load_environment() {
//!     env_file.log();
//! }
//! let settings = Settings::from_env()?;
//! ```
//!
//! ## Recognised variables
//!
//! ```text
//! ACI_URL=https://sandboxapicdc.cisco.com
//! ACI_INSECURE_TLS=false          # lab/sandbox only
//! ISE_URL=https://devnetsandboxise.cisco.com
//! ISE_INSECURE_TLS=false          # lab/sandbox only
//! IOSXE_TESTBED=testbed.yaml
//! IOSXE_DEVICE=Cat8000V
//! ACI_CATALOG=aci_urls.json
//! ISE_CATALOG=ise_urls.json
//! IOSXE_CATALOG=ios_xe_commands.json
//! LLM_BASE_URL=https://api.openai.com/v1
//! LLM_MODEL=gpt-4
//! OPENAI_API_KEY=sk-...
//! MAX_HOPS=10
//! PORT=8080
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Default path for the environment file
pub const DEFAULT_ENV_FILE: &str = "/etc/netops-agent/environment";

/// Variable naming an environment file to use instead of the defaults
pub const ENV_FILE_VAR: &str = "NETOPS_ENV_FILE";

/// Alternative paths to check (in order of priority)
pub const ENV_FILE_PATHS: &[&str] = &[DEFAULT_ENV_FILE, ".env"];

/// One line of an environment file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvLine {
    /// Blank or `#` comment
    Blank,
    /// `KEY=value`, optionally prefixed with `export`
    Assign { key: String, value: String },
    /// Anything else; kept so the line number can be reported
    Malformed(String),
}

impl EnvLine {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return EnvLine::Blank;
        }

        let body = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
        let Some((key, value)) = body.split_once('=') else {
            return EnvLine::Malformed(line.to_string());
        };
        let key = key.trim();
        if !is_valid_key(key) {
            return EnvLine::Malformed(line.to_string());
        }

        EnvLine::Assign {
            key: key.to_string(),
            value: unquote(value.trim()).to_string(),
        }
    }
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Strip matching quotes. Unquoted values lose a trailing ` # comment`.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end(),
        None => value,
    }
}

/// What loading an environment file did to the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    pub path: PathBuf,
    /// Keys that were set from the file
    pub applied: Vec<String>,
    /// Keys left alone because the process already had them
    pub skipped: Vec<String>,
    /// 1-based numbers of lines that could not be parsed
    pub malformed: Vec<usize>,
}

impl EnvFile {
    /// Apply `content` read from `path`. Variables already present in the
    /// process environment win.
    pub fn apply(path: impl Into<PathBuf>, content: &str) -> Self {
        let mut report = EnvFile {
            path: path.into(),
            ..Default::default()
        };

        for (idx, line) in content.lines().enumerate() {
            match EnvLine::parse(line) {
                EnvLine::Blank => {}
                EnvLine::Malformed(_) => report.malformed.push(idx + 1),
                EnvLine::Assign { key, value } => {
                    if std::env::var_os(&key).is_some() {
                        report.skipped.push(key);
                    } else {
                        std::env::set_var(&key, value);
                        report.applied.push(key);
                    }
                }
            }
        }
        report
    }

    /// Log the outcome. Only key names are logged, never values.
    pub fn log(&self) {
        info!(
            "Loaded {} environment variables from {} ({} already set)",
            self.applied.len(),
            self.path.display(),
            self.skipped.len()
        );
        debug!("Applied: {}", self.applied.join(", "));
        if !self.malformed.is_empty() {
            warn!(
                "Ignored malformed lines {:?} in {}",
                self.malformed,
                self.path.display()
            );
        }
    }
}

/// Candidate environment files, most specific first
pub fn env_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(custom) = std::env::var_os(ENV_FILE_VAR) {
        candidates.push(PathBuf::from(custom));
    }
    candidates.extend(ENV_FILE_PATHS.iter().map(PathBuf::from));
    candidates
}

/// Load the first readable file from [`env_file_candidates`].
///
/// Runs before logging is set up, so nothing is logged here; call
/// [`EnvFile::log`] on the result once a subscriber is installed.
pub fn load_environment() -> Option<EnvFile> {
    env_file_candidates()
        .into_iter()
        .filter(|path| path.is_file())
        .find_map(|path| {
            let content = fs::read_to_string(&path).ok()?;
            Some(EnvFile::apply(path, &content))
        })
}

/// Get a configuration value with a default.
pub fn get_config(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an optional configuration value.
pub fn get_config_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get a boolean configuration value.
pub fn get_config_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(default)
}

/// Get an integer configuration value.
pub fn get_config_int(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Shared HTTP controller settings (ACI and ISE)
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub base_url: String,
    /// Skip TLS certificate verification. Lab/sandbox only.
    pub insecure_tls: bool,
    pub timeout: Duration,
}

impl ControllerSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            insecure_tls: false,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }

    fn from_env(prefix: &str, default_url: &str) -> Self {
        Self {
            base_url: get_config(&format!("{}_URL", prefix), default_url),
            insecure_tls: get_config_bool(&format!("{}_INSECURE_TLS", prefix), false),
            timeout: Duration::from_secs(
                get_config_int(&format!("{}_TIMEOUT_SECS", prefix), 30).max(1) as u64,
            ),
        }
    }
}

/// IOS XE device settings
#[derive(Debug, Clone)]
pub struct IosXeSettings {
    /// pyATS-style testbed descriptor
    pub testbed: PathBuf,
    /// Device name inside the testbed
    pub device: String,
    pub connect_timeout: Duration,
}

impl Default for IosXeSettings {
    fn default() -> Self {
        Self {
            testbed: PathBuf::from("testbed.yaml"),
            device: "Cat8000V".to_string(),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Catalog file locations
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    pub aci: PathBuf,
    pub ise: PathBuf,
    pub ios_xe: PathBuf,
}

impl Default for CatalogPaths {
    fn default() -> Self {
        Self {
            aci: PathBuf::from("aci_urls.json"),
            ise: PathBuf::from("ise_urls.json"),
            ios_xe: PathBuf::from("ios_xe_commands.json"),
        }
    }
}

/// Completion model settings
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Typed settings for the whole agent
#[derive(Debug, Clone)]
pub struct Settings {
    pub aci: ControllerSettings,
    pub ise: ControllerSettings,
    pub ios_xe: IosXeSettings,
    pub catalogs: CatalogPaths,
    pub llm: LlmSettings,
    /// Hop budget for one user turn
    pub max_hops: usize,
    pub port: u16,
}

impl Settings {
    /// Build settings from the process environment
    pub fn from_env() -> Result<Self> {
        let max_hops = get_config_int("MAX_HOPS", 10);
        if max_hops < 1 {
            return Err(Error::config(format!("MAX_HOPS must be >= 1, got {}", max_hops)));
        }

        let port = get_config_int("PORT", 8080);
        let port = u16::try_from(port)
            .map_err(|_| Error::config(format!("PORT out of range: {}", port)))?;

        let defaults = CatalogPaths::default();
        let settings = Self {
            aci: ControllerSettings::from_env("ACI", "https://sandboxapicdc.cisco.com"),
            ise: ControllerSettings::from_env("ISE", "https://devnetsandboxise.cisco.com"),
            ios_xe: IosXeSettings {
                testbed: get_config_opt("IOSXE_TESTBED")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| IosXeSettings::default().testbed),
                device: get_config("IOSXE_DEVICE", "Cat8000V"),
                connect_timeout: Duration::from_secs(
                    get_config_int("IOSXE_CONNECT_TIMEOUT_SECS", 30).max(1) as u64,
                ),
            },
            catalogs: CatalogPaths {
                aci: get_config_opt("ACI_CATALOG").map(PathBuf::from).unwrap_or(defaults.aci),
                ise: get_config_opt("ISE_CATALOG").map(PathBuf::from).unwrap_or(defaults.ise),
                ios_xe: get_config_opt("IOSXE_CATALOG")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.ios_xe),
            },
            llm: LlmSettings {
                base_url: get_config("LLM_BASE_URL", "https://api.openai.com/v1"),
                model: get_config("LLM_MODEL", "gpt-4"),
                timeout: Duration::from_secs(get_config_int("LLM_TIMEOUT_SECS", 120).max(1) as u64),
            },
            max_hops: max_hops as usize,
            port,
        };

        for (name, controller) in [("ACI", &settings.aci), ("ISE", &settings.ise)] {
            if controller.insecure_tls {
                warn!(
                    "{} TLS certificate verification is DISABLED ({}_INSECURE_TLS=true). \
                     Use only against lab/sandbox controllers.",
                    name, name
                );
            }
        }

        Ok(settings)
    }
}

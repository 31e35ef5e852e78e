use crate::error::{ProbeError, ProbeResult};
use crate::exchange::RetryPolicy;
use radius_proto::ValidationMode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Longest overall or per-attempt timeout a module may configure
pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

/// Values used for any optional field a module leaves out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDefaults {
    /// Overall probe deadline
    pub timeout: Duration,
    /// Retransmissions after the first send
    pub retries: u32,
    /// Invalid datagrams tolerated before giving up
    pub max_packet_errors: u32,
    /// Reject responses that carry no Message-Authenticator
    pub require_message_authenticator: bool,
}

impl Default for ModuleDefaults {
    fn default() -> Self {
        ModuleDefaults {
            timeout: Duration::from_secs(5),
            retries: 0,
            max_packet_errors: 0,
            require_message_authenticator: true,
        }
    }
}

/// One module as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ModuleSpec {
    pub username: String,
    pub password: String,
    pub secret: String,
    /// Overall timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    /// Per-attempt read timeout in milliseconds (default: timeout / (retries + 1))
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_packet_errors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nas_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nas_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_message_authenticator: Option<bool>,
}

/// The config file as written on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub modules: BTreeMap<String, ModuleSpec>,
}

impl ConfigFile {
    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Create an example configuration file
    pub fn example() -> Self {
        let mut modules = BTreeMap::new();
        modules.insert(
            "default".to_string(),
            ModuleSpec {
                username: "probe".to_string(),
                password: "probe-password".to_string(),
                secret: "testing123".to_string(),
                timeout: Some(5),
                retries: Some(2),
                attempt_timeout_ms: None,
                max_packet_errors: Some(0),
                nas_id: Some("radius-exporter".to_string()),
                nas_ip: None,
                require_message_authenticator: Some(true),
            },
        );
        ConfigFile { modules }
    }
}

/// Validated probe settings shared by every probe that names this module
#[derive(Clone)]
pub struct Module {
    pub username: String,
    pub password: String,
    pub secret: Vec<u8>,
    /// `Some("")` sends an empty NAS-Identifier; `None` omits the attribute
    pub nas_identifier: Option<String>,
    pub nas_ip_address: Option<Ipv4Addr>,
    pub policy: RetryPolicy,
    pub validation_mode: ValidationMode,
}

impl Module {
    /// Build a module from its file form, filling gaps from `defaults`
    pub fn from_spec(spec: ModuleSpec, defaults: &ModuleDefaults) -> Result<Self, ConfigError> {
        let timeout = spec
            .timeout
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let retries = spec.retries.unwrap_or(defaults.retries);
        let max_packet_errors = spec.max_packet_errors.unwrap_or(defaults.max_packet_errors);

        let mut policy = RetryPolicy::new(timeout, retries, max_packet_errors);
        if let Some(ms) = spec.attempt_timeout_ms {
            policy = policy.with_attempt_timeout(Duration::from_millis(ms));
        }

        let nas_ip_address = spec.nas_ip.as_deref().map(parse_nas_ip).transpose()?;

        let require = spec
            .require_message_authenticator
            .unwrap_or(defaults.require_message_authenticator);

        let module = Module {
            username: spec.username,
            password: spec.password,
            secret: spec.secret.into_bytes(),
            nas_identifier: spec.nas_id,
            nas_ip_address,
            policy,
            validation_mode: if require {
                ValidationMode::Strict
            } else {
                ValidationMode::Lenient
            },
        };
        module.validate()?;
        Ok(module)
    }

    /// Check the settings a probe cannot run without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::Invalid("Username must not be empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Invalid("Password must not be empty".to_string()));
        }
        if self.secret.is_empty() {
            return Err(ConfigError::Invalid("Secret must not be empty".to_string()));
        }
        if self.policy.timeout.is_zero() {
            return Err(ConfigError::Invalid("Timeout cannot be 0".to_string()));
        }
        if self.policy.attempt_timeout.is_zero() {
            return Err(ConfigError::Invalid("Attempt timeout cannot be 0".to_string()));
        }
        if self.policy.timeout > MAX_TIMEOUT {
            return Err(ConfigError::Invalid(format!(
                "Timeout cannot exceed {}s",
                MAX_TIMEOUT.as_secs()
            )));
        }
        if self.policy.attempt_timeout > MAX_TIMEOUT {
            return Err(ConfigError::Invalid(format!(
                "Attempt timeout cannot exceed {}s",
                MAX_TIMEOUT.as_secs()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("username", &self.username)
            .field("nas_identifier", &self.nas_identifier)
            .field("nas_ip_address", &self.nas_ip_address)
            .field("policy", &self.policy)
            .field("validation_mode", &self.validation_mode)
            .finish_non_exhaustive()
    }
}

fn parse_nas_ip(value: &str) -> Result<Ipv4Addr, ConfigError> {
    match value.parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) => Ok(addr),
        Ok(IpAddr::V6(_)) => Err(ConfigError::Invalid(format!(
            "'{}' is not an IPv4 address; NAS-IP-Address carries IPv4 only",
            value
        ))),
        Err(_) => Err(ConfigError::Invalid(format!("'{}' is not a valid IP", value))),
    }
}

/// Exporter configuration: named probe modules
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub modules: HashMap<String, Arc<Module>>,
}

impl Config {
    /// Load configuration from a JSON file using [`ModuleDefaults::default`]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_file_with_defaults(path, &ModuleDefaults::default())
    }

    /// Load configuration from a JSON file
    pub fn from_file_with_defaults<P: AsRef<Path>>(
        path: P,
        defaults: &ModuleDefaults,
    ) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_str_with_defaults(&contents, defaults)
    }

    /// Parse configuration from JSON text
    pub fn from_str_with_defaults(
        contents: &str,
        defaults: &ModuleDefaults,
    ) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(contents)?;
        Self::from_config_file(file, defaults)
    }

    pub fn from_config_file(
        file: ConfigFile,
        defaults: &ModuleDefaults,
    ) -> Result<Self, ConfigError> {
        let mut modules = HashMap::with_capacity(file.modules.len());
        for (name, spec) in file.modules {
            let module = Module::from_spec(spec, defaults)
                .map_err(|e| ConfigError::Invalid(format!("module '{}': {}", name, e)))?;
            modules.insert(name, Arc::new(module));
        }
        Ok(Config { modules })
    }

    pub fn module(&self, name: &str) -> Option<Arc<Module>> {
        self.modules.get(name).cloned()
    }
}

/// Everything one probe needs: where to send and which module to use
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub target: String,
    pub module: Arc<Module>,
}

impl ProbeConfig {
    /// Pair a target with a module, failing before any network activity if
    /// either is unusable
    pub fn new(target: impl Into<String>, module: Arc<Module>) -> ProbeResult<Self> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(ProbeError::Configuration("No target specified".to_string()));
        }
        module
            .validate()
            .map_err(|e| ProbeError::Configuration(e.to_string()))?;
        Ok(ProbeConfig { target, module })
    }
}

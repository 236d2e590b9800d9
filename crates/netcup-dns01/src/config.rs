//! Provider configuration and environment loading
//!
//! Environment access always goes through a lookup function so that callers
//! (and tests) can supply a snapshot instead of the process environment.
//!
//! Every required variable also accepts a `<NAME>_FILE` companion pointing at
//! a file that holds the secret.

use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{NetcupError, NetcupResult};

/// Customer number environment variable
pub const ENV_CUSTOMER_NUMBER: &str = "NETCUP_CUSTOMER_NUMBER";
/// API key environment variable
pub const ENV_API_KEY: &str = "NETCUP_API_KEY";
/// API password environment variable
pub const ENV_API_PASSWORD: &str = "NETCUP_API_PASSWORD";
/// Domain used by live tests
pub const ENV_DOMAIN: &str = "NETCUP_DOMAIN";

pub const ENV_PROPAGATION_TIMEOUT: &str = "NETCUP_PROPAGATION_TIMEOUT";
pub const ENV_POLLING_INTERVAL: &str = "NETCUP_POLLING_INTERVAL";
pub const ENV_HTTP_TIMEOUT: &str = "NETCUP_HTTP_TIMEOUT";

/// Required credential variables, in the order they are reported
pub const REQUIRED_ENV_VARS: [&str; 3] = [ENV_CUSTOMER_NUMBER, ENV_API_KEY, ENV_API_PASSWORD];

/// Suffix of the variable naming a file that holds a credential
const FILE_SUFFIX: &str = "_FILE";

/// netcup CCP JSON endpoint
pub const DEFAULT_ENDPOINT: &str =
    "https://ccp.netcup.net/run/webservice/servers/endpoint.php?JSON";

pub const DEFAULT_PROPAGATION_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the netcup provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetcupConfig {
    /// Customer number
    pub customer: String,
    /// API key
    pub key: String,
    /// API password
    pub password: String,
    /// How long an orchestrator should wait for the record to propagate
    pub propagation_timeout: Duration,
    /// How often an orchestrator should poll for propagation
    pub polling_interval: Duration,
    /// Timeout applied to every API request
    pub http_timeout: Duration,
    /// API endpoint URL
    pub endpoint: String,
}

impl Default for NetcupConfig {
    fn default() -> Self {
        Self {
            customer: String::new(),
            key: String::new(),
            password: String::new(),
            propagation_timeout: DEFAULT_PROPAGATION_TIMEOUT,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl NetcupConfig {
    /// Default configuration with tuning values taken from `lookup`.
    /// Credentials are left empty.
    pub fn with_env_defaults<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            propagation_timeout: parse_secs(
                &lookup,
                ENV_PROPAGATION_TIMEOUT,
                DEFAULT_PROPAGATION_TIMEOUT,
            ),
            polling_interval: parse_secs(&lookup, ENV_POLLING_INTERVAL, DEFAULT_POLLING_INTERVAL),
            http_timeout: parse_secs(&lookup, ENV_HTTP_TIMEOUT, DEFAULT_HTTP_TIMEOUT),
            ..Self::default()
        }
    }

    /// Load a complete configuration from the process environment
    pub fn from_env() -> NetcupResult<Self> {
        Self::from_env_lookup(process_env)
    }

    /// Load a complete configuration through `lookup`
    ///
    /// Fails with every missing credential variable named, in declaration
    /// order.
    pub fn from_env_lookup<F>(lookup: F) -> NetcupResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = Vec::with_capacity(REQUIRED_ENV_VARS.len());
        let mut missing = Vec::new();

        for name in REQUIRED_ENV_VARS {
            match read_credential(&lookup, name) {
                Some(value) => values.push(value),
                None => missing.push(name),
            }
        }

        if !missing.is_empty() {
            return Err(NetcupError::MissingEnvCredentials(missing));
        }

        let mut values = values.into_iter();
        let mut config = Self::with_env_defaults(&lookup);
        config.customer = values.next().unwrap_or_default();
        config.key = values.next().unwrap_or_default();
        config.password = values.next().unwrap_or_default();

        debug!(customer = %config.customer, "Loaded netcup credentials from environment");
        Ok(config)
    }

    /// Whether all three credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.customer.is_empty() && !self.key.is_empty() && !self.password.is_empty()
    }

    /// Set the API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Lookup backed by the process environment
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Read a credential, falling back to `<name>_FILE`
///
/// Unset and empty values both count as missing.
fn read_credential<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
        return Some(value);
    }

    let file_var = format!("{}{}", name, FILE_SUFFIX);
    let path = lookup(&file_var).filter(|p| !p.is_empty())?;
    read_secret_file(Path::new(&path))
}

fn read_secret_file(path: &Path) -> Option<String> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if let Ok(metadata) = fs::metadata(path) {
            let file_mode = metadata.permissions().mode() & 0o777;
            // Only owner should have access (0600 or 0400)
            if file_mode & 0o077 != 0 {
                warn!(
                    path = %path.display(),
                    mode = format!("{:o}", file_mode),
                    "Credentials file has overly permissive permissions (should be 0600 or 0400)"
                );
            }
        }
    }

    match fs::read_to_string(path) {
        Ok(content) => {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                warn!(path = %path.display(), "Credentials file is empty");
                None
            } else {
                debug!(path = %path.display(), "Loaded credential from file");
                Some(trimmed.to_string())
            }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read credentials file");
            None
        }
    }
}

fn parse_secs<F>(lookup: &F, name: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name).filter(|v| !v.trim().is_empty()) else {
        return default;
    };

    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!(
                variable = name,
                value = %raw,
                default_secs = default.as_secs(),
                "Invalid duration in environment, using default"
            );
            default
        }
    }
}

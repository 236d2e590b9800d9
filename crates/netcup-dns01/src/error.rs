//! Error types for the netcup DNS provider

use thiserror::Error;

/// Result type for netcup provider operations
pub type NetcupResult<T> = Result<T, NetcupError>;

/// Errors that can occur while building or driving the netcup provider
#[derive(Debug, Error)]
pub enum NetcupError {
    /// One or more required environment variables were unset or empty
    #[error("netcup: some credentials information are missing: {}", .0.join(","))]
    MissingEnvCredentials(Vec<&'static str>),

    /// A configuration was supplied without all three credentials
    #[error("netcup: netcup credentials missing")]
    MissingCredentials,

    /// The HTTP client could not be built
    #[error("netcup: failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Transport-level failure while calling an API action
    #[error("netcup: {action} request failed: {source}")]
    Request {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// API action did not answer within the configured HTTP timeout
    #[error("netcup: {action} timed out after {elapsed_secs}s")]
    Timeout {
        action: &'static str,
        elapsed_secs: u64,
    },

    /// Non-success HTTP status from the endpoint
    #[error("netcup: {action} returned HTTP {status}: {body}")]
    HttpStatus {
        action: &'static str,
        status: u16,
        body: String,
    },

    /// Response payload could not be decoded
    #[error("netcup: failed to decode {action} response: {message}")]
    Decode {
        action: &'static str,
        message: String,
    },

    /// API answered with a non-success status
    #[error("netcup: {action} failed with status '{status}' ({status_code}): {short_message}")]
    Api {
        action: &'static str,
        status: String,
        status_code: u32,
        short_message: String,
        long_message: String,
    },

    /// API request quota exhausted
    #[error("netcup: {action} rate limited: {message}")]
    RateLimited {
        action: &'static str,
        message: String,
    },

    /// Credentials were rejected
    #[error("netcup: authentication failed: {0}")]
    Authentication(String),

    /// No zone in the customer account covers the domain
    ///
    /// `cause` carries the last answer the API gave for a candidate zone.
    #[error(
        "netcup: zone not found for domain '{domain}'{}",
        .cause.as_deref().map(|c| format!(": {}", c)).unwrap_or_default()
    )]
    ZoneNotFound {
        domain: String,
        cause: Option<String>,
    },

    /// Record creation failed
    #[error("netcup: failed to add TXT record '{hostname}' in zone '{zone}': {message}")]
    RecordCreation {
        hostname: String,
        zone: String,
        message: String,
    },

    /// The challenge record to remove does not exist
    #[error("netcup: no TXT record '{hostname}' with the challenge value in zone '{zone}'")]
    RecordNotFound { hostname: String, zone: String },

    /// Record deletion failed
    #[error("netcup: failed to remove TXT record '{hostname}' in zone '{zone}': {message}")]
    RecordDeletion {
        hostname: String,
        zone: String,
        message: String,
    },
}

impl NetcupError {
    /// Status code reported by the API, if this is an API error
    pub fn status_code(&self) -> Option<u32> {
        match self {
            NetcupError::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Short description without the `netcup:` prefix, used when nesting
    /// one failure inside a record-level error.
    pub(crate) fn detail(&self) -> String {
        match self {
            NetcupError::Api {
                status_code,
                short_message,
                long_message,
                ..
            } if !long_message.is_empty() => {
                format!("{} ({}): {}", short_message, status_code, long_message)
            }
            NetcupError::Api {
                status_code,
                short_message,
                ..
            } => format!("{} ({})", short_message, status_code),
            other => {
                let text = other.to_string();
                text.strip_prefix("netcup: ").unwrap_or(&text).to_string()
            }
        }
    }
}

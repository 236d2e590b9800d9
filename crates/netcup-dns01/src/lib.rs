//! DNS-01 challenge provider for the netcup CCP DNS API
//!
//! Publishes and removes the `_acme-challenge` TXT record that ACME servers
//! check during DNS-01 validation.
//!
//! # Architecture
//!
//! - [`NetcupProvider`] - Credential-gated provider with `present` / `clean_up`
//! - [`NetcupConfig`] - Credentials and tuning, loadable from the environment
//! - [`NetcupClient`] - netcup JSON API client (session, record listing, updates)
//! - [`Dns01Record`] - Challenge record name and value
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), netcup_dns01::NetcupError> {
//! use netcup_dns01::NetcupProvider;
//!
//! // Reads NETCUP_CUSTOMER_NUMBER, NETCUP_API_KEY and NETCUP_API_PASSWORD
//! let provider = NetcupProvider::from_env()?;
//!
//! provider.present("example.com", "token", "token.thumbprint").await?;
//! // ... let the ACME server validate ...
//! provider.clean_up("example.com", "token", "token.thumbprint").await?;
//! # Ok(())
//! # }
//! ```

pub mod challenge;
pub mod client;
pub mod config;
mod error;
pub mod logging;
mod provider;

pub use challenge::{challenge_record_fqdn, compute_challenge_value, normalize_domain, Dns01Record};
pub use client::{DnsRecord, NetcupClient};
pub use config::NetcupConfig;
pub use error::{NetcupError, NetcupResult};
pub use provider::NetcupProvider;

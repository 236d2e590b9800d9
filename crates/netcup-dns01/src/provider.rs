//! netcup DNS provider for DNS-01 challenges
//!
//! Creates and removes `_acme-challenge` TXT records through the netcup CCP
//! API. Each operation runs in its own API session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info, trace, warn};

use crate::challenge::{normalize_domain, record_name_for_zone, zone_candidates, Dns01Record};
use crate::client::{DnsRecord, NetcupClient};
use crate::config::NetcupConfig;
use crate::error::{NetcupError, NetcupResult};

/// netcup DNS provider
///
/// Only constructed through [`NetcupProvider::new`] or one of the
/// environment constructors, so the credentials it holds are always
/// non-empty.
#[derive(Debug)]
pub struct NetcupProvider {
    config: NetcupConfig,
    client: NetcupClient,
    /// Cache of normalized domain -> zone name
    zone_cache: Arc<RwLock<HashMap<String, String>>>,
}

impl NetcupProvider {
    /// Provider name used in logs
    pub const NAME: &'static str = "netcup";

    /// Create a provider from the process environment
    pub fn from_env() -> NetcupResult<Self> {
        Self::new(NetcupConfig::from_env()?)
    }

    /// Create a provider from an environment snapshot
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the value of an environment variable, if set
    pub fn from_env_lookup<F>(lookup: F) -> NetcupResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(NetcupConfig::from_env_lookup(lookup)?)
    }

    /// Create a provider from an explicit configuration
    ///
    /// Fails without naming fields if any credential is empty. No request
    /// is sent.
    pub fn new(config: NetcupConfig) -> NetcupResult<Self> {
        if !config.has_credentials() {
            return Err(NetcupError::MissingCredentials);
        }

        let client = NetcupClient::new(
            &config.endpoint,
            &config.customer,
            &config.key,
            &config.password,
            config.http_timeout,
        )?;

        Ok(Self {
            config,
            client,
            zone_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Configuration the provider was built from
    pub fn config(&self) -> &NetcupConfig {
        &self.config
    }

    /// API client bound to the provider's credentials
    pub fn client(&self) -> &NetcupClient {
        &self.client
    }

    /// Propagation timeout and polling interval for orchestrators
    pub fn timeout(&self) -> (Duration, Duration) {
        (self.config.propagation_timeout, self.config.polling_interval)
    }

    /// Create the TXT record that fulfils the DNS-01 challenge
    ///
    /// If the record already exists with the same value nothing is sent.
    pub async fn present(&self, domain: &str, token: &str, key_auth: &str) -> NetcupResult<()> {
        let record = Dns01Record::new(domain, key_auth);

        info!(
            domain = %domain,
            record = %record.fqdn,
            token = %token,
            provider = Self::NAME,
            "Creating DNS-01 challenge record"
        );

        let session_id = self.client.login().await?;
        let result = self.present_in_session(&session_id, domain, &record).await;
        self.close_session(&session_id).await;
        result
    }

    /// Remove the TXT record created by [`present`](Self::present)
    ///
    /// Errors are returned as-is; the record may need manual removal.
    pub async fn clean_up(&self, domain: &str, token: &str, key_auth: &str) -> NetcupResult<()> {
        let record = Dns01Record::new(domain, key_auth);

        debug!(
            domain = %domain,
            record = %record.fqdn,
            token = %token,
            provider = Self::NAME,
            "Cleaning up DNS-01 challenge record"
        );

        let session_id = self.client.login().await?;
        let result = self.clean_up_in_session(&session_id, domain, &record).await;
        self.close_session(&session_id).await;

        match &result {
            Ok(()) => info!(domain = %domain, "DNS-01 challenge record cleaned up"),
            Err(e) => warn!(
                domain = %domain,
                record = %record.fqdn,
                error = %e,
                "Failed to clean up DNS-01 challenge record"
            ),
        }
        result
    }

    async fn present_in_session(
        &self,
        session_id: &str,
        domain: &str,
        record: &Dns01Record,
    ) -> NetcupResult<()> {
        let (zone, existing) = self.find_zone(session_id, domain).await?;
        let hostname = record_name_for_zone(&record.fqdn, &zone);

        if existing.iter().any(|r| r.is_txt(&hostname, &record.value)) {
            debug!(zone = %zone, hostname = %hostname, "TXT record already present");
            return Ok(());
        }

        debug!(zone = %zone, hostname = %hostname, "Adding TXT record");

        self.client
            .update_dns_records(session_id, &zone, &[DnsRecord::txt(&hostname, &record.value)])
            .await
            .map_err(|e| NetcupError::RecordCreation {
                hostname: hostname.clone(),
                zone: zone.clone(),
                message: e.detail(),
            })?;

        info!(zone = %zone, hostname = %hostname, "DNS-01 challenge record created");
        Ok(())
    }

    async fn clean_up_in_session(
        &self,
        session_id: &str,
        domain: &str,
        record: &Dns01Record,
    ) -> NetcupResult<()> {
        let (zone, existing) = self.find_zone(session_id, domain).await?;
        let hostname = record_name_for_zone(&record.fqdn, &zone);

        let mut target = existing
            .into_iter()
            .find(|r| r.is_txt(&hostname, &record.value))
            .ok_or_else(|| NetcupError::RecordNotFound {
                hostname: hostname.clone(),
                zone: zone.clone(),
            })?;
        target.delete_record = true;

        debug!(zone = %zone, hostname = %hostname, record_id = %target.id, "Deleting TXT record");

        self.client
            .update_dns_records(session_id, &zone, &[target])
            .await
            .map_err(|e| NetcupError::RecordDeletion {
                hostname,
                zone,
                message: e.detail(),
            })?;

        Ok(())
    }

    /// Find the zone for a domain along with its current records
    ///
    /// Tries the domain and each parent, longest first. An API error on a
    /// candidate means "not a zone of this account" and the walk moves on;
    /// rate limiting and transport failures abort it.
    async fn find_zone(
        &self,
        session_id: &str,
        domain: &str,
    ) -> NetcupResult<(String, Vec<DnsRecord>)> {
        let normalized = normalize_domain(domain).to_ascii_lowercase();

        let cached = self.zone_cache.read().get(&normalized).cloned();
        if let Some(zone) = cached {
            trace!(domain = %domain, zone = %zone, "Zone found in cache");
            let records = self.client.info_dns_records(session_id, &zone).await?;
            return Ok((zone, records));
        }

        let mut last_error = None;
        for candidate in zone_candidates(&normalized) {
            match self.client.info_dns_records(session_id, candidate).await {
                Ok(records) => {
                    self.zone_cache
                        .write()
                        .insert(normalized.clone(), candidate.to_string());
                    debug!(
                        domain = %domain,
                        zone = %candidate,
                        records = records.len(),
                        "Found zone for domain"
                    );
                    return Ok((candidate.to_string(), records));
                }
                Err(e @ NetcupError::Api { .. }) => {
                    trace!(
                        candidate = %candidate,
                        error = %e,
                        "Not a zone of this account"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(NetcupError::ZoneNotFound {
            domain: domain.to_string(),
            cause: last_error.map(|e| e.detail()),
        })
    }

    async fn close_session(&self, session_id: &str) {
        if let Err(e) = self.client.logout(session_id).await {
            warn!(error = %e, "Failed to close netcup API session");
        }
    }
}

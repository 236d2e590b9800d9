//! DNS-01 challenge record computation
//!
//! Derives the `_acme-challenge` record name and TXT value for a domain and
//! key authorization, and maps record names onto netcup zone-relative
//! hostnames.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// ACME challenge record name prefix
pub const ACME_CHALLENGE_RECORD: &str = "_acme-challenge";

/// Hostname netcup uses for the zone apex
pub const ZONE_APEX: &str = "@";

/// The TXT record a DNS-01 challenge expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dns01Record {
    /// Fully qualified record name, without trailing dot
    pub fqdn: String,
    /// Base64url-encoded SHA-256 digest of the key authorization
    pub value: String,
}

impl Dns01Record {
    /// Compute the challenge record for `domain` and `key_authorization`
    pub fn new(domain: &str, key_authorization: &str) -> Self {
        Self {
            fqdn: challenge_record_fqdn(domain),
            value: compute_challenge_value(key_authorization),
        }
    }
}

/// Compute the DNS-01 challenge value from key authorization
///
/// The value is the unpadded base64url encoding of the SHA-256 digest of the
/// key authorization.
pub fn compute_challenge_value(key_authorization: &str) -> String {
    let digest = Sha256::digest(key_authorization.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Strip a wildcard label and any trailing dot from a domain
///
/// `*.example.com.` becomes `example.com`. The zone lookup is done by the
/// provider.
pub fn normalize_domain(domain: &str) -> &str {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    domain.strip_prefix("*.").unwrap_or(domain)
}

/// Build the full ACME challenge record name
///
/// For `example.com` and `*.example.com`, returns `_acme-challenge.example.com`
pub fn challenge_record_fqdn(domain: &str) -> String {
    format!(
        "{}.{}",
        ACME_CHALLENGE_RECORD,
        normalize_domain(domain).to_ascii_lowercase()
    )
}

/// Extract a record name relative to its zone
pub fn record_name_for_zone(fqdn: &str, zone_name: &str) -> String {
    if fqdn == zone_name {
        ZONE_APEX.to_string()
    } else if let Some(stripped) = fqdn.strip_suffix(&format!(".{}", zone_name)) {
        stripped.to_string()
    } else {
        fqdn.to_string()
    }
}

/// Candidate zone names for a domain, longest first
///
/// `a.b.example.com` yields `a.b.example.com`, `b.example.com`,
/// `example.com`. Single-label names never qualify as a zone.
pub fn zone_candidates(domain: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    let mut current = normalize_domain(domain);

    while let Some(pos) = current.find('.') {
        candidates.push(current);
        current = &current[pos + 1..];
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("*.example.com"), "example.com");
        assert_eq!(normalize_domain("sub.example.com"), "sub.example.com");
        assert_eq!(normalize_domain("*.sub.example.com"), "sub.example.com");
        assert_eq!(normalize_domain("example.com."), "example.com");
    }

    #[test]
    fn test_challenge_record_fqdn() {
        assert_eq!(
            challenge_record_fqdn("example.com"),
            "_acme-challenge.example.com"
        );
        assert_eq!(
            challenge_record_fqdn("*.example.com"),
            "_acme-challenge.example.com"
        );
        assert_eq!(
            challenge_record_fqdn("*.sub.example.com"),
            "_acme-challenge.sub.example.com"
        );
        assert_eq!(
            challenge_record_fqdn("*.Sub.EXAMPLE.com."),
            "_acme-challenge.sub.example.com"
        );
    }

    #[test]
    fn test_compute_challenge_value() {
        assert_eq!(
            compute_challenge_value("123d=="),
            "ADw2sEd82DUgXcQ9hNBZThJs7zVJkR5v9JeSbAb9mZY"
        );
        assert_eq!(
            compute_challenge_value("token.thumbprint"),
            "61rBZ_4knHblO0MNoxFsXZ_eTFUHum0B6IVRbhvUn5I"
        );

        let value = compute_challenge_value("evaGxfADs6pSRb2LAv9IZf17Dt3juxGJ-PCt92wr-oA.key");
        assert_eq!(value.len(), 43);
        assert!(!value.contains('+'));
        assert!(!value.contains('/'));
        assert!(!value.contains('='));
    }

    #[test]
    fn test_dns01_record_for_wildcard() {
        let plain = Dns01Record::new("example.com", "token.thumbprint");
        let wildcard = Dns01Record::new("*.example.com", "token.thumbprint");

        assert_eq!(plain, wildcard);
        assert_eq!(plain.fqdn, "_acme-challenge.example.com");
    }

    #[test]
    fn test_record_name_for_zone() {
        assert_eq!(record_name_for_zone("example.com", "example.com"), "@");
        assert_eq!(
            record_name_for_zone("_acme-challenge.example.com", "example.com"),
            "_acme-challenge"
        );
        assert_eq!(
            record_name_for_zone("_acme-challenge.sub.example.com", "example.com"),
            "_acme-challenge.sub"
        );
        // Not inside the zone: left untouched
        assert_eq!(
            record_name_for_zone("_acme-challenge.other.org", "example.com"),
            "_acme-challenge.other.org"
        );
    }

    #[test]
    fn test_zone_candidates() {
        assert_eq!(
            zone_candidates("a.b.example.com"),
            vec!["a.b.example.com", "b.example.com", "example.com"]
        );
        assert_eq!(zone_candidates("*.example.com"), vec!["example.com"]);
        assert!(zone_candidates("localhost").is_empty());
    }
}

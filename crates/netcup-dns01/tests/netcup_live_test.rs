//! Live tests against the real netcup API
//!
//! Run with credentials and a domain of the account:
//!
//! ```text
//! NETCUP_CUSTOMER_NUMBER=... NETCUP_API_KEY=... NETCUP_API_PASSWORD=... \
//! NETCUP_DOMAIN=example.com cargo test --test netcup_live_test -- --ignored
//! ```

use std::collections::HashMap;

use netcup_dns01::config::{process_env, ENV_DOMAIN, REQUIRED_ENV_VARS};
use netcup_dns01::NetcupProvider;

/// Snapshot of the provider's variables in the process environment
struct EnvTest {
    values: HashMap<&'static str, String>,
    domain: Option<String>,
}

impl EnvTest {
    fn capture() -> Self {
        let values = REQUIRED_ENV_VARS
            .iter()
            .filter_map(|name| process_env(name).map(|value| (*name, value)))
            .collect();

        Self {
            values,
            domain: process_env(ENV_DOMAIN).filter(|d| !d.is_empty()),
        }
    }

    fn is_live_test(&self) -> bool {
        self.domain.is_some()
            && REQUIRED_ENV_VARS
                .iter()
                .all(|name| self.values.get(name).is_some_and(|v| !v.is_empty()))
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

#[tokio::test]
#[ignore = "Requires netcup API credentials and NETCUP_DOMAIN"]
async fn live_present_and_clean_up() {
    let env = EnvTest::capture();
    if !env.is_live_test() {
        eprintln!("skipping live test: netcup credentials or NETCUP_DOMAIN not set");
        return;
    }

    let provider = NetcupProvider::from_env_lookup(|name| env.lookup(name)).unwrap();
    let zone = env.domain.clone().unwrap_or_default();

    let domains = [
        zone.clone(),
        format!("sub.{}", zone),
        format!("*.{}", zone),
        format!("*.sub.{}", zone),
    ];

    for domain in &domains {
        provider
            .present(domain, "987d", "123d==")
            .await
            .unwrap_or_else(|e| panic!("present({}) failed: {}", domain, e));

        provider
            .clean_up(domain, "987d", "123d==")
            .await
            .unwrap_or_else(|e| {
                panic!(
                    "clean_up({}) failed, did not clean up! Please remove record yourself: {}",
                    domain, e
                )
            });
    }
}

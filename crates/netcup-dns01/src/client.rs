//! netcup CCP DNS API client
//!
//! Every action is a JSON POST to a single endpoint:
//!
//! ```text
//! POST https://ccp.netcup.net/run/webservice/servers/endpoint.php?JSON
//! Content-Type: application/json
//!
//! {
//!   "action": "infoDnsRecords",
//!   "param": {
//!     "domainname": "example.com",
//!     "customernumber": "12345",
//!     "apikey": "...",
//!     "apisessionid": "..."
//!   }
//! }
//!
//! Response:
//! {
//!   "serverrequestid": "...",
//!   "action": "infoDnsRecords",
//!   "status": "success",
//!   "statuscode": 2000,
//!   "shortmessage": "DNS records found",
//!   "longmessage": "...",
//!   "responsedata": { "dnsrecords": [ ... ] }
//! }
//! ```
//!
//! A session is opened with `login` and closed with `logout`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{NetcupError, NetcupResult};

const ACTION_LOGIN: &str = "login";
const ACTION_LOGOUT: &str = "logout";
const ACTION_INFO_DNS_RECORDS: &str = "infoDnsRecords";
const ACTION_UPDATE_DNS_RECORDS: &str = "updateDnsRecords";

const STATUS_SUCCESS: &str = "success";

/// Status code `infoDnsRecords` answers with when a zone has no records
pub const STATUS_CODE_NO_RECORDS: u32 = 5029;

/// Status code `login` answers with when credentials are rejected
pub const STATUS_CODE_VALIDATION_ERROR: u32 = 4013;

/// Marker in the message netcup sends once the request quota is used up
const RATE_LIMIT_MARKER: &str = "requests per minute";

/// TXT record type
pub const RECORD_TYPE_TXT: &str = "TXT";

/// Client for the netcup CCP DNS API
#[derive(Debug, Clone)]
pub struct NetcupClient {
    http: Client,
    endpoint: String,
    customer: String,
    key: String,
    password: String,
    timeout: Duration,
}

impl NetcupClient {
    /// Create a new client
    ///
    /// Builds the HTTP client only; no request is sent.
    pub fn new(
        endpoint: &str,
        customer: &str,
        key: &str,
        password: &str,
        timeout: Duration,
    ) -> NetcupResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NetcupError::HttpClient)?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            customer: customer.to_string(),
            key: key.to_string(),
            password: password.to_string(),
            timeout,
        })
    }

    /// Endpoint URL this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Customer number this client authenticates as
    pub fn customer(&self) -> &str {
        &self.customer
    }

    /// Open an API session and return its session ID
    pub async fn login(&self) -> NetcupResult<String> {
        let param = LoginParam {
            customer_number: &self.customer,
            api_key: &self.key,
            api_password: &self.password,
        };

        let data: LoginResponse = self
            .call(ACTION_LOGIN, &param)
            .await
            .map_err(|e| match e {
                NetcupError::Api {
                    status_code: STATUS_CODE_VALIDATION_ERROR,
                    short_message,
                    ..
                } => NetcupError::Authentication(short_message),
                other => other,
            })?;

        debug!(customer = %self.customer, "Opened netcup API session");
        Ok(data.api_session_id)
    }

    /// Close an API session
    pub async fn logout(&self, session_id: &str) -> NetcupResult<()> {
        let param = SessionParam {
            customer_number: &self.customer,
            api_key: &self.key,
            api_session_id: session_id,
        };

        let _: IgnoredAny = self.call(ACTION_LOGOUT, &param).await?;
        debug!(customer = %self.customer, "Closed netcup API session");
        Ok(())
    }

    /// List the records of a zone
    ///
    /// An empty zone yields an empty list rather than an error.
    pub async fn info_dns_records(
        &self,
        session_id: &str,
        zone: &str,
    ) -> NetcupResult<Vec<DnsRecord>> {
        let param = ZoneParam {
            domain_name: zone,
            customer_number: &self.customer,
            api_key: &self.key,
            api_session_id: session_id,
            dns_record_set: None,
        };

        match self
            .call::<_, DnsRecordSet>(ACTION_INFO_DNS_RECORDS, &param)
            .await
        {
            Ok(set) => Ok(set.dns_records),
            Err(e) if e.status_code() == Some(STATUS_CODE_NO_RECORDS) => {
                trace!(zone = %zone, "Zone has no DNS records");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Submit record changes for a zone
    ///
    /// Records without an ID are created, records with `delete_record` set
    /// are removed. Returns the zone's record set after the update.
    pub async fn update_dns_records(
        &self,
        session_id: &str,
        zone: &str,
        records: &[DnsRecord],
    ) -> NetcupResult<Vec<DnsRecord>> {
        let param = ZoneParam {
            domain_name: zone,
            customer_number: &self.customer,
            api_key: &self.key,
            api_session_id: session_id,
            dns_record_set: Some(DnsRecordSetRef {
                dns_records: records,
            }),
        };

        let set: DnsRecordSet = self.call(ACTION_UPDATE_DNS_RECORDS, &param).await?;
        Ok(set.dns_records)
    }

    /// Send one action and decode its `responsedata`
    async fn call<P, R>(&self, action: &'static str, param: &P) -> NetcupResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        trace!(action = action, "Sending netcup API request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&ApiRequest { action, param })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NetcupError::Timeout {
                        action,
                        elapsed_secs: self.timeout.as_secs(),
                    }
                } else {
                    NetcupError::Request { action, source: e }
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(NetcupError::Authentication(format!(
                "{} rejected with HTTP {}",
                action, status
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetcupError::HttpStatus {
                action,
                status: status.as_u16(),
                body,
            });
        }

        let body: ApiResponse = response.json().await.map_err(|e| NetcupError::Decode {
            action,
            message: e.to_string(),
        })?;

        if body.status != STATUS_SUCCESS {
            debug!(
                action = action,
                status = %body.status,
                status_code = body.status_code,
                message = %body.short_message,
                "netcup API reported failure"
            );

            if is_rate_limited(&body.short_message, &body.long_message) {
                let message = if body.long_message.is_empty() {
                    body.short_message
                } else {
                    body.long_message
                };
                return Err(NetcupError::RateLimited { action, message });
            }

            return Err(NetcupError::Api {
                action,
                status: body.status,
                status_code: body.status_code,
                short_message: body.short_message,
                long_message: body.long_message,
            });
        }

        serde_json::from_value(body.response_data).map_err(|e| NetcupError::Decode {
            action,
            message: e.to_string(),
        })
    }
}

/// A DNS record as exchanged with the netcup API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Record ID, empty for records not yet created
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Hostname relative to the zone (`@` for the apex)
    pub hostname: String,
    /// Record type, e.g. `TXT`
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priority: String,
    /// Record data
    pub destination: String,
    /// Set to remove the record on update
    #[serde(rename = "deleterecord", default)]
    pub delete_record: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
}

impl DnsRecord {
    /// New TXT record for `hostname` carrying `value`
    pub fn txt(hostname: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            hostname: hostname.into(),
            record_type: RECORD_TYPE_TXT.to_string(),
            priority: String::new(),
            destination: value.into(),
            delete_record: false,
            state: String::new(),
        }
    }

    /// Whether this is the TXT record `hostname` = `value`
    pub fn is_txt(&self, hostname: &str, value: &str) -> bool {
        self.record_type.eq_ignore_ascii_case(RECORD_TYPE_TXT)
            && self.hostname.eq_ignore_ascii_case(hostname)
            && self.destination == value
    }
}

fn is_rate_limited(short_message: &str, long_message: &str) -> bool {
    [short_message, long_message]
        .iter()
        .any(|m| m.to_ascii_lowercase().contains(RATE_LIMIT_MARKER))
}

// Wire types

#[derive(Serialize)]
struct ApiRequest<'a, P> {
    action: &'a str,
    param: &'a P,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(rename = "statuscode", default)]
    status_code: u32,
    #[serde(rename = "shortmessage", default)]
    short_message: String,
    #[serde(rename = "longmessage", default)]
    long_message: String,
    /// Object on success, empty string on most failures
    #[serde(rename = "responsedata", default)]
    response_data: serde_json::Value,
}

#[derive(Serialize)]
struct LoginParam<'a> {
    #[serde(rename = "customernumber")]
    customer_number: &'a str,
    #[serde(rename = "apikey")]
    api_key: &'a str,
    #[serde(rename = "apipassword")]
    api_password: &'a str,
}

#[derive(Serialize)]
struct SessionParam<'a> {
    #[serde(rename = "customernumber")]
    customer_number: &'a str,
    #[serde(rename = "apikey")]
    api_key: &'a str,
    #[serde(rename = "apisessionid")]
    api_session_id: &'a str,
}

#[derive(Serialize)]
struct ZoneParam<'a> {
    #[serde(rename = "domainname")]
    domain_name: &'a str,
    #[serde(rename = "customernumber")]
    customer_number: &'a str,
    #[serde(rename = "apikey")]
    api_key: &'a str,
    #[serde(rename = "apisessionid")]
    api_session_id: &'a str,
    #[serde(rename = "dnsrecordset", skip_serializing_if = "Option::is_none")]
    dns_record_set: Option<DnsRecordSetRef<'a>>,
}

#[derive(Serialize)]
struct DnsRecordSetRef<'a> {
    #[serde(rename = "dnsrecords")]
    dns_records: &'a [DnsRecord],
}

#[derive(Debug, Deserialize)]
struct DnsRecordSet {
    #[serde(rename = "dnsrecords", default)]
    dns_records: Vec<DnsRecord>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "apisessionid")]
    api_session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_does_not_touch_network() {
        let client = NetcupClient::new(
            "http://127.0.0.1:9/endpoint.php",
            "A",
            "B",
            "C",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/endpoint.php");
        assert_eq!(client.customer(), "A");
    }

    #[test]
    fn test_dns_record_wire_format() {
        let record = DnsRecord::txt("_acme-challenge", "value");
        let encoded = serde_json::to_value(&record).unwrap();
        assert_eq!(
            encoded,
            json!({
                "hostname": "_acme-challenge",
                "type": "TXT",
                "destination": "value",
                "deleterecord": false
            })
        );

        let decoded: DnsRecord = serde_json::from_value(json!({
            "id": "42",
            "hostname": "@",
            "type": "A",
            "priority": "0",
            "destination": "192.0.2.1",
            "deleterecord": false,
            "state": "yes"
        }))
        .unwrap();
        assert_eq!(decoded.id, "42");
        assert_eq!(decoded.record_type, "A");
        assert_eq!(decoded.state, "yes");
    }

    #[test]
    fn test_is_txt() {
        let record = DnsRecord::txt("_acme-challenge", "value");
        assert!(record.is_txt("_acme-challenge", "value"));
        assert!(!record.is_txt("_acme-challenge", "other"));
        assert!(!record.is_txt("_acme-challenge.sub", "value"));
        assert!(record.is_txt("_ACME-challenge", "value"));

        let mut upper = DnsRecord::txt("_acme-challenge.Sub", "value");
        upper.id = "7".to_string();
        assert!(upper.is_txt("_acme-challenge.sub", "value"));

        let mut lower = record.clone();
        lower.record_type = "txt".to_string();
        assert!(lower.is_txt("_acme-challenge", "value"));
    }

    #[test]
    fn test_zone_param_omits_empty_record_set() {
        let param = ZoneParam {
            domain_name: "example.com",
            customer_number: "A",
            api_key: "B",
            api_session_id: "S",
            dns_record_set: None,
        };
        let encoded = serde_json::to_value(&ApiRequest {
            action: ACTION_INFO_DNS_RECORDS,
            param: &param,
        })
        .unwrap();

        assert_eq!(
            encoded,
            json!({
                "action": "infoDnsRecords",
                "param": {
                    "domainname": "example.com",
                    "customernumber": "A",
                    "apikey": "B",
                    "apisessionid": "S"
                }
            })
        );
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limited(
            "Validation Error.",
            "More than 180 requests per minute. Please wait and retry later."
        ));
        assert!(!is_rate_limited("Validation Error.", ""));
        assert!(!is_rate_limited("Domain not found", "The domain is not in this account."));
    }

    #[test]
    fn test_error_response_with_string_payload() {
        let body: ApiResponse = serde_json::from_value(json!({
            "serverrequestid": "abc",
            "clientrequestid": "",
            "action": "login",
            "status": "error",
            "statuscode": 4013,
            "shortmessage": "Validation Error.",
            "longmessage": "More than 180 requests per minute.",
            "responsedata": ""
        }))
        .unwrap();

        assert_eq!(body.status, "error");
        assert_eq!(body.status_code, 4013);
        assert_eq!(body.response_data, json!(""));
    }
}

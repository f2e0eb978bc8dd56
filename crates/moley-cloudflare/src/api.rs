use serde::Deserialize;
use tracing::debug;

use crate::error::CloudflareError;

const API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Minimal REST client for the Cloudflare DNS surface. Only the handful
/// of read/delete operations `DnsPort` needs are wrapped; everything else
/// about tunnel lifecycle goes through the `cloudflared` CLI instead.
pub struct CloudflareApiClient {
    http: reqwest::Client,
    api_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    pub content: String,
}

impl CloudflareApiClient {
    pub fn new(api_token: String) -> Self {
        Self { http: reqwest::Client::new(), api_token }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(&self.api_token)
    }

    pub async fn zone_id(&self, zone: &str) -> Result<String, CloudflareError> {
        let url = format!("{API_BASE}/zones");
        let response =
            self.authed(self.http.get(&url).query(&[("name", zone)])).send().await?.error_for_status()?;
        let body: ApiResponse<Vec<Zone>> = response.json().await?;

        match body.result.as_slice() {
            [] => Err(CloudflareError::ZoneNotFound(zone.to_string())),
            [zone] => Ok(zone.id.clone()),
            _ => Err(CloudflareError::AmbiguousZone(zone.to_string())),
        }
    }

    pub async fn find_record(
        &self,
        zone_id: &str,
        name: &str,
        content: &str,
    ) -> Result<Option<DnsRecord>, CloudflareError> {
        let url = format!("{API_BASE}/zones/{zone_id}/dns_records");
        let response = self
            .authed(self.http.get(&url).query(&[("name", name), ("content", content)]))
            .send()
            .await?
            .error_for_status()?;
        let body: ApiResponse<Vec<DnsRecord>> = response.json().await?;
        Ok(body.result.into_iter().next())
    }

    pub async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), CloudflareError> {
        let url = format!("{API_BASE}/zones/{zone_id}/dns_records/{record_id}");
        debug!(zone_id, record_id, "deleting dns record");
        self.authed(self.http.delete(&url)).send().await?.error_for_status()?;
        Ok(())
    }
}

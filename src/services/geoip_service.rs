use crate::models::GeoLocation;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// ip-api.com style response
#[derive(Debug, Deserialize)]
struct GeoIpResponse {
    status: Option<String>,
    country: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
}

#[derive(Clone)]
pub struct GeoIpClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl GeoIpClient {
    /// `None` disables lookups entirely
    pub fn new(base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_default();

        Self { client, base_url }
    }

    /// Best-effort lookup. Never fails: errors are logged and yield `None`.
    pub async fn lookup(&self, ip: &str) -> Option<GeoLocation> {
        let base_url = self.base_url.as_ref()?;

        if !is_public_ip(ip) {
            log::debug!("🌍 Skipping geo lookup for non-public address {}", ip);
            return None;
        }

        let url = format!("{}/{}", base_url, ip);

        let response = match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                log::warn!("⚠️  Geo-IP lookup returned {}", r.status());
                return None;
            }
            Err(e) => {
                log::warn!("⚠️  Geo-IP lookup failed: {}", e);
                return None;
            }
        };

        match response.json::<GeoIpResponse>().await {
            Ok(body) => to_location(body),
            Err(e) => {
                log::warn!("⚠️  Geo-IP response parse failed: {}", e);
                None
            }
        }
    }
}

fn to_location(body: GeoIpResponse) -> Option<GeoLocation> {
    if body.status.as_deref() == Some("fail") {
        return None;
    }
    if body.country.is_none() && body.city.is_none() {
        return None;
    }
    Some(GeoLocation {
        country: body.country,
        region: body.region_name,
        city: body.city,
    })
}

pub fn is_public_ip(ip: &str) -> bool {
    match ip.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation())
        }
        Ok(IpAddr::V6(v6)) => {
            let unique_local = (v6.segments()[0] & 0xfe00) == 0xfc00;
            let link_local = (v6.segments()[0] & 0xffc0) == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_ip_detection() {
        assert!(is_public_ip("8.8.8.8"));
        assert!(is_public_ip("2606:4700:4700::1111"));
        assert!(!is_public_ip("127.0.0.1"));
        assert!(!is_public_ip("192.168.1.20"));
        assert!(!is_public_ip("10.0.0.1"));
        assert!(!is_public_ip("::1"));
        assert!(!is_public_ip("fd12:3456::1"));
        assert!(!is_public_ip("not-an-ip"));
    }

    #[test]
    fn test_failed_status_yields_none() {
        let body = GeoIpResponse {
            status: Some("fail".into()),
            country: None,
            region_name: None,
            city: None,
        };
        assert!(to_location(body).is_none());
    }

    #[test]
    fn test_response_mapping() {
        let body: GeoIpResponse = serde_json::from_value(serde_json::json!({
            "status": "success",
            "country": "Germany",
            "regionName": "Berlin",
            "city": "Berlin"
        }))
        .unwrap();

        let geo = to_location(body).unwrap();
        assert_eq!(geo.country.as_deref(), Some("Germany"));
        assert_eq!(geo.region.as_deref(), Some("Berlin"));
    }

    #[tokio::test]
    async fn test_disabled_client_skips_lookup() {
        let client = GeoIpClient::new(None);
        assert!(client.lookup("8.8.8.8").await.is_none());
    }

    #[tokio::test]
    async fn test_private_ip_skips_lookup() {
        // Unroutable base URL: the request must never be attempted
        let client = GeoIpClient::new(Some("http://127.0.0.1:9".to_string()));
        assert!(client.lookup("192.168.0.4").await.is_none());
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::client::{ClientProvider, DnsRecordsApi};
use crate::config::CloudflareConfig;
use crate::record::{DnsRecord, NewDnsRecord};

// Largest page size the dns_records listing accepts without batching.
const PAGE_SIZE: u32 = 100;
// Upper bound on pages fetched for one zone listing.
const MAX_PAGES: u32 = 500;

/// Authenticated client for the Cloudflare v4 DNS record endpoints.
pub struct CloudflareClient {
    client: Client,
    api_base: String,
    api_token: String,
}

impl CloudflareClient {
    pub fn new(config: &CloudflareConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<CloudflareResponse<T>> {
        let (status, body) = self.execute(request, action).await?;
        parse_response(status, &body, action)
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<(StatusCode, String)> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to Cloudflare", action))?;

        let status = response.status();
        debug!("Cloudflare {} responded with {}", action, status);

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read Cloudflare {} response", action))?;

        Ok((status, body))
    }
}

fn parse_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    action: &str,
) -> Result<CloudflareResponse<T>> {
    let parsed: CloudflareResponse<T> = serde_json::from_str(body).with_context(|| {
        format!("Failed to parse Cloudflare {} response (HTTP {})", action, status)
    })?;

    if !parsed.success || !status.is_success() {
        let errors: Vec<String> = parsed
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect();
        let detail = if errors.is_empty() {
            "unknown error".to_string()
        } else {
            errors.join(", ")
        };
        anyhow::bail!("Cloudflare API error (HTTP {}): {}", status, detail);
    }

    Ok(parsed)
}

#[async_trait]
impl DnsRecordsApi for CloudflareClient {
    async fn create_record(&self, zone_id: &str, record: &NewDnsRecord) -> Result<DnsRecord> {
        let url = self.records_url(zone_id);
        debug!("POST {}", url);

        let response: CloudflareResponse<DnsRecord> = self
            .send(self.client.post(&url).json(record), "create")
            .await?;

        response
            .result
            .ok_or_else(|| anyhow::anyhow!("No result in Cloudflare response"))
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        let url = self.records_url(zone_id);
        let mut records = Vec::new();
        let mut page = 1;
        let mut previous_first_id: Option<String> = None;

        loop {
            debug!("GET {} (page {})", url, page);
            let request = self
                .client
                .get(&url)
                .query(&[("page", page), ("per_page", PAGE_SIZE)]);
            let response: CloudflareResponse<Vec<DnsRecord>> = self.send(request, "list").await?;

            let batch = response.result.unwrap_or_default();
            let fetched = batch.len() as u32;

            let first_id = batch.first().and_then(|r| r.id.clone());
            if page > 1 && first_id.is_some() && first_id == previous_first_id {
                anyhow::bail!(
                    "Cloudflare returned page {} of zone {} twice; pagination is being ignored",
                    page,
                    zone_id
                );
            }
            previous_first_id = first_id;
            records.extend(batch);

            let more = match response.result_info {
                Some(ResultInfo {
                    total_pages: Some(total_pages),
                    ..
                }) => page < total_pages,
                Some(ResultInfo {
                    total_count: Some(total_count),
                    ..
                }) => (records.len() as u64) < total_count,
                _ => fetched == PAGE_SIZE,
            };
            if !more || fetched == 0 {
                break;
            }
            if page >= MAX_PAGES {
                anyhow::bail!(
                    "Zone {} has more than {} pages of DNS records",
                    zone_id,
                    MAX_PAGES
                );
            }
            page += 1;
        }

        Ok(records)
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.records_url(zone_id), record_id);
        debug!("DELETE {}", url);

        let (status, body) = self.execute(self.client.delete(&url), "delete").await?;
        if status.is_success() && body.trim().is_empty() {
            return Ok(());
        }
        let _: CloudflareResponse<serde_json::Value> = parse_response(status, &body, "delete")?;

        Ok(())
    }
}

/// Builds a [`CloudflareClient`] from config on first use and shares it afterwards.
pub struct CloudflareClientProvider {
    config: CloudflareConfig,
    client: OnceCell<Arc<CloudflareClient>>,
}

impl CloudflareClientProvider {
    pub fn new(config: CloudflareConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }
}

#[async_trait]
impl ClientProvider for CloudflareClientProvider {
    type Client = CloudflareClient;

    async fn get(&self, cancel: &CancellationToken) -> Result<Arc<CloudflareClient>> {
        if cancel.is_cancelled() {
            anyhow::bail!("Cancelled before the Cloudflare client was ready");
        }

        let client = self
            .client
            .get_or_try_init(|| async {
                debug!("Building Cloudflare client for {}", self.config.api_base);
                CloudflareClient::new(&self.config).map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(client))
    }
}

// Cloudflare API types

#[derive(Debug, Deserialize)]
struct CloudflareResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<CloudflareError>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct CloudflareError {
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    total_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AUTO_TTL;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ZONE: &str = "023e105f4ecef8ad9ca31a8372d0c353";

    fn client_for(server: &MockServer) -> CloudflareClient {
        let mut config = CloudflareConfig::new("test_token_12345");
        config.api_base = format!("{}/client/v4/", server.uri());
        CloudflareClient::new(&config).unwrap()
    }

    fn records_path() -> String {
        format!("/client/v4/zones/{}/dns_records", ZONE)
    }

    #[tokio::test]
    async fn test_create_record_posts_typed_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(records_path()))
            .and(header("Authorization", "Bearer test_token_12345"))
            .and(body_json(json!({
                "type": "MX",
                "name": "example.com",
                "content": "mail.example.com",
                "ttl": 1,
                "proxied": false,
                "priority": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "messages": [],
                "result": {
                    "id": "rec-1",
                    "type": "MX",
                    "name": "example.com",
                    "content": "mail.example.com",
                    "priority": 10,
                    "ttl": 1,
                    "proxied": false
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = NewDnsRecord::Mx {
            name: "example.com".to_string(),
            content: "mail.example.com".to_string(),
            priority: 10,
            ttl: AUTO_TTL,
        };
        let created = client_for(&server).create_record(ZONE, &record).await.unwrap();

        assert_eq!(created.id.as_deref(), Some("rec-1"));
        assert_eq!(created.priority, Some(10));
    }

    #[tokio::test]
    async fn test_create_record_surfaces_api_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(records_path()))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "errors": [{ "code": 81057, "message": "Record already exists." }],
                "messages": [],
                "result": null
            })))
            .mount(&server)
            .await;

        let record = NewDnsRecord::A {
            name: "www.example.com".to_string(),
            content: "192.0.2.1".to_string(),
            ttl: AUTO_TTL,
            proxied: true,
        };
        let err = client_for(&server).create_record(ZONE, &record).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("81057: Record already exists."), "{}", message);
        assert!(message.contains("400"), "{}", message);
    }

    #[tokio::test]
    async fn test_non_json_body_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(format!("{}/rec-1", records_path())))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server).delete_record(ZONE, "rec-1").await.unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_list_records_follows_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(records_path()))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": [
                    { "id": "1", "type": "A", "name": "a.example.com" },
                    { "id": "2", "type": "CNAME", "name": "b.example.com" }
                ],
                "result_info": { "page": 1, "per_page": 100, "count": 2, "total_count": 3, "total_pages": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(records_path()))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": [{ "id": "3", "type": "TXT", "name": "c.example.com" }],
                "result_info": { "page": 2, "per_page": 100, "count": 1, "total_count": 3, "total_pages": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = client_for(&server).list_records(ZONE).await.unwrap();
        let ids: Vec<_> = records.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_list_records_null_result_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(records_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = client_for(&server).list_records(ZONE).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_list_records_stops_when_pages_repeat() {
        let server = MockServer::start().await;

        let full_page: Vec<_> = (0..100)
            .map(|i| json!({ "id": format!("rec-{}", i), "type": "A", "name": "a.example.com" }))
            .collect();

        Mock::given(method("GET"))
            .and(path(records_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": full_page
            })))
            .expect(2)
            .mount(&server)
            .await;

        let err = client_for(&server).list_records(ZONE).await.unwrap_err();
        assert!(err.to_string().contains("twice"), "{}", err);
    }

    #[tokio::test]
    async fn test_list_records_stops_at_total_count() {
        let server = MockServer::start().await;

        let full_page: Vec<_> = (0..100)
            .map(|i| json!({ "id": format!("rec-{}", i), "type": "TXT", "name": "t.example.com" }))
            .collect();

        Mock::given(method("GET"))
            .and(path(records_path()))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": full_page,
                "result_info": { "page": 1, "per_page": 100, "count": 100, "total_count": 100 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = client_for(&server).list_records(ZONE).await.unwrap();
        assert_eq!(records.len(), 100);
    }

    #[tokio::test]
    async fn test_delete_record_accepts_empty_body() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(format!("{}/rec-1", records_path())))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path(format!("{}/rec-2", records_path())))
            .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.delete_record(ZONE, "rec-1").await.unwrap();
        client.delete_record(ZONE, "rec-2").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_record_empty_error_body_still_fails() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(format!("{}/rec-1", records_path())))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).delete_record(ZONE, "rec-1").await.unwrap_err();
        assert!(err.to_string().contains("404"), "{}", err);
    }

    #[tokio::test]
    async fn test_delete_record() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(format!("{}/rec-9", records_path())))
            .and(header("Authorization", "Bearer test_token_12345"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": { "id": "rec-9" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete_record(ZONE, "rec-9").await.unwrap();
    }

    #[tokio::test]
    async fn test_provider_builds_client_once() {
        let provider = CloudflareClientProvider::new(CloudflareConfig::new("token"));
        let cancel = CancellationToken::new();

        let first = provider.get(&cancel).await.unwrap();
        let second = provider.get(&cancel).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_provider_respects_cancelled_token() {
        let provider = CloudflareClientProvider::new(CloudflareConfig::new("token"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(provider.get(&cancel).await.is_err());
    }
}

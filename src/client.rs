//! Seams between the facade and whatever talks to Cloudflare.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::record::{DnsRecord, NewDnsRecord};

/// The DNS record endpoints of one authenticated API client.
#[async_trait]
pub trait DnsRecordsApi: Send + Sync {
    /// `POST /zones/{zone_id}/dns_records`
    async fn create_record(&self, zone_id: &str, record: &NewDnsRecord) -> Result<DnsRecord>;

    /// `GET /zones/{zone_id}/dns_records`, every page.
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>>;

    /// `DELETE /zones/{zone_id}/dns_records/{record_id}`
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()>;
}

/// Hands out a ready-to-use client.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    type Client: DnsRecordsApi;

    async fn get(&self, cancel: &CancellationToken) -> Result<Arc<Self::Client>>;
}

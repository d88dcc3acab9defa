//! High-level record operations on top of a [`ClientProvider`].
//!
//! Every method is one stateless round trip (or a list followed by deletes).
//! Inputs are checked locally before the provider is touched; client failures
//! are logged and handed back unchanged as [`DnsRecordsError::Remote`].

use std::future::Future;
use std::sync::Arc;

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::client::{ClientProvider, DnsRecordsApi};
use crate::config::CloudflareConfig;
use crate::error::{require, DnsRecordsError, Result};
use crate::provider::CloudflareClientProvider;
use crate::record::{DnsRecord, NewDnsRecord, RecordType};

pub struct DnsRecordsFacade<P> {
    provider: P,
}

/// The facade wired to the real Cloudflare API.
pub type CloudflareDnsRecords = DnsRecordsFacade<CloudflareClientProvider>;

impl DnsRecordsFacade<CloudflareClientProvider> {
    pub fn from_config(config: CloudflareConfig) -> Self {
        Self::new(CloudflareClientProvider::new(config))
    }
}

// Races a client call against the caller's token. A cancelled call is dropped,
// which aborts the in-flight request.
async fn guard<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = anyhow::Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DnsRecordsError::Cancelled),
        result = call => result.map_err(DnsRecordsError::Remote),
    }
}

impl<P: ClientProvider> DnsRecordsFacade<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn add_a_record(
        &self,
        zone_id: &str,
        name: &str,
        content: &str,
        ttl: u32,
        proxied: bool,
        cancel: &CancellationToken,
    ) -> Result<DnsRecord> {
        let record = NewDnsRecord::A {
            name: name.to_string(),
            content: content.to_string(),
            ttl,
            proxied,
        };
        self.add_record(zone_id, &record, cancel).await
    }

    pub async fn add_cname_record(
        &self,
        zone_id: &str,
        name: &str,
        content: &str,
        ttl: u32,
        proxied: bool,
        cancel: &CancellationToken,
    ) -> Result<DnsRecord> {
        let record = NewDnsRecord::Cname {
            name: name.to_string(),
            content: content.to_string(),
            ttl,
            proxied,
        };
        self.add_record(zone_id, &record, cancel).await
    }

    /// TXT records are never proxied.
    pub async fn add_txt_record(
        &self,
        zone_id: &str,
        name: &str,
        content: &str,
        ttl: u32,
        cancel: &CancellationToken,
    ) -> Result<DnsRecord> {
        let record = NewDnsRecord::Txt {
            name: name.to_string(),
            content: content.to_string(),
            ttl,
        };
        self.add_record(zone_id, &record, cancel).await
    }

    /// MX records are never proxied. Lower `priority` is preferred.
    pub async fn add_mx_record(
        &self,
        zone_id: &str,
        name: &str,
        content: &str,
        priority: u16,
        ttl: u32,
        cancel: &CancellationToken,
    ) -> Result<DnsRecord> {
        let record = NewDnsRecord::Mx {
            name: name.to_string(),
            content: content.to_string(),
            priority,
            ttl,
        };
        self.add_record(zone_id, &record, cancel).await
    }

    /// Submits a prepared record with a single create call.
    pub async fn add_record(
        &self,
        zone_id: &str,
        record: &NewDnsRecord,
        cancel: &CancellationToken,
    ) -> Result<DnsRecord> {
        require(zone_id, "zone_id")?;
        require(record.name(), "name")?;
        require(record.content(), "content")?;
        if record.ttl() == 0 {
            return Err(DnsRecordsError::InvalidArgument(
                "ttl must be at least 1".to_string(),
            ));
        }

        let record_type = record.record_type();
        info!(
            "Adding {} record for zone {}: {} -> {}",
            record_type,
            zone_id,
            record.name(),
            record.content()
        );

        let client = self.client(cancel).await?;
        let created = guard(cancel, client.create_record(zone_id, record))
            .await
            .inspect_err(|e| {
                error!(
                    "Failed to add {} record for zone {}: {}: {}",
                    record_type,
                    zone_id,
                    record.name(),
                    e
                )
            })?;

        info!(
            "Successfully added {} record for zone {}: {}",
            record_type,
            zone_id,
            record.name()
        );
        Ok(created)
    }

    pub async fn list_records(
        &self,
        zone_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<DnsRecord>> {
        require(zone_id, "zone_id")?;
        let client = self.client(cancel).await?;
        self.list_with(&client, zone_id, cancel).await
    }

    /// Issues exactly one delete call. Whether the id exists is up to Cloudflare to report.
    pub async fn delete_record_by_id(
        &self,
        zone_id: &str,
        record_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        require(zone_id, "zone_id")?;
        require(record_id, "record_id")?;

        let client = self.client(cancel).await?;
        self.delete_with(&client, zone_id, record_id, cancel).await
    }

    /// Deletes the first record (in provider list order) whose name and type
    /// match case-insensitively. Finding nothing is not an error.
    pub async fn delete_record_by_name_and_type(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        require(zone_id, "zone_id")?;
        require(name, "name")?;
        require(record_type, "record_type")?;

        info!(
            "Deleting {} record {} from zone {}",
            record_type, name, zone_id
        );

        let client = self.client(cancel).await?;
        let records = self.list_with(&client, zone_id, cancel).await?;

        if records.is_empty() {
            warn!("No DNS records found in zone {}", zone_id);
            return Ok(());
        }

        let Some(record) = records
            .iter()
            .find(|r| r.has_name(name) && r.has_type(record_type))
        else {
            warn!(
                "No {} record found with name {} in zone {}",
                record_type, name, zone_id
            );
            return Ok(());
        };

        let Some(record_id) = record.id.as_deref() else {
            let message = format!(
                "record id is missing for {} record {} in zone {}",
                record_type, name, zone_id
            );
            error!("{}", message);
            return Err(DnsRecordsError::InvariantViolation(message));
        };

        self.delete_with(&client, zone_id, record_id, cancel).await
    }

    /// Deletes every record of `record_type`, one at a time in list order.
    /// Entries without an id are skipped. The first failed delete stops the
    /// batch; records already deleted stay deleted. Returns how many were deleted.
    pub async fn delete_records_by_type(
        &self,
        zone_id: &str,
        record_type: &str,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        require(zone_id, "zone_id")?;
        require(record_type, "record_type")?;

        info!("Deleting all {} records from zone {}", record_type, zone_id);

        let client = self.client(cancel).await?;
        let records = self.list_with(&client, zone_id, cancel).await?;

        if records.is_empty() {
            warn!("No DNS records found in zone {}", zone_id);
            return Ok(0);
        }

        let mut deleted = 0;
        for record in records.iter().filter(|r| r.has_type(record_type)) {
            let Some(record_id) = record.id.as_deref() else {
                warn!(
                    "Skipping {} record {} without an id in zone {}",
                    record_type,
                    record.name.as_deref().unwrap_or("-"),
                    zone_id
                );
                continue;
            };

            self.delete_with(&client, zone_id, record_id, cancel)
                .await
                .inspect_err(|_| {
                    error!(
                        "Failed to delete all {} records from zone {} ({} deleted)",
                        record_type, zone_id, deleted
                    )
                })?;
            deleted += 1;
        }

        info!(
            "Successfully deleted {} {} record(s) from zone {}",
            deleted, record_type, zone_id
        );
        Ok(deleted)
    }

    pub async fn remove_a_record(
        &self,
        zone_id: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.delete_record_by_name_and_type(zone_id, name, RecordType::A.as_str(), cancel)
            .await
    }

    pub async fn remove_cname_record(
        &self,
        zone_id: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.delete_record_by_name_and_type(zone_id, name, RecordType::Cname.as_str(), cancel)
            .await
    }

    pub async fn remove_txt_record(
        &self,
        zone_id: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.delete_record_by_name_and_type(zone_id, name, RecordType::Txt.as_str(), cancel)
            .await
    }

    pub async fn remove_mx_record(
        &self,
        zone_id: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.delete_record_by_name_and_type(zone_id, name, RecordType::Mx.as_str(), cancel)
            .await
    }

    async fn client(&self, cancel: &CancellationToken) -> Result<Arc<P::Client>> {
        guard(cancel, self.provider.get(cancel)).await
    }

    async fn list_with(
        &self,
        client: &P::Client,
        zone_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<DnsRecord>> {
        guard(cancel, client.list_records(zone_id))
            .await
            .inspect_err(|e| error!("Failed to list DNS records in zone {}: {}", zone_id, e))
    }

    async fn delete_with(
        &self,
        client: &P::Client,
        zone_id: &str,
        record_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        info!("Deleting DNS record {} from zone {}", record_id, zone_id);

        guard(cancel, client.delete_record(zone_id, record_id))
            .await
            .inspect_err(|e| {
                error!(
                    "Failed to delete DNS record {} from zone {}: {}",
                    record_id, zone_id, e
                )
            })?;

        info!(
            "Successfully deleted DNS record {} from zone {}",
            record_id, zone_id
        );
        Ok(())
    }
}

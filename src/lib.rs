//! Cloudflare DNS records
//!
//! Adds and removes A, CNAME, TXT and MX records in a Cloudflare zone.
//!
//! ```no_run
//! use cloudflare_dns_records::{CloudflareConfig, CloudflareDnsRecords, AUTO_TTL};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> cloudflare_dns_records::Result<()> {
//! let records = CloudflareDnsRecords::from_config(CloudflareConfig::new("api-token"));
//! let cancel = CancellationToken::new();
//!
//! records
//!     .add_a_record("zone-id", "www.example.com", "192.0.2.1", AUTO_TTL, true, &cancel)
//!     .await?;
//! records.remove_a_record("zone-id", "www.example.com", &cancel).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod facade;
pub mod provider;
pub mod record;

pub use client::{ClientProvider, DnsRecordsApi};
pub use config::CloudflareConfig;
pub use error::{DnsRecordsError, Result};
pub use facade::{CloudflareDnsRecords, DnsRecordsFacade};
pub use provider::{CloudflareClient, CloudflareClientProvider};
pub use record::{DnsRecord, NewDnsRecord, RecordType, AUTO_TTL};

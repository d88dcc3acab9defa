use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// TTL value Cloudflare treats as "automatic".
pub const AUTO_TTL: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    A,
    #[serde(rename = "CNAME")]
    Cname,
    #[serde(rename = "TXT")]
    Txt,
    #[serde(rename = "MX")]
    Mx,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record to be created. Each variant only carries the fields Cloudflare
/// accepts for that type; TXT and MX are never proxied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewDnsRecord {
    A {
        name: String,
        content: String,
        ttl: u32,
        proxied: bool,
    },
    Cname {
        name: String,
        content: String,
        ttl: u32,
        proxied: bool,
    },
    Txt {
        name: String,
        content: String,
        ttl: u32,
    },
    Mx {
        name: String,
        content: String,
        priority: u16,
        ttl: u32,
    },
}

impl NewDnsRecord {
    pub fn record_type(&self) -> RecordType {
        match self {
            NewDnsRecord::A { .. } => RecordType::A,
            NewDnsRecord::Cname { .. } => RecordType::Cname,
            NewDnsRecord::Txt { .. } => RecordType::Txt,
            NewDnsRecord::Mx { .. } => RecordType::Mx,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NewDnsRecord::A { name, .. }
            | NewDnsRecord::Cname { name, .. }
            | NewDnsRecord::Txt { name, .. }
            | NewDnsRecord::Mx { name, .. } => name,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            NewDnsRecord::A { content, .. }
            | NewDnsRecord::Cname { content, .. }
            | NewDnsRecord::Txt { content, .. }
            | NewDnsRecord::Mx { content, .. } => content,
        }
    }

    pub fn ttl(&self) -> u32 {
        match self {
            NewDnsRecord::A { ttl, .. }
            | NewDnsRecord::Cname { ttl, .. }
            | NewDnsRecord::Txt { ttl, .. }
            | NewDnsRecord::Mx { ttl, .. } => *ttl,
        }
    }

    pub fn proxied(&self) -> bool {
        match self {
            NewDnsRecord::A { proxied, .. } | NewDnsRecord::Cname { proxied, .. } => *proxied,
            NewDnsRecord::Txt { .. } | NewDnsRecord::Mx { .. } => false,
        }
    }

    pub fn priority(&self) -> Option<u16> {
        match self {
            NewDnsRecord::Mx { priority, .. } => Some(*priority),
            _ => None,
        }
    }
}

// Wire body for POST /zones/{zone}/dns_records
#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: RecordType,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u16>,
}

impl Serialize for NewDnsRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CreateRecordRequest {
            record_type: self.record_type(),
            name: self.name(),
            content: self.content(),
            ttl: self.ttl(),
            proxied: self.proxied(),
            priority: self.priority(),
        }
        .serialize(serializer)
    }
}

/// A record as Cloudflare returns it. The well-known fields are lifted out;
/// everything else the provider sends is kept untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DnsRecord {
    /// Case-insensitive type comparison against the raw provider value.
    pub fn has_type(&self, record_type: &str) -> bool {
        self.record_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(record_type))
    }

    /// Case-insensitive name comparison.
    pub fn has_name(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    }
}

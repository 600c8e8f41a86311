use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Sock entity - one catalogue record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Sock {
    /// Unique, immutable identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Image references, in display order
    #[serde(rename = "imageUrl", default)]
    pub image_urls: Vec<String>,
    /// Unit price
    pub price: f64,
    /// Units in stock
    #[serde(rename = "count", default)]
    pub quantity: i32,
    /// Labels used for filtering; absent means none
    #[serde(rename = "tag", default)]
    pub tags: BTreeSet<String>,
}

impl Sock {
    /// True when the sock carries every one of `required` (intersection filter).
    pub fn has_all_tags(&self, required: &[String]) -> bool {
        required.iter().all(|tag| self.tags.contains(tag))
    }
}

/// Field a listing is ordered by
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortKey {
    Id,
    #[default]
    Name,
    Price,
    /// Stock quantity
    Count,
    /// Number of tags on the record
    #[strum(to_string = "tags", serialize = "tag_count", serialize = "tag-count", serialize = "tags-count")]
    #[serde(rename = "tags")]
    TagCount,
}

/// Sort key plus direction. Ascending unless the raw key starts with `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SortOrder {
    pub key: SortKey,
    pub descending: bool,
}

impl SortOrder {
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            descending: false,
        }
    }

    pub fn descending(key: SortKey) -> Self {
        Self {
            key,
            descending: true,
        }
    }

    /// Parse a raw `order` parameter. Never fails: blank or unknown keys fall
    /// back to ascending by name.
    pub fn parse_lenient(raw: &str) -> Self {
        let raw = raw.trim();
        let (descending, key) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest.trim()),
            None => (false, raw),
        };

        match SortKey::from_str(key) {
            Ok(key) => Self { key, descending },
            Err(_) => {
                if !raw.is_empty() {
                    tracing::debug!(order = raw, "Unknown sort key, falling back to name");
                }
                Self::default()
            }
        }
    }

    /// Compare two socks by this order. Equal keys compare `Equal`, so a
    /// stable sort keeps their store order.
    pub fn compare(&self, a: &Sock, b: &Sock) -> Ordering {
        let ordering = match self.key {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Price => a.price.total_cmp(&b.price),
            SortKey::Count => a.quantity.cmp(&b.quantity),
            SortKey::TagCount => a.tags.len().cmp(&b.tags.len()),
        };

        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.key)
        } else {
            write!(f, "{}", self.key)
        }
    }
}

/// Listing query, built per request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    /// Records must carry all of these
    pub tags: Vec<String>,
    pub order: SortOrder,
    /// 1-based; values below 1 mean the first page
    pub page_num: i64,
    /// Values of 0 or less disable pagination
    pub page_size: i64,
}

impl ListQuery {
    pub fn new(tags: Vec<String>) -> Self {
        Self {
            tags,
            ..Default::default()
        }
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, page_num: i64, page_size: i64) -> Self {
        self.page_num = page_num;
        self.page_size = page_size;
        self
    }
}

/// Health status of one dependency
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Point-in-time status of one probed dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthFact {
    /// Probed dependency, e.g. `catalogue` or `catalogue-db`
    pub service: String,
    pub status: HealthStatus,
    /// Probe round-trip in milliseconds
    pub latency_ms: f64,
    /// When the probe finished
    pub time: DateTime<Utc>,
    /// Failure reason for unhealthy probes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthFact {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

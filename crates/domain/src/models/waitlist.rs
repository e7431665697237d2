//! Waitlist domain models.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use shared::validation::normalize_label;

/// Default source tag for signups that do not name one.
pub const DEFAULT_SOURCE: &str = "website";

/// A record of public interest in the not-yet-available paid tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub source: String,
    pub interests: Vec<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub contacted: bool,
    pub converted_to_customer: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn status(&self) -> WaitlistStatus {
        WaitlistStatus::derive(self.contacted, self.converted_to_customer)
    }
}

/// Input for a public waitlist signup. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewWaitlistEntry {
    pub email: String,
    pub name: String,
    pub source: String,
    pub interests: Vec<String>,
}

/// Follow-up status derived from the contacted/converted flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitlistStatus {
    Pending,
    Contacted,
    Converted,
}

impl WaitlistStatus {
    pub fn derive(contacted: bool, converted_to_customer: bool) -> Self {
        if converted_to_customer {
            WaitlistStatus::Converted
        } else if contacted {
            WaitlistStatus::Contacted
        } else {
            WaitlistStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WaitlistStatus::Pending => "pending",
            WaitlistStatus::Contacted => "contacted",
            WaitlistStatus::Converted => "converted",
        }
    }
}

impl FromStr for WaitlistStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(WaitlistStatus::Pending),
            "contacted" => Ok(WaitlistStatus::Contacted),
            "converted" => Ok(WaitlistStatus::Converted),
            _ => Err(format!("Invalid waitlist status: {}", s)),
        }
    }
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-status counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: i64,
    pub contacted: i64,
    pub converted: i64,
}

impl StatusCounts {
    pub fn record(&mut self, status: WaitlistStatus) {
        match status {
            WaitlistStatus::Pending => self.pending += 1,
            WaitlistStatus::Contacted => self.contacted += 1,
            WaitlistStatus::Converted => self.converted += 1,
        }
    }
}

/// Aggregate waitlist statistics for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistStats {
    pub total: i64,
    /// Entries with `created_at >= now - 7 days` (boundary inclusive).
    pub last_week: i64,
    pub by_status: StatusCounts,
}

/// Filter and paging for the admin waitlist listing.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct WaitlistQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: u32,

    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 100, message = "per_page must be between 1 and 100"))]
    pub per_page: u32,

    pub status: Option<WaitlistStatus>,

    #[validate(length(max = 100, message = "Search must be at most 100 characters"))]
    pub search: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

impl Default for WaitlistQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
            status: None,
            search: None,
        }
    }
}

impl WaitlistQuery {
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    /// Trimmed, lowercased search term; `None` when blank.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Whether an entry passes the status and search filters.
    pub fn matches(&self, entry: &WaitlistEntry) -> bool {
        if let Some(status) = self.status {
            if entry.status() != status {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => {
                entry.email.to_lowercase().contains(&term)
                    || entry.name.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

/// Admin changes to a waitlist entry. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct WaitlistUpdate {
    pub contacted: Option<bool>,
    pub converted_to_customer: Option<bool>,
    /// Appended to the notes log, never replaces it.
    pub note: Option<String>,
    pub tag: Option<String>,
}

impl WaitlistUpdate {
    pub fn is_empty(&self) -> bool {
        self.contacted.is_none()
            && self.converted_to_customer.is_none()
            && self.note.is_none()
            && self.tag.is_none()
    }

    /// Applies the update to an in-memory entry.
    pub fn apply(&self, entry: &mut WaitlistEntry, now: DateTime<Utc>) {
        if let Some(contacted) = self.contacted {
            entry.contacted = contacted;
        }
        if let Some(converted) = self.converted_to_customer {
            entry.converted_to_customer = converted;
        }
        if let Some(note) = self.note.as_deref() {
            entry.notes = Some(append_note(entry.notes.as_deref(), note, now));
        }
        if let Some(tag) = self.tag.as_deref() {
            entry.tags = add_tag(&entry.tags, tag);
        }
        entry.updated_at = now;
    }
}

/// Appends a timestamped line to a notes log.
pub fn append_note(existing: Option<&str>, note: &str, at: DateTime<Utc>) -> String {
    let line = format!(
        "[{}] {}",
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        note.trim()
    );
    match existing {
        Some(prev) if !prev.is_empty() => format!("{}\n{}", prev, line),
        _ => line,
    }
}

/// Adds a normalized tag, keeping set semantics and insertion order.
pub fn add_tag(tags: &[String], tag: &str) -> Vec<String> {
    let tag = normalize_label(tag);
    let mut out = tags.to_vec();
    if !tag.is_empty() && !out.iter().any(|t| *t == tag) {
        out.push(tag);
    }
    out
}

/// Normalizes a signup's interests: trimmed, lowercased, deduplicated.
pub fn normalize_interests(interests: &[String]) -> Vec<String> {
    interests
        .iter()
        .fold(Vec::new(), |acc, interest| add_tag(&acc, interest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry() -> WaitlistEntry {
        let now = Utc::now();
        WaitlistEntry {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            name: "Jane Doe".to_string(),
            source: DEFAULT_SOURCE.to_string(),
            interests: vec![],
            notes: None,
            tags: vec![],
            contacted: false,
            converted_to_customer: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(WaitlistStatus::derive(false, false), WaitlistStatus::Pending);
        assert_eq!(WaitlistStatus::derive(true, false), WaitlistStatus::Contacted);
        assert_eq!(WaitlistStatus::derive(true, true), WaitlistStatus::Converted);
        assert_eq!(WaitlistStatus::derive(false, true), WaitlistStatus::Converted);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(WaitlistStatus::from_str("Contacted").unwrap(), WaitlistStatus::Contacted);
        assert!(WaitlistStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_append_note() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let first = append_note(None, " called, left voicemail ", at);
        assert_eq!(first, "[2024-03-01T09:30:00Z] called, left voicemail");

        let later = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();
        let second = append_note(Some(&first), "interested in family plan", later);
        assert_eq!(
            second,
            "[2024-03-01T09:30:00Z] called, left voicemail\n[2024-03-02T10:00:00Z] interested in family plan"
        );
    }

    #[test]
    fn test_add_tag_set_semantics() {
        let tags = add_tag(&[], " VIP ");
        assert_eq!(tags, vec!["vip"]);
        let tags = add_tag(&tags, "vip");
        assert_eq!(tags, vec!["vip"]);
        let tags = add_tag(&tags, "beta");
        assert_eq!(tags, vec!["vip", "beta"]);
        assert_eq!(add_tag(&tags, "   "), tags);
    }

    #[test]
    fn test_normalize_interests() {
        let raw = vec!["Budgeting".to_string(), " budgeting".to_string(), "Alerts".to_string()];
        assert_eq!(normalize_interests(&raw), vec!["budgeting", "alerts"]);
    }

    #[test]
    fn test_update_apply() {
        let mut e = entry();
        let now = Utc::now();
        let update = WaitlistUpdate {
            contacted: Some(true),
            converted_to_customer: None,
            note: Some("sent intro email".to_string()),
            tag: Some("Priority".to_string()),
        };
        update.apply(&mut e, now);
        assert!(e.contacted);
        assert!(!e.converted_to_customer);
        assert_eq!(e.status(), WaitlistStatus::Contacted);
        assert!(e.notes.unwrap().ends_with("sent intro email"));
        assert_eq!(e.tags, vec!["priority"]);
        assert_eq!(e.updated_at, now);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(WaitlistUpdate::default().is_empty());
        assert!(!WaitlistUpdate {
            contacted: Some(false),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_query_defaults_and_offset() {
        let query: WaitlistQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 50);
        assert_eq!(query.offset(), 0);

        let query = WaitlistQuery {
            page: 3,
            per_page: 20,
            ..Default::default()
        };
        assert_eq!(query.offset(), 40);
        assert_eq!(query.limit(), 20);
    }

    #[test]
    fn test_query_validation() {
        let query = WaitlistQuery {
            page: 0,
            ..Default::default()
        };
        assert!(query.validate().is_err());

        let query = WaitlistQuery {
            per_page: 101,
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_query_matches() {
        let mut e = entry();
        let query = WaitlistQuery {
            search: Some("  JANE ".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&e));

        let query = WaitlistQuery {
            status: Some(WaitlistStatus::Contacted),
            ..Default::default()
        };
        assert!(!query.matches(&e));
        e.contacted = true;
        assert!(query.matches(&e));

        let query = WaitlistQuery {
            search: Some("nobody".to_string()),
            ..Default::default()
        };
        assert!(!query.matches(&e));
    }

    #[test]
    fn test_stats_serialization() {
        let stats = WaitlistStats {
            total: 3,
            last_week: 2,
            by_status: StatusCounts {
                pending: 1,
                contacted: 1,
                converted: 1,
            },
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["lastWeek"], 2);
        assert_eq!(json["byStatus"]["converted"], 1);
    }
}

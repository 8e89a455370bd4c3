//! Machine record schema.
//!
//! `MachineDraft` is the unvalidated input shape (prompted strings, CLI
//! flags, or imported JSON fields). `MachineDraft::validate` checks required
//! fields, formats, and allowed-value sets and produces a normalized
//! `MachineRecord`.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::error::{FieldIssue, ValidationError};

/// OS families accepted as the leading word of the `os` label.
pub const KNOWN_OS_FAMILIES: &[&str] = &[
    "arch", "centos", "debian", "fedora", "ios", "linux", "macos", "redhat", "ubuntu", "windows",
];

// ============================================================================
// Closed-set fields
// ============================================================================

/// Machine status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "UP")]
    Up,
    #[serde(rename = "DOWN")]
    Down,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Up => write!(f, "UP"),
            Status::Down => write!(f, "DOWN"),
        }
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("up") {
            Ok(Status::Up)
        } else if s.eq_ignore_ascii_case("down") {
            Ok(Status::Down)
        } else {
            Err(())
        }
    }
}

/// Kind of simulated health probe attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Ping,
    Http,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Ping => write!(f, "ping"),
            ProbeKind::Http => write!(f, "http"),
        }
    }
}

impl FromStr for ProbeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ping") {
            Ok(ProbeKind::Ping)
        } else if s.eq_ignore_ascii_case("http") {
            Ok(ProbeKind::Http)
        } else {
            Err(())
        }
    }
}

// ============================================================================
// MachineRecord
// ============================================================================

/// One simulated VM entry, as persisted in the instances document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineRecord {
    pub id: String,
    pub name: String,
    pub ip: IpAddr,
    pub os: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<ProbeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl MachineRecord {
    /// Leading word of the `os` label, lowercased.
    ///
    /// Used as the grouping key in statistics; "Ubuntu 22.04" and
    /// "ubuntu 24.04" both count under "ubuntu".
    pub fn os_family(&self) -> String {
        self.os
            .split_whitespace()
            .next()
            .map(|word| word.to_lowercase())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Re-run the full rule set against an already-typed record.
    ///
    /// The serde layer only guarantees shape; rules like OS family
    /// membership, percent ranges, and probe/url pairing are checked here.
    pub fn revalidate(&self) -> Result<(), ValidationError> {
        self.to_draft().validate().map(|_| ())
    }

    /// Convert back into the raw input shape, e.g. as the base of an edit.
    pub fn to_draft(&self) -> MachineDraft {
        MachineDraft {
            id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            ip: Some(self.ip.to_string()),
            os: Some(self.os.clone()),
            status: Some(self.status.to_string()),
            cpus: self.cpus.map(|v| v.to_string()),
            memory_mb: self.memory_mb.map(|v| v.to_string()),
            health: self.health.clone(),
            response_time_ms: self.response_time_ms.map(|v| v.to_string()),
            cpu_percent: self.cpu_percent.map(|v| v.to_string()),
            memory_percent: self.memory_percent.map(|v| v.to_string()),
            check: self.check.map(|c| c.to_string()),
            url: self.url.clone(),
        }
    }
}

// ============================================================================
// MachineDraft
// ============================================================================

/// Unvalidated machine input: every field optional, every field a string as
/// the user typed it. `validate` turns a draft into a `MachineRecord` or a
/// `ValidationError` naming each bad field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub ip: Option<String>,
    pub os: Option<String>,
    pub status: Option<String>,
    pub cpus: Option<String>,
    pub memory_mb: Option<String>,
    pub health: Option<String>,
    pub response_time_ms: Option<String>,
    pub cpu_percent: Option<String>,
    pub memory_percent: Option<String>,
    pub check: Option<String>,
    pub url: Option<String>,
}

impl MachineDraft {
    /// Fill unset fields from an existing record, so that empty edit input
    /// keeps the current value. The record's id always wins; it is stable
    /// across edits.
    pub fn merged_over(mut self, current: &MachineRecord) -> MachineDraft {
        let base = current.to_draft();
        self.id = base.id;
        self.name = self.name.or(base.name);
        self.ip = self.ip.or(base.ip);
        self.os = self.os.or(base.os);
        self.status = self.status.or(base.status);
        self.cpus = self.cpus.or(base.cpus);
        self.memory_mb = self.memory_mb.or(base.memory_mb);
        self.health = self.health.or(base.health);
        self.response_time_ms = self.response_time_ms.or(base.response_time_ms);
        self.cpu_percent = self.cpu_percent.or(base.cpu_percent);
        self.memory_percent = self.memory_percent.or(base.memory_percent);
        self.check = self.check.or(base.check);
        self.url = self.url.or(base.url);
        self
    }

    /// Validate the draft and produce a normalized record.
    ///
    /// A missing id is generated (ULID). Name and ip/os/status values are
    /// trimmed; the status is canonicalized to its upper-case form.
    pub fn validate(self) -> Result<MachineRecord, ValidationError> {
        let mut issues = Vec::new();

        let id = match self.id.as_deref().map(str::trim) {
            None => Some(Ulid::new().to_string()),
            Some("") => {
                issues.push(FieldIssue::new("id", "cannot be empty"));
                None
            }
            Some(id) => Some(id.to_string()),
        };

        let name = match self.name.as_deref().map(str::trim) {
            None | Some("") => {
                issues.push(FieldIssue::new("name", "cannot be empty"));
                None
            }
            Some(name) => Some(name.to_string()),
        };

        let ip = match self.ip.as_deref().map(str::trim) {
            None | Some("") => {
                issues.push(FieldIssue::new("ip", "is required"));
                None
            }
            Some(raw) => match raw.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    issues.push(FieldIssue::new(
                        "ip",
                        format!("'{raw}' is not a valid IPv4 or IPv6 address"),
                    ));
                    None
                }
            },
        };

        let os = match self.os.as_deref().map(str::trim) {
            None | Some("") => {
                issues.push(FieldIssue::new("os", "is required"));
                None
            }
            Some(raw) if leading_os_family(raw).is_some() => Some(raw.to_string()),
            Some(raw) => {
                issues.push(FieldIssue::new(
                    "os",
                    format!(
                        "unknown operating system '{raw}', expected one of: {}",
                        KNOWN_OS_FAMILIES.join(", ")
                    ),
                ));
                None
            }
        };

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => {
                issues.push(FieldIssue::new("status", "is required"));
                None
            }
            Some(raw) => match raw.parse::<Status>() {
                Ok(status) => Some(status),
                Err(()) => {
                    issues.push(FieldIssue::new(
                        "status",
                        format!("'{raw}' must be either UP or DOWN"),
                    ));
                    None
                }
            },
        };

        let cpus = parse_optional::<u32>(self.cpus.as_deref(), "cpus", "a whole number", &mut issues);
        if let Some(0) = cpus {
            issues.push(FieldIssue::new("cpus", "must be at least 1"));
        }
        let memory_mb = parse_optional::<u64>(
            self.memory_mb.as_deref(),
            "memory_mb",
            "a whole number",
            &mut issues,
        );

        let response_time_ms = parse_optional::<f64>(
            self.response_time_ms.as_deref(),
            "response_time_ms",
            "a number",
            &mut issues,
        );
        if let Some(ms) = response_time_ms
            && ms < 0.0
        {
            issues.push(FieldIssue::new("response_time_ms", "cannot be negative"));
        }

        let cpu_percent =
            parse_optional::<f64>(self.cpu_percent.as_deref(), "cpu_percent", "a number", &mut issues);
        let memory_percent = parse_optional::<f64>(
            self.memory_percent.as_deref(),
            "memory_percent",
            "a number",
            &mut issues,
        );
        for (field, value) in [("cpu_percent", cpu_percent), ("memory_percent", memory_percent)] {
            if let Some(pct) = value
                && !(0.0..=100.0).contains(&pct)
            {
                issues.push(FieldIssue::new(field, format!("{pct} is outside 0..=100")));
            }
        }

        let check = match self.check.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<ProbeKind>() {
                Ok(kind) => Some(kind),
                Err(()) => {
                    issues.push(FieldIssue::new(
                        "check",
                        format!("'{raw}' must be either ping or http"),
                    ));
                    None
                }
            },
        };
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        if check == Some(ProbeKind::Http) && url.is_none() {
            issues.push(FieldIssue::new("url", "is required when check is 'http'"));
        }

        let health = self
            .health
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);

        match (id, name, ip, os, status) {
            (Some(id), Some(name), Some(ip), Some(os), Some(status)) if issues.is_empty() => {
                Ok(MachineRecord {
                    id,
                    name,
                    ip,
                    os,
                    status,
                    cpus,
                    memory_mb,
                    health,
                    response_time_ms,
                    cpu_percent,
                    memory_percent,
                    check,
                    url,
                })
            }
            _ => Err(ValidationError::new(issues)),
        }
    }
}

/// Leading word of an OS label, lowercased, if it names a known family.
fn leading_os_family(label: &str) -> Option<String> {
    let first = label.split_whitespace().next()?;
    let family = first.to_lowercase();
    KNOWN_OS_FAMILIES
        .contains(&family.as_str())
        .then_some(family)
}

fn parse_optional<T: FromStr>(
    raw: Option<&str>,
    field: &'static str,
    expected: &str,
    issues: &mut Vec<FieldIssue>,
) -> Option<T> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            issues.push(FieldIssue::new(field, format!("'{raw}' is not {expected}")));
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_draft() -> MachineDraft {
        MachineDraft {
            name: Some("web-01".to_string()),
            ip: Some("10.0.0.5".to_string()),
            os: Some("Ubuntu 22.04".to_string()),
            status: Some("UP".to_string()),
            ..MachineDraft::default()
        }
    }

    #[test]
    fn validate_minimal_draft() {
        let record = minimal_draft().validate().unwrap();
        assert_eq!(record.name, "web-01");
        assert_eq!(record.ip, "10.0.0.5".parse::<IpAddr>().unwrap());
        assert_eq!(record.os, "Ubuntu 22.04");
        assert_eq!(record.status, Status::Up);
        assert!(!record.id.is_empty());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = minimal_draft().validate().unwrap();
        let b = minimal_draft().validate().unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn explicit_id_is_kept() {
        let mut draft = minimal_draft();
        draft.id = Some("vm-1".to_string());
        let record = draft.validate().unwrap();
        assert_eq!(record.id, "vm-1");
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut draft = minimal_draft();
        draft.name = Some("   ".to_string());
        let err = draft.validate().unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == "name"));
    }

    #[test]
    fn bad_ip_is_rejected() {
        let mut draft = minimal_draft();
        draft.ip = Some("999.1.2.3".to_string());
        let err = draft.validate().unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == "ip"));
    }

    #[test]
    fn ipv6_is_accepted() {
        let mut draft = minimal_draft();
        draft.ip = Some("::1".to_string());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn unknown_os_family_is_rejected() {
        let mut draft = minimal_draft();
        draft.os = Some("TempleOS 5.03".to_string());
        let err = draft.validate().unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == "os"));
    }

    #[test]
    fn os_family_match_is_case_insensitive() {
        let mut draft = minimal_draft();
        draft.os = Some("WINDOWS Server 2022".to_string());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn status_is_canonicalized() {
        let mut draft = minimal_draft();
        draft.status = Some("down".to_string());
        let record = draft.validate().unwrap();
        assert_eq!(record.status, Status::Down);
        assert_eq!(record.status.to_string(), "DOWN");
    }

    #[test]
    fn bad_status_is_rejected() {
        let mut draft = minimal_draft();
        draft.status = Some("SIDEWAYS".to_string());
        let err = draft.validate().unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == "status"));
    }

    #[test]
    fn multiple_issues_are_all_reported() {
        let draft = MachineDraft {
            status: Some("MAYBE".to_string()),
            ..MachineDraft::default()
        };
        let err = draft.validate().unwrap_err();
        let fields: Vec<_> = err.issues.iter().map(|i| i.field).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"ip"));
        assert!(fields.contains(&"os"));
        assert!(fields.contains(&"status"));
    }

    #[test]
    fn percent_out_of_range_is_rejected() {
        let mut draft = minimal_draft();
        draft.cpu_percent = Some("120".to_string());
        let err = draft.validate().unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == "cpu_percent"));
    }

    #[test]
    fn numeric_fields_parse_from_strings() {
        let mut draft = minimal_draft();
        draft.cpus = Some("4".to_string());
        draft.memory_mb = Some("8192".to_string());
        draft.response_time_ms = Some("12.5".to_string());
        let record = draft.validate().unwrap();
        assert_eq!(record.cpus, Some(4));
        assert_eq!(record.memory_mb, Some(8192));
        assert_eq!(record.response_time_ms, Some(12.5));
    }

    #[test]
    fn garbage_numeric_field_is_rejected() {
        let mut draft = minimal_draft();
        draft.cpus = Some("four".to_string());
        let err = draft.validate().unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == "cpus"));
    }

    #[test]
    fn http_check_requires_url() {
        let mut draft = minimal_draft();
        draft.check = Some("http".to_string());
        let err = draft.validate().unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == "url"));

        let mut draft = minimal_draft();
        draft.check = Some("http".to_string());
        draft.url = Some("http://10.0.0.5/health".to_string());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn edit_merge_keeps_unset_fields() {
        let record = {
            let mut draft = minimal_draft();
            draft.id = Some("vm-1".to_string());
            draft.cpus = Some("2".to_string());
            draft.validate().unwrap()
        };

        let changes = MachineDraft {
            status: Some("DOWN".to_string()),
            ..MachineDraft::default()
        };
        let merged = changes.merged_over(&record).validate().unwrap();
        assert_eq!(merged.id, "vm-1");
        assert_eq!(merged.name, "web-01");
        assert_eq!(merged.status, Status::Down);
        assert_eq!(merged.cpus, Some(2));
    }

    #[test]
    fn edit_merge_cannot_change_id() {
        let record = {
            let mut draft = minimal_draft();
            draft.id = Some("vm-1".to_string());
            draft.validate().unwrap()
        };
        let changes = MachineDraft {
            id: Some("vm-2".to_string()),
            ..MachineDraft::default()
        };
        let merged = changes.merged_over(&record).validate().unwrap();
        assert_eq!(merged.id, "vm-1");
    }

    #[test]
    fn os_family_groups_by_leading_word() {
        let record = minimal_draft().validate().unwrap();
        assert_eq!(record.os_family(), "ubuntu");
    }

    #[test]
    fn record_round_trips_through_json() {
        let mut draft = minimal_draft();
        draft.id = Some("vm-1".to_string());
        draft.check = Some("ping".to_string());
        let record = draft.validate().unwrap();

        let json = serde_json::to_string(&record).unwrap();
        let parsed: MachineRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn revalidate_catches_semantic_drift() {
        let mut record = minimal_draft().validate().unwrap();
        record.os = "SkyNet".to_string();
        record.cpu_percent = Some(250.0);
        let err = record.revalidate().unwrap_err();
        let fields: Vec<_> = err.issues.iter().map(|i| i.field).collect();
        assert!(fields.contains(&"os"));
        assert!(fields.contains(&"cpu_percent"));
    }
}

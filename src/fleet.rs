//! The in-memory machine collection and the operations over it.
//!
//! Operations mutate only the in-memory state; persistence is the caller's
//! job, performed through `store::RecordStore` after every mutation.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::machine::{FieldIssue, MachineDraft, MachineRecord, ValidationError};

// ============================================================================
// Errors
// ============================================================================

/// Errors from collection operations. None of these leave the collection
/// modified.
#[derive(Debug, Error)]
pub enum OpError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Referenced id is absent.
    #[error("no machine with id '{id}'")]
    NotFound { id: String },

    /// Add would collide with an existing id.
    #[error("a machine with id '{id}' already exists")]
    DuplicateId { id: String },
}

// ============================================================================
// MachineCollection
// ============================================================================

/// Ordered collection of machine records, insertion order preserved.
///
/// Serializes as the instances document: `{"instances": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineCollection {
    #[serde(default)]
    instances: Vec<MachineRecord>,
}

impl MachineCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(instances: Vec<MachineRecord>) -> Self {
        Self { instances }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[MachineRecord] {
        &self.instances
    }

    pub fn get(&self, id: &str) -> Option<&MachineRecord> {
        self.instances.iter().find(|rec| rec.id == id)
    }

    /// Existence check by display name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.instances.iter().any(|rec| rec.name == name)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.instances.iter().position(|rec| rec.id == id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Validate and append a new record.
    pub fn add(&mut self, draft: MachineDraft) -> Result<&MachineRecord, OpError> {
        let record = draft.validate()?;
        if self.get(&record.id).is_some() {
            return Err(OpError::DuplicateId { id: record.id });
        }
        let idx = self.instances.len();
        self.instances.push(record);
        Ok(&self.instances[idx])
    }

    /// Merge `changes` over the record with the given id, re-validate, and
    /// replace it in place. Position and id are preserved.
    pub fn edit(&mut self, id: &str, changes: MachineDraft) -> Result<&MachineRecord, OpError> {
        let idx = self.position(id).ok_or_else(|| OpError::NotFound { id: id.to_string() })?;
        let record = changes.merged_over(&self.instances[idx]).validate()?;
        self.instances[idx] = record;
        Ok(&self.instances[idx])
    }

    /// Remove and return the record with the given id.
    pub fn remove(&mut self, id: &str) -> Result<MachineRecord, OpError> {
        let idx = self.position(id).ok_or_else(|| OpError::NotFound { id: id.to_string() })?;
        Ok(self.instances.remove(idx))
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    /// Summary statistics over the collection.
    pub fn stats(&self) -> FleetStats {
        let mut by_status = BTreeMap::new();
        let mut by_os = BTreeMap::new();
        let mut by_health = BTreeMap::new();

        for rec in &self.instances {
            *by_status.entry(rec.status.to_string()).or_insert(0) += 1;
            *by_os.entry(rec.os_family()).or_insert(0) += 1;
            let health = rec
                .health
                .as_deref()
                .map(str::to_uppercase)
                .unwrap_or_else(|| "UNKNOWN".to_string());
            *by_health.entry(health).or_insert(0) += 1;
        }

        FleetStats {
            total: self.instances.len(),
            by_status,
            by_os,
            by_health,
            avg_response_time_ms: mean(self.instances.iter().filter_map(|r| r.response_time_ms)),
            avg_cpu_percent: mean(self.instances.iter().filter_map(|r| r.cpu_percent)),
            avg_memory_percent: mean(self.instances.iter().filter_map(|r| r.memory_percent)),
        }
    }

    /// Re-check every record against the full rule set, one outcome per
    /// record in collection order. Also flags ids that appear more than
    /// once, an invariant no single record can see on its own.
    pub fn audit(&self) -> Vec<Result<(), ValidationError>> {
        let mut id_counts: HashMap<&str, usize> = HashMap::new();
        for rec in &self.instances {
            *id_counts.entry(rec.id.as_str()).or_insert(0) += 1;
        }

        self.instances
            .iter()
            .map(|rec| {
                let mut issues = match rec.revalidate() {
                    Ok(()) => Vec::new(),
                    Err(e) => e.issues,
                };
                if id_counts.get(rec.id.as_str()).copied().unwrap_or(0) > 1 {
                    issues.push(FieldIssue::new(
                        "id",
                        format!("'{}' is shared by more than one machine", rec.id),
                    ));
                }
                if issues.is_empty() {
                    Ok(())
                } else {
                    Err(ValidationError::new(issues))
                }
            })
            .collect()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

// ============================================================================
// FleetStats
// ============================================================================

/// Output of `MachineCollection::stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_os: BTreeMap<String, usize>,
    pub by_health: BTreeMap<String, usize>,
    /// Averages over the records that carry the metric; `None` when none do.
    pub avg_response_time_ms: Option<f64>,
    pub avg_cpu_percent: Option<f64>,
    pub avg_memory_percent: Option<f64>,
}

// ============================================================================
// Tests
// ============================================================================

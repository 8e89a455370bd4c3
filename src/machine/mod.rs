//! Machine record schema and validation.

mod error;
mod record;

pub use error::{FieldIssue, ValidationError};
pub use record::{KNOWN_OS_FAMILIES, MachineDraft, MachineRecord, ProbeKind, Status};

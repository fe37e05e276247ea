//! Breakpoint bookkeeping for a debug session.

use serde::Serialize;

use crate::protocol::WireLocation;

/// The location a caller asked for, echoed back on listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestedLocation {
    /// Script URL the breakpoint was requested against.
    pub url: String,
    /// 0-based line.
    pub line: u32,
    /// 0-based column, when given.
    pub column: Option<u32>,
    /// Condition expression, when given.
    pub condition: Option<String>,
}

/// A location the target actually bound the breakpoint to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    /// Script the breakpoint landed in.
    pub script_id: String,
    /// 0-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
}

impl ResolvedLocation {
    /// Convert a wire location (absent column means 0).
    pub fn from_wire(location: &WireLocation) -> Self {
        Self {
            script_id: location.script_id.clone(),
            line: location.line_number,
            column: location.column_number.unwrap_or(0),
        }
    }
}

/// A breakpoint the session created on the target.
///
/// The id is target-issued. Resolved locations grow as
/// `breakpointResolved` events arrive; scripts parsed later may bind
/// the same breakpoint again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakpointRecord {
    /// Target-issued breakpoint id.
    pub id: String,
    /// What the caller asked for.
    pub requested: RequestedLocation,
    /// Whether the breakpoint is active.
    pub enabled: bool,
    /// Where the target bound it, in arrival order.
    pub resolved: Vec<ResolvedLocation>,
}

/// Breakpoints of one session, keyed by target-issued id,
/// listed in creation order.
#[derive(Debug, Clone, Default)]
pub struct BreakpointTable {
    records: Vec<BreakpointRecord>,
}

impl BreakpointTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record. Identical requested locations may coexist;
    /// the target issues distinct ids for them.
    pub fn insert(&mut self, record: BreakpointRecord) {
        self.records.push(record);
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&BreakpointRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Whether a record with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Remove a record by id, returning it.
    pub fn remove(&mut self, id: &str) -> Option<BreakpointRecord> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(idx))
    }

    /// Append a resolved location to an existing record.
    ///
    /// Returns false when no record matches — late resolves for
    /// removed breakpoints, or breakpoints the target created on its
    /// own, are tolerated.
    pub fn append_resolved(&mut self, id: &str, location: ResolvedLocation) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.resolved.push(location);
                true
            }
            None => false,
        }
    }

    /// All records in creation order.
    pub fn all(&self) -> &[BreakpointRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

//! Run report

use docgeom_core::{MissReason, Resolution, ResolveOutcome};
use std::fmt;

/// Tally of what the resolver did per group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub already_resolved: usize,
    pub centroid: usize,
    pub first_vertex: usize,
    /// No row in the geometry table, or a NULL geometry
    pub not_found: usize,
    pub lookup_failed: usize,
    /// Geometry present but undecodable or without coordinates
    pub undecodable: usize,
    /// Resolved coordinates the source store refused to persist
    pub write_failures: usize,
}

impl ResolutionStats {
    pub fn record(&mut self, outcome: &ResolveOutcome) {
        match &outcome.resolution {
            Resolution::AlreadyResolved => self.already_resolved += 1,
            Resolution::Centroid(_) => self.centroid += 1,
            Resolution::FirstVertex { .. } => self.first_vertex += 1,
            Resolution::Missing(MissReason::NotFound) => self.not_found += 1,
            Resolution::Missing(MissReason::LookupFailed(_)) => self.lookup_failed += 1,
            Resolution::Missing(MissReason::DecodeFailed(_))
            | Resolution::Missing(MissReason::NoCoordinates) => self.undecodable += 1,
        }
        if outcome.write_error.is_some() {
            self.write_failures += 1;
        }
    }

    /// Groups that received the (0.1, 0.1) marker
    pub fn missing(&self) -> usize {
        self.not_found + self.lookup_failed + self.undecodable
    }

    /// Groups that needed a lookup
    pub fn looked_up(&self) -> usize {
        self.centroid + self.first_vertex + self.missing()
    }
}

/// Wall-clock time spent per stage, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimings {
    pub fetch_ms: u64,
    pub aggregate_ms: u64,
    pub resolve_ms: u64,
    pub write_ms: u64,
}

impl StageTimings {
    pub fn total_ms(&self) -> u64 {
        self.fetch_ms + self.aggregate_ms + self.resolve_ms + self.write_ms
    }
}

/// Summary of one completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Table metadata documents read
    pub tables: usize,
    /// Link records read
    pub records: usize,
    /// Link records dropped for the `"undefined"` key
    pub skipped_undefined: usize,
    /// Distinct (table id, key value) pairs
    pub groups: usize,
    pub resolution: ResolutionStats,
    pub rows_written: usize,
    pub timings: StageTimings,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Read {} tables and {} link records ({} with undefined key skipped)",
            self.tables, self.records, self.skipped_undefined
        )?;
        writeln!(f, "Aggregated into {} groups", self.groups)?;
        let r = &self.resolution;
        writeln!(
            f,
            "Resolved {} groups: {} centroid, {} first vertex, {} missing ({} not found, {} lookup errors, {} undecodable); {} already located",
            r.looked_up(),
            r.centroid,
            r.first_vertex,
            r.missing(),
            r.not_found,
            r.lookup_failed,
            r.undecodable,
            r.already_resolved
        )?;
        if r.write_failures > 0 {
            writeln!(f, "Failed to write back {} coordinates", r.write_failures)?;
        }
        write!(
            f,
            "Wrote {} rows in {}ms (fetch {}, aggregate {}, resolve {}, write {})",
            self.rows_written,
            self.timings.total_ms(),
            self.timings.fetch_ms,
            self.timings.aggregate_ms,
            self.timings.resolve_ms,
            self.timings.write_ms
        )
    }
}

//! Target-versus-allocated accounting for partners and leaders.

use crate::grow::{GrowthState, RegionOutcome};
use serde::Serialize;
use std::fmt;

/// Allocation outcome for one labelled region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub code: String,
    /// Seed id in the full collection, `None` when the region was never seeded.
    pub seed: Option<u32>,
    pub target: f64,
    pub allocated: f64,
    pub cells: usize,
    pub state: SummaryState,
}

/// Serializable mirror of [`GrowthState`], plus the unseeded case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryState {
    Satisfied,
    Exhausted,
    Unseeded,
}

impl From<GrowthState> for SummaryState {
    fn from(state: GrowthState) -> Self {
        match state {
            GrowthState::Satisfied => SummaryState::Satisfied,
            // Active never survives a grow call.
            GrowthState::Exhausted | GrowthState::Active => SummaryState::Exhausted,
        }
    }
}

impl RegionSummary {
    pub(crate) fn from_outcome(code: &str, seed: u32, outcome: &RegionOutcome) -> Self {
        Self {
            code: code.to_string(),
            seed: Some(seed),
            target: outcome.target,
            allocated: outcome.allocated,
            cells: outcome.cells,
            state: outcome.state.into(),
        }
    }

    pub(crate) fn unseeded(code: &str, target: f64) -> Self {
        Self {
            code: code.to_string(),
            seed: None,
            target,
            allocated: 0.0,
            cells: 0,
            state: SummaryState::Unseeded,
        }
    }

    pub fn difference(&self) -> f64 {
        self.allocated - self.target
    }

    pub fn is_short(&self) -> bool {
        self.allocated < self.target
    }
}

/// Partner-level summary with its leaders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerSummary {
    #[serde(flatten)]
    pub region: RegionSummary,
    pub leaders: Vec<RegionSummary>,
}

/// Whole-partition report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSummary {
    pub total_cells: usize,
    pub total_risk: f64,
    pub unassigned_cells: usize,
    pub partners: Vec<PartnerSummary>,
}

impl fmt::Display for AllocationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Risk Allocation Summary:")?;
        for partner in &self.partners {
            let r = &partner.region;
            writeln!(
                f,
                "Partner {}: Target = {:.2}, Allocated = {:.2}, Difference = {:.2}, Cells = {}",
                r.code,
                r.target,
                r.allocated,
                r.difference(),
                r.cells
            )?;
            for leader in &partner.leaders {
                writeln!(
                    f,
                    "  Leader {}: Target = {:.0} cells, Allocated = {} cells",
                    leader.code, leader.target, leader.cells
                )?;
            }
        }
        write!(
            f,
            "Unassigned cells: {} of {}",
            self.unassigned_cells, self.total_cells
        )
    }
}

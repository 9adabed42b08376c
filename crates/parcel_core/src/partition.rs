//! Two-level partitioning: partners by risk share, then leaders by cell count.

use crate::cell::{CellCollection, CellId, CellSet};
use crate::config::{PartitionConfig, PartnerConfig};
use crate::error::{InputError, PartitionError};
use crate::geometry::{Geometry, PlanarGeometry};
use crate::grow::{RegionGrower, RegionSpec};
use crate::index::SpatialIndex;
use crate::seed::{SeedRule, SeedSelector};
use crate::summary::{AllocationSummary, PartnerSummary, RegionSummary};

/// Label written for cells no region reached.
pub const UNASSIGNED: &str = "Unassigned";

/// Partner and leader labels for one cell. `None` means unassigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CellLabels {
    pub partner: Option<String>,
    pub leader: Option<String>,
}

impl CellLabels {
    pub fn partner_label(&self) -> &str {
        self.partner.as_deref().unwrap_or(UNASSIGNED)
    }

    pub fn leader_label(&self) -> &str {
        self.leader.as_deref().unwrap_or(UNASSIGNED)
    }
}

/// Final labelled grid, produced once per run and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionResult {
    labels: Vec<CellLabels>,
    total_risk: f64,
    partners: Vec<PartnerSummary>,
    idle_partners: Vec<String>,
}

impl PartitionResult {
    pub fn labels(&self) -> &[CellLabels] {
        &self.labels
    }

    pub fn label(&self, id: CellId) -> &CellLabels {
        &self.labels[id.index()]
    }

    pub fn partners(&self) -> &[PartnerSummary] {
        &self.partners
    }

    /// Partners that ended the partner pass without any cells.
    pub fn idle_partners(&self) -> &[String] {
        &self.idle_partners
    }

    /// Ids labelled with `partner`, ascending.
    pub fn cells_of_partner(&self, partner: &str) -> Vec<CellId> {
        self.ids_where(|labels| labels.partner.as_deref() == Some(partner))
    }

    /// Ids labelled with `leader`, ascending.
    pub fn cells_of_leader(&self, leader: &str) -> Vec<CellId> {
        self.ids_where(|labels| labels.leader.as_deref() == Some(leader))
    }

    pub fn unassigned(&self) -> usize {
        self.labels.iter().filter(|l| l.partner.is_none()).count()
    }

    pub fn summary(&self) -> AllocationSummary {
        AllocationSummary {
            total_cells: self.labels.len(),
            total_risk: self.total_risk,
            unassigned_cells: self.unassigned(),
            partners: self.partners.clone(),
        }
    }

    fn ids_where(&self, pred: impl Fn(&CellLabels) -> bool) -> Vec<CellId> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, labels)| pred(labels))
            .map(|(index, _)| CellId::from_index(index))
            .collect()
    }
}

/// Runs the partner pass once, then one leader pass per partner.
pub struct PartitionOrchestrator<G = PlanarGeometry> {
    config: PartitionConfig,
    shares: Vec<f64>,
    geometry: G,
}

impl PartitionOrchestrator<PlanarGeometry> {
    pub fn new(config: &PartitionConfig) -> Result<Self, PartitionError> {
        Self::with_geometry(config, PlanarGeometry::new())
    }
}

impl<G: Geometry> PartitionOrchestrator<G> {
    pub fn with_geometry(config: &PartitionConfig, geometry: G) -> Result<Self, PartitionError> {
        let shares = config.shares()?;
        Ok(Self {
            config: config.clone(),
            shares,
            geometry,
        })
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Normalized resource shares, in partner order.
    pub fn shares(&self) -> &[f64] {
        &self.shares
    }

    /// Partition with farthest-point partner seeds chosen over the whole grid.
    pub fn run(&self, cells: &CellCollection) -> Result<PartitionResult, PartitionError> {
        if cells.is_empty() {
            return Err(InputError::EmptyCollection.into());
        }
        let seeds = SeedSelector::new(SeedRule::LowestY).select(cells, self.config.partners.len())?;
        if seeds.len() < self.config.partners.len() {
            tracing::warn!(
                partners = self.config.partners.len(),
                cells = cells.len(),
                "fewer cells than partners, trailing partners stay unseeded"
            );
        }
        Ok(self.run_seeded(cells, &seeds))
    }

    /// Partition with caller-chosen partner seeds, one per partner in order.
    pub fn run_with_partner_seeds(
        &self,
        cells: &CellCollection,
        seeds: &[CellId],
    ) -> Result<PartitionResult, PartitionError> {
        if cells.is_empty() {
            return Err(InputError::EmptyCollection.into());
        }
        if seeds.len() != self.config.partners.len() {
            return Err(InputError::SeedCountMismatch {
                expected: self.config.partners.len(),
                actual: seeds.len(),
            }
            .into());
        }
        for (i, &seed) in seeds.iter().enumerate() {
            if seed.index() >= cells.len() || seeds[..i].contains(&seed) {
                return Err(InputError::InvalidSeed {
                    seed,
                    len: cells.len(),
                }
                .into());
            }
        }
        Ok(self.run_seeded(cells, seeds))
    }

    fn run_seeded(&self, cells: &CellCollection, seeds: &[CellId]) -> PartitionResult {
        let partners = &self.config.partners;
        let total_risk = cells.total_risk();
        let index = SpatialIndex::build(cells);

        let specs: Vec<RegionSpec> = seeds
            .iter()
            .zip(&self.shares)
            .map(|(&seed, share)| RegionSpec::new(seed, share * total_risk))
            .collect();

        tracing::info!(
            cells = cells.len(),
            partners = partners.len(),
            total_risk,
            "partner pass"
        );
        let growth = RegionGrower::new(cells, &index, &self.geometry)
            .grow(&specs, |id| cells.risk(id));

        let mut labels = vec![CellLabels::default(); cells.len()];
        for (i, owner) in growth.owners().iter().enumerate() {
            if let Some(p) = owner {
                labels[i].partner = Some(partners[*p].code.clone());
            }
        }

        let mut summaries = Vec::with_capacity(partners.len());
        let mut idle_partners = Vec::new();
        for (p, partner) in partners.iter().enumerate() {
            let region = match growth.regions().get(p) {
                Some(outcome) => {
                    RegionSummary::from_outcome(&partner.code, outcome.seed.raw(), outcome)
                }
                None => RegionSummary::unseeded(&partner.code, self.shares[p] * total_risk),
            };
            if region.is_short() {
                tracing::warn!(
                    partner = %partner.code,
                    target = region.target,
                    allocated = region.allocated,
                    "partner under-allocated"
                );
            }

            let members = if p < specs.len() {
                growth.members(p)
            } else {
                Vec::new()
            };
            let leaders = if members.is_empty() {
                tracing::warn!(partner = %partner.code, "partner has no cells, skipping leader pass");
                idle_partners.push(partner.code.clone());
                partner
                    .leaders
                    .iter()
                    .map(|leader| RegionSummary::unseeded(leader, 0.0))
                    .collect()
            } else {
                self.leader_pass(cells, partner, members, &mut labels)
            };

            summaries.push(PartnerSummary { region, leaders });
        }

        PartitionResult {
            labels,
            total_risk,
            partners: summaries,
            idle_partners,
        }
    }

    /// Split one partner's cells among its leaders by equal cell count.
    fn leader_pass(
        &self,
        cells: &CellCollection,
        partner: &PartnerConfig,
        members: Vec<CellId>,
        labels: &mut [CellLabels],
    ) -> Vec<RegionSummary> {
        let sub = cells.subset(members);
        let index = SpatialIndex::build(&sub);
        let leaders = &partner.leaders;
        let target = (sub.len() / leaders.len()) as f64;

        // `sub` is non-empty, so selection cannot fail.
        let seeds = SeedSelector::new(SeedRule::LowestXPlusY)
            .select(&sub, leaders.len())
            .unwrap_or_default();
        let specs: Vec<RegionSpec> = seeds
            .iter()
            .map(|&seed| RegionSpec::new(seed, target))
            .collect();

        tracing::info!(
            partner = %partner.code,
            cells = sub.len(),
            leaders = leaders.len(),
            target,
            "leader pass"
        );
        let growth = RegionGrower::new(&sub, &index, &self.geometry).grow(&specs, |_| 1.0);

        for local in sub.ids() {
            if let Some(l) = growth.owner(local) {
                labels[sub.to_parent(local).index()].leader = Some(leaders[l].clone());
            }
        }

        leaders
            .iter()
            .enumerate()
            .map(|(l, leader)| match growth.regions().get(l) {
                Some(outcome) => {
                    RegionSummary::from_outcome(leader, sub.to_parent(outcome.seed).raw(), outcome)
                }
                None => {
                    tracing::warn!(partner = %partner.code, leader = %leader, "leader left unseeded");
                    RegionSummary::unseeded(leader, target)
                }
            })
            .collect()
    }
}

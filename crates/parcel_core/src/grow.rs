//! Round-robin, multi-source region growing.
//!
//! Every region starts from its seed and absorbs touching, unowned cells in
//! breadth-first order. Regions take turns expanding one frontier cell each,
//! in the order they were given. Ownership is first come, first served:
//! once a cell belongs to a region it is never reassigned, and cells no
//! region reaches stay unowned. The result is a deterministic function of
//! the cell set, the seeds and their order.

use crate::cell::{CellId, CellSet};
use crate::geometry::Geometry;
use crate::index::SpatialIndex;
use std::collections::VecDeque;

/// Starting cell and capacity for one region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSpec {
    pub seed: CellId,
    pub target: f64,
}

impl RegionSpec {
    pub fn new(seed: CellId, target: f64) -> Self {
        Self { seed, target }
    }
}

/// Lifecycle of a region during one [`RegionGrower::grow`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrowthState {
    /// Frontier non-empty and allocation below target.
    Active,
    /// Frontier emptied before the target was reached.
    Exhausted,
    /// Allocation reached or exceeded the target.
    Satisfied,
}

impl GrowthState {
    pub fn as_str(self) -> &'static str {
        match self {
            GrowthState::Active => "active",
            GrowthState::Exhausted => "exhausted",
            GrowthState::Satisfied => "satisfied",
        }
    }
}

/// Final accounting for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOutcome {
    pub seed: CellId,
    pub target: f64,
    pub allocated: f64,
    pub cells: usize,
    pub state: GrowthState,
}

/// Counters gathered while growing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowthStats {
    pub rounds: usize,
    pub index_queries: usize,
    pub candidates: usize,
    pub touch_tests: usize,
}

/// Result of one grow call, indexed by region position and cell id.
#[derive(Debug, Clone, PartialEq)]
pub struct Growth {
    owner: Vec<Option<usize>>,
    regions: Vec<RegionOutcome>,
    stats: GrowthStats,
}

impl Growth {
    /// Region index owning `id`, if any.
    #[inline]
    pub fn owner(&self, id: CellId) -> Option<usize> {
        self.owner[id.index()]
    }

    pub fn owners(&self) -> &[Option<usize>] {
        &self.owner
    }

    pub fn regions(&self) -> &[RegionOutcome] {
        &self.regions
    }

    pub fn stats(&self) -> GrowthStats {
        self.stats
    }

    /// Ids owned by `region`, ascending.
    pub fn members(&self, region: usize) -> Vec<CellId> {
        self.owner
            .iter()
            .enumerate()
            .filter(|(_, owner)| **owner == Some(region))
            .map(|(index, _)| CellId::from_index(index))
            .collect()
    }

    pub fn unassigned(&self) -> usize {
        self.owner.iter().filter(|owner| owner.is_none()).count()
    }
}

/// Mutable state scoped to a single grow call.
struct GrowthContext {
    owner: Vec<Option<usize>>,
    frontiers: Vec<VecDeque<CellId>>,
    allocated: Vec<f64>,
    counts: Vec<usize>,
    states: Vec<GrowthState>,
    stats: GrowthStats,
}

impl GrowthContext {
    fn new(cells: usize, regions: usize) -> Self {
        Self {
            owner: vec![None; cells],
            frontiers: vec![VecDeque::new(); regions],
            allocated: vec![0.0; regions],
            counts: vec![0; regions],
            states: vec![GrowthState::Active; regions],
            stats: GrowthStats::default(),
        }
    }

    #[inline]
    fn claim(&mut self, region: usize, id: CellId, weight: f64) {
        debug_assert!(self.owner[id.index()].is_none());
        self.owner[id.index()] = Some(region);
        self.allocated[region] += weight;
        self.counts[region] += 1;
        self.frontiers[region].push_back(id);
    }

    fn any_active(&self) -> bool {
        self.states.contains(&GrowthState::Active)
    }
}

/// Flood-fill allocator over one [`CellSet`] and its [`SpatialIndex`].
pub struct RegionGrower<'a, C: ?Sized, G> {
    cells: &'a C,
    index: &'a SpatialIndex,
    geometry: &'a G,
}

impl<'a, C, G> RegionGrower<'a, C, G>
where
    C: CellSet + ?Sized,
    G: Geometry,
{
    /// `index` must have been built over `cells`.
    pub fn new(cells: &'a C, index: &'a SpatialIndex, geometry: &'a G) -> Self {
        debug_assert_eq!(cells.len(), index.len(), "index built over another id space");
        Self {
            cells,
            index,
            geometry,
        }
    }

    /// Grow one region per [`RegionSpec`], round-robin in slice order.
    ///
    /// `weight` gives each absorbed cell's contribution toward its region's
    /// target. Falling short of a target is a normal outcome, reported as
    /// [`GrowthState::Exhausted`]. A region whose seed was already claimed by an
    /// earlier region owns nothing and ends exhausted.
    pub fn grow<W>(&self, regions: &[RegionSpec], weight: W) -> Growth
    where
        W: Fn(CellId) -> f64,
    {
        let mut ctx = GrowthContext::new(self.cells.len(), regions.len());

        for (region, spec) in regions.iter().enumerate() {
            debug_assert!(spec.seed.index() < self.cells.len());
            if ctx.owner[spec.seed.index()].is_some() {
                ctx.states[region] = GrowthState::Exhausted;
                tracing::warn!(region, seed = %spec.seed, "seed already owned, region left empty");
                continue;
            }
            ctx.claim(region, spec.seed, weight(spec.seed));
            if ctx.allocated[region] >= spec.target {
                ctx.states[region] = GrowthState::Satisfied;
            }
        }

        while ctx.any_active() {
            ctx.stats.rounds += 1;
            for (region, spec) in regions.iter().enumerate() {
                if ctx.states[region] != GrowthState::Active {
                    continue;
                }
                self.expand(&mut ctx, region, spec.target, &weight);
            }
        }

        let outcomes = regions
            .iter()
            .enumerate()
            .map(|(region, spec)| RegionOutcome {
                seed: spec.seed,
                target: spec.target,
                allocated: ctx.allocated[region],
                cells: ctx.counts[region],
                state: ctx.states[region],
            })
            .collect();

        tracing::debug!(
            regions = regions.len(),
            rounds = ctx.stats.rounds,
            index_queries = ctx.stats.index_queries,
            candidates = ctx.stats.candidates,
            touch_tests = ctx.stats.touch_tests,
            "growth finished"
        );

        Growth {
            owner: ctx.owner,
            regions: outcomes,
            stats: ctx.stats,
        }
    }

    /// One turn: pop the oldest frontier cell and absorb its free neighbours.
    fn expand<W>(&self, ctx: &mut GrowthContext, region: usize, target: f64, weight: &W)
    where
        W: Fn(CellId) -> f64,
    {
        let Some(current) = ctx.frontiers[region].pop_front() else {
            ctx.states[region] = GrowthState::Exhausted;
            return;
        };

        let polygon = self.cells.polygon(current);
        let candidates = self.index.query(&self.cells.bounds(current));
        ctx.stats.index_queries += 1;
        ctx.stats.candidates += candidates.len();

        for candidate in candidates {
            if candidate == current || ctx.owner[candidate.index()].is_some() {
                continue;
            }
            ctx.stats.touch_tests += 1;
            if !self.geometry.touches(polygon, self.cells.polygon(candidate)) {
                continue;
            }
            ctx.claim(region, candidate, weight(candidate));
            if ctx.allocated[region] >= target {
                ctx.states[region] = GrowthState::Satisfied;
                return;
            }
        }

        if ctx.frontiers[region].is_empty() {
            ctx.states[region] = GrowthState::Exhausted;
        }
    }
}

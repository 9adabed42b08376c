//! Farthest-point seed selection.

use crate::cell::{CellId, CellSet};
use crate::error::InputError;
use glam::DVec2;

/// Key minimized to pick the very first seed.
///
/// The two conventions differ only in reproducibility, not correctness,
/// and both are kept exactly: partner seeding starts from the lowest
/// centroid, leader seeding from the lowest `x + y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedRule {
    LowestY,
    LowestXPlusY,
}

impl SeedRule {
    #[inline]
    fn key(self, centroid: DVec2) -> f64 {
        match self {
            SeedRule::LowestY => centroid.y,
            SeedRule::LowestXPlusY => centroid.x + centroid.y,
        }
    }
}

/// Greedy farthest-point sampler over cell centroids.
#[derive(Debug, Clone, Copy)]
pub struct SeedSelector {
    rule: SeedRule,
}

impl SeedSelector {
    pub fn new(rule: SeedRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> SeedRule {
        self.rule
    }

    /// Pick up to `count` distinct, well separated ids.
    ///
    /// Returns fewer than `count` seeds only when the set holds fewer cells.
    /// Every tie goes to the lowest id.
    pub fn select<C: CellSet + ?Sized>(
        &self,
        cells: &C,
        count: usize,
    ) -> Result<Vec<CellId>, InputError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if cells.is_empty() {
            return Err(InputError::EmptyCollection);
        }

        let n = cells.len();
        let centroids: Vec<DVec2> = cells.ids().map(|id| cells.centroid(id)).collect();
        let mut chosen = vec![false; n];
        let mut seeds = Vec::with_capacity(count.min(n));

        let mut first = 0;
        for i in 1..n {
            if self.rule.key(centroids[i]) < self.rule.key(centroids[first]) {
                first = i;
            }
        }
        chosen[first] = true;
        seeds.push(CellId::from_index(first));

        // nearest[i] = distance from i to its closest chosen seed.
        let mut nearest: Vec<f64> = centroids
            .iter()
            .map(|c| c.distance(centroids[first]))
            .collect();

        while seeds.len() < count && seeds.len() < n {
            let mut best: Option<usize> = None;
            for i in 0..n {
                if chosen[i] {
                    continue;
                }
                match best {
                    Some(b) if nearest[i] <= nearest[b] => {}
                    _ => best = Some(i),
                }
            }
            let Some(next) = best else { break };

            chosen[next] = true;
            seeds.push(CellId::from_index(next));
            let origin = centroids[next];
            for (i, dist) in nearest.iter_mut().enumerate() {
                if !chosen[i] {
                    *dist = dist.min(centroids[i].distance(origin));
                }
            }
        }

        tracing::trace!(rule = ?self.rule, requested = count, picked = seeds.len(), "seeds selected");
        Ok(seeds)
    }
}

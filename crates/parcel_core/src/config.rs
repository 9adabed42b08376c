//! Partner and leader configuration.

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One resource-holding partner and the team leads that split its territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerConfig {
    pub code: String,
    /// Declared resources; only the ratio between partners matters.
    pub resources: f64,
    pub leaders: Vec<String>,
}

impl PartnerConfig {
    pub fn new(code: impl Into<String>, resources: f64, leaders: &[&str]) -> Self {
        Self {
            code: code.into(),
            resources,
            leaders: leaders.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Externally supplied partition plan, in round-robin order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionConfig {
    pub partners: Vec<PartnerConfig>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            partners: vec![
                PartnerConfig::new("A", 10_000.0, &["A1", "A2", "A3"]),
                PartnerConfig::new("B", 7_000.0, &["B1", "B2"]),
                PartnerConfig::new("C", 3_000.0, &["C1"]),
            ],
        }
    }
}

impl PartitionConfig {
    pub fn validate(&self) -> Result<(), InputError> {
        if self.partners.is_empty() {
            return Err(InputError::NoPartners);
        }

        let mut codes = HashSet::new();
        for partner in &self.partners {
            if !codes.insert(partner.code.as_str()) {
                return Err(InputError::DuplicatePartner {
                    code: partner.code.clone(),
                });
            }
            if !partner.resources.is_finite() || partner.resources < 0.0 {
                return Err(InputError::InvalidResources {
                    code: partner.code.clone(),
                    value: partner.resources,
                });
            }
            if partner.leaders.is_empty() {
                return Err(InputError::NoLeaders {
                    partner: partner.code.clone(),
                });
            }
            let mut leaders = HashSet::new();
            for leader in &partner.leaders {
                if !leaders.insert(leader.as_str()) {
                    return Err(InputError::DuplicateLeader {
                        partner: partner.code.clone(),
                        code: leader.clone(),
                    });
                }
            }
        }

        if self.total_resources() <= 0.0 {
            return Err(InputError::ZeroTotalResources);
        }
        Ok(())
    }

    pub fn total_resources(&self) -> f64 {
        self.partners.iter().map(|p| p.resources).sum()
    }

    /// Resource shares normalized to sum to 1, in partner order.
    pub fn shares(&self) -> Result<Vec<f64>, InputError> {
        self.validate()?;
        let total = self.total_resources();
        Ok(self.partners.iter().map(|p| p.resources / total).collect())
    }
}

//! Policy pipeline orchestration
//!
//! Wires the engine pieces together: subtract every exclusion from the
//! full address space, canonicalize, aggregate if the route budget is
//! exceeded, then force coverage of every mandatory subnet and
//! canonicalize once more. The whole computation is a pure function of
//! its input.

use crate::policy::{aggregate, collapse, subtract_all, Block, PolicyError};
use tracing::{debug, info, warn};

/// Prefix length below which aggregation refuses to widen further.
pub const DEFAULT_FLOOR_PREFIX: u8 = 17;

/// Safety cap on the intermediate block count during exclusion
/// processing. Realistic country lists stay well below this.
pub const DEFAULT_BLOCK_CAP: usize = 1_000_000;

#[derive(Debug, Clone)]
pub struct PolicyInput {
    /// Ranges that bypass the tunnel (reserved + externally supplied).
    pub exclusions: Vec<Block>,
    /// VPN-internal subnets that must always be routed.
    pub mandatory: Vec<Block>,
    /// Maximum acceptable output cardinality.
    pub route_budget: usize,
}

#[derive(Debug, Clone)]
pub struct PolicyOutput {
    /// Canonical route set: sorted, disjoint, minimal.
    pub blocks: Vec<Block>,
    /// False when aggregation could not reach the route budget; the
    /// blocks are then the best effort at the floor prefix.
    pub budget_met: bool,
    /// Mandatory subnets that had to be re-inserted after aggregation
    /// dropped their coverage.
    pub repaired: Vec<Block>,
}

#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    floor_prefix: u8,
    block_cap: usize,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self {
            floor_prefix: DEFAULT_FLOOR_PREFIX,
            block_cap: DEFAULT_BLOCK_CAP,
        }
    }
}

impl PolicyBuilder {
    pub fn new(floor_prefix: u8, block_cap: usize) -> Self {
        Self {
            floor_prefix,
            block_cap,
        }
    }

    /// Compute the routing policy for the given input.
    ///
    /// The output union always covers `FullSpace − union(exclusions)`
    /// and every mandatory subnet; when no aggregation was needed it
    /// covers exactly the former plus any forced mandatory repair.
    pub fn compute(&self, input: &PolicyInput) -> Result<PolicyOutput, PolicyError> {
        if self.floor_prefix > 32 {
            return Err(PolicyError::InvalidFloorPrefix(self.floor_prefix));
        }

        let remaining = subtract_all(&input.exclusions, self.block_cap)?;
        debug!(
            "{} exclusions applied, {} blocks before collapse",
            input.exclusions.len(),
            remaining.len()
        );

        let mut working = collapse(&remaining);
        info!("Canonical route set: {} blocks", working.len());

        let mut budget_met = true;
        if working.len() > input.route_budget {
            let result = aggregate(
                &working,
                &input.mandatory,
                input.route_budget,
                self.floor_prefix,
            );
            info!(
                "Aggregated {} -> {} blocks at threshold /{}",
                working.len(),
                result.blocks.len(),
                result.threshold
            );
            budget_met = result.budget_met;
            working = result.blocks;
        }

        // Safety net: aggregation must never drop required coverage.
        let mut repaired = Vec::new();
        for &m in &input.mandatory {
            if !working.iter().any(|blk| blk.contains(m)) {
                warn!("Mandatory subnet {} not covered, re-inserting", m);
                working.push(m);
                repaired.push(m);
            }
        }

        Ok(PolicyOutput {
            blocks: collapse(&working),
            budget_met,
            repaired,
        })
    }
}

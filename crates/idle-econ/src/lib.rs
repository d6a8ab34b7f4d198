#![deny(warnings)]

//! Economy engine: cost curves, production and purchase operations.
//!
//! This crate provides:
//! - Geometric cost curves for producers and the click upgrade
//! - On-demand production rate (energy/second) over owned producers
//! - The [`Engine`], sole owner and writer of the mutable [`GameState`]

use idle_core::{Catalog, CatalogError, ClickUpgradeCurve, GameState, ProducerDef, ProducerId};
use tracing::{debug, trace};

/// Geometric growth factor between consecutive producer purchases.
pub const PRODUCER_COST_GROWTH: f64 = 1.15;

/// Price of the next unit after `steps` have already been bought:
/// `ceil(base * growth^steps)`. Strictly increasing in `steps` while the
/// result fits; saturates at `u64::MAX` beyond that.
pub fn geometric_cost(base: u64, growth: f64, steps: u64) -> u64 {
    let raw = (base as f64) * growth.powf(steps as f64);
    raw.ceil() as u64
}

/// Price of the next unit of `def` given the currently owned count.
pub fn producer_cost(def: &ProducerDef, owned: u64) -> u64 {
    geometric_cost(def.base_cost, PRODUCER_COST_GROWTH, owned)
}

/// Price of the next click upgrade after `purchased` prior upgrades.
pub fn click_upgrade_cost(curve: &ClickUpgradeCurve, purchased: u32) -> u64 {
    geometric_cost(curve.base_cost, curve.growth, u64::from(purchased))
}

/// Steady-state energy per second over all owned producers. Recomputed on
/// every call so it always reflects current ownership.
pub fn production_rate(catalog: &Catalog, state: &GameState) -> f64 {
    catalog
        .producers()
        .iter()
        .map(|def| def.rate * state.owned(&def.id) as f64)
        .sum()
}

/// Outcome of a purchase attempt. A decline is an expected condition, not an
/// error: the state is left untouched and the quoted cost is reported back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Purchase {
    /// The cost was deducted and the item granted.
    Bought {
        /// Energy spent.
        cost: u64,
    },
    /// The balance did not cover the cost; nothing changed.
    Declined {
        /// Energy that would have been required.
        cost: u64,
    },
}

impl Purchase {
    /// True when the purchase went through.
    pub fn is_bought(&self) -> bool {
        matches!(self, Purchase::Bought { .. })
    }
}

/// Owns the game state and applies every mutation: manual actions,
/// purchases, time advance, replacement and reset. Callers read snapshots
/// via [`Engine::state`] and never mutate directly.
#[derive(Debug)]
pub struct Engine {
    catalog: Catalog,
    state: GameState,
}

impl Engine {
    /// Engine over a fresh initial state.
    pub fn new(catalog: Catalog) -> Self {
        let state = GameState::new(&catalog);
        Self { catalog, state }
    }

    /// Engine adopting an externally supplied state. The state is
    /// normalized before use, like any load or import.
    pub fn with_state(catalog: Catalog, state: GameState) -> Self {
        let mut engine = Self::new(catalog);
        engine.restore(state);
        engine
    }

    /// The read-only catalog this engine runs against.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Current state snapshot.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Current energy per second.
    pub fn production_rate(&self) -> f64 {
        production_rate(&self.catalog, &self.state)
    }

    /// Price of the next unit of the given producer.
    pub fn producer_cost(&self, id: &ProducerId) -> Result<u64, CatalogError> {
        let def = self.catalog.get(id)?;
        Ok(producer_cost(def, self.state.owned(id)))
    }

    /// Price of the next click upgrade.
    pub fn click_upgrade_cost(&self) -> u64 {
        click_upgrade_cost(self.catalog.click_upgrade(), self.state.click_upgrades)
    }

    /// Whether the balance covers `cost`.
    pub fn can_afford(&self, cost: u64) -> bool {
        self.state.energy >= cost as f64
    }

    /// Manual action: grants the per-click yield to balance and lifetime.
    /// Always succeeds; returns the yield granted.
    pub fn click(&mut self) -> u32 {
        let gain = self.state.click_power;
        self.state.energy += f64::from(gain);
        self.state.lifetime += f64::from(gain);
        trace!(gain, "manual action");
        gain
    }

    /// Attempt to buy one unit of the given producer. Unknown identifiers
    /// are an error; an uncovered cost is a [`Purchase::Declined`] no-op.
    pub fn buy_producer(&mut self, id: &ProducerId) -> Result<Purchase, CatalogError> {
        let def = self.catalog.get(id)?;
        let cost = producer_cost(def, self.state.owned(id));
        if !self.can_afford(cost) {
            debug!(id = %id.0, cost, "producer purchase declined");
            return Ok(Purchase::Declined { cost });
        }
        self.state.energy -= cost as f64;
        if let Some(rec) = self.state.producers.iter_mut().find(|rec| &rec.id == id) {
            rec.owned += 1;
        }
        debug!(id = %id.0, cost, owned = self.state.owned(id), "producer bought");
        Ok(Purchase::Bought { cost })
    }

    /// Attempt to buy the next click upgrade. On success the per-click
    /// yield rises by one.
    pub fn buy_click_upgrade(&mut self) -> Purchase {
        let cost = self.click_upgrade_cost();
        if !self.can_afford(cost) {
            debug!(cost, "click upgrade declined");
            return Purchase::Declined { cost };
        }
        self.state.energy -= cost as f64;
        self.state.click_upgrades += 1;
        self.state.click_power += 1;
        debug!(cost, click_power = self.state.click_power, "click upgrade bought");
        Purchase::Bought { cost }
    }

    /// Advance the simulation by `seconds` of real time, accruing
    /// `production_rate * seconds` to balance and lifetime. Accrual is
    /// continuous: fractional amounts are retained. Non-positive or
    /// non-finite elapsed time is a no-op; the engine never caps a large
    /// gap itself, that policy belongs to the scheduler.
    pub fn advance(&mut self, seconds: f64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            return;
        }
        let income = self.production_rate() * seconds;
        self.state.energy += income;
        self.state.lifetime += income;
        trace!(seconds, income, "advanced");
    }

    /// Replace the whole state, normalizing it first. Used by load and
    /// import; the previous state is discarded only after the replacement
    /// has been brought back into its invariants.
    pub fn restore(&mut self, mut state: GameState) {
        state.normalize(&self.catalog);
        self.state = state;
    }

    /// Start over, preserving only the schema tag.
    pub fn reset(&mut self) {
        self.state.reset(&self.catalog);
        debug!("state reset");
    }
}

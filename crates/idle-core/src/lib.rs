#![deny(warnings)]

//! Core domain models and invariants for the energy clicker.
//!
//! This crate defines the producer catalog, the serializable game state, and
//! the normalization pass that clamps untrusted state back into its
//! invariants after a load or import.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Schema tag written into freshly created states. Carried through saves and
/// imports verbatim; never interpreted on load.
pub const STATE_VERSION: &str = "ec-0.1";

/// Unique identifier for a producer, e.g. "spark_wheel". Stable across
/// versions so old saves keep referencing the same catalog entries.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProducerId(pub String);

/// A purchasable passive-income source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProducerDef {
    /// Producer identifier, e.g. "dynamo".
    pub id: ProducerId,
    /// Human-readable display name.
    pub name: String,
    /// Cost of the first unit; later units follow the geometric curve.
    pub base_cost: u64,
    /// Energy generated per second by one unit.
    pub rate: f64,
    /// Input-binding tag for the host's dispatch layer.
    pub hotkey: String,
}

/// Cost model for the per-click yield upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClickUpgradeCurve {
    /// Cost of the first upgrade.
    pub base_cost: u64,
    /// Geometric growth factor between consecutive upgrades (> 1).
    pub growth: f64,
}

impl Default for ClickUpgradeCurve {
    fn default() -> Self {
        Self {
            base_cost: 50,
            growth: 1.3,
        }
    }
}

/// Validation errors for catalog data and lookups.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Identifier not present in the catalog.
    #[error("unknown producer id: {0}")]
    UnknownProducer(String),
    /// The same identifier appears twice.
    #[error("duplicate producer id: {0}")]
    DuplicateProducer(String),
    /// Identifier must be non-empty.
    #[error("producer id must not be empty")]
    EmptyId,
    /// Display name must be non-empty.
    #[error("producer {0} has an empty display name")]
    EmptyName(String),
    /// Base cost must be at least 1.
    #[error("producer {0} has a zero base cost")]
    ZeroBaseCost(String),
    /// Rate must be finite and non-negative.
    #[error("producer {0} has a non-finite or negative rate")]
    InvalidRate(String),
    /// Upgrade curve must have a positive base cost and growth > 1.
    #[error("click upgrade curve must have a positive base cost and growth > 1")]
    InvalidUpgradeCurve,
    /// Catalog file could not be parsed.
    #[error("catalog config is not valid: {0}")]
    Config(String),
}

/// Raw shape of a catalog file before validation.
#[derive(Deserialize)]
struct CatalogFile {
    producers: Vec<ProducerDef>,
    #[serde(default)]
    click_upgrade: ClickUpgradeCurve,
}

/// Ordered, immutable set of producer definitions plus the click-upgrade
/// cost model. Read-only input to the economy engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    producers: Vec<ProducerDef>,
    click_upgrade: ClickUpgradeCurve,
}

impl Catalog {
    /// Build a catalog from validated definitions. Order is preserved and
    /// becomes the canonical order of owned-producer records.
    pub fn new(
        producers: Vec<ProducerDef>,
        click_upgrade: ClickUpgradeCurve,
    ) -> Result<Self, CatalogError> {
        let mut seen: BTreeSet<&ProducerId> = BTreeSet::new();
        for def in &producers {
            validate_producer(def)?;
            if !seen.insert(&def.id) {
                return Err(CatalogError::DuplicateProducer(def.id.0.clone()));
            }
        }
        if click_upgrade.base_cost == 0
            || !(click_upgrade.growth.is_finite() && click_upgrade.growth > 1.0)
        {
            return Err(CatalogError::InvalidUpgradeCurve);
        }
        Ok(Self {
            producers,
            click_upgrade,
        })
    }

    /// Parse and validate a catalog from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_yaml::from_str(text).map_err(|e| CatalogError::Config(e.to_string()))?;
        Self::new(file.producers, file.click_upgrade)
    }

    /// The built-in five-producer roster.
    pub fn builtin() -> Self {
        let producers = vec![
            ProducerDef {
                id: ProducerId("spark_wheel".to_string()),
                name: "Spark Wheel".to_string(),
                base_cost: 15,
                rate: 0.1,
                hotkey: "1".to_string(),
            },
            ProducerDef {
                id: ProducerId("dynamo".to_string()),
                name: "Dynamo".to_string(),
                base_cost: 100,
                rate: 1.0,
                hotkey: "2".to_string(),
            },
            ProducerDef {
                id: ProducerId("solar_array".to_string()),
                name: "Solar Array".to_string(),
                base_cost: 1_100,
                rate: 8.0,
                hotkey: "3".to_string(),
            },
            ProducerDef {
                id: ProducerId("reactor_core".to_string()),
                name: "Reactor Core".to_string(),
                base_cost: 12_000,
                rate: 47.0,
                hotkey: "4".to_string(),
            },
            ProducerDef {
                id: ProducerId("fusion_forge".to_string()),
                name: "Fusion Forge".to_string(),
                base_cost: 130_000,
                rate: 260.0,
                hotkey: "5".to_string(),
            },
        ];
        Self {
            producers,
            click_upgrade: ClickUpgradeCurve::default(),
        }
    }

    /// All definitions in catalog order.
    pub fn producers(&self) -> &[ProducerDef] {
        &self.producers
    }

    /// Look up a definition by identifier.
    pub fn get(&self, id: &ProducerId) -> Result<&ProducerDef, CatalogError> {
        self.producers
            .iter()
            .find(|def| &def.id == id)
            .ok_or_else(|| CatalogError::UnknownProducer(id.0.clone()))
    }

    /// The click-upgrade cost model.
    pub fn click_upgrade(&self) -> &ClickUpgradeCurve {
        &self.click_upgrade
    }
}

fn validate_producer(def: &ProducerDef) -> Result<(), CatalogError> {
    if def.id.0.trim().is_empty() {
        return Err(CatalogError::EmptyId);
    }
    if def.name.trim().is_empty() {
        return Err(CatalogError::EmptyName(def.id.0.clone()));
    }
    if def.base_cost == 0 {
        return Err(CatalogError::ZeroBaseCost(def.id.0.clone()));
    }
    if !def.rate.is_finite() || def.rate < 0.0 {
        return Err(CatalogError::InvalidRate(def.id.0.clone()));
    }
    Ok(())
}

/// Ownership record for one catalog entry. The unsigned count keeps owned
/// totals non-negative and integral by construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnedProducer {
    /// Catalog identifier this record refers to.
    pub id: ProducerId,
    /// Units owned.
    pub owned: u64,
}

/// Full mutable game state. The economy engine is the only writer; everyone
/// else reads snapshots or proposes whole-state replacements that are
/// normalized before becoming authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Schema tag, carried through saves and imports verbatim.
    pub version: String,
    /// Spendable energy balance. Fractional amounts accumulate between
    /// purchases even though displays may round.
    pub energy: f64,
    /// Lifetime energy total, monotonically non-decreasing except on reset.
    pub lifetime: f64,
    /// Energy granted per manual action (>= 1).
    pub click_power: u32,
    /// Number of click upgrades purchased; determines the next upgrade cost.
    pub click_upgrades: u32,
    /// One record per catalog entry, in catalog order.
    pub producers: Vec<OwnedProducer>,
}

impl GameState {
    /// Fresh initial state for the given catalog.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            energy: 0.0,
            lifetime: 0.0,
            click_power: 1,
            click_upgrades: 0,
            producers: catalog
                .producers()
                .iter()
                .map(|def| OwnedProducer {
                    id: def.id.clone(),
                    owned: 0,
                })
                .collect(),
        }
    }

    /// Units owned of the given producer. Zero when no record exists.
    pub fn owned(&self, id: &ProducerId) -> u64 {
        self.producers
            .iter()
            .find(|rec| &rec.id == id)
            .map(|rec| rec.owned)
            .unwrap_or(0)
    }

    /// Clamp every field back into its invariant bounds and reconcile the
    /// owned-producer records against the catalog: exactly one record per
    /// catalog entry, in catalog order, unknown identifiers dropped.
    ///
    /// Must run after any external state replacement (load, import) before
    /// the state is used. Idempotent.
    pub fn normalize(&mut self, catalog: &Catalog) {
        if !self.energy.is_finite() || self.energy < 0.0 {
            self.energy = 0.0;
        }
        if !self.lifetime.is_finite() || self.lifetime < 0.0 {
            self.lifetime = 0.0;
        }
        if self.click_power < 1 {
            self.click_power = 1;
        }
        let mut counts: BTreeMap<ProducerId, u64> = BTreeMap::new();
        for rec in self.producers.drain(..) {
            // First record wins when a save carries duplicates.
            counts.entry(rec.id).or_insert(rec.owned);
        }
        self.producers = catalog
            .producers()
            .iter()
            .map(|def| OwnedProducer {
                id: def.id.clone(),
                owned: counts.get(&def.id).copied().unwrap_or(0),
            })
            .collect();
    }

    /// Return all mutable fields to their initial values, preserving only
    /// the schema tag.
    pub fn reset(&mut self, catalog: &Catalog) {
        let version = std::mem::take(&mut self.version);
        *self = GameState::new(catalog);
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn def(id: &str, base_cost: u64, rate: f64) -> ProducerDef {
        ProducerDef {
            id: ProducerId(id.to_string()),
            name: id.to_string(),
            base_cost,
            rate,
            hotkey: "1".to_string(),
        }
    }

    #[test]
    fn builtin_catalog_is_ordered_and_unique() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.producers().len(), 5);
        assert_eq!(catalog.producers()[0].id.0, "spark_wheel");
        assert_eq!(catalog.producers()[0].base_cost, 15);
        let ids: BTreeSet<_> = catalog.producers().iter().map(|d| &d.id).collect();
        assert_eq!(ids.len(), catalog.producers().len());
    }

    #[test]
    fn lookup_unknown_id_fails() {
        let catalog = Catalog::builtin();
        let err = catalog.get(&ProducerId("warp_coil".to_string())).unwrap_err();
        assert_eq!(err, CatalogError::UnknownProducer("warp_coil".to_string()));
    }

    #[test]
    fn catalog_rejects_bad_definitions() {
        let dup = Catalog::new(
            vec![def("a", 10, 1.0), def("a", 20, 2.0)],
            ClickUpgradeCurve::default(),
        );
        assert_eq!(dup.unwrap_err(), CatalogError::DuplicateProducer("a".to_string()));

        let zero = Catalog::new(vec![def("a", 0, 1.0)], ClickUpgradeCurve::default());
        assert_eq!(zero.unwrap_err(), CatalogError::ZeroBaseCost("a".to_string()));

        let nan = Catalog::new(vec![def("a", 10, f64::NAN)], ClickUpgradeCurve::default());
        assert_eq!(nan.unwrap_err(), CatalogError::InvalidRate("a".to_string()));

        let flat = Catalog::new(
            vec![def("a", 10, 1.0)],
            ClickUpgradeCurve {
                base_cost: 50,
                growth: 1.0,
            },
        );
        assert_eq!(flat.unwrap_err(), CatalogError::InvalidUpgradeCurve);
    }

    #[test]
    fn catalog_parses_from_yaml() {
        let text = r#"
producers:
  - id: windmill
    name: Windmill
    base_cost: 25
    rate: 0.5
    hotkey: "1"
"#;
        let catalog = Catalog::from_yaml_str(text).unwrap();
        assert_eq!(catalog.producers().len(), 1);
        assert_eq!(catalog.producers()[0].base_cost, 25);
        // Upgrade curve falls back to the default when omitted.
        assert_eq!(catalog.click_upgrade().base_cost, 50);

        assert!(matches!(
            Catalog::from_yaml_str("producers: 3"),
            Err(CatalogError::Config(_))
        ));
    }

    #[test]
    fn serde_roundtrip_game_state() {
        let catalog = Catalog::builtin();
        let mut state = GameState::new(&catalog);
        state.energy = 12.5;
        state.lifetime = 40.25;
        state.producers[1].owned = 3;
        let s = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&s).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn fresh_state_matches_catalog() {
        let catalog = Catalog::builtin();
        let state = GameState::new(&catalog);
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.energy, 0.0);
        assert_eq!(state.click_power, 1);
        assert_eq!(state.producers.len(), catalog.producers().len());
        assert!(state.producers.iter().all(|rec| rec.owned == 0));
    }

    #[test]
    fn normalize_clamps_and_reconciles() {
        let catalog = Catalog::builtin();
        let mut state = GameState::new(&catalog);
        state.energy = -4.0;
        state.lifetime = f64::NAN;
        state.click_power = 0;
        // A stale record from an older catalog plus a missing roster entry.
        state.producers = vec![
            OwnedProducer {
                id: ProducerId("retired_gadget".to_string()),
                owned: 9,
            },
            OwnedProducer {
                id: ProducerId("dynamo".to_string()),
                owned: 2,
            },
            OwnedProducer {
                id: ProducerId("dynamo".to_string()),
                owned: 7,
            },
        ];
        state.normalize(&catalog);

        assert_eq!(state.energy, 0.0);
        assert_eq!(state.lifetime, 0.0);
        assert_eq!(state.click_power, 1);
        assert_eq!(state.producers.len(), catalog.producers().len());
        for (rec, def) in state.producers.iter().zip(catalog.producers()) {
            assert_eq!(rec.id, def.id);
        }
        assert_eq!(state.owned(&ProducerId("dynamo".to_string())), 2);
        assert_eq!(state.owned(&ProducerId("retired_gadget".to_string())), 0);
    }

    #[test]
    fn reset_preserves_version_only() {
        let catalog = Catalog::builtin();
        let mut state = GameState::new(&catalog);
        state.version = "ec-legacy".to_string();
        state.energy = 500.0;
        state.lifetime = 900.0;
        state.click_power = 4;
        state.click_upgrades = 3;
        state.producers[0].owned = 12;
        state.reset(&catalog);

        assert_eq!(state.version, "ec-legacy");
        assert_eq!(state.energy, 0.0);
        assert_eq!(state.lifetime, 0.0);
        assert_eq!(state.click_power, 1);
        assert_eq!(state.click_upgrades, 0);
        assert!(state.producers.iter().all(|rec| rec.owned == 0));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(
            energy in -1.0e12f64..1.0e12,
            lifetime in -1.0e12f64..1.0e12,
            click_power in 0u32..10_000,
            click_upgrades in 0u32..10_000,
            counts in proptest::collection::vec(0u64..1_000_000, 0..8),
        ) {
            let catalog = Catalog::builtin();
            let mut state = GameState::new(&catalog);
            state.energy = energy;
            state.lifetime = lifetime;
            state.click_power = click_power;
            state.click_upgrades = click_upgrades;
            for (rec, owned) in state.producers.iter_mut().zip(counts) {
                rec.owned = owned;
            }
            state.normalize(&catalog);
            let once = state.clone();
            state.normalize(&catalog);
            prop_assert_eq!(state, once);
        }
    }
}

#![deny(warnings)]

//! Real-time session driver: accrual ticking and periodic autosave.
//!
//! The host's timing facility calls [`Session::frame`] once per refresh with
//! a monotonic timestamp; the session turns consecutive timestamps into
//! elapsed-time deltas for the engine and runs an independently-cadenced
//! autosave timer. Every call returns promptly; nothing here sleeps or
//! blocks.

use idle_core::Catalog;
use idle_econ::Engine;
use persistence::{DecodeError, EncodeError, SaveMedium, SAVE_KEY};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default cadence of the background save timer.
pub const AUTOSAVE_PERIOD: Duration = Duration::from_secs(10);

/// Turns successive monotonic timestamps into elapsed deltas. The first
/// tick has no predecessor and contributes zero elapsed time.
#[derive(Debug, Default)]
pub struct Accrual {
    last: Option<Instant>,
}

impl Accrual {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed time since the previous tick. Timestamps that run backwards
    /// are treated as zero elapsed.
    pub fn tick(&mut self, now: Instant) -> Duration {
        let dt = match self.last {
            Some(prev) => now.saturating_duration_since(prev),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        dt
    }
}

/// Fixed-period timer fed with wall-clock deltas. Latches when the period
/// has accumulated, then starts over.
#[derive(Debug)]
pub struct Autosave {
    period: Duration,
    since_last: Duration,
}

impl Autosave {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            since_last: Duration::ZERO,
        }
    }

    /// Account for `dt` of elapsed wall time; true when a save is due.
    pub fn record(&mut self, dt: Duration) -> bool {
        self.since_last += dt;
        if self.since_last >= self.period {
            self.since_last = Duration::ZERO;
            true
        } else {
            false
        }
    }
}

/// Tuning knobs for a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Cadence of the background save timer.
    pub autosave_period: Duration,
    /// Upper bound on a single accrual step. A suspended host can report an
    /// arbitrarily large gap on resume; `None` accrues the whole gap.
    pub max_step: Option<Duration>,
    /// Record key used against the save medium.
    pub save_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_period: AUTOSAVE_PERIOD,
            max_step: None,
            save_key: SAVE_KEY.to_string(),
        }
    }
}

/// A live game session: engine, save medium, accrual tracker and autosave
/// timer. All input dispatch reaches the engine through here.
#[derive(Debug)]
pub struct Session<M: SaveMedium> {
    engine: Engine,
    medium: M,
    accrual: Accrual,
    autosave: Autosave,
    config: SessionConfig,
}

impl<M: SaveMedium> Session<M> {
    /// Open a session against the medium, resuming from a prior save when
    /// one exists and is readable.
    pub fn new(catalog: Catalog, medium: M, config: SessionConfig) -> Self {
        let engine = match persistence::load_game(&medium, &config.save_key) {
            Some(state) => {
                info!("resuming from prior save");
                Engine::with_state(catalog, state)
            }
            None => Engine::new(catalog),
        };
        Self::with_engine(engine, medium, config)
    }

    /// Wrap an already-built engine, skipping the load.
    pub fn with_engine(engine: Engine, medium: M, config: SessionConfig) -> Self {
        let autosave = Autosave::new(config.autosave_period);
        Self {
            engine,
            medium,
            accrual: Accrual::new(),
            autosave,
            config,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// One scheduler invocation: advance the engine by the elapsed time
    /// since the previous call (clamped to `max_step` when configured) and
    /// autosave when due. Returns the delta actually applied.
    pub fn frame(&mut self, now: Instant) -> Duration {
        let raw = self.accrual.tick(now);
        let dt = match self.config.max_step {
            Some(cap) => raw.min(cap),
            None => raw,
        };
        self.engine.advance(dt.as_secs_f64());
        // The save timer runs on wall time, independent of any accrual cap.
        if self.autosave.record(raw) {
            debug!("autosave due");
            self.save();
        }
        dt
    }

    /// Persist the current state. False when the write was skipped.
    pub fn save(&mut self) -> bool {
        persistence::save_game(&mut self.medium, &self.config.save_key, self.engine.state())
    }

    /// Export the live state as a shareable token.
    pub fn export(&self) -> Result<String, EncodeError> {
        persistence::encode_token(self.engine.state())
    }

    /// Replace the live state from a user-supplied token. A corrupt token
    /// leaves the current state untouched; a valid one is normalized,
    /// adopted and saved.
    pub fn import(&mut self, token: &str) -> Result<(), DecodeError> {
        let state = persistence::decode_token(token)?;
        self.engine.restore(state);
        self.save();
        Ok(())
    }

    /// Start over and persist the fresh state.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.save();
    }
}

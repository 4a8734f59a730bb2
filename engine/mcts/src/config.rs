//! Search configuration parameters.

use thiserror::Error;

/// Errors produced when a configuration is rejected at search start.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("simulation budget must be positive")]
    ZeroBudget,

    #[error("worker pool width must be positive")]
    ZeroWorkers,

    #[error("evaluation batch limit must be positive")]
    ZeroEvalBatch,

    #[error("transposition cache capacity must be positive")]
    ZeroCacheCapacity,

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    #[error("{name} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
}

/// Configuration for a concurrent tree search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Simulation budget per move request.
    pub simulations: u32,

    /// Worker pool width. Also bounds how many simulations are in
    /// flight at once, since the driver dispatches in batches of this
    /// size.
    pub workers: usize,

    /// Multiplier on the UCB1-TUNED exploration term.
    pub exploration: f32,

    /// Cap on the empirical variance bound inside UCB1-TUNED.
    pub variance_bound: f32,

    /// RAVE blend constant k: beta = sqrt(k / (3 * visits + k)).
    pub rave_k: f32,

    /// Whether RAVE statistics participate in selection and backup.
    pub rave_enabled: bool,

    /// Base virtual loss applied to an edge while a simulation is in
    /// flight through it.
    pub virtual_loss_base: f32,

    /// Weight of the visit-ratio term in the dynamic virtual loss.
    pub virtual_loss_ratio_weight: f32,

    /// Transposition cache capacity in entries.
    pub cache_capacity: usize,

    /// Minimum visit count before a cached node is reused to seed a
    /// tree miss.
    pub cache_visit_threshold: u32,

    /// Progressive unlock: a move is gated until
    /// `visits >= complexity * unlock_multiplier`.
    pub unlock_multiplier: f32,

    /// Flat score bonus for unlocked moves.
    pub unlock_bonus: f32,

    /// Whether resignation is considered at all.
    pub resign_enabled: bool,

    /// Best root Q below this value triggers resignation.
    pub resign_threshold: f32,

    /// Resignation is only considered past this ply.
    pub min_resign_ply: u32,

    /// Per-ply temperature decay: tau = tau_decay ^ ply.
    pub tau_decay: f32,

    /// Fraction of the root selection score replaced by Dirichlet
    /// noise.
    pub noise_epsilon: f32,

    /// Dirichlet concentration for root exploration noise.
    pub dirichlet_alpha: f32,

    /// Maximum number of evaluation requests coalesced into one batch
    /// by the sender thread.
    pub eval_batch: usize,

    /// Simulation budget used for pondering requests.
    pub ponder_budget: u32,

    /// Optional hard wall-clock ceiling per move request, in
    /// milliseconds. When it expires the driver harvests whatever
    /// visits have accumulated.
    pub wall_clock_ms: Option<u64>,

    /// Seed for all engine-owned randomness.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            simulations: 3200,
            workers: 64,
            exploration: 1.0,
            variance_bound: 0.25,
            rave_k: 2000.0,
            rave_enabled: true,
            virtual_loss_base: 3.0,
            virtual_loss_ratio_weight: 0.5,
            cache_capacity: 1_000_000,
            cache_visit_threshold: 10,
            unlock_multiplier: 50.0,
            unlock_bonus: 0.1,
            resign_enabled: true,
            resign_threshold: -0.98,
            min_resign_ply: 40,
            tau_decay: 0.9,
            noise_epsilon: 0.15,
            dirichlet_alpha: 0.2,
            eval_batch: 256,
            ponder_budget: 100_000,
            wall_clock_ms: None,
            seed: 0,
        }
    }
}

impl SearchConfig {
    /// A small deterministic config for tests.
    pub fn for_testing() -> Self {
        Self {
            simulations: 64,
            workers: 2,
            noise_epsilon: 0.0,
            resign_enabled: false,
            eval_batch: 8,
            seed: 42,
            ..Self::default()
        }
    }

    /// Builder: set the simulation budget.
    pub fn with_simulations(mut self, n: u32) -> Self {
        self.simulations = n;
        self
    }

    /// Builder: set the worker pool width.
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    /// Builder: set the root noise fraction.
    pub fn with_noise_epsilon(mut self, eps: f32) -> Self {
        self.noise_epsilon = eps;
        self
    }

    /// Builder: set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: set the transposition cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Builder: enable or disable RAVE.
    pub fn with_rave(mut self, enabled: bool) -> Self {
        self.rave_enabled = enabled;
        self
    }

    /// Builder: set the wall-clock ceiling in milliseconds.
    pub fn with_wall_clock_ms(mut self, ms: u64) -> Self {
        self.wall_clock_ms = Some(ms);
        self
    }

    /// Reject malformed knob values before any worker is dispatched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulations == 0 || self.ponder_budget == 0 {
            return Err(ConfigError::ZeroBudget);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.eval_batch == 0 {
            return Err(ConfigError::ZeroEvalBatch);
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }
        for (name, value) in [
            ("exploration", self.exploration),
            ("variance_bound", self.variance_bound),
            ("rave_k", self.rave_k),
            ("unlock_multiplier", self.unlock_multiplier),
            ("dirichlet_alpha", self.dirichlet_alpha),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.virtual_loss_base < 0.0 {
            return Err(ConfigError::NonPositive {
                name: "virtual_loss_base",
                value: self.virtual_loss_base,
            });
        }
        if !(0.0..=1.0).contains(&self.noise_epsilon) {
            return Err(ConfigError::OutOfRange {
                name: "noise_epsilon",
                min: 0.0,
                max: 1.0,
                value: self.noise_epsilon,
            });
        }
        if !(self.tau_decay > 0.0 && self.tau_decay <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "tau_decay",
                min: 0.0,
                max: 1.0,
                value: self.tau_decay,
            });
        }
        if !(-1.0..=1.0).contains(&self.resign_threshold) {
            return Err(ConfigError::OutOfRange {
                name: "resign_threshold",
                min: -1.0,
                max: 1.0,
                value: self.resign_threshold,
            });
        }
        Ok(())
    }
}

use log::warn;
use std::env;

use crate::domain::solver_factory::SolverType;

pub const DEFAULT_OPTIMAL_KAPPA_LIMIT: f64 = 1e9;
pub const DEFAULT_UNBOUNDED_KAPPA_LIMIT: f64 = 1e8;

/// Condition-number limits above which a solve is repeated under
/// conservative settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityLimits {
    pub optimal_kappa_limit: f64,
    pub unbounded_kappa_limit: f64,
}

impl Default for QualityLimits {
    fn default() -> Self {
        QualityLimits {
            optimal_kappa_limit: DEFAULT_OPTIMAL_KAPPA_LIMIT,
            unbounded_kappa_limit: DEFAULT_UNBOUNDED_KAPPA_LIMIT,
        }
    }
}

impl QualityLimits {
    /// An unknown quality is accepted; a NaN one is not.
    pub fn accepts_optimal(&self, quality: Option<f64>) -> bool {
        quality.map_or(true, |kappa| kappa <= self.optimal_kappa_limit)
    }

    pub fn accepts_unbounded(&self, quality: Option<f64>) -> bool {
        quality.map_or(true, |kappa| kappa <= self.unbounded_kappa_limit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FvaConfig {
    pub limits: QualityLimits,
    /// Upper bound on the worker pool, on top of the CPU count.
    pub threads: Option<usize>,
    /// CPUs the pool may spread over; `None` asks the system.
    pub available_cpus: Option<usize>,
    pub solver: SolverType,
}

impl Default for FvaConfig {
    fn default() -> Self {
        FvaConfig {
            limits: QualityLimits::default(),
            threads: None,
            available_cpus: None,
            solver: SolverType::Microlp,
        }
    }
}

impl FvaConfig {
    /// Read `FVA_OPTIMAL_KAPPA_LIMIT`, `FVA_UNBOUNDED_KAPPA_LIMIT`,
    /// `FVA_THREADS` and `FVA_SOLVER`. Missing or unparseable values fall back
    /// to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let positive = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| *v > 0.0)
        };

        let limits = QualityLimits {
            optimal_kappa_limit: positive("FVA_OPTIMAL_KAPPA_LIMIT")
                .unwrap_or(DEFAULT_OPTIMAL_KAPPA_LIMIT),
            unbounded_kappa_limit: positive("FVA_UNBOUNDED_KAPPA_LIMIT")
                .unwrap_or(DEFAULT_UNBOUNDED_KAPPA_LIMIT),
        };

        let threads = lookup("FVA_THREADS")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0);

        let solver = match lookup("FVA_SOLVER") {
            Some(name) => SolverType::from_str(&name).unwrap_or_else(|| {
                warn!("Unknown solver '{}' in FVA_SOLVER, using {:?}", name, SolverType::Microlp);
                SolverType::Microlp
            }),
            None => SolverType::Microlp,
        };

        FvaConfig {
            limits,
            threads,
            available_cpus: None,
            solver,
        }
    }

    pub fn available_cpus(&self) -> usize {
        self.available_cpus.unwrap_or_else(num_cpus::get)
    }
}

use crate::model::WardSchedule;
use crate::report::UnreflectedRequest;
use std::time::Duration;
use thiserror::Error;

use super::anneal::AnnealStats;
use super::penalty::ScoreBreakdown;

/// Paramètres du recuit
#[derive(Debug, Clone, Copy)]
pub struct AnnealOptions {
    pub initial_temperature: f64,
    pub cooling_rate: f64,
    pub max_iterations: usize,
    /// Itérations sans amélioration avant réchauffe.
    pub max_no_improvement: usize,
    /// Au-delà de cet écart, la température effective est divisée par deux.
    pub hard_regression: f64,
    /// Budget horloge optionnel, vérifié entre deux itérations.
    pub time_budget: Option<Duration>,
}

impl Default for AnnealOptions {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            cooling_rate: 0.995,
            max_iterations: 50_000,
            max_no_improvement: 1_000,
            hard_regression: 10_000.0,
            time_budget: None,
        }
    }
}

impl AnnealOptions {
    pub fn with_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Résultat d'une génération : la nouvelle révision et ses diagnostics.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub schedule: WardSchedule,
    /// `false` si la révision produite est identique à la révision courante.
    pub changed: bool,
    pub initial: ScoreBreakdown,
    pub best: ScoreBreakdown,
    pub stats: AnnealStats,
    pub unreflected: Vec<UnreflectedRequest>,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("insufficient staff: {needed} nurses needed, {available} available")]
    InsufficientStaff { needed: usize, available: usize },
    #[error("schedule not found for {year}-{month:02}")]
    ScheduleNotFound { year: i32, month: u32 },
    #[error("invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("invalid shift code: {0}")]
    InvalidShiftCode(char),
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

//! Recuit simulé : refroidissement géométrique, acceptation de Metropolis,
//! réchauffage après stagnation, suivi de la meilleure solution.

use super::neighbor::{self, MoveKind};
use super::penalty::Evaluator;
use super::solution::Solution;
use super::types::AnnealOptions;
use super::util::PrevTails;
use rand::Rng;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Compteurs d'une exécution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnealStats {
    pub iterations: usize,
    pub accepted: usize,
    pub improvements: usize,
    pub reheats: usize,
    /// Acceptations par mouvement, dans l'ordre de [`MoveKind::ALL`].
    pub accepted_by_move: [usize; 6],
    /// `(itération, score)` à chaque nouveau meilleur score.
    pub best_trace: Vec<(usize, f64)>,
    /// Arrêt anticipé sur budget de temps.
    pub timed_out: bool,
}

#[derive(Debug, Clone)]
pub struct AnnealOutcome {
    pub best: Solution,
    pub best_score: f64,
    pub initial_score: f64,
    pub stats: AnnealStats,
}

/// Test de Metropolis. Une régression d'au moins `hard_regression` est jugée
/// à température divisée par deux, pour ce seul test.
fn accept<R: Rng>(current: f64, candidate: f64, temperature: f64, opts: &AnnealOptions, rng: &mut R) -> bool {
    if candidate < current {
        return true;
    }
    let delta = candidate - current;
    let mut effective = temperature;
    if delta >= opts.hard_regression {
        effective *= 0.5;
    }
    let effective = effective.max(f64::MIN_POSITIVE);
    rng.random::<f64>() < (-delta / effective).exp()
}

/// Lance la recherche à partir de `initial`. Ne renvoie jamais d'erreur :
/// au pire la meilleure solution est la solution initiale.
pub fn run<R: Rng>(
    initial: Solution,
    evaluator: &Evaluator<'_>,
    tails: &PrevTails,
    opts: &AnnealOptions,
    rng: &mut R,
) -> AnnealOutcome {
    let started = Instant::now();
    let initial_score = evaluator.score(&initial);
    let mut stats = AnnealStats::default();
    stats.best_trace.push((0, initial_score));

    let mut best = initial.clone();
    let mut best_score = initial_score;
    let mut current = initial;
    let mut current_score = initial_score;
    let mut temperature = opts.initial_temperature;
    let mut stagnation = 0usize;

    info!(
        nurses = current.nurses().len(),
        days = current.days_in_month(),
        score = initial_score,
        "annealing started"
    );

    for iteration in 0..opts.max_iterations {
        if opts.time_budget.is_some_and(|budget| started.elapsed() >= budget) {
            stats.timed_out = true;
            debug!(iteration, "time budget exhausted");
            break;
        }
        stats.iterations += 1;

        let (candidate, kind) = neighbor::generate(&current, tails, rng);
        let candidate_score = evaluator.score(&candidate);

        let mut improved = false;
        if accept(current_score, candidate_score, temperature, opts, rng) {
            stats.accepted += 1;
            stats.accepted_by_move[kind.index()] += 1;
            current = candidate;
            current_score = candidate_score;
            if current_score < best_score {
                best = current.clone();
                best_score = current_score;
                improved = true;
                stats.improvements += 1;
                stats.best_trace.push((iteration + 1, best_score));
            }
        }

        if improved {
            stagnation = 0;
        } else {
            stagnation += 1;
        }

        if stagnation > opts.max_no_improvement {
            temperature = opts.initial_temperature;
            stagnation = 0;
            stats.reheats += 1;
            debug!(iteration, best = best_score, "reheat");
        } else {
            temperature *= opts.cooling_rate;
        }
    }

    info!(
        iterations = stats.iterations,
        accepted = stats.accepted,
        reheats = stats.reheats,
        initial = initial_score,
        best = best_score,
        "annealing finished"
    );
    for kind in MoveKind::ALL {
        debug!(%kind, accepted = stats.accepted_for(kind), "moves accepted");
    }

    AnnealOutcome {
        best,
        best_score,
        initial_score,
        stats,
    }
}

impl AnnealStats {
    pub fn accepted_for(&self, kind: MoveKind) -> usize {
        self.accepted_by_move[kind.index()]
    }
}

//! Fonction objectif : somme pondérée de compteurs de violations.
//!
//! Chaque terme est calculé indépendamment et conservé brut dans
//! [`ScoreBreakdown`] ; le score scalaire est `Σ brut × poids`.

use super::solution::{Nurse, Solution};
use super::util::{leading_run, trailing_run, PrevTails};
use crate::model::{ShiftCode, ShiftRequest, WorkIntensity};
use crate::rule::WardRule;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

pub const STAFFING_WEIGHT: f64 = 10_000.0;
pub const CONSECUTIVE_WEIGHT: f64 = 10_000.0;
pub const PREVIOUS_MONTH_WEIGHT: f64 = 10_000.0;
pub const ELIGIBILITY_WEIGHT: f64 = 30_000.0;
pub const REQUEST_WEIGHT: f64 = 5_000.0;
pub const NOD_WEIGHT: f64 = 5_000.0;
pub const PATTERN_WEIGHT: f64 = 2_500.0;
pub const WORKLOAD_WEIGHT: f64 = 1_000.0;
pub const INTENSITY_WEIGHT: f64 = 2_000.0;

/// Valeurs brutes (non pondérées) de chaque terme.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub staffing: f64,
    pub consecutive: f64,
    pub previous_month: f64,
    pub eligibility: f64,
    pub requests: f64,
    pub nod: f64,
    pub patterns: f64,
    pub workload: f64,
    pub intensity: f64,
}

impl ScoreBreakdown {
    /// Score scalaire minimisé par la recherche.
    pub fn total(&self) -> f64 {
        self.staffing * STAFFING_WEIGHT
            + self.consecutive * CONSECUTIVE_WEIGHT
            + self.previous_month * PREVIOUS_MONTH_WEIGHT
            + self.eligibility * ELIGIBILITY_WEIGHT
            + self.requests * REQUEST_WEIGHT
            + self.nod * NOD_WEIGHT
            + self.patterns * PATTERN_WEIGHT
            + self.workload * WORKLOAD_WEIGHT
            + self.intensity * INTENSITY_WEIGHT
    }

    /// Somme des termes durs (effectifs, enchaînements, continuité, éligibilité).
    pub fn hard(&self) -> f64 {
        self.staffing * STAFFING_WEIGHT
            + self.consecutive * CONSECUTIVE_WEIGHT
            + self.previous_month * PREVIOUS_MONTH_WEIGHT
            + self.eligibility * ELIGIBILITY_WEIGHT
    }
}

impl fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "staffing        {:>10.2}", self.staffing)?;
        writeln!(f, "consecutive     {:>10.2}", self.consecutive)?;
        writeln!(f, "previous month  {:>10.2}", self.previous_month)?;
        writeln!(f, "eligibility     {:>10.2}", self.eligibility)?;
        writeln!(f, "requests        {:>10.2}", self.requests)?;
        writeln!(f, "nod             {:>10.2}", self.nod)?;
        writeln!(f, "patterns        {:>10.2}", self.patterns)?;
        writeln!(f, "workload        {:>10.2}", self.workload)?;
        writeln!(f, "intensity       {:>10.2}", self.intensity)?;
        write!(f, "total           {:>10.2}", self.total())
    }
}

/// Souhait rattaché à une position dans la solution.
#[derive(Debug, Clone, Copy)]
struct BoundRequest {
    nurse: usize,
    day: usize,
    shift: ShiftCode,
    reinforced: bool,
}

/// Évaluateur lié à une règle, aux queues du mois précédent et aux souhaits.
///
/// Les souhaits sont résolus une fois contre l'ordre des infirmières de
/// `shape` ; toutes les solutions d'une même recherche partagent cet ordre.
#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    rule: &'a WardRule,
    tails: &'a PrevTails,
    requests: Vec<BoundRequest>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        rule: &'a WardRule,
        tails: &'a PrevTails,
        requests: &[ShiftRequest],
        shape: &Solution,
    ) -> Self {
        let days = shape.days_in_month();
        let mut bound = Vec::with_capacity(requests.len());
        for req in requests {
            if req.day == 0 || req.day > days {
                warn!(nurse = %req.nurse, day = req.day, "request outside the month, ignored");
                continue;
            }
            match shape.nurses().iter().position(|n| n.id() == req.nurse) {
                Some(nurse) => bound.push(BoundRequest {
                    nurse,
                    day: req.day - 1,
                    shift: req.shift,
                    reinforced: req.reinforced,
                }),
                None => debug!(nurse = %req.nurse, "request for a nurse outside the search pool"),
            }
        }
        Self {
            rule,
            tails,
            requests: bound,
        }
    }

    pub fn score(&self, solution: &Solution) -> f64 {
        self.breakdown(solution).total()
    }

    pub fn breakdown(&self, solution: &Solution) -> ScoreBreakdown {
        if solution.nurses().is_empty() {
            return ScoreBreakdown::default();
        }
        ScoreBreakdown {
            staffing: staffing(solution),
            consecutive: solution
                .nurses()
                .iter()
                .map(|n| consecutive_runs(n, self.rule))
                .sum(),
            previous_month: solution
                .nurses()
                .iter()
                .map(|n| self.previous_month(n))
                .sum(),
            eligibility: solution.nurses().iter().map(eligibility).sum(),
            requests: self.requests(solution),
            nod: solution.nurses().iter().map(|n| self.nod(n)).sum(),
            patterns: solution.nurses().iter().map(patterns).sum(),
            workload: workload(solution),
            intensity: intensity(solution),
        }
    }

    fn requests(&self, solution: &Solution) -> f64 {
        self.requests
            .iter()
            .filter(|r| {
                solution
                    .nurses()
                    .get(r.nurse)
                    .is_some_and(|n| n.shift(r.day) != r.shift)
            })
            .map(|r| if r.reinforced { 3.0 } else { 1.0 })
            .sum()
    }

    fn previous_month(&self, nurse: &Nurse) -> f64 {
        let Some(tail) = self.tails.get(nurse.id()) else {
            return 0.0;
        };
        let max_shift = self.rule.max_consecutive_shifts as usize;
        let max_night = self.rule.max_consecutive_nights as usize;
        let last = tail[tail.len() - 1];
        let first = nurse.shift(0);
        let mut v = 0.0;

        if last == ShiftCode::N {
            if matches!(first, ShiftCode::D | ShiftCode::E) {
                v += 50.0;
            }
            if first == ShiftCode::N {
                let excess = boundary_night_run(tail, nurse).saturating_sub(max_night);
                // comptée deux fois : excès de la série, puis série à cheval
                v += excess as f64 * 10.0;
                v += excess as f64 * 8.0;

                let single_before = tail.len() < 2 || tail[tail.len() - 2] != ShiftCode::N;
                if nurse.days() >= 2 && nurse.shift(1) != ShiftCode::N && single_before {
                    v += 15.0;
                }
            }
            if first != ShiftCode::O && first != ShiftCode::N {
                v += 30.0;
            }
            if first == ShiftCode::O && nurse.days() >= 2 && nurse.shift(1) == ShiftCode::D {
                v += 40.0;
            }
        }

        let worked = trailing_run(tail, ShiftCode::is_work) + leading_run(nurse.shifts(), ShiftCode::is_work);
        if worked > max_shift {
            v += (worked - max_shift) as f64 * 5.0;
        }

        if last == ShiftCode::E && first == ShiftCode::D {
            v += 10.0;
        }
        v
    }

    fn nod(&self, nurse: &Nurse) -> f64 {
        let days = nurse.days();
        let mut v = (0..days.saturating_sub(2))
            .filter(|start| nurse.has_nod_at(*start))
            .count() as f64
            * 10.0;
        if self.tails.ends_with_night(nurse.id())
            && days >= 2
            && nurse.shift(0) == ShiftCode::O
            && nurse.shift(1) == ShiftCode::D
        {
            v += 20.0;
        }
        v
    }
}

/// Série de nuits à cheval : fin de la queue + début du mois.
fn boundary_night_run(tail: &[ShiftCode], nurse: &Nurse) -> usize {
    let is_night = |s: ShiftCode| s == ShiftCode::N;
    trailing_run(tail, is_night) + leading_run(nurse.shifts(), is_night)
}

fn staffing(solution: &Solution) -> f64 {
    let mut v = 0.0;
    for day in 0..solution.days_in_month() {
        let req = solution.requirement(day);
        let gap = |code: ShiftCode| solution.count_on(day, code).abs_diff(req.target(code)) as f64;
        v += gap(ShiftCode::N) * 50.0;
        v += gap(ShiftCode::D);
        v += gap(ShiftCode::E);
    }
    v
}

fn consecutive_runs(nurse: &Nurse, rule: &WardRule) -> f64 {
    let max_shift = rule.max_consecutive_shifts as usize;
    let max_night = rule.max_consecutive_nights as usize;
    let mut v = 0.0;
    let mut shifts = 0usize;
    let mut nights = 0usize;
    let mut has_single = false;

    for &code in nurse.shifts() {
        if code.is_work() {
            shifts += 1;
            if code == ShiftCode::N {
                nights += 1;
            } else {
                if nights == 1 {
                    v += 10.0;
                    has_single = true;
                }
                nights = 0;
            }
        } else {
            if nights == 1 {
                v += 10.0;
                has_single = true;
            }
            shifts = 0;
            nights = 0;
        }

        if shifts > max_shift {
            v += 1.0;
        }
        if nights > max_night {
            v += 1.0;
        }
    }

    if nights == 1 {
        v += 10.0;
        has_single = true;
    }
    if has_single {
        v += 5.0;
    }
    v
}

fn eligibility(nurse: &Nurse) -> f64 {
    let dedicated = nurse.eligibility().dedicated();
    nurse
        .shifts()
        .iter()
        .filter(|s| s.is_work())
        .map(|&code| {
            let mut v = 0.0;
            if !nurse.can_work(code) {
                v += 200.0;
            }
            if dedicated.is_some_and(|own| own != code) {
                v += 500.0;
            }
            v
        })
        .sum()
}

fn patterns(nurse: &Nurse) -> f64 {
    nurse
        .shifts()
        .windows(2)
        .map(|w| match (w[0], w[1]) {
            (ShiftCode::N, ShiftCode::D | ShiftCode::E) => 2.0,
            (ShiftCode::E, ShiftCode::D) => 1.0,
            _ => 0.0,
        })
        .sum()
}

/// Somme des écarts-types (population) du nombre de D, E, N et O par infirmière.
fn workload(solution: &Solution) -> f64 {
    [ShiftCode::D, ShiftCode::E, ShiftCode::N, ShiftCode::O]
        .into_iter()
        .map(|code| {
            let counts: Vec<f64> = solution
                .nurses()
                .iter()
                .map(|n| n.count(code) as f64)
                .collect();
            std_dev(&counts)
        })
        .sum()
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

fn intensity(solution: &Solution) -> f64 {
    let days = solution.days_in_month();
    if days == 0 {
        return 0.0;
    }
    let only_low = solution
        .nurses()
        .iter()
        .all(|n| n.intensity() == WorkIntensity::Low);

    solution
        .nurses()
        .iter()
        .map(|nurse| {
            let ratio = nurse.worked_days() as f64 / days as f64;
            let target = nurse.intensity().target_ratio();
            let diff = (ratio - target).abs();
            let multiplier = match nurse.intensity() {
                WorkIntensity::Low => {
                    let base = if only_low { 5.0 } else { 3.0 };
                    if ratio > target {
                        base * 1.5
                    } else {
                        base
                    }
                }
                WorkIntensity::High | WorkIntensity::Medium => 1.0,
            };
            diff * 100.0 * multiplier
        })
        .sum()
}

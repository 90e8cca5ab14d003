//! Mouvements locaux. Chaque appel produit une copie mutée ; un mouvement
//! dont les préconditions ne sont pas réunies laisse la copie intacte.

use super::construction::can_start_night_block;
use super::solution::Solution;
use super::util::PrevTails;
use crate::model::ShiftCode;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Échange d'un jour entre deux infirmières
    SwapDay,
    /// Nouveau code éligible sur une case
    Recolor,
    /// Échange d'une séquence de 1 à 3 jours
    SwapSequence,
    /// Création ou casse d'un motif Nuit-Repos-Jour
    ToggleNod,
    /// Nuit isolée prolongée en bloc de deux
    ExtendNight,
    /// Réparation du passage de mois après une nuit
    RepairBoundary,
}

impl MoveKind {
    pub const ALL: [MoveKind; 6] = [
        MoveKind::SwapDay,
        MoveKind::Recolor,
        MoveKind::SwapSequence,
        MoveKind::ToggleNod,
        MoveKind::ExtendNight,
        MoveKind::RepairBoundary,
    ];

    pub fn index(self) -> usize {
        match self {
            MoveKind::SwapDay => 0,
            MoveKind::Recolor => 1,
            MoveKind::SwapSequence => 2,
            MoveKind::ToggleNod => 3,
            MoveKind::ExtendNight => 4,
            MoveKind::RepairBoundary => 5,
        }
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MoveKind::SwapDay => "swap-day",
            MoveKind::Recolor => "recolor",
            MoveKind::SwapSequence => "swap-sequence",
            MoveKind::ToggleNod => "toggle-nod",
            MoveKind::ExtendNight => "extend-night",
            MoveKind::RepairBoundary => "repair-boundary",
        };
        f.write_str(s)
    }
}

/// Tire un mouvement uniformément et l'applique à une copie de `current`.
pub fn generate<R: Rng>(current: &Solution, tails: &PrevTails, rng: &mut R) -> (Solution, MoveKind) {
    let kind = MoveKind::ALL[rng.random_range(0..MoveKind::ALL.len())];
    let mut neighbor = current.clone();
    apply(kind, &mut neighbor, tails, rng);
    (neighbor, kind)
}

/// Applique `kind` en place.
pub fn apply<R: Rng>(kind: MoveKind, sol: &mut Solution, tails: &PrevTails, rng: &mut R) {
    match kind {
        MoveKind::SwapDay => swap_day(sol, rng),
        MoveKind::Recolor => recolor(sol, rng),
        MoveKind::SwapSequence => swap_sequence(sol, rng),
        MoveKind::ToggleNod => toggle_nod(sol, rng),
        MoveKind::ExtendNight => extend_night(sol, rng),
        MoveKind::RepairBoundary => repair_boundary(sol, tails, rng),
    }
}

/// Deux indices distincts tirés uniformément.
fn two_nurses<R: Rng>(count: usize, rng: &mut R) -> Option<(usize, usize)> {
    if count < 2 {
        return None;
    }
    let a = rng.random_range(0..count);
    let mut b = rng.random_range(0..count - 1);
    if b >= a {
        b += 1;
    }
    Some((a, b))
}

fn swap_day<R: Rng>(sol: &mut Solution, rng: &mut R) {
    let days = sol.days_in_month();
    if days == 0 {
        return;
    }
    let Some((a, b)) = two_nurses(sol.nurses().len(), rng) else {
        return;
    };
    let day = rng.random_range(0..days);
    if let Some((x, y)) = sol.pair_mut(a, b) {
        x.swap_with(y, day);
    }
}

fn recolor<R: Rng>(sol: &mut Solution, rng: &mut R) {
    let days = sol.days_in_month();
    if days == 0 || sol.nurses().is_empty() {
        return;
    }
    let idx = rng.random_range(0..sol.nurses().len());
    let day = rng.random_range(0..days);
    let nurse = &mut sol.nurses_mut()[idx];

    let mut options: Vec<ShiftCode> = [ShiftCode::D, ShiftCode::E, ShiftCode::N]
        .into_iter()
        .filter(|c| nurse.can_work(*c))
        .collect();
    options.push(ShiftCode::O);
    if let Some(code) = options.choose(rng) {
        nurse.assign(day, *code);
    }
}

fn swap_sequence<R: Rng>(sol: &mut Solution, rng: &mut R) {
    let days = sol.days_in_month();
    if days < 3 {
        return;
    }
    let Some((a, b)) = two_nurses(sol.nurses().len(), rng) else {
        return;
    };
    let start = rng.random_range(0..days - 2);
    let len = rng.random_range(1..=3usize);
    let span = start..(start + len).min(days);

    let (na, nb) = (&sol.nurses()[a], &sol.nurses()[b]);
    let feasible = span
        .clone()
        .all(|d| nb.can_work(na.shift(d)) && na.can_work(nb.shift(d)));
    if !feasible {
        return;
    }
    if let Some((x, y)) = sol.pair_mut(a, b) {
        for day in span {
            x.swap_with(y, day);
        }
    }
}

fn toggle_nod<R: Rng>(sol: &mut Solution, rng: &mut R) {
    let days = sol.days_in_month();
    if days < 3 || sol.nurses().is_empty() {
        return;
    }
    let idx = rng.random_range(0..sol.nurses().len());
    let start = rng.random_range(0..days - 2);
    let nurse = &mut sol.nurses_mut()[idx];

    if nurse.has_nod_at(start) {
        let offset = rng.random_range(0..3usize);
        let candidates: &[ShiftCode] = match offset {
            0 => &[ShiftCode::E, ShiftCode::D],
            1 => &[ShiftCode::E, ShiftCode::N, ShiftCode::D],
            _ => &[ShiftCode::E, ShiftCode::N, ShiftCode::O],
        };
        let alternatives: Vec<ShiftCode> = candidates
            .iter()
            .copied()
            .filter(|c| nurse.can_work(*c))
            .collect();
        if let Some(code) = alternatives.choose(rng) {
            nurse.assign(start + offset, *code);
        }
    } else if nurse.can_work(ShiftCode::N) && nurse.can_work(ShiftCode::D) {
        nurse.assign(start, ShiftCode::N);
        nurse.assign(start + 1, ShiftCode::O);
        nurse.assign(start + 2, ShiftCode::D);
    }
}

fn extend_night<R: Rng>(sol: &mut Solution, rng: &mut R) {
    let days = sol.days_in_month();
    if days < 3 {
        return;
    }
    let eligible: Vec<usize> = (0..sol.nurses().len())
        .filter(|idx| sol.nurses()[*idx].can_work(ShiftCode::N))
        .collect();
    let Some(&idx) = eligible.choose(rng) else {
        return;
    };
    let start = rng.random_range(0..days - 2);
    let nurse = &mut sol.nurses_mut()[idx];

    for day in start..days - 2 {
        if nurse.shift(day) == ShiftCode::N
            && nurse.shift(day + 1) != ShiftCode::N
            && can_start_night_block(nurse, day)
        {
            nurse.assign(day + 1, ShiftCode::N);
            break;
        }
    }
}

fn repair_boundary<R: Rng>(sol: &mut Solution, tails: &PrevTails, rng: &mut R) {
    let candidates: Vec<usize> = (0..sol.nurses().len())
        .filter(|idx| tails.ends_with_night(sol.nurses()[*idx].id()))
        .collect();
    let Some(&idx) = candidates.choose(rng) else {
        return;
    };
    let nurse = &mut sol.nurses_mut()[idx];
    let has_second_day = nurse.days() > 1;

    if nurse.can_work(ShiftCode::N) {
        let first = if rng.random_bool(0.5) {
            ShiftCode::N
        } else {
            ShiftCode::O
        };
        nurse.assign(0, first);
        if !has_second_day {
            return;
        }
        if first == ShiftCode::N {
            let second = if rng.random_bool(0.5) {
                ShiftCode::N
            } else {
                ShiftCode::O
            };
            nurse.assign(1, second);
        } else {
            let mut options: Vec<ShiftCode> = [ShiftCode::E, ShiftCode::N]
                .into_iter()
                .filter(|c| nurse.can_work(*c))
                .collect();
            options.push(ShiftCode::O);
            if let Some(code) = options.choose(rng) {
                nurse.assign(1, *code);
            }
        }
    } else {
        nurse.assign(0, ShiftCode::O);
        if !has_second_day {
            return;
        }
        let mut options: Vec<ShiftCode> = [ShiftCode::D, ShiftCode::E]
            .into_iter()
            .filter(|c| nurse.can_work(*c))
            .collect();
        options.push(ShiftCode::O);
        if let Some(code) = options.choose(rng) {
            nurse.assign(1, *code);
        }
    }
}

//! Solution initiale : reprise de la révision courante, continuité avec le
//! mois précédent, puis remplissage glouton des jours encore vierges
//! (Nuit → Jour → Soir).
//!
//! Un besoin impossible à couvrir laisse simplement la case en repos ; c'est
//! l'évaluateur qui le fera payer.

use super::solution::{DailyRequirement, Nurse, Solution};
use super::util::{trailing_run, PrevTails};
use crate::model::{Duty, Member, ShiftCode};
use crate::rule::WardRule;
use rand::Rng;

/// Au-delà de ce nombre de jours travaillés d'affilée, plus de nouvelle affectation.
const AVAILABILITY_WINDOW: usize = 5;

/// Construit la solution initiale pour les infirmières polyvalentes.
///
/// Le nombre de jours est celui de `requirements`.
pub fn build<R: Rng>(
    flexible: &[Member],
    rule: &WardRule,
    existing: Option<&Duty>,
    tails: &PrevTails,
    requirements: Vec<DailyRequirement>,
    rng: &mut R,
) -> Solution {
    let days = requirements.len();
    let mut nurses: Vec<Nurse> = flexible
        .iter()
        .map(|member| seed(member, existing, days))
        .collect();

    apply_continuity(&mut nurses, tails, rule, rng);

    for (day, req) in requirements.iter().enumerate() {
        if has_no_assignment(&nurses, day) {
            fill_day(&mut nurses, day, req, rule, rng);
        }
    }

    Solution::new(days, nurses, requirements)
}

/// Tout en repos, puis recopie de la révision courante (X et M deviennent O).
fn seed(member: &Member, existing: Option<&Duty>, days: usize) -> Nurse {
    let mut shifts = vec![ShiftCode::O; days];
    if let Some(row) = existing.and_then(|duty| duty.find(member.id)) {
        for (day, cell) in shifts.iter_mut().enumerate() {
            *cell = match row.shift_on(day + 1) {
                ShiftCode::X | ShiftCode::M => ShiftCode::O,
                code => code,
            };
        }
    }
    Nurse::with_shifts(member, shifts)
}

/// Une nuit en fin de mois précédent impose soit de prolonger la série
/// (puis repos le 2), soit un repos le 1er.
fn apply_continuity<R: Rng>(nurses: &mut [Nurse], tails: &PrevTails, rule: &WardRule, rng: &mut R) {
    for nurse in nurses.iter_mut() {
        let Some(tail) = tails.get(nurse.id()) else {
            continue;
        };
        if tail.last() != Some(&ShiftCode::N) {
            continue;
        }

        let extend = rng.random_bool(0.5) && nurse.days() > 1 && nurse.can_work(ShiftCode::N);
        let run = trailing_run(tail, |s| s == ShiftCode::N);
        if extend && (run as u32) < rule.max_consecutive_nights {
            nurse.assign(0, ShiftCode::N);
            nurse.assign(1, ShiftCode::O);
        } else {
            nurse.assign(0, ShiftCode::O);
        }
    }
}

/// Jour encore vierge : seules les journées sans aucune affectation sont
/// remplies, une saisie manuelle n'est jamais complétée.
fn has_no_assignment(nurses: &[Nurse], day: usize) -> bool {
    nurses.iter().all(|nurse| nurse.shift(day).is_rest())
}

/// Disponible : pas de nuit la veille, pas déjà `AVAILABILITY_WINDOW` jours
/// travaillés d'affilée, case du jour encore libre.
fn is_available(nurse: &Nurse, day: usize) -> bool {
    if !nurse.shift(day).is_rest() {
        return false;
    }
    if day > 0 && nurse.shift(day - 1) == ShiftCode::N {
        return false;
    }
    let mut consecutive = 0;
    for d in day.saturating_sub(AVAILABILITY_WINDOW)..day {
        if nurse.shift(d).is_work() {
            consecutive += 1;
        } else {
            consecutive = 0;
        }
    }
    consecutive < AVAILABILITY_WINDOW
}

/// Un bloc de deux nuits peut-il commencer à `start` (repos avant et après) ?
pub(super) fn can_start_night_block(nurse: &Nurse, start: usize) -> bool {
    if start + 1 >= nurse.days() || !nurse.can_work(ShiftCode::N) {
        return false;
    }
    if start > 0 && !nurse.shift(start - 1).is_rest() {
        return false;
    }
    start + 2 >= nurse.days() || nurse.shift(start + 2).is_rest()
}

fn fill_day<R: Rng>(
    nurses: &mut [Nurse],
    day: usize,
    req: &DailyRequirement,
    rule: &WardRule,
    rng: &mut R,
) {
    let remaining = |nurses: &[Nurse], code: ShiftCode| {
        let assigned = nurses.iter().filter(|n| n.shift(day) == code).count();
        req.target(code).saturating_sub(assigned)
    };

    let mut available: Vec<usize> = (0..nurses.len())
        .filter(|idx| is_available(&nurses[*idx], day))
        .collect();
    available.sort_by_key(|idx| nurses[*idx].intensity().rank());

    let nights = remaining(nurses, ShiftCode::N);
    assign_nights(nurses, day, nights, &mut available, rule, rng);

    for code in [ShiftCode::D, ShiftCode::E] {
        let mut needed = remaining(nurses, code);
        let mut eligible: Vec<usize> = available
            .iter()
            .copied()
            .filter(|idx| nurses[*idx].can_work(code))
            .collect();
        while needed > 0 && !eligible.is_empty() {
            let pick = eligible.swap_remove(rng.random_range(0..eligible.len()));
            nurses[pick].assign(day, code);
            available.retain(|idx| *idx != pick);
            needed -= 1;
        }
    }
}

fn assign_nights<R: Rng>(
    nurses: &mut [Nurse],
    day: usize,
    mut needed: usize,
    available: &mut Vec<usize>,
    rule: &WardRule,
    rng: &mut R,
) {
    if needed == 0 {
        return;
    }

    // 1. prolonger les séries de la veille
    if day > 0 {
        let mut carriers: Vec<usize> = (0..nurses.len())
            .filter(|idx| {
                let nurse = &nurses[*idx];
                nurse.shift(day - 1) == ShiftCode::N
                    && nurse.shift(day).is_rest()
                    && nurse.can_work(ShiftCode::N)
                    && (nurse.night_run_ending_at(day - 1) as u32) < rule.max_consecutive_nights
            })
            .collect();
        carriers.sort_by_key(|idx| nurses[*idx].intensity().rank());
        for idx in carriers {
            if needed == 0 {
                break;
            }
            nurses[idx].assign(day, ShiftCode::N);
            available.retain(|a| *a != idx);
            needed -= 1;
        }
    }

    // 2. jours pairs : ouvrir un bloc de deux nuits (veille + jour)
    if needed > 0 && day > 0 && (day + 1) % 2 == 0 {
        let mut candidates = available.clone();
        while needed > 0 && !candidates.is_empty() {
            let idx = candidates.swap_remove(rng.random_range(0..candidates.len()));
            let nurse = &mut nurses[idx];
            if nurse.shift(day - 1).is_rest() && can_start_night_block(nurse, day - 1) {
                nurse.assign(day - 1, ShiftCode::N);
                nurse.assign(day, ShiftCode::N);
                available.retain(|a| *a != idx);
                needed -= 1;
            }
        }
    }

    // 3. reste : n'importe quelle infirmière disponible et éligible
    let mut eligible: Vec<usize> = available
        .iter()
        .copied()
        .filter(|idx| nurses[*idx].can_work(ShiftCode::N))
        .collect();
    while needed > 0 && !eligible.is_empty() {
        let idx = eligible.swap_remove(rng.random_range(0..eligible.len()));
        let nurse = &mut nurses[idx];
        let pair = can_start_night_block(nurse, day);
        nurse.assign(day, ShiftCode::N);
        if pair {
            nurse.assign(day + 1, ShiftCode::N);
        }
        available.retain(|a| *a != idx);
        needed -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_shifts, NurseId, ShiftSet};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn flat(days: usize, d: i32, e: i32, n: i32) -> Vec<DailyRequirement> {
        vec![DailyRequirement { day: d, evening: e, night: n }; days]
    }

    fn roster(n: u64) -> Vec<Member> {
        (1..=n).map(|id| Member::new(id, format!("n{id}"))).collect()
    }

    #[test]
    fn every_cell_is_filled_with_an_eligible_code() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut members = roster(10);
        members[0].eligibility = ShiftSet::of(&[ShiftCode::D, ShiftCode::E]);
        let sol = build(
            &members,
            &WardRule::default(),
            None,
            &PrevTails::default(),
            flat(30, 3, 2, 2),
            &mut rng,
        );

        assert_eq!(sol.nurses().len(), 10);
        for nurse in sol.nurses() {
            assert_eq!(nurse.shifts().len(), 30);
            assert!(nurse.shifts().iter().all(|s| nurse.can_work(*s)));
        }
        assert_eq!(sol.nurses()[0].count(ShiftCode::N), 0);
    }

    #[test]
    fn never_overstaffs_day_and_evening() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let sol = build(
            &roster(12),
            &WardRule::default(),
            None,
            &PrevTails::default(),
            flat(28, 3, 2, 2),
            &mut rng,
        );
        for day in 0..28 {
            assert!(sol.count_on(day, ShiftCode::D) <= 3);
            assert!(sol.count_on(day, ShiftCode::E) <= 2);
        }
    }

    #[test]
    fn night_at_month_end_forces_rest_when_run_is_full() {
        let mut tails = PrevTails::default();
        tails.insert(NurseId::new(1), parse_shifts("ONNN").unwrap());
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sol = build(
                &roster(1),
                &WardRule::default(),
                None,
                &tails,
                flat(5, 0, 0, 0),
                &mut rng,
            );
            assert_eq!(sol.nurses()[0].shift(0), ShiftCode::O);
        }
    }

    #[test]
    fn short_night_tail_either_extends_or_rests() {
        let mut tails = PrevTails::default();
        tails.insert(NurseId::new(1), parse_shifts("OOON").unwrap());
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sol = build(
                &roster(1),
                &WardRule::default(),
                None,
                &tails,
                flat(5, 0, 0, 0),
                &mut rng,
            );
            let nurse = &sol.nurses()[0];
            match nurse.shift(0) {
                ShiftCode::N => assert_eq!(nurse.shift(1), ShiftCode::O),
                other => assert_eq!(other, ShiftCode::O),
            }
        }
    }

    #[test]
    fn existing_revision_is_overlaid() {
        let members = roster(2);
        let duty = Duty {
            idx: 0,
            rows: vec![crate::model::NurseShift {
                nurse: NurseId::new(1),
                shifts: "DXMEN".to_string(),
            }],
            history: crate::model::History {
                author: None,
                label: "manual".into(),
                auto_created: false,
                created_at: chrono::Utc::now(),
            },
        };
        let nurse = seed(&members[0], Some(&duty), 5);
        assert_eq!(nurse.shifts(), parse_shifts("DOOEN").unwrap().as_slice());
        let blank = seed(&members[1], Some(&duty), 5);
        assert!(blank.shifts().iter().all(|s| *s == ShiftCode::O));
    }

    #[test]
    fn manually_edited_day_is_left_untouched() {
        let members = roster(10);
        let duty = Duty {
            idx: 0,
            rows: vec![crate::model::NurseShift {
                nurse: NurseId::new(1),
                shifts: format!("XD{}", "X".repeat(28)),
            }],
            history: crate::model::History {
                author: None,
                label: "manual".into(),
                auto_created: false,
                created_at: chrono::Utc::now(),
            },
        };
        for seed in 0..8 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sol = build(
                &members,
                &WardRule::default(),
                Some(&duty),
                &PrevTails::default(),
                flat(30, 3, 2, 2),
                &mut rng,
            );
            // seules les paires de nuits ouvertes la veille peuvent déborder sur le 2
            assert_eq!(sol.nurses()[0].shift(1), ShiftCode::D);
            assert_eq!(sol.count_on(1, ShiftCode::D), 1);
            assert_eq!(sol.count_on(1, ShiftCode::E), 0);
            assert!(sol.count_on(0, ShiftCode::D) > 0);
        }
    }

    #[test]
    fn degenerate_rosters_do_not_panic() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let empty = build(&[], &WardRule::default(), None, &PrevTails::default(), flat(30, 3, 2, 2), &mut rng);
        assert!(empty.nurses().is_empty());

        let one_day = build(&roster(1), &WardRule::default(), None, &PrevTails::default(), flat(1, 1, 1, 1), &mut rng);
        assert_eq!(one_day.nurses()[0].shifts().len(), 1);

        let no_days = build(&roster(3), &WardRule::default(), None, &PrevTails::default(), Vec::new(), &mut rng);
        assert_eq!(no_days.days_in_month(), 0);
    }
}

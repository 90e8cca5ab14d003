//! Motifs fixes des infirmières dédiées à un seul poste.
//!
//! - Nuit : rotation `NNNOOO`, décalée de 3 jours d'une infirmière à l'autre,
//!   ou prolongée à partir de la queue du mois précédent quand elle existe.
//! - Jour, soir, mi-journée : le poste en semaine, repos le week-end.
//!
//! Ces infirmières ne passent jamais par la recherche stochastique.

use super::requirement::DedicatedSupply;
use super::solution::Nurse;
use super::util::{trailing_run, PrevTails};
use crate::calendar::YearMonth;
use crate::model::{Member, ShiftCode};
use tracing::debug;

const NIGHT_CYCLE: [ShiftCode; 6] = [
    ShiftCode::N,
    ShiftCode::N,
    ShiftCode::N,
    ShiftCode::O,
    ShiftCode::O,
    ShiftCode::O,
];

/// Génère les plannings dédiés et alimente `supply` au passage.
///
/// Les membres non dédiés sont ignorés ; l'ordre de sortie suit celui
/// de `members`.
pub fn generate(
    members: &[Member],
    month: YearMonth,
    tails: &PrevTails,
    supply: &mut DedicatedSupply,
) -> Vec<Nurse> {
    let days = month.days_in_month();
    let mut night_rotation = 0usize;
    let mut out = Vec::new();

    for member in members {
        let Some(code) = member.dedicated() else {
            continue;
        };
        let shifts = match code {
            ShiftCode::N => {
                let offset = match tails.get(member.id) {
                    Some(tail) if tail.iter().any(|s| *s != ShiftCode::X) => cycle_position(tail),
                    _ => night_rotation * 3 % NIGHT_CYCLE.len(),
                };
                night_rotation += 1;
                night_pattern(days, offset)
            }
            _ => weekday_pattern(month, code),
        };

        for (day, shift) in shifts.iter().enumerate() {
            supply.record(day, *shift);
        }
        debug!(nurse = %member.id, shift = %code, "dedicated pattern generated");
        out.push(Nurse::with_shifts(member, shifts));
    }
    out
}

fn night_pattern(days: usize, offset: usize) -> Vec<ShiftCode> {
    (0..days)
        .map(|day| NIGHT_CYCLE[(day + offset) % NIGHT_CYCLE.len()])
        .collect()
}

fn weekday_pattern(month: YearMonth, code: ShiftCode) -> Vec<ShiftCode> {
    (1..=month.days_in_month())
        .map(|day| if month.is_weekend(day) { ShiftCode::O } else { code })
        .collect()
}

/// Position dans `NNNOOO` qui suit immédiatement `tail`.
fn cycle_position(tail: &[ShiftCode]) -> usize {
    let len = NIGHT_CYCLE.len();
    let matched = (0..len).find(|start| {
        tail.iter()
            .enumerate()
            .all(|(j, s)| NIGHT_CYCLE[(start + j) % len] == *s)
    });
    if let Some(start) = matched {
        return (start + tail.len()) % len;
    }

    // queue atypique : on se recale sur la dernière série
    if tail.last() == Some(&ShiftCode::N) {
        match trailing_run(tail, |s| s == ShiftCode::N) {
            n if n >= 3 => 3,
            2 => 2,
            _ => 1,
        }
    } else {
        match trailing_run(tail, ShiftCode::is_rest) {
            n if n >= 3 => 0,
            2 => 5,
            _ => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{format_shifts, parse_shifts, NurseId, ShiftSet};

    fn june() -> YearMonth {
        YearMonth::new(2025, 6).unwrap()
    }

    fn dedicated(id: u64, code: ShiftCode) -> Member {
        Member::new(id, format!("n{id}")).with_eligibility(ShiftSet::only(code))
    }

    #[test]
    fn night_rotation_offsets_and_supply() {
        let members = vec![dedicated(1, ShiftCode::N), dedicated(2, ShiftCode::N)];
        let mut supply = DedicatedSupply::new(30);
        let out = generate(&members, june(), &PrevTails::default(), &mut supply);

        assert_eq!(out.len(), 2);
        assert!(format_shifts(out[0].shifts()).starts_with("NNNOOONNN"));
        assert!(format_shifts(out[1].shifts()).starts_with("OOONNNOOO"));
        for day in 0..30 {
            assert_eq!(supply.on(day, ShiftCode::N), 1);
        }
    }

    #[test]
    fn continues_rotation_from_previous_tail() {
        let members = vec![dedicated(1, ShiftCode::N)];
        let mut tails = PrevTails::default();
        tails.insert(NurseId::new(1), parse_shifts("ONNN").unwrap());
        let mut supply = DedicatedSupply::new(30);
        let out = generate(&members, june(), &tails, &mut supply);
        assert!(format_shifts(out[0].shifts()).starts_with("OOONNN"));
    }

    #[test]
    fn atypical_tail_falls_back_on_last_run() {
        assert_eq!(cycle_position(&parse_shifts("DENN").unwrap()), 2);
        assert_eq!(cycle_position(&parse_shifts("DDEO").unwrap()), 4);
        assert_eq!(cycle_position(&parse_shifts("NOOO").unwrap()), 0);
        assert_eq!(cycle_position(&parse_shifts("XXXX").unwrap()), 0);
    }

    #[test]
    fn weekday_only_patterns_never_leave_their_shift() {
        let members = vec![
            dedicated(1, ShiftCode::D),
            dedicated(2, ShiftCode::E),
            dedicated(3, ShiftCode::M),
            Member::new(4, "flex"),
        ];
        let mut supply = DedicatedSupply::new(30);
        let out = generate(&members, june(), &PrevTails::default(), &mut supply);

        assert_eq!(out.len(), 3);
        for nurse in &out {
            let own = nurse.eligibility().dedicated().unwrap();
            assert!(nurse.shifts().iter().all(|s| *s == own || *s == ShiftCode::O));
            // 1er juin = dimanche, 2 juin = lundi
            assert_eq!(nurse.shift(0), ShiftCode::O);
            assert_eq!(nurse.shift(1), own);
        }
        assert_eq!(supply.on(1, ShiftCode::D), 1);
        assert_eq!(supply.on(1, ShiftCode::E), 1);
        assert_eq!(supply.on(0, ShiftCode::D), 0);
    }
}

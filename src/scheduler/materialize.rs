//! Conversion de la meilleure solution en révision persistée.

use super::solution::{Nurse, Solution};
use crate::model::{Duty, History, NurseId, NurseShift, WardSchedule};
use chrono::Utc;

/// Lignes de la révision : polyvalentes d'abord, dédiées ensuite.
pub fn rows(best: &Solution, dedicated: &[Nurse]) -> Vec<NurseShift> {
    best.nurses()
        .iter()
        .chain(dedicated)
        .map(|n| NurseShift::new(n.id(), n.shifts()))
        .collect()
}

/// Vrai dès qu'une ligne diffère de la révision courante (comparaison par
/// infirmière) ou que le nombre de lignes change.
pub fn differs(current: Option<&Duty>, rows: &[NurseShift]) -> bool {
    let Some(current) = current else {
        return true;
    };
    if current.rows.len() != rows.len() {
        return true;
    }
    rows.iter().any(|row| {
        current
            .find(row.nurse)
            .map_or(true, |existing| existing.shifts != row.shifts)
    })
}

/// Nouvelle révision ajoutée juste après `now_idx`.
///
/// Les révisions postérieures au pointeur (branche abandonnée) sont
/// écartées ; les précédentes restent intactes.
pub fn append_revision(
    schedule: &WardSchedule,
    rows: Vec<NurseShift>,
    author: Option<NurseId>,
) -> WardSchedule {
    let keep = (schedule.now_idx + 1).min(schedule.duties.len());
    let mut duties: Vec<Duty> = schedule.duties[..keep].to_vec();
    let idx = keep;
    duties.push(Duty {
        idx,
        rows,
        history: History {
            author,
            label: "auto".to_string(),
            auto_created: true,
            created_at: Utc::now(),
        },
    });

    WardSchedule {
        id: schedule.id.clone(),
        ward: schedule.ward.clone(),
        month: schedule.month,
        now_idx: idx,
        duties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::YearMonth;
    use crate::model::{parse_shifts, Member};
    use crate::scheduler::solution::DailyRequirement;

    fn schedule() -> WardSchedule {
        let ym = YearMonth::new(2025, 2).unwrap();
        WardSchedule::initialize("icu", ym, &[Member::new(1, "a"), Member::new(2, "b")])
    }

    #[test]
    fn appends_after_pointer_and_drops_later_branch() {
        let mut s = schedule();
        let first = append_revision(&s, s.duties[0].rows.clone(), None);
        let second = append_revision(&first, first.duties[0].rows.clone(), None);
        assert_eq!(second.duties.len(), 3);

        s = second.clone();
        s.now_idx = 0;
        let branched = append_revision(&s, Vec::new(), Some(NurseId::new(1)));
        assert_eq!(branched.duties.len(), 2);
        assert_eq!(branched.now_idx, 1);
        assert_eq!(branched.duties[1].idx, 1);
        assert_eq!(branched.duties[1].history.author, Some(NurseId::new(1)));
        assert!(branched.duties[1].history.auto_created);
        assert_eq!(branched.duties[0], second.duties[0]);
        assert_eq!(branched.id, second.id);
    }

    #[test]
    fn change_detection_by_nurse() {
        let s = schedule();
        let current = s.current();
        let same = current.map(|d| d.rows.clone()).unwrap_or_default();
        assert!(!differs(current, &same));

        let mut reordered = same.clone();
        reordered.reverse();
        assert!(!differs(current, &reordered));

        let mut edited = same.clone();
        edited[0].shifts.replace_range(0..1, "D");
        assert!(differs(current, &edited));
        assert!(differs(None, &same));

        // infirmière retirée du roster : sa ligne disparaît
        assert!(differs(current, &same[..1]));
    }

    #[test]
    fn rows_put_dedicated_last() {
        let a = Member::new(1, "a");
        let b = Member::new(2, "b");
        let flex = Nurse::with_shifts(&a, parse_shifts("DEN").unwrap());
        let night = Nurse::with_shifts(&b, parse_shifts("NNN").unwrap());
        let best = Solution::new(3, vec![flex], vec![DailyRequirement::default(); 3]);
        let out = rows(&best, &[night]);
        assert_eq!(out[0].nurse, NurseId::new(1));
        assert_eq!(out[0].shifts, "DEN");
        assert_eq!(out[1].shifts, "NNN");
    }
}

use crate::model::{NurseId, ShiftCode, WardSchedule};
use std::collections::BTreeMap;

/// Queues du mois précédent (4 derniers codes par infirmière). Jamais modifiées.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrevTails(BTreeMap<NurseId, Vec<ShiftCode>>);

impl PrevTails {
    /// Lit la révision courante du planning précédent. Les lignes de moins
    /// de 4 jours sont ignorées.
    pub fn from_schedule(previous: Option<&WardSchedule>) -> Self {
        let Some(duty) = previous.and_then(WardSchedule::current) else {
            return Self::default();
        };
        Self(
            duty.rows
                .iter()
                .filter_map(|row| row.tail().map(|tail| (row.nurse, tail)))
                .collect(),
        )
    }

    pub fn insert(&mut self, nurse: NurseId, tail: Vec<ShiftCode>) {
        self.0.insert(nurse, tail);
    }

    pub fn get(&self, nurse: NurseId) -> Option<&[ShiftCode]> {
        self.0.get(&nurse).map(Vec::as_slice).filter(|t| !t.is_empty())
    }

    pub fn last(&self, nurse: NurseId) -> Option<ShiftCode> {
        self.get(nurse).and_then(|t| t.last().copied())
    }

    pub fn ends_with_night(&self, nurse: NurseId) -> bool {
        self.last(nurse) == Some(ShiftCode::N)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Longueur de la série finale de `tail` satisfaisant `pred`.
pub(super) fn trailing_run(tail: &[ShiftCode], pred: impl Fn(ShiftCode) -> bool) -> usize {
    tail.iter().rev().take_while(|s| pred(**s)).count()
}

/// Longueur de la série initiale de `shifts` satisfaisant `pred`.
pub(super) fn leading_run(shifts: &[ShiftCode], pred: impl Fn(ShiftCode) -> bool) -> usize {
    shifts.iter().take_while(|s| pred(**s)).count()
}

use crate::model::{Member, NurseId, ShiftCode, ShiftSet, WorkIntensity};

/// Effectif cible d'un jour, net de l'offre des dédiées.
///
/// Les valeurs restent signées (une valeur négative signale un excédent) ;
/// le bornage à zéro se fait au moment de la comparaison via [`target`].
///
/// [`target`]: DailyRequirement::target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyRequirement {
    pub day: i32,
    pub evening: i32,
    pub night: i32,
}

impl DailyRequirement {
    pub fn target(&self, code: ShiftCode) -> usize {
        let raw = match code {
            ShiftCode::D => self.day,
            ShiftCode::E => self.evening,
            ShiftCode::N => self.night,
            _ => 0,
        };
        raw.max(0) as usize
    }
}

/// Infirmière pendant la recherche : une séquence de codes, un jour par case
/// (index 0 = 1er du mois).
#[derive(Debug, Clone, PartialEq)]
pub struct Nurse {
    id: NurseId,
    shifts: Vec<ShiftCode>,
    eligibility: ShiftSet,
    intensity: WorkIntensity,
}

impl Nurse {
    /// Tout le mois en repos.
    pub fn new(member: &Member, days: usize) -> Self {
        Self {
            id: member.id,
            shifts: vec![ShiftCode::O; days],
            eligibility: member.eligibility,
            intensity: member.intensity,
        }
    }

    /// Séquence brute, sans contrôle d'éligibilité (les écarts seront pénalisés).
    pub fn with_shifts(member: &Member, shifts: Vec<ShiftCode>) -> Self {
        Self {
            id: member.id,
            shifts,
            eligibility: member.eligibility,
            intensity: member.intensity,
        }
    }

    pub fn id(&self) -> NurseId {
        self.id
    }

    pub fn eligibility(&self) -> ShiftSet {
        self.eligibility
    }

    pub fn intensity(&self) -> WorkIntensity {
        self.intensity
    }

    pub fn shifts(&self) -> &[ShiftCode] {
        &self.shifts
    }

    pub fn days(&self) -> usize {
        self.shifts.len()
    }

    pub fn can_work(&self, code: ShiftCode) -> bool {
        self.eligibility.allows(code)
    }

    /// Code du jour `day` ; X hors du mois.
    pub fn shift(&self, day: usize) -> ShiftCode {
        self.shifts.get(day).copied().unwrap_or(ShiftCode::X)
    }

    /// Pose `code` si l'infirmière y a droit. Renvoie `false` sinon (case inchangée).
    pub fn assign(&mut self, day: usize, code: ShiftCode) -> bool {
        if !self.can_work(code) {
            return false;
        }
        match self.shifts.get_mut(day) {
            Some(cell) => {
                *cell = code;
                true
            }
            None => false,
        }
    }

    /// Échange des cases `day` avec `other`, si chacune a droit au code de l'autre.
    pub fn swap_with(&mut self, other: &mut Nurse, day: usize) -> bool {
        let (mine, theirs) = (self.shift(day), other.shift(day));
        if day >= self.days() || day >= other.days() {
            return false;
        }
        if !other.can_work(mine) || !self.can_work(theirs) {
            return false;
        }
        self.shifts[day] = theirs;
        other.shifts[day] = mine;
        true
    }

    /// Motif Nuit → Repos → Jour débutant à `start`.
    pub fn has_nod_at(&self, start: usize) -> bool {
        start + 2 < self.shifts.len()
            && self.shifts[start] == ShiftCode::N
            && self.shifts[start + 1] == ShiftCode::O
            && self.shifts[start + 2] == ShiftCode::D
    }

    pub fn count(&self, code: ShiftCode) -> usize {
        self.shifts.iter().filter(|s| **s == code).count()
    }

    /// Nombre de jours travaillés (D + E + N).
    pub fn worked_days(&self) -> usize {
        self.count(ShiftCode::D) + self.count(ShiftCode::E) + self.count(ShiftCode::N)
    }

    /// Longueur de la série de nuits qui se termine à `day` inclus.
    pub fn night_run_ending_at(&self, day: usize) -> usize {
        if day >= self.shifts.len() {
            return 0;
        }
        self.shifts[..=day]
            .iter()
            .rev()
            .take_while(|s| **s == ShiftCode::N)
            .count()
    }
}

/// Solution candidate. Toute mutation se fait sur un clone profond.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    days_in_month: usize,
    nurses: Vec<Nurse>,
    requirements: Vec<DailyRequirement>,
}

impl Solution {
    pub fn new(days_in_month: usize, nurses: Vec<Nurse>, requirements: Vec<DailyRequirement>) -> Self {
        Self {
            days_in_month,
            nurses,
            requirements,
        }
    }

    pub fn days_in_month(&self) -> usize {
        self.days_in_month
    }

    pub fn nurses(&self) -> &[Nurse] {
        &self.nurses
    }

    pub fn nurses_mut(&mut self) -> &mut [Nurse] {
        &mut self.nurses
    }

    pub fn requirement(&self, day: usize) -> DailyRequirement {
        self.requirements.get(day).copied().unwrap_or_default()
    }

    pub fn nurse(&self, id: NurseId) -> Option<&Nurse> {
        self.nurses.iter().find(|n| n.id == id)
    }

    /// Effectif affecté à `code` le jour `day`.
    pub fn count_on(&self, day: usize, code: ShiftCode) -> usize {
        self.nurses.iter().filter(|n| n.shift(day) == code).count()
    }

    /// Deux infirmières distinctes, en mutable.
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut Nurse, &mut Nurse)> {
        if a == b || a >= self.nurses.len() || b >= self.nurses.len() {
            return None;
        }
        if a < b {
            let (left, right) = self.nurses.split_at_mut(b);
            Some((&mut left[a], &mut right[0]))
        } else {
            let (left, right) = self.nurses.split_at_mut(a);
            Some((&mut right[0], &mut left[b]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_shifts;

    fn nurse(eligibility: ShiftSet, shifts: &str) -> Nurse {
        let member = Member::new(1, "a").with_eligibility(eligibility);
        Nurse::with_shifts(&member, parse_shifts(shifts).unwrap())
    }

    #[test]
    fn assign_respects_eligibility() {
        let mut n = nurse(ShiftSet::only(ShiftCode::N), "OOO");
        assert!(!n.assign(0, ShiftCode::D));
        assert!(n.assign(0, ShiftCode::N));
        assert!(n.assign(1, ShiftCode::O));
        assert!(!n.assign(3, ShiftCode::N));
        assert_eq!(n.shifts(), parse_shifts("NOO").unwrap().as_slice());
    }

    #[test]
    fn night_runs_and_nod() {
        let n = nurse(ShiftSet::ALL, "ONNNOD");
        assert_eq!(n.night_run_ending_at(3), 3);
        assert_eq!(n.night_run_ending_at(4), 0);
        assert!(n.has_nod_at(3));
        assert!(!n.has_nod_at(4));
        assert_eq!(n.worked_days(), 4);
    }

    #[test]
    fn requirement_clamps_only_on_read() {
        let req = DailyRequirement {
            day: 2,
            evening: 1,
            night: -1,
        };
        assert_eq!(req.night, -1);
        assert_eq!(req.target(ShiftCode::N), 0);
        assert_eq!(req.target(ShiftCode::D), 2);
    }

    #[test]
    fn pair_mut_swaps_cells() {
        let a = nurse(ShiftSet::ALL, "DO");
        let b = nurse(ShiftSet::ALL, "EN");
        let mut sol = Solution::new(2, vec![a, b], Vec::new());
        let (x, y) = sol.pair_mut(1, 0).unwrap();
        assert!(x.swap_with(y, 1));
        assert_eq!(sol.nurses()[0].shift(1), ShiftCode::N);
        assert_eq!(sol.nurses()[1].shift(1), ShiftCode::O);
        assert!(sol.pair_mut(0, 0).is_none());
    }
}

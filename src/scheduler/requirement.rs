use super::solution::DailyRequirement;
use crate::calendar::YearMonth;
use crate::model::ShiftCode;
use crate::rule::WardRule;

/// Effectif déjà fourni chaque jour par les infirmières dédiées.
///
/// Alimenté par le générateur de motifs fixes, puis lu par le calcul des
/// besoins : il circule explicitement d'une phase à l'autre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedicatedSupply {
    day: Vec<i32>,
    evening: Vec<i32>,
    night: Vec<i32>,
}

impl DedicatedSupply {
    pub fn new(days: usize) -> Self {
        Self {
            day: vec![0; days],
            evening: vec![0; days],
            night: vec![0; days],
        }
    }

    /// Enregistre un poste dédié ; M, O et X ne couvrent aucun besoin.
    pub fn record(&mut self, day: usize, code: ShiftCode) {
        let slot = match code {
            ShiftCode::D => self.day.get_mut(day),
            ShiftCode::E => self.evening.get_mut(day),
            ShiftCode::N => self.night.get_mut(day),
            _ => None,
        };
        if let Some(count) = slot {
            *count += 1;
        }
    }

    pub fn on(&self, day: usize, code: ShiftCode) -> i32 {
        let series = match code {
            ShiftCode::D => &self.day,
            ShiftCode::E => &self.evening,
            ShiftCode::N => &self.night,
            _ => return 0,
        };
        series.get(day).copied().unwrap_or(0)
    }
}

/// Besoins jour par jour (index 0 = 1er du mois), nets de l'offre dédiée.
pub fn daily_requirements(
    rule: &WardRule,
    month: YearMonth,
    supply: &DedicatedSupply,
) -> Vec<DailyRequirement> {
    (0..month.days_in_month())
        .map(|idx| {
            let (day, evening, night) = rule.targets(month.is_weekend(idx + 1));
            DailyRequirement {
                day: day - supply.on(idx, ShiftCode::D),
                evening: evening - supply.on(idx, ShiftCode::E),
                night: night - supply.on(idx, ShiftCode::N),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_and_weekend_targets() {
        // 1er juin 2025 = dimanche, 2 juin = lundi
        let ym = YearMonth::new(2025, 6).unwrap();
        let reqs = daily_requirements(&WardRule::default(), ym, &DedicatedSupply::new(30));
        assert_eq!(reqs.len(), 30);
        assert_eq!(reqs[0], DailyRequirement { day: 2, evening: 2, night: 2 });
        assert_eq!(reqs[1], DailyRequirement { day: 3, evening: 2, night: 2 });
    }

    #[test]
    fn supply_is_subtracted_and_may_go_negative() {
        let ym = YearMonth::new(2025, 6).unwrap();
        let mut supply = DedicatedSupply::new(30);
        for _ in 0..3 {
            supply.record(1, ShiftCode::N);
        }
        supply.record(1, ShiftCode::D);
        supply.record(1, ShiftCode::M);
        supply.record(99, ShiftCode::N);

        let reqs = daily_requirements(&WardRule::default(), ym, &supply);
        assert_eq!(reqs[1].night, -1);
        assert_eq!(reqs[1].day, 2);
        assert_eq!(reqs[1].evening, 2);
        assert_eq!(reqs[1].target(ShiftCode::N), 0);
    }
}

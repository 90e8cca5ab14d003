use crate::calendar::YearMonth;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Règle d'effectif d'un service : cibles semaine / week-end par poste
/// et limites de travail consécutif.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardRule {
    pub weekday_day: i32,
    pub weekday_evening: i32,
    pub weekday_night: i32,
    pub weekend_day: i32,
    pub weekend_evening: i32,
    pub weekend_night: i32,
    #[serde(default = "default_max_consecutive_shifts")]
    pub max_consecutive_shifts: u32,
    #[serde(default = "default_max_consecutive_nights")]
    pub max_consecutive_nights: u32,
}

fn default_max_consecutive_shifts() -> u32 {
    5
}

fn default_max_consecutive_nights() -> u32 {
    3
}

impl Default for WardRule {
    fn default() -> Self {
        Self {
            weekday_day: 3,
            weekday_evening: 2,
            weekday_night: 2,
            weekend_day: 2,
            weekend_evening: 2,
            weekend_night: 2,
            max_consecutive_shifts: default_max_consecutive_shifts(),
            max_consecutive_nights: default_max_consecutive_nights(),
        }
    }
}

impl WardRule {
    pub fn validate(&self) -> Result<()> {
        let counts = [
            self.weekday_day,
            self.weekday_evening,
            self.weekday_night,
            self.weekend_day,
            self.weekend_evening,
            self.weekend_night,
        ];
        if counts.iter().any(|c| *c < 0) {
            bail!("headcount targets cannot be negative");
        }
        if self.max_consecutive_shifts == 0 {
            bail!("max_consecutive_shifts must be > 0");
        }
        if self.max_consecutive_nights == 0 {
            bail!("max_consecutive_nights must be > 0");
        }
        if self.max_consecutive_nights > self.max_consecutive_shifts {
            bail!("max_consecutive_nights cannot exceed max_consecutive_shifts");
        }
        Ok(())
    }

    /// (jour, soir, nuit) bruts pour un jour de semaine ou de week-end.
    pub fn targets(&self, weekend: bool) -> (i32, i32, i32) {
        if weekend {
            (self.weekend_day, self.weekend_evening, self.weekend_night)
        } else {
            (self.weekday_day, self.weekday_evening, self.weekday_night)
        }
    }

    /// Nombre total de postes à pourvoir sur le mois.
    pub fn required_shifts(&self, month: YearMonth) -> i64 {
        let (wd, we, wn) = self.targets(false);
        let (ed, ee, en) = self.targets(true);
        let weekday = i64::from(wd + we + wn) * month.weekday_count() as i64;
        let weekend = i64::from(ed + ee + en) * month.weekend_count() as i64;
        weekday + weekend
    }
}

/// Effectif minimal théorique pour couvrir le mois.
///
/// Chaque infirmière polyvalente compte pour autant de postes qu'il y a
/// de jours ouvrés ; une infirmière de nuit dédiée couvre la moitié du mois.
/// Les dédiées mi-journée s'ajoutent telles quelles.
pub fn needed_nurse_count(
    month: YearMonth,
    rule: &WardRule,
    night_dedicated: usize,
    mid_dedicated: usize,
) -> usize {
    let total = rule.required_shifts(month);
    let per_nurse = month.weekday_count().max(1) as i64;
    let night_capacity = (night_dedicated * (month.days_in_month() / 2)) as i64;
    let remaining = (total - night_capacity).max(0);

    let mut flexible = 1usize;
    while (flexible as i64) * per_nurse < remaining {
        flexible += 1;
    }
    flexible + night_dedicated + mid_dedicated
}

pub fn export_rule_json<P: AsRef<Path>>(path: P, rule: &WardRule) -> Result<()> {
    let json = serde_json::to_string_pretty(rule)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_rule_from_file<P: AsRef<Path>>(path: P) -> Result<WardRule> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading rule {}", path.display()))?;
    let rule: WardRule = serde_json::from_slice(&data)
        .with_context(|| format!("parsing rule {}", path.display()))?;
    rule.validate()?;
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_is_valid() {
        assert!(WardRule::default().validate().is_ok());
    }

    #[test]
    fn rejects_negative_or_inverted_limits() {
        let mut rule = WardRule::default();
        rule.weekend_night = -1;
        assert!(rule.validate().is_err());

        let mut rule = WardRule::default();
        rule.max_consecutive_nights = 6;
        assert!(rule.validate().is_err());
    }

    #[test]
    fn needed_count_for_june_2025() {
        // 21 jours ouvrés * 7 + 9 jours de week-end * 6 = 201 postes
        let ym = YearMonth::new(2025, 6).unwrap();
        let rule = WardRule::default();
        assert_eq!(rule.required_shifts(ym), 201);
        // ceil(201 / 21) = 10
        assert_eq!(needed_nurse_count(ym, &rule, 0, 0), 10);
        // 2 nuits dédiées couvrent 2 * 15 = 30 postes : ceil(171 / 21) = 9
        assert_eq!(needed_nurse_count(ym, &rule, 2, 1), 9 + 2 + 1);
    }
}

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mois civil (année + mois 1..=12), base de tout le calcul d'effectifs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Valide le mois (1..=12) et l'année (représentable par chrono).
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    fn first_day(&self) -> NaiveDate {
        // invariant garanti par `new`
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn days_in_month(&self) -> usize {
        let next = self.next().first_day();
        next.signed_duration_since(self.first_day()).num_days() as usize
    }

    /// `day` est le quantième (1-based). Hors du mois : `false`.
    pub fn is_weekend(&self, day: usize) -> bool {
        let Ok(day) = u32::try_from(day) else {
            return false;
        };
        match NaiveDate::from_ymd_opt(self.year, self.month, day) {
            Some(date) => matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            None => false,
        }
    }

    pub fn weekday_count(&self) -> usize {
        (1..=self.days_in_month())
            .filter(|day| !self.is_weekend(*day))
            .count()
    }

    pub fn weekend_count(&self) -> usize {
        self.days_in_month() - self.weekday_count()
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

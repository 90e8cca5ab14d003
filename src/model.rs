use crate::calendar::YearMonth;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifiant fort pour une infirmière (clé du service de persistance)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NurseId(u64);

impl NurseId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NurseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Code de poste d'une journée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftCode {
    /// Jour
    D,
    /// Soir
    E,
    /// Nuit
    N,
    /// Mi-journée
    M,
    /// Repos
    O,
    /// Non pourvu / gelé
    X,
}

impl ShiftCode {
    pub const WORKING: [ShiftCode; 4] = [ShiftCode::D, ShiftCode::E, ShiftCode::N, ShiftCode::M];

    pub fn as_char(self) -> char {
        match self {
            ShiftCode::D => 'D',
            ShiftCode::E => 'E',
            ShiftCode::N => 'N',
            ShiftCode::M => 'M',
            ShiftCode::O => 'O',
            ShiftCode::X => 'X',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'D' => Some(ShiftCode::D),
            'E' => Some(ShiftCode::E),
            'N' => Some(ShiftCode::N),
            'M' => Some(ShiftCode::M),
            'O' => Some(ShiftCode::O),
            'X' => Some(ShiftCode::X),
            _ => None,
        }
    }

    /// O et X ne comptent jamais comme travail.
    pub fn is_rest(self) -> bool {
        matches!(self, ShiftCode::O | ShiftCode::X)
    }

    pub fn is_work(self) -> bool {
        !self.is_rest()
    }

    fn bit(self) -> u8 {
        match self {
            ShiftCode::D => 0b0001,
            ShiftCode::E => 0b0010,
            ShiftCode::N => 0b0100,
            ShiftCode::M => 0b1000,
            ShiftCode::O | ShiftCode::X => 0,
        }
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Parse une séquence de codes ("DDENO..."). Premier caractère invalide en erreur.
pub fn parse_shifts(raw: &str) -> Result<Vec<ShiftCode>, char> {
    raw.chars()
        .map(|c| ShiftCode::from_char(c).ok_or(c))
        .collect()
}

pub fn format_shifts(shifts: &[ShiftCode]) -> String {
    shifts.iter().map(|s| s.as_char()).collect()
}

/// Ensemble des postes de travail autorisés (D/E/N/M) pour une infirmière.
///
/// Représenté en interne par un bitset ; O et X sont toujours autorisés
/// et n'en font donc pas partie.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShiftSet(u8);

impl ShiftSet {
    pub const EMPTY: ShiftSet = ShiftSet(0);
    /// Polyvalente : D, E et N (la mi-journée reste un poste dédié).
    pub const ALL: ShiftSet = ShiftSet(0b0111);

    pub fn only(code: ShiftCode) -> Self {
        Self(code.bit())
    }

    pub fn of(codes: &[ShiftCode]) -> Self {
        Self(codes.iter().fold(0, |acc, c| acc | c.bit()))
    }

    pub fn with(self, code: ShiftCode) -> Self {
        Self(self.0 | code.bit())
    }

    pub fn allows(&self, code: ShiftCode) -> bool {
        code.is_rest() || self.0 & code.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Poste unique si l'ensemble contient exactement un poste de travail.
    pub fn dedicated(&self) -> Option<ShiftCode> {
        let mut found = ShiftCode::WORKING.iter().filter(|c| self.0 & c.bit() != 0);
        match (found.next(), found.next()) {
            (Some(code), None) => Some(*code),
            _ => None,
        }
    }

    pub fn codes(&self) -> impl Iterator<Item = ShiftCode> {
        let bits = self.0;
        ShiftCode::WORKING
            .into_iter()
            .filter(move |c| bits & c.bit() != 0)
    }
}

impl Default for ShiftSet {
    fn default() -> Self {
        ShiftSet::ALL
    }
}

impl fmt::Debug for ShiftSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShiftSet({})", String::from(*self))
    }
}

impl From<ShiftSet> for String {
    fn from(set: ShiftSet) -> Self {
        if set == ShiftSet::ALL {
            return "ALL".to_string();
        }
        set.codes().map(ShiftCode::as_char).collect()
    }
}

impl TryFrom<String> for ShiftSet {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl std::str::FromStr for ShiftSet {
    type Err = String;

    /// Accepte "ALL" ou une liste de postes ("DE", "N", "M").
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") {
            return Ok(ShiftSet::ALL);
        }
        let mut set = ShiftSet::EMPTY;
        for c in raw.chars().filter(|c| !c.is_whitespace() && *c != '|') {
            match ShiftCode::from_char(c) {
                Some(code) if code.is_work() => set = set.with(code),
                _ => return Err(format!("invalid shift in eligibility: {c}")),
            }
        }
        if set.is_empty() {
            return Err("eligibility cannot be empty".to_string());
        }
        Ok(set)
    }
}

/// Intensité de travail déclarée (part cible de jours travaillés).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkIntensity {
    High,
    #[default]
    Medium,
    Low,
}

impl WorkIntensity {
    pub fn target_ratio(self) -> f64 {
        match self {
            WorkIntensity::High => 0.7,
            WorkIntensity::Medium => 0.6,
            WorkIntensity::Low => 0.5,
        }
    }

    /// Ordre de priorité à l'affectation (HIGH d'abord).
    pub fn rank(self) -> u8 {
        match self {
            WorkIntensity::High => 0,
            WorkIntensity::Medium => 1,
            WorkIntensity::Low => 2,
        }
    }
}

impl std::str::FromStr for WorkIntensity {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(WorkIntensity::High),
            "" | "medium" | "m" => Ok(WorkIntensity::Medium),
            "low" | "l" => Ok(WorkIntensity::Low),
            other => Err(format!("invalid work intensity: {other}")),
        }
    }
}

/// Membre du service (entrée du roster)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: NurseId,
    pub name: String,
    #[serde(default)]
    pub eligibility: ShiftSet,
    #[serde(default)]
    pub intensity: WorkIntensity,
}

impl Member {
    pub fn new<S: Into<String>>(id: u64, name: S) -> Self {
        Self {
            id: NurseId::new(id),
            name: name.into(),
            eligibility: ShiftSet::ALL,
            intensity: WorkIntensity::Medium,
        }
    }

    pub fn with_eligibility(mut self, eligibility: ShiftSet) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn with_intensity(mut self, intensity: WorkIntensity) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn dedicated(&self) -> Option<ShiftCode> {
        self.eligibility.dedicated()
    }
}

/// Souhait d'une infirmière pour un jour (1-based) et un poste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRequest {
    pub nurse: NurseId,
    pub day: usize,
    pub shift: ShiftCode,
    #[serde(default)]
    pub reinforced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl ShiftRequest {
    pub fn new(nurse: NurseId, day: usize, shift: ShiftCode) -> Self {
        Self {
            nurse,
            day,
            shift,
            reinforced: false,
            memo: None,
        }
    }

    pub fn reinforced(mut self) -> Self {
        self.reinforced = true;
        self
    }
}

/// Ligne d'une révision : la chaîne complète du mois pour une infirmière.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NurseShift {
    pub nurse: NurseId,
    pub shifts: String,
}

impl NurseShift {
    pub fn new(nurse: NurseId, shifts: &[ShiftCode]) -> Self {
        Self {
            nurse,
            shifts: format_shifts(shifts),
        }
    }

    /// Code du jour (1-based), X si hors plage ou illisible.
    pub fn shift_on(&self, day: usize) -> ShiftCode {
        day.checked_sub(1)
            .and_then(|idx| self.shifts.chars().nth(idx))
            .and_then(ShiftCode::from_char)
            .unwrap_or(ShiftCode::X)
    }

    /// Les 4 derniers codes (queue utilisée pour la continuité inter-mois).
    pub fn tail(&self) -> Option<Vec<ShiftCode>> {
        let codes = parse_shifts(&self.shifts).ok()?;
        if codes.len() < 4 {
            return None;
        }
        Some(codes[codes.len() - 4..].to_vec())
    }
}

/// Trace d'une révision (qui, quand, auto ou manuelle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<NurseId>,
    pub label: String,
    pub auto_created: bool,
    pub created_at: DateTime<Utc>,
}

/// Révision immuable d'un planning mensuel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duty {
    pub idx: usize,
    pub rows: Vec<NurseShift>,
    pub history: History,
}

impl Duty {
    pub fn find(&self, nurse: NurseId) -> Option<&NurseShift> {
        self.rows.iter().find(|r| r.nurse == nurse)
    }
}

/// Identifiant fort pour un planning
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(String);

impl ScheduleId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Planning d'un service pour un mois : historique append-only de révisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardSchedule {
    pub id: ScheduleId,
    pub ward: String,
    pub month: YearMonth,
    pub now_idx: usize,
    pub duties: Vec<Duty>,
}

impl WardSchedule {
    /// Révision 0 : tout le monde à X sur tout le mois.
    pub fn initialize<S: Into<String>>(ward: S, month: YearMonth, members: &[Member]) -> Self {
        let blank = vec![ShiftCode::X; month.days_in_month()];
        let rows = members
            .iter()
            .map(|m| NurseShift::new(m.id, &blank))
            .collect();
        Self {
            id: ScheduleId::random(),
            ward: ward.into(),
            month,
            now_idx: 0,
            duties: vec![Duty {
                idx: 0,
                rows,
                history: History {
                    author: None,
                    label: "init".to_string(),
                    auto_created: true,
                    created_at: Utc::now(),
                },
            }],
        }
    }

    /// Révision courante (pointeur `now_idx`).
    pub fn current(&self) -> Option<&Duty> {
        self.duties.get(self.now_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_set_classifies_dedicated() {
        assert_eq!(ShiftSet::only(ShiftCode::N).dedicated(), Some(ShiftCode::N));
        assert_eq!(ShiftSet::ALL.dedicated(), None);
        assert_eq!(
            ShiftSet::of(&[ShiftCode::D, ShiftCode::E]).dedicated(),
            None
        );
        assert_eq!(ShiftSet::EMPTY.dedicated(), None);
    }

    #[test]
    fn rest_codes_always_allowed() {
        let night = ShiftSet::only(ShiftCode::N);
        assert!(night.allows(ShiftCode::O));
        assert!(night.allows(ShiftCode::X));
        assert!(night.allows(ShiftCode::N));
        assert!(!night.allows(ShiftCode::D));
        assert!(!ShiftSet::ALL.allows(ShiftCode::M));
    }

    #[test]
    fn shift_set_text_forms() {
        assert_eq!("ALL".parse::<ShiftSet>().unwrap(), ShiftSet::ALL);
        assert_eq!("den".parse::<ShiftSet>().unwrap(), ShiftSet::ALL);
        assert_eq!(String::from(ShiftSet::only(ShiftCode::M)), "M");
        assert!("DO".parse::<ShiftSet>().is_err());
        assert!("".parse::<ShiftSet>().is_err());
    }

    #[test]
    fn nurse_shift_tail_and_lookup() {
        let row = NurseShift {
            nurse: NurseId::new(7),
            shifts: "DDEONN".to_string(),
        };
        assert_eq!(row.shift_on(1), ShiftCode::D);
        assert_eq!(row.shift_on(6), ShiftCode::N);
        assert_eq!(row.shift_on(7), ShiftCode::X);
        assert_eq!(row.shift_on(0), ShiftCode::X);
        assert_eq!(
            row.tail().unwrap(),
            vec![ShiftCode::E, ShiftCode::O, ShiftCode::N, ShiftCode::N]
        );
    }
}

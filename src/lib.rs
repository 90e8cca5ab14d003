#![forbid(unsafe_code)]
//! Garde : génération locale de plannings mensuels d'infirmiers (sans BD).
//!
//! - Postes D/E/N/M, repos O, case non pourvue X.
//! - Solution initiale gloutonne puis recuit simulé.
//! - Révisions immuables, stockage fichiers (JSON/CSV).
//! - Générateur aléatoire injecté : un même seed donne le même planning.

pub mod calendar;
pub mod io;
pub mod model;
pub mod report;
pub mod rule;
pub mod scheduler;
pub mod storage;

pub use calendar::YearMonth;
pub use model::{
    Duty, History, Member, NurseId, NurseShift, ScheduleId, ShiftCode, ShiftRequest, ShiftSet,
    WardSchedule, WorkIntensity,
};
pub use report::{unreflected_requests, ReportRenderer, TextReport, UnreflectedRequest};
pub use rule::{export_rule_json, load_rule_from_file, needed_nurse_count, WardRule};
pub use scheduler::{
    AnnealOptions, AnnealStats, GenerateInput, SchedError, ScheduleOutcome, Scheduler,
    ScoreBreakdown,
};
pub use storage::{JsonStorage, ScheduleStore};

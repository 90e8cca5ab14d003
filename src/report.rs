use crate::model::{Duty, NurseId, ShiftCode, ShiftRequest};
use serde::Serialize;

/// Souhait non honoré par une révision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreflectedRequest {
    pub nurse: NurseId,
    /// Jour du mois (1-based).
    pub day: usize,
    pub requested: ShiftCode,
    pub actual: ShiftCode,
    pub reinforced: bool,
    pub memo: Option<String>,
}

/// Permet de customiser le rendu du rapport (texte, mail, etc.).
pub trait ReportRenderer {
    fn render(&self, items: &[UnreflectedRequest]) -> String;
}

/// Rendu texte brut, une ligne par souhait.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReport;

impl ReportRenderer for TextReport {
    fn render(&self, items: &[UnreflectedRequest]) -> String {
        if items.is_empty() {
            return "all requests reflected\n".to_string();
        }
        let mut out = format!("{} request(s) not reflected\n", items.len());
        for item in items {
            out.push_str(&format!(
                "- nurse {nurse} day {day:>2}: requested {req}, got {got}{flag}",
                nurse = item.nurse,
                day = item.day,
                req = item.requested,
                got = item.actual,
                flag = if item.reinforced { " (reinforced)" } else { "" },
            ));
            if let Some(memo) = &item.memo {
                out.push_str(&format!(" [{memo}]"));
            }
            out.push('\n');
        }
        out
    }
}

/// Souhaits que `duty` ne respecte pas, dans l'ordre des souhaits.
///
/// Un souhait visant une infirmière absente de la révision est signalé
/// avec `actual = X`.
pub fn unreflected_requests(duty: &Duty, requests: &[ShiftRequest]) -> Vec<UnreflectedRequest> {
    requests
        .iter()
        .filter_map(|req| {
            let actual = duty
                .find(req.nurse)
                .map_or(ShiftCode::X, |row| row.shift_on(req.day));
            (actual != req.shift).then(|| UnreflectedRequest {
                nurse: req.nurse,
                day: req.day,
                requested: req.shift,
                actual,
                reinforced: req.reinforced,
                memo: req.memo.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{History, NurseShift};
    use chrono::Utc;

    fn duty() -> Duty {
        Duty {
            idx: 1,
            rows: vec![NurseShift {
                nurse: NurseId::new(1),
                shifts: "DENO".to_string(),
            }],
            history: History {
                author: None,
                label: "auto".into(),
                auto_created: true,
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn lists_only_violated_requests() {
        let mut memo = ShiftRequest::new(NurseId::new(1), 4, ShiftCode::D).reinforced();
        memo.memo = Some("wedding".into());
        let requests = vec![
            ShiftRequest::new(NurseId::new(1), 1, ShiftCode::D),
            ShiftRequest::new(NurseId::new(1), 2, ShiftCode::O),
            memo,
            ShiftRequest::new(NurseId::new(9), 1, ShiftCode::O),
        ];
        let out = unreflected_requests(&duty(), &requests);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].day, 2);
        assert_eq!(out[0].actual, ShiftCode::E);
        assert!(out[1].reinforced);
        assert_eq!(out[2].actual, ShiftCode::X);
    }

    #[test]
    fn empty_report() {
        assert_eq!(TextReport.render(&[]), "all requests reflected\n");
    }
}

#![forbid(unsafe_code)]
use garde::{
    unreflected_requests, Duty, History, NurseId, NurseShift, ReportRenderer, ShiftCode,
    ShiftRequest, TextReport,
};
use chrono::{TimeZone, Utc};

fn duty() -> Duty {
    Duty {
        idx: 1,
        rows: vec![
            NurseShift {
                nurse: NurseId::new(1),
                shifts: "OODOO".to_string(),
            },
            NurseShift {
                nurse: NurseId::new(2),
                shifts: "EEEEE".to_string(),
            },
        ],
        history: History {
            author: None,
            label: "auto".into(),
            auto_created: true,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        },
    }
}

#[test]
fn text_report_lists_unreflected_requests() {
    let mut wedding = ShiftRequest::new(NurseId::new(1), 3, ShiftCode::O).reinforced();
    wedding.memo = Some("wedding".into());
    let requests = vec![
        wedding,
        ShiftRequest::new(NurseId::new(1), 1, ShiftCode::O),
        ShiftRequest::new(NurseId::new(2), 5, ShiftCode::N),
    ];

    let items = unreflected_requests(&duty(), &requests);
    insta::assert_snapshot!(TextReport.render(&items).trim_end(), @r"
    2 request(s) not reflected
    - nurse 1 day  3: requested O, got D (reinforced) [wedding]
    - nurse 2 day  5: requested N, got E
    ");
}

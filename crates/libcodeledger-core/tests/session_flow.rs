//! End-to-end flow through the public API: store mutations feeding a report.

use libcodeledger_core::report::{build_report, CODE_HEADING, ISSUES_HEADING, NOTES_HEADING};
use libcodeledger_core::store::SteppingClock;
use libcodeledger_core::{
    render_report, FileStatus, LayoutEngine, LedgerError, MarkdownEngine, PdfEngine, RecordStore,
    ReportConfig, Severity,
};
use chrono::NaiveDate;

fn fixed_store() -> RecordStore {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    RecordStore::with_clock(SteppingClock::new(start))
}

/// Position of each needle, each searched after the previous match
fn ordered_positions(haystack: &str, needles: &[&str]) -> Option<Vec<usize>> {
    let mut from = 0;
    let mut positions = Vec::new();
    for needle in needles {
        let at = haystack[from..].find(needle)? + from;
        positions.push(at);
        from = at + needle.len();
    }
    Some(positions)
}

#[test]
fn test_full_flow_renders_history_in_order() {
    let mut store = fixed_store();
    store.create("x.py").unwrap();
    store.append_note("x.py", "fix bug").unwrap();
    store.append_issue("x.py", "crash on start", Severity::High).unwrap();
    store.append_snapshot("x.py", "print('hi')").unwrap();

    let record = store.get("x.py").unwrap();
    let config = ReportConfig::default();

    let pdf = render_report(record, &PdfEngine::default(), &config).unwrap();
    assert_eq!(pdf.file_name, "x.py_v1.0_report.pdf");
    assert_eq!(pdf.mime_type, "application/pdf");
    let text = String::from_utf8(pdf.bytes.clone()).unwrap();

    // the issue block lists severity before the description
    let order = ["x.py", "fix bug", "High", "crash on start", "print('hi')"];
    assert!(ordered_positions(&text, &order).is_some());

    let md = render_report(record, &MarkdownEngine, &config).unwrap();
    assert_eq!(md.file_name, "x.py_v1.0_report.md");
    let md = String::from_utf8(md.bytes).unwrap();
    assert!(ordered_positions(&md, &order).is_some());

    assert!(pdf.data_link().starts_with("data:application/pdf;base64,JVBERi0"));
}

#[test]
fn test_sections_follow_list_contents() {
    let config = ReportConfig::default();
    let cases: [(usize, usize, usize); 4] = [(0, 0, 0), (2, 0, 0), (0, 3, 1), (1, 1, 1)];

    for (notes, issues, snapshots) in cases {
        let mut store = fixed_store();
        store.create("f.py").unwrap();
        for i in 0..notes {
            store.append_note("f.py", &format!("note {}", i)).unwrap();
        }
        for i in 0..issues {
            store.append_issue("f.py", &format!("issue {}", i), Severity::Low).unwrap();
        }
        for i in 0..snapshots {
            store.append_snapshot("f.py", &format!("code {}", i)).unwrap();
        }

        let doc = build_report(store.get("f.py").unwrap(), &config);
        let headings = doc.headings();
        assert_eq!(headings.contains(&NOTES_HEADING), notes > 0);
        assert_eq!(headings.contains(&ISSUES_HEADING), issues > 0);
        assert_eq!(headings.contains(&CODE_HEADING), snapshots > 0);

        let texts = doc.texts().join("\n");
        let expected: Vec<String> = (0..issues).map(|i| format!("Description: issue {}", i)).collect();
        let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
        assert!(ordered_positions(&texts, &expected).is_some());
    }
}

#[test]
fn test_failed_operations_leave_store_unchanged() {
    let mut store = fixed_store();
    store.create("keep.py").unwrap();
    store.append_note("keep.py", "original").unwrap();
    let before = store.get("keep.py").unwrap().clone();

    assert!(matches!(store.create(""), Err(LedgerError::EmptyName)));
    assert!(matches!(store.create("keep.py"), Err(LedgerError::DuplicateName(_))));
    assert!(matches!(store.append_note("gone.py", "x"), Err(LedgerError::NotFound(_))));
    assert!(matches!(
        store.set_status("gone.py", FileStatus::Deprecated),
        Err(LedgerError::NotFound(_))
    ));

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("keep.py").unwrap(), &before);
}

#[test]
fn test_engines_are_substitutable() {
    let mut store = fixed_store();
    store.create("a.py").unwrap();
    let record = store.get("a.py").unwrap();
    let engines: Vec<Box<dyn LayoutEngine>> = vec![Box::new(PdfEngine::default()), Box::new(MarkdownEngine)];
    for engine in &engines {
        let report = render_report(record, engine.as_ref(), &ReportConfig::default()).unwrap();
        assert!(report.file_name.ends_with(engine.extension()));
        assert!(!report.bytes.is_empty());
    }
}

#[test]
fn test_pdf_rejects_text_outside_latin1() {
    let mut store = fixed_store();
    store.create("x.py").unwrap();
    store.append_note("x.py", "修复 bug").unwrap();
    store.append_snapshot("x.py", "print('日本')").unwrap();
    let record = store.get("x.py").unwrap();
    let config = ReportConfig::default();

    let err = render_report(record, &PdfEngine::default(), &config).unwrap_err();
    assert!(matches!(err, LedgerError::RenderFailure(_)));
    assert!(!err.suggestions().is_empty());

    let md = render_report(record, &MarkdownEngine, &config).unwrap();
    let md = String::from_utf8(md.bytes).unwrap();
    assert!(md.contains("修复 bug"));
    assert!(md.contains("print('日本')"));
}

#[test]
fn test_pdf_keeps_latin1_text() {
    let mut store = fixed_store();
    store.create("x.py").unwrap();
    store.append_note("x.py", "café").unwrap();
    let report = render_report(store.get("x.py").unwrap(), &PdfEngine::default(), &ReportConfig::default()).unwrap();
    let text = String::from_utf8(report.bytes).unwrap();
    assert!(text.contains("(caf\\351)"));
}

//! Generated population invariants.

use casedesk_core::{
    clock::ReferenceClock,
    config::GeneratorConfig,
    error::PipelineError,
    generator::SyntheticGenerator,
    model::{CaseStatus, RawTables},
    rng::RandomSource,
};
use chrono::NaiveDate;
use std::collections::HashMap;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn generate(seed: u64) -> RawTables {
    SyntheticGenerator::new(
        GeneratorConfig::default().with_counts(100, 600, 1_500),
        ReferenceClock::new(as_of()),
    )
    .generate(&RandomSource::new(seed))
    .unwrap()
}

#[test]
fn generates_requested_counts() {
    let raw = generate(42);
    assert_eq!(raw.clients.len(), 100);
    assert_eq!(raw.cases.len(), 600);
    assert_eq!(raw.notes.len(), 1_500);
}

#[test]
fn close_dates_follow_resolution_days() {
    let raw = generate(7);
    for case in &raw.cases {
        match (case.close_date, case.resolution_days) {
            (Some(close), Some(days)) => {
                assert!(close >= case.open_date, "case {} closes before it opens", case.case_id);
                assert_eq!((close - case.open_date).num_days(), days);
                assert!((1..=364).contains(&days));
                assert!(matches!(case.status, CaseStatus::Resolved | CaseStatus::Appealed));
            }
            (None, None) => {
                assert!(matches!(case.status, CaseStatus::Pending | CaseStatus::Abandoned));
            }
            other => panic!("case {} has inconsistent resolution {other:?}", case.case_id),
        }
    }
}

#[test]
fn note_dates_fall_inside_their_case_window() {
    let raw = generate(11);
    let cases: HashMap<u32, _> = raw.cases.iter().map(|c| (c.case_id, c)).collect();
    for note in &raw.notes {
        let case = cases[&note.case_id];
        let end = case.close_date.unwrap_or(as_of());
        assert!(
            case.open_date <= note.note_date && note.note_date <= end,
            "note {} dated {} outside {}..={}",
            note.note_id,
            note.note_date,
            case.open_date,
            end
        );
    }
}

#[test]
fn every_case_references_an_existing_client() {
    let raw = generate(5);
    let n = raw.clients.len() as u32;
    assert!(raw.cases.iter().all(|c| c.client_id < n));
    assert!(raw
        .clients
        .iter()
        .all(|c| (18..=79).contains(&c.age) && c.join_date <= as_of()));
}

#[test]
fn resolution_share_is_near_configured_probability() {
    let raw = generate(3);
    let resolved = raw.cases.iter().filter(|c| c.close_date.is_some()).count();
    let share = resolved as f64 / raw.cases.len() as f64;
    assert!((share - 0.7).abs() < 0.06, "resolved share {share:.3} far from 0.7");
}

#[test]
fn zero_counts_fail_before_generation() {
    let generator = SyntheticGenerator::new(
        GeneratorConfig::default().with_counts(10, 10, 0),
        ReferenceClock::default(),
    );
    let err = generator.generate(&RandomSource::new(1)).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidArgument(_)));
}

#[test]
fn litigation_cases_escalate_more_often() {
    let raw = SyntheticGenerator::new(
        GeneratorConfig::default().with_counts(200, 5_000, 1),
        ReferenceClock::new(as_of()),
    )
    .generate(&RandomSource::new(42))
    .unwrap();

    let (mut lit, mut lit_esc, mut other, mut other_esc) = (0usize, 0usize, 0usize, 0usize);
    for case in &raw.cases {
        if case.case_type.is_litigation() {
            lit += 1;
            lit_esc += usize::from(case.escalated);
        } else {
            other += 1;
            other_esc += usize::from(case.escalated);
        }
    }
    assert!(lit > 1_000 && other > 1_000, "litigation {lit}, other {other}");

    let lit_rate = lit_esc as f64 / lit as f64;
    let other_rate = other_esc as f64 / other as f64;
    assert!((lit_rate - 0.3).abs() < 0.05, "litigation escalation rate {lit_rate}");
    assert!((other_rate - 0.1).abs() < 0.05, "baseline escalation rate {other_rate}");
}

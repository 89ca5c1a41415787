//! Synthetic data generator: clients, cases and case notes.
//!
//! Each table draws from its own stream forked off the caller's
//! `RandomSource`, in this fixed order:
//!   1. Clients  (StreamSlot::Clients)
//!   2. Cases    (StreamSlot::Cases),   referencing existing clients
//!   3. Notes    (StreamSlot::Notes),   referencing existing cases
//!
//! Resolution is sampled in two stages: a Bernoulli draw decides whether the
//! case is resolved, then status and resolution days are drawn conditional on
//! that outcome, so a resolved case always carries a close date.

use crate::{
    clock::{DateWindow, ReferenceClock},
    config::GeneratorConfig,
    error::PipelineResult,
    model::{Case, CaseNote, Client, NoteType, RawTables},
    name_generator::NameGenerator,
    note_writer::NoteWriter,
    rng::{RandomSource, StreamSlot},
    types::{CaseId, ClientId, NoteId},
};
use chrono::Duration;

pub struct SyntheticGenerator {
    config: GeneratorConfig,
    clock: ReferenceClock,
}

impl SyntheticGenerator {
    pub fn new(config: GeneratorConfig, clock: ReferenceClock) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Produce all three tables. Fails with `InvalidArgument` before drawing
    /// anything if the configuration is unusable.
    pub fn generate(&self, source: &RandomSource) -> PipelineResult<RawTables> {
        self.config.validate()?;

        let clients = self.generate_clients(&mut source.fork(StreamSlot::Clients));
        let cases = self.generate_cases(&mut source.fork(StreamSlot::Cases), clients.len());
        let notes = self.generate_notes(&mut source.fork(StreamSlot::Notes), &cases);

        log::info!(
            "generator: seed={} produced {} clients, {} cases, {} notes",
            source.seed(),
            clients.len(),
            cases.len(),
            notes.len()
        );
        Ok(RawTables {
            clients,
            cases,
            notes,
        })
    }

    fn generate_clients(&self, rng: &mut RandomSource) -> Vec<Client> {
        let cfg = &self.config;
        let joined = self.clock.trailing_window(cfg.join_window_days);

        (0..cfg.num_clients)
            .map(|i| Client {
                client_id: i as ClientId,
                name: NameGenerator::full_name(rng),
                age: rng.range_inclusive(cfg.client_age_min.into(), cfg.client_age_max.into()) as u32,
                income_level: rng.weighted(&cfg.income_weights),
                location: NameGenerator::location(rng),
                join_date: joined.sample(rng),
            })
            .collect()
    }

    fn generate_cases(&self, rng: &mut RandomSource, num_clients: usize) -> Vec<Case> {
        let cfg = &self.config;
        let opened = self.clock.trailing_window(cfg.open_window_days);
        let mut cases = Vec::with_capacity(cfg.num_cases);

        for i in 0..cfg.num_cases {
            let open_date = opened.sample(rng);

            let (close_date, resolution_days, status) = if rng.chance(cfg.resolved_probability) {
                let days = rng.range_inclusive(cfg.resolution_days_min, cfg.resolution_days_max);
                let status = rng.weighted(&cfg.resolved_status_weights);
                (Some(open_date + Duration::days(days)), Some(days), status)
            } else {
                (None, None, rng.weighted(&cfg.open_status_weights))
            };

            let case_type = rng.weighted(&cfg.case_type_weights);
            let escalation_p = if case_type.is_litigation() {
                cfg.litigation_escalation_probability
            } else {
                cfg.baseline_escalation_probability
            };
            let escalated = rng.chance(escalation_p);
            let assignee = NameGenerator::attorney(rng, cfg.attorney_pool);
            let client_id = rng.next_u64_below(num_clients as u64) as ClientId;
            let complexity = rng.weighted(&cfg.complexity_weights);

            cases.push(Case {
                case_id: i as CaseId,
                client_id,
                case_type,
                open_date,
                close_date,
                resolution_days,
                status,
                complexity,
                assignee,
                escalated,
            });
        }
        cases
    }

    fn generate_notes(&self, rng: &mut RandomSource, cases: &[Case]) -> Vec<CaseNote> {
        let cfg = &self.config;

        (0..cfg.num_notes)
            .map(|i| {
                let case = rng.pick(cases);
                let lifespan = DateWindow::new(
                    case.open_date,
                    case.close_date.unwrap_or_else(|| self.clock.today()),
                );
                let note_date = lifespan.sample(rng);
                let note_type = *rng.pick(NoteType::ALL);
                let note_text = NoteWriter::write(rng, note_type, case.case_type);
                let created_by = if rng.chance(cfg.note_by_assignee_probability) {
                    case.assignee.clone()
                } else {
                    NameGenerator::staff(rng, cfg.staff_pool)
                };

                CaseNote {
                    note_id: i as NoteId,
                    case_id: case.case_id,
                    note_date,
                    note_type,
                    note_text,
                    created_by,
                }
            })
            .collect()
    }
}

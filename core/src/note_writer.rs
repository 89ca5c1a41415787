//! Template prose for case notes.
//!
//! Sentences are stitched from fixed fragments so the text looks like a
//! paralegal's log without carrying any real content.

use crate::{
    model::{CaseType, NoteType},
    rng::RandomSource,
};

pub struct NoteWriter;

impl NoteWriter {
    /// Note body conditioned on the note's type.
    pub fn write(rng: &mut RandomSource, note_type: NoteType, case_type: CaseType) -> String {
        match note_type {
            NoteType::ClientMeeting => format!(
                "Met with client to discuss {} case. {}",
                case_type.label(),
                Self::paragraph(rng)
            ),
            NoteType::CourtAppearance => {
                let hearing = Self::sentence(rng);
                format!(
                    "Appeared in court for {}. {}",
                    hearing.trim_end_matches('.').to_lowercase(),
                    Self::paragraph(rng)
                )
            }
            _ => Self::paragraph(rng),
        }
    }

    /// Three to five sentences.
    pub fn paragraph(rng: &mut RandomSource) -> String {
        let count = rng.range_inclusive(3, 5);
        (0..count)
            .map(|_| Self::sentence(rng))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn sentence(rng: &mut RandomSource) -> String {
        let subject = rng.pick(SUBJECTS);
        let verb = rng.pick(VERBS);
        let object = rng.pick(OBJECTS);
        let tail = rng.pick(TAILS);
        format!("{subject} {verb} {object} {tail}.")
    }
}

const SUBJECTS: &[&str] = &[
    "Counsel", "The client", "Opposing counsel", "The paralegal", "The court clerk",
    "The mediator", "The expert witness", "The associate",
];

const VERBS: &[&str] = &[
    "reviewed", "requested", "filed", "summarized", "challenged", "confirmed",
    "drafted", "circulated", "objected to", "scheduled",
];

const OBJECTS: &[&str] = &[
    "the discovery responses", "the settlement proposal", "the motion to dismiss",
    "the deposition transcript", "the retainer agreement", "the filing deadline",
    "the witness list", "the billing summary", "the custody schedule",
    "the licensing terms",
];

const TAILS: &[&str] = &[
    "before the hearing", "with the supervising partner", "for the next status conference",
    "pending further review", "ahead of mediation", "as discussed last week",
    "for the case file", "under the current timeline",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeting_notes_name_the_case_type() {
        let mut rng = RandomSource::new(4);
        let text = NoteWriter::write(&mut rng, NoteType::ClientMeeting, CaseType::Corporate);
        assert!(text.starts_with("Met with client to discuss Corporate case. "));
    }

    #[test]
    fn court_notes_use_appearance_template() {
        let mut rng = RandomSource::new(4);
        let text = NoteWriter::write(&mut rng, NoteType::CourtAppearance, CaseType::FamilyLaw);
        assert!(text.starts_with("Appeared in court for "));
    }

    #[test]
    fn paragraphs_end_with_a_period() {
        let mut rng = RandomSource::new(11);
        for _ in 0..20 {
            assert!(NoteWriter::paragraph(&mut rng).ends_with('.'));
        }
    }
}

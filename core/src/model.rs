//! Entity records and their categorical vocabularies.

use crate::{
    error::{PipelineError, PipelineResult},
    table::{ColumnData, Table},
    types::{CaseId, ClientId, NoteId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Declares a closed categorical vocabulary with stable display labels.
macro_rules! vocabulary {
    ($name:ident, $field:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn from_label(raw: &str) -> PipelineResult<Self> {
                match raw.trim() {
                    $($label => Ok($name::$variant),)+
                    other => Err(PipelineError::UnknownLabel {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

vocabulary!(IncomeLevel, "income_level", {
    Low => "Low",
    Medium => "Medium",
    High => "High",
});

vocabulary!(CaseType, "case_type", {
    FamilyLaw => "Family Law",
    CriminalDefense => "Criminal Defense",
    CivilLitigation => "Civil Litigation",
    Corporate => "Corporate",
    IntellectualProperty => "Intellectual Property",
    EstatePlanning => "Estate Planning",
});

vocabulary!(CaseStatus, "status", {
    Resolved => "Resolved",
    Pending => "Pending",
    Appealed => "Appealed",
    Abandoned => "Abandoned",
    Open => "Open",
    Closed => "Closed",
});

vocabulary!(Complexity, "complexity", {
    Low => "Low",
    Medium => "Medium",
    High => "High",
});

vocabulary!(NoteType, "note_type", {
    ClientMeeting => "Client Meeting",
    DocumentReview => "Document Review",
    CourtAppearance => "Court Appearance",
    Research => "Research",
    ClientCommunication => "Client Communication",
    InternalDiscussion => "Internal Discussion",
});

impl CaseType {
    /// Litigation-heavy practice areas escalate more often.
    pub fn is_litigation(&self) -> bool {
        matches!(self, Self::CriminalDefense | Self::CivilLitigation)
    }
}

impl CaseStatus {
    /// Statuses counted as a positive resolution outcome.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    /// Text-level check used when status arrives as a free-form column.
    pub fn label_is_resolved(raw: &str) -> bool {
        Self::from_label(raw).map(|s| s.is_resolved()).unwrap_or(false)
    }
}

impl Complexity {
    pub fn score(&self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: ClientId,
    pub name: String,
    pub age: u32,
    pub income_level: IncomeLevel,
    pub location: String,
    pub join_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub case_id: CaseId,
    pub client_id: ClientId,
    pub case_type: CaseType,
    pub open_date: NaiveDate,
    pub close_date: Option<NaiveDate>,
    pub resolution_days: Option<i64>,
    pub status: CaseStatus,
    pub complexity: Complexity,
    pub assignee: String,
    pub escalated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseNote {
    pub note_id: NoteId,
    pub case_id: CaseId,
    pub note_date: NaiveDate,
    pub note_type: NoteType,
    pub note_text: String,
    pub created_by: String,
}

/// The three source tables of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTables {
    pub clients: Vec<Client>,
    pub cases: Vec<Case>,
    pub notes: Vec<CaseNote>,
}

/// Column-oriented view of `RawTables`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTables {
    pub clients: Table,
    pub cases: Table,
    pub notes: Table,
}

fn text<T>(rows: &[T], f: impl Fn(&T) -> String) -> ColumnData {
    ColumnData::Text(rows.iter().map(|r| Some(f(r))).collect())
}

fn ints<T>(rows: &[T], f: impl Fn(&T) -> Option<i64>) -> ColumnData {
    ColumnData::Int(rows.iter().map(f).collect())
}

fn dates<T>(rows: &[T], f: impl Fn(&T) -> Option<NaiveDate>) -> ColumnData {
    ColumnData::Date(rows.iter().map(f).collect())
}

impl RawTables {
    pub fn clients_table(&self) -> PipelineResult<Table> {
        let c = &self.clients;
        Table::new()
            .with_column("client_id", ints(c, |r| Some(r.client_id.into())))?
            .with_column("name", text(c, |r| r.name.clone()))?
            .with_column("age", ints(c, |r| Some(r.age.into())))?
            .with_column("income_level", text(c, |r| r.income_level.label().into()))?
            .with_column("location", text(c, |r| r.location.clone()))?
            .with_column("join_date", dates(c, |r| Some(r.join_date)))
    }

    pub fn cases_table(&self) -> PipelineResult<Table> {
        let c = &self.cases;
        Table::new()
            .with_column("case_id", ints(c, |r| Some(r.case_id.into())))?
            .with_column("client_id", ints(c, |r| Some(r.client_id.into())))?
            .with_column("case_type", text(c, |r| r.case_type.label().into()))?
            .with_column("open_date", dates(c, |r| Some(r.open_date)))?
            .with_column("close_date", dates(c, |r| r.close_date))?
            .with_column("resolution_days", ints(c, |r| r.resolution_days))?
            .with_column("status", text(c, |r| r.status.label().into()))?
            .with_column("complexity", text(c, |r| r.complexity.label().into()))?
            .with_column("assignee", text(c, |r| r.assignee.clone()))?
            .with_column(
                "escalated",
                ColumnData::Bool(c.iter().map(|r| Some(r.escalated)).collect()),
            )
    }

    pub fn notes_table(&self) -> PipelineResult<Table> {
        let n = &self.notes;
        Table::new()
            .with_column("note_id", ints(n, |r| Some(r.note_id.into())))?
            .with_column("case_id", ints(n, |r| Some(r.case_id.into())))?
            .with_column("note_date", dates(n, |r| Some(r.note_date)))?
            .with_column("note_type", text(n, |r| r.note_type.label().into()))?
            .with_column("note_text", text(n, |r| r.note_text.clone()))?
            .with_column("created_by", text(n, |r| r.created_by.clone()))
    }

    pub fn to_tables(&self) -> PipelineResult<SourceTables> {
        Ok(SourceTables {
            clients: self.clients_table()?,
            cases: self.cases_table()?,
            notes: self.notes_table()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for t in CaseType::ALL {
            assert_eq!(CaseType::from_label(t.label()).unwrap(), *t);
        }
        assert!(matches!(
            NoteType::from_label("Lunch"),
            Err(PipelineError::UnknownLabel { field: "note_type", .. })
        ));
    }

    #[test]
    fn closed_variants_count_as_resolved() {
        assert!(CaseStatus::label_is_resolved("Closed"));
        assert!(CaseStatus::label_is_resolved("Resolved"));
        assert!(!CaseStatus::label_is_resolved("Appealed"));
        assert!(!CaseStatus::label_is_resolved("whatever"));
    }

    #[test]
    fn empty_raw_tables_have_fixed_widths() {
        let tables = RawTables::default().to_tables().unwrap();
        assert_eq!(tables.clients.shape(), (0, 6));
        assert_eq!(tables.cases.shape(), (0, 10));
        assert_eq!(tables.notes.shape(), (0, 6));
    }
}

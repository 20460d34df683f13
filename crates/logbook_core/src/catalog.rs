use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Log kinds
// Every kind shares the same lifecycle; only the table, the category list
// and the field list differ.
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    CasePresentation,
    Procedure,
    Imaging,
    JournalClub,
    Seminar,
    TrainingRecord,
}

impl LogKind {
    pub const ALL: [LogKind; 6] = [
        LogKind::CasePresentation,
        LogKind::Procedure,
        LogKind::Imaging,
        LogKind::JournalClub,
        LogKind::Seminar,
        LogKind::TrainingRecord,
    ];

    /// Stable identifier used in URLs and as the signature `entity_type`.
    pub fn slug(&self) -> &'static str {
        match self {
            LogKind::CasePresentation => "case_presentation",
            LogKind::Procedure => "procedure",
            LogKind::Imaging => "imaging",
            LogKind::JournalClub => "journal_club",
            LogKind::Seminar => "seminar",
            LogKind::TrainingRecord => "training_record",
        }
    }

    /// Backing table. Only ever interpolated from this static list.
    pub fn table(&self) -> &'static str {
        match self {
            LogKind::CasePresentation => "case_presentations",
            LogKind::Procedure => "procedure_logs",
            LogKind::Imaging => "imaging_logs",
            LogKind::JournalClub => "journal_clubs",
            LogKind::Seminar => "seminars",
            LogKind::TrainingRecord => "training_records",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LogKind::CasePresentation => "Case Presentation",
            LogKind::Procedure => "Procedure Log",
            LogKind::Imaging => "Imaging Log",
            LogKind::JournalClub => "Journal Club",
            LogKind::Seminar => "Seminar",
            LogKind::TrainingRecord => "Training Record",
        }
    }

    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            LogKind::CasePresentation => CASE_CATEGORIES,
            LogKind::Procedure => PROCEDURE_CATEGORIES,
            LogKind::Imaging => IMAGING_CATEGORIES,
            LogKind::JournalClub => &["original-article", "review-article", "guideline"],
            LogKind::Seminar => &["departmental", "interdepartmental", "grand-rounds"],
            LogKind::TrainingRecord => &["workshop", "cme", "conference", "course", "rotation"],
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            LogKind::CasePresentation => CASE_FIELDS,
            LogKind::Procedure => PROCEDURE_FIELDS,
            LogKind::Imaging => IMAGING_FIELDS,
            LogKind::JournalClub => JOURNAL_CLUB_FIELDS,
            LogKind::Seminar => SEMINAR_FIELDS,
            LogKind::TrainingRecord => TRAINING_FIELDS,
        }
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories().contains(&category)
    }

    pub fn descriptor(&self) -> KindDescriptor {
        KindDescriptor {
            kind: *self,
            label: self.label(),
            categories: self.categories(),
            fields: self.fields(),
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for LogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| format!("unknown log kind '{}'", s))
    }
}

// ---------------------------------------------------------------------------
// Field descriptors
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "options", rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text, up to 500 characters.
    Text,
    /// Narrative text, up to 10 000 characters.
    LongText,
    /// Calendar date as `YYYY-MM-DD`.
    Date,
    Number,
    Choice(&'static [&'static str]),
}

impl FieldKind {
    pub fn max_len(&self) -> Option<usize> {
        match self {
            FieldKind::Text => Some(500),
            FieldKind::LongText => Some(10_000),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec { name, label, kind, required }
}

/// Serializable view of one kind, served by the catalog endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct KindDescriptor {
    pub kind: LogKind,
    pub label: &'static str,
    pub categories: &'static [&'static str],
    pub fields: &'static [FieldSpec],
}

pub fn catalog() -> Vec<KindDescriptor> {
    LogKind::ALL.iter().map(LogKind::descriptor).collect()
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------
const CASE_CATEGORIES: &[&str] = &[
    "neuroradiology",
    "head-and-neck",
    "spine",
    "chest",
    "cardiac",
    "breast",
    "gastrointestinal",
    "hepatobiliary",
    "pancreas",
    "genitourinary",
    "obstetrics",
    "gynaecology",
    "musculoskeletal",
    "paediatric",
    "vascular",
    "interventional",
    "trauma",
    "oncology",
    "emergency",
    "nuclear-medicine",
    "endocrine",
    "infectious",
    "congenital",
    "miscellaneous",
];

const PROCEDURE_CATEGORIES: &[&str] = &[
    "usg-guided-fnac",
    "usg-guided-biopsy",
    "ct-guided-biopsy",
    "ct-guided-fnac",
    "pleural-tap",
    "ascitic-tap",
    "pigtail-drainage",
    "abscess-drainage",
    "ptbd",
    "percutaneous-nephrostomy",
    "hysterosalpingography",
    "intravenous-urography",
    "micturating-cystourethrography",
    "retrograde-urethrography",
    "barium-swallow",
    "barium-meal",
    "barium-meal-follow-through",
    "barium-enema",
    "fistulography",
    "sinography",
    "t-tube-cholangiography",
    "sialography",
    "dacryocystography",
    "arthrography",
    "myelography",
    "ductography",
    "breast-biopsy",
    "wire-localisation",
    "cerebral-dsa",
    "peripheral-dsa",
    "angioplasty",
    "stenting",
    "embolisation",
    "tace",
    "radiofrequency-ablation",
    "microwave-ablation",
    "vertebroplasty",
    "central-venous-access",
    "picc-line",
    "ivc-filter",
    "tips",
    "thrombolysis",
    "sclerotherapy",
    "varicocele-embolisation",
    "uterine-artery-embolisation",
    "gastrostomy",
    "biliary-stenting",
    "joint-injection",
    "nerve-block",
];

const IMAGING_CATEGORIES: &[&str] = &["radiograph", "ultrasound", "ct", "mri", "mammography"];

// ---------------------------------------------------------------------------
// Field lists
// ---------------------------------------------------------------------------
const CASE_FIELDS: &[FieldSpec] = &[
    field("date", "Date", FieldKind::Date, true),
    field("patient_id", "Patient ID", FieldKind::Text, true),
    field("patient_age", "Patient age", FieldKind::Number, false),
    field("clinical_history", "Clinical history", FieldKind::LongText, false),
    field("findings", "Findings", FieldKind::LongText, true),
    field("diagnosis", "Diagnosis", FieldKind::LongText, true),
    field("learning_points", "Learning points", FieldKind::LongText, false),
];

const PROCEDURE_FIELDS: &[FieldSpec] = &[
    field("date", "Date", FieldKind::Date, true),
    field("patient_id", "Patient ID", FieldKind::Text, true),
    field(
        "participation",
        "Participation",
        FieldKind::Choice(&["observed", "assisted", "performed"]),
        true,
    ),
    field("indication", "Indication", FieldKind::LongText, true),
    field("complications", "Complications", FieldKind::LongText, false),
    field("outcome", "Outcome", FieldKind::LongText, false),
];

const IMAGING_FIELDS: &[FieldSpec] = &[
    field("date", "Date", FieldKind::Date, true),
    field("patient_id", "Patient ID", FieldKind::Text, true),
    field("study", "Study description", FieldKind::Text, true),
    field("findings", "Findings", FieldKind::LongText, true),
    field("impression", "Impression", FieldKind::LongText, true),
];

const JOURNAL_CLUB_FIELDS: &[FieldSpec] = &[
    field("date", "Date", FieldKind::Date, true),
    field("article_title", "Article title", FieldKind::Text, true),
    field("journal", "Journal", FieldKind::Text, true),
    field("authors", "Authors", FieldKind::Text, false),
    field("summary", "Summary", FieldKind::LongText, true),
];

const SEMINAR_FIELDS: &[FieldSpec] = &[
    field("date", "Date", FieldKind::Date, true),
    field("topic", "Topic", FieldKind::Text, true),
    field("moderator", "Moderator", FieldKind::Text, false),
    field("summary", "Summary", FieldKind::LongText, false),
];

const TRAINING_FIELDS: &[FieldSpec] = &[
    field("date", "Date", FieldKind::Date, true),
    field("title", "Title", FieldKind::Text, true),
    field("venue", "Venue", FieldKind::Text, false),
    field("duration_hours", "Duration (hours)", FieldKind::Number, false),
    field("description", "Description", FieldKind::LongText, false),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_counts_match_the_programme() {
        assert_eq!(LogKind::CasePresentation.categories().len(), 24);
        assert_eq!(LogKind::Procedure.categories().len(), 49);
        assert_eq!(LogKind::Imaging.categories().len(), 5);
    }

    #[test]
    fn test_slugs_round_trip_and_tables_are_distinct() {
        let mut tables: Vec<_> = LogKind::ALL.iter().map(|k| k.table()).collect();
        tables.sort();
        tables.dedup();
        assert_eq!(tables.len(), LogKind::ALL.len());

        for kind in LogKind::ALL {
            assert_eq!(kind.slug().parse::<LogKind>().unwrap(), kind);
        }
        assert!("thesis".parse::<LogKind>().is_err());
    }

    #[test]
    fn test_every_kind_requires_a_date() {
        for kind in LogKind::ALL {
            let date = kind.field("date").expect("date field");
            assert!(date.required, "{} should require a date", kind);
            assert_eq!(date.kind, FieldKind::Date);
        }
    }

    #[test]
    fn test_catalog_serializes_choice_options() {
        let json = serde_json::to_value(LogKind::Procedure.descriptor()).unwrap();
        assert_eq!(json["kind"], "procedure");
        let participation = json["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == "participation")
            .unwrap();
        assert_eq!(participation["kind"]["type"], "choice");
        assert_eq!(participation["kind"]["options"][2], "performed");
    }
}

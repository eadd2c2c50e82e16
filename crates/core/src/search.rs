//! Search/filter engine.
//!
//! Filtering is a boolean predicate over the collection: case-insensitive substring containment
//! against either one selected field or every field the kind designates as searchable. Matching
//! records keep their store order; nothing is ranked or paged.

use crate::entity::{EntityKind, Record};
use std::fmt;
use std::str::FromStr;

/// A closed, per-kind set of fields that can be selected individually.
pub trait SearchField:
    Copy + Eq + fmt::Debug + fmt::Display + FromStr<Err = UnknownField> + Send + Sync + 'static
{
    /// Every selectable field, in display order.
    const ALL: &'static [Self];

    /// Wire name of the field (camelCase).
    fn as_str(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown search field '{value}', expected one of: all, {}", .expected.join(", "))]
pub struct UnknownField {
    pub value: String,
    pub expected: Vec<&'static str>,
}

impl UnknownField {
    pub fn new<F: SearchField>(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            expected: F::ALL.iter().map(SearchField::as_str).collect(),
        }
    }
}

/// Declares a field enum implementing [`SearchField`], `Display` and `FromStr`.
macro_rules! search_fields {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $crate::search::SearchField for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::search::SearchField::as_str(self))
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::search::UnknownField;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    _ => Err($crate::search::UnknownField::new::<Self>(s)),
                }
            }
        }
    };
}

pub(crate) use search_fields;

/// Which fields a filter term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldSelector<F> {
    #[default]
    All,
    Field(F),
}

impl<F: SearchField> FieldSelector<F> {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSelector::All => "all",
            FieldSelector::Field(field) => field.as_str(),
        }
    }
}

impl<F: SearchField> fmt::Display for FieldSelector<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<F: SearchField> FromStr for FieldSelector<F> {
    type Err = UnknownField;

    /// Parses `all` or one of the kind's field names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(FieldSelector::All);
        }
        s.parse().map(FieldSelector::Field)
    }
}

/// Returns true if `record` matches the lowercased `needle` under `selector`.
fn matches<E: EntityKind>(record: &Record<E>, needle: &str, selector: FieldSelector<E::Field>) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);
    match selector {
        FieldSelector::All => record.data().searchable_text().into_iter().any(contains),
        FieldSelector::Field(field) => contains(record.data().field_text(field)),
    }
}

/// Filters `records` by `term`.
///
/// An empty term returns every record. Otherwise a record is kept when the lowercased term is a
/// substring of the lowercased text of the selected field (or of any searchable field for
/// [`FieldSelector::All`]). Order is preserved.
pub fn filter<E: EntityKind>(
    records: &[Record<E>],
    term: &str,
    selector: FieldSelector<E::Field>,
) -> Vec<Record<E>> {
    if term.is_empty() {
        return records.to_vec();
    }

    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|record| matches(record, &needle, selector))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DiagnosticCode, DiagnosticCodeField, Status};
    use chrono::NaiveDate;
    use hmc_types::NonEmptyText;

    fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).unwrap()
    }

    fn code(id: &str, code: &str, description: &str, category: &str, version: &str) -> Record<DiagnosticCode> {
        Record::seeded(
            id,
            DiagnosticCode {
                code: text(code),
                description: text(description),
                category: text(category),
                version: text(version),
                status: Status::Active,
                valid_from: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
                valid_to: None,
            },
        )
    }

    fn collection() -> Vec<Record<DiagnosticCode>> {
        vec![
            code("dx-1", "I10", "Essential hypertension", "Circulatory System", "ICD-10"),
            code("dx-2", "E11.9", "Type 2 diabetes mellitus without complications", "Endocrine", "ICD-10"),
            code("dx-3", "J45.909", "Unspecified asthma, uncomplicated", "Respiratory System", "ICD-10-CM"),
        ]
    }

    fn ids(records: &[Record<DiagnosticCode>]) -> Vec<&str> {
        records.iter().map(Record::id).collect()
    }

    #[test]
    fn empty_term_returns_collection_unchanged() {
        let all = collection();
        for selector in [
            FieldSelector::All,
            FieldSelector::Field(DiagnosticCodeField::Code),
            FieldSelector::Field(DiagnosticCodeField::Category),
        ] {
            assert_eq!(filter(&all, "", selector), all);
        }
    }

    #[test]
    fn field_scoped_search_matches_only_that_field() {
        let result = filter(&collection(), "E11", FieldSelector::Field(DiagnosticCodeField::Code));
        assert_eq!(ids(&result), vec!["dx-2"]);

        // "System" appears only in categories.
        let result = filter(&collection(), "system", FieldSelector::Field(DiagnosticCodeField::Description));
        assert!(result.is_empty());
    }

    #[test]
    fn all_fields_search_covers_version() {
        let result = filter(&collection(), "icd-10-cm", FieldSelector::All);
        assert_eq!(ids(&result), vec!["dx-3"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let upper = filter(&collection(), "SYSTEM", FieldSelector::All);
        let lower = filter(&collection(), "system", FieldSelector::All);
        assert_eq!(upper, lower);
        assert_eq!(ids(&upper), vec!["dx-1", "dx-3"]);
    }

    #[test]
    fn filter_preserves_store_order() {
        let result = filter(&collection(), "i", FieldSelector::Field(DiagnosticCodeField::Description));
        assert_eq!(ids(&result), vec!["dx-1", "dx-2", "dx-3"]);
    }

    #[test]
    fn whitespace_term_is_not_trimmed() {
        let result = filter(&collection(), " ", FieldSelector::Field(DiagnosticCodeField::Code));
        assert!(result.is_empty());
    }

    #[test]
    fn selector_parses_all_and_field_names() {
        assert_eq!(
            "all".parse::<FieldSelector<DiagnosticCodeField>>().unwrap(),
            FieldSelector::All
        );
        assert_eq!(
            "category".parse::<FieldSelector<DiagnosticCodeField>>().unwrap(),
            FieldSelector::Field(DiagnosticCodeField::Category)
        );

        let err = "dosage".parse::<FieldSelector<DiagnosticCodeField>>().unwrap_err();
        assert_eq!(err.value, "dosage");
        assert_eq!(err.expected, vec!["code", "description", "category"]);
    }
}

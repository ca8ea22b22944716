use crate::loader::Table;
use crate::models::{Document, Metadata, Record, ROW_INDEX_KEY, SOURCE_KEY};
use serde_json::Value;
use std::collections::HashSet;

pub const AFFILIATION_SLOTS: usize = 4;

/// Turns dataset rows into flat text blocks with a restricted metadata map.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    text_columns: HashSet<String>,
    metadata_columns: Vec<String>,
    source: String,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub documents: Vec<Document>,
    pub dropped_rows: Vec<usize>,
}

impl DocumentBuilder {
    pub fn new(
        text_columns: &[String],
        metadata_columns: &[String],
        source: impl Into<String>,
    ) -> Self {
        Self {
            text_columns: text_columns.iter().cloned().collect(),
            metadata_columns: metadata_columns.to_vec(),
            source: source.into(),
        }
    }

    pub fn build_all(&self, table: &Table) -> BuildReport {
        let mut report = BuildReport::default();

        for (row_index, record) in table.records.iter().enumerate() {
            match self.build(record, row_index) {
                Some(document) => report.documents.push(document),
                None => {
                    tracing::debug!(row_index, "row has no text fields, skipping");
                    report.dropped_rows.push(row_index);
                }
            }
        }

        report
    }

    pub fn build(&self, record: &Record, row_index: usize) -> Option<Document> {
        let lines = self.text_lines(record);
        if lines.is_empty() {
            return None;
        }

        let mut metadata = Metadata::new();
        for column in &self.metadata_columns {
            if let Some(value) = record.get(column) {
                metadata.insert(column.clone(), Value::String(value.to_string()));
            }
        }
        metadata.insert(ROW_INDEX_KEY.to_string(), Value::from(row_index as u64));
        metadata.insert(SOURCE_KEY.to_string(), Value::String(self.source.clone()));

        Some(Document {
            content: lines.join("\n"),
            metadata,
        })
    }

    fn field<'a>(&self, record: &'a Record, column: &str) -> Option<&'a str> {
        if self.text_columns.contains(column) {
            record.get(column)
        } else {
            None
        }
    }

    fn text_lines(&self, record: &Record) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(name) = self.field(record, "fullName") {
            lines.push(format!("Laureate: {name}"));
        } else if let Some(name) = self.field(record, "orgName") {
            lines.push(format!("Organization: {name}"));
        }

        let award_fields = [
            ("awardYear", "Year"),
            ("category", "Category"),
            ("categoryFullName", "Category Full Name"),
            ("motivation", "Motivation"),
        ];
        for (column, label) in award_fields {
            if let Some(value) = self.field(record, column) {
                lines.push(format!("{label}: {value}"));
            }
        }
        if let Some(amount) = self.field(record, "prizeAmount") {
            lines.push(format!("Prize Amount: {amount} SEK"));
        }
        if let Some(date) = self.field(record, "dateAwarded") {
            lines.push(format!("Date Awarded: {date}"));
        }

        if let Some(gender) = self.field(record, "gender") {
            lines.push(format!("Gender: {gender}"));
        }
        if let Some(date) = self.field(record, "birth_date") {
            lines.push(format!("Birth Date: {date}"));
        }
        if let Some(city) = self.field(record, "birth_city") {
            match self.field(record, "birth_country") {
                Some(country) => lines.push(format!("Birth Place: {city}, {country}")),
                None => lines.push(format!("Birth Place: {city}")),
            }
        }

        if self.field(record, "orgName").is_some() {
            if let Some(acronym) = self.field(record, "acronym") {
                lines.push(format!("Acronym: {acronym}"));
            }
            if let Some(founded) = self.field(record, "org_founded_date") {
                lines.push(format!("Founded: {founded}"));
            }
        }

        for slot in 1..=AFFILIATION_SLOTS {
            if let Some(affiliation) = self.field(record, &format!("affiliation_{slot}")) {
                lines.push(format!("Affiliation {slot}: {affiliation}"));
            }
        }

        if let Some(kind) = self.field(record, "ind_or_org") {
            lines.push(format!("Type: {kind}"));
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_METADATA_COLUMNS, DEFAULT_TEXT_COLUMNS};
    use crate::loader::TextEncoding;
    use serde_json::json;

    fn builder() -> DocumentBuilder {
        let text = DEFAULT_TEXT_COLUMNS.map(String::from);
        let metadata = DEFAULT_METADATA_COLUMNS.map(String::from);
        DocumentBuilder::new(&text, &metadata, "data/nobel.csv")
    }

    #[test]
    fn individual_row_renders_in_fixed_order() {
        let record = Record::new()
            .with("id", "6")
            .with("fullName", "Marie Curie")
            .with("awardYear", "1903")
            .with("category", "Physics")
            .with("categoryFullName", "The Nobel Prize in Physics")
            .with("motivation", "in recognition of the extraordinary services")
            .with("prizeAmount", "150782")
            .with("dateAwarded", "1903-11-12")
            .with("gender", "female")
            .with("birth_date", "1867-11-07")
            .with("birth_city", "Warsaw")
            .with("birth_country", "Russian Empire (now Poland)")
            .with("affiliation_1", "Sorbonne University")
            .with("affiliation_3", "Institut du Radium")
            .with("ind_or_org", "Individual");

        let document = builder().build(&record, 3).expect("document");
        assert_eq!(
            document.content,
            "Laureate: Marie Curie\n\
             Year: 1903\n\
             Category: Physics\n\
             Category Full Name: The Nobel Prize in Physics\n\
             Motivation: in recognition of the extraordinary services\n\
             Prize Amount: 150782 SEK\n\
             Date Awarded: 1903-11-12\n\
             Gender: female\n\
             Birth Date: 1867-11-07\n\
             Birth Place: Warsaw, Russian Empire (now Poland)\n\
             Affiliation 1: Sorbonne University\n\
             Affiliation 3: Institut du Radium\n\
             Type: Individual"
        );
        assert_eq!(document.metadata["id"], json!("6"));
        assert_eq!(document.metadata["row_index"], json!(3));
        assert_eq!(document.metadata["source"], json!("data/nobel.csv"));
        assert!(!document.metadata.contains_key("motivation"));
        assert!(!document.metadata.contains_key("orgName"));
    }

    #[test]
    fn full_name_wins_over_org_name() {
        let record = Record::new()
            .with("fullName", "Henry Dunant")
            .with("orgName", "International Committee of the Red Cross")
            .with("acronym", "ICRC");

        let document = builder().build(&record, 0).expect("document");
        let first_line = document.content.lines().next();
        assert_eq!(first_line, Some("Laureate: Henry Dunant"));
        assert!(!document.content.contains("Organization:"));
        assert!(document.content.contains("Acronym: ICRC"));
    }

    #[test]
    fn organization_block_needs_org_name() {
        let organization = Record::new()
            .with("orgName", "Institute of International Law")
            .with("acronym", "IIL")
            .with("org_founded_date", "1873-09-08")
            .with("ind_or_org", "Organization");
        let document = builder().build(&organization, 1).expect("document");
        assert_eq!(
            document.content,
            "Organization: Institute of International Law\n\
             Acronym: IIL\n\
             Founded: 1873-09-08\n\
             Type: Organization"
        );

        let stray_acronym = Record::new().with("fullName", "X").with("acronym", "ABC");
        let document = builder().build(&stray_acronym, 2).expect("document");
        assert!(!document.content.contains("Acronym"));
    }

    #[test]
    fn birth_place_without_country_is_city_only() {
        let record = Record::new().with("birth_city", "Lviv");
        let document = builder().build(&record, 0).expect("document");
        assert_eq!(document.content, "Birth Place: Lviv");
    }

    #[test]
    fn rows_without_text_fields_are_dropped() {
        let empty = Record::new().with("id", "42").with("death_country", "France");
        assert!(builder().build(&empty, 0).is_none());

        let table = Table {
            headers: vec!["id".to_string(), "fullName".to_string()],
            records: vec![
                Record::new().with("id", "1"),
                Record::new().with("id", "2").with("fullName", "Niels Bohr"),
            ],
            encoding: TextEncoding::Utf8,
        };
        let report = builder().build_all(&table);
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.dropped_rows, vec![0]);
        assert_eq!(report.documents[0].row_index(), 1);
    }

    #[test]
    fn columns_outside_the_text_list_are_ignored() {
        let builder = DocumentBuilder::new(
            &["awardYear".to_string()],
            &[],
            "nobel.csv",
        );
        let record = Record::new().with("fullName", "Niels Bohr").with("awardYear", "1922");
        let document = builder.build(&record, 0).expect("document");
        assert_eq!(document.content, "Year: 1922");
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use cutsheet_core::{
    AllocationMap, CutSheetTemplate, Selection, SelectionSet, SellerCatalogConfig, Species,
};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Selections read from disk, plus whatever a template bundle carried.
#[derive(Debug, Clone, Default)]
pub struct SelectionInput {
    pub species: Option<Species>,
    pub template_name: Option<String>,
    pub selections: SelectionSet,
    pub allocations: AllocationMap,
}

/// Array entries may be bare cut ids or full selection objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SelectionEntry {
    Id(String),
    Full(Selection),
}

impl From<SelectionEntry> for Selection {
    fn from(entry: SelectionEntry) -> Self {
        match entry {
            SelectionEntry::Id(cut_id) => Self::new(cut_id),
            SelectionEntry::Full(selection) => selection,
        }
    }
}

/// Parse a selections document: a JSON array of selections or a template
/// bundle.
pub fn parse_selections(json: &str) -> Result<SelectionInput> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("selections are not valid JSON")?;
    if value.is_array() {
        let entries: Vec<SelectionEntry> =
            serde_json::from_value(value).context("selection array is malformed")?;
        return Ok(SelectionInput {
            selections: entries.into_iter().map(Selection::from).collect(),
            ..SelectionInput::default()
        });
    }
    let template: CutSheetTemplate =
        serde_json::from_value(value).context("template bundle is malformed")?;
    Ok(SelectionInput {
        species: Some(template.species),
        template_name: Some(template.name),
        selections: template.selections,
        allocations: template.allocations,
    })
}

pub fn load_selections(path: &Path) -> Result<SelectionInput> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_selections(&json).with_context(|| format!("failed to load {}", path.display()))
}

/// Read and check a seller configuration file.
pub fn load_seller_config(path: &Path) -> Result<SellerCatalogConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = SellerCatalogConfig::from_json(&json)
        .with_context(|| format!("failed to parse seller config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("seller config {} is inconsistent", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" tbone, ,filet,  nystrip ");
        assert_eq!(parts, vec!["tbone", "filet", "nystrip"]);
    }

    #[test]
    fn arrays_accept_ids_and_objects() {
        let input =
            parse_selections(r#"["ribeye", {"cut_id": "primerib", "params": {"weight": "4 rib"}}]"#)
                .unwrap();
        assert!(input.species.is_none());
        let ids: Vec<_> = input.selections.ids().collect();
        assert_eq!(ids, vec!["ribeye", "primerib"]);
        assert_eq!(
            input.selections.get("primerib").unwrap().params.weight.as_deref(),
            Some("4 rib")
        );
    }

    #[test]
    fn templates_carry_species_and_allocations() {
        let input = parse_selections(
            r#"{
                "name": "Quarter",
                "species": "beef",
                "selections": [{"cut_id": "ribeye"}, {"cut_id": "primerib"}],
                "allocations": {"rib": [
                    {"cut_id": "ribeye", "percent": 75},
                    {"cut_id": "primerib", "percent": 25}
                ]}
            }"#,
        )
        .unwrap();
        assert_eq!(input.species, Some(Species::Beef));
        assert_eq!(input.template_name.as_deref(), Some("Quarter"));
        assert_eq!(input.allocations.percent_of("ribeye"), Some(75));
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(parse_selections("not json").is_err());
        assert!(parse_selections(r#"{"name": "x"}"#).is_err());
        assert!(parse_selections("[42]").is_err());
    }

    #[test]
    fn seller_config_is_validated_on_load() {
        let path = std::env::temp_dir().join(format!(
            "cutsheet-seller-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        fs::write(&path, r#"{"min_hanging_weight": 900, "max_hanging_weight": 300}"#).unwrap();
        let err = load_seller_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("exceeds maximum"));
        let _ = fs::remove_file(path);
    }
}

pub mod reports;

use anyhow::{Result, bail};
use colored::Colorize;
use serde::Serialize;
use std::time::{Duration, Instant};

use cutsheet_core::{
    CutAvailability, CutId, CutSheet, CutSheetEngine, NormalizeOutcome, SelectionSet,
    SheetStatus, Species, SpeciesCatalog, can_add_cut, cut_availability, required_cuts,
    would_disable,
};

use crate::common::SelectionInput;
use crate::common::scenario::find_scenario;

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub description: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub duration: Duration,
}

/// Run scenarios by key, in order. Unknown keys are reported and skipped.
pub fn run_scenarios(
    engine: &CutSheetEngine<'_>,
    keys: &[String],
    verbose: bool,
) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    for key in keys {
        let Some(scenario) = find_scenario(key) else {
            eprintln!("⚠️  Unknown scenario: {}", key.yellow());
            continue;
        };
        if verbose {
            println!("🧪 Running scenario: {}", key.bright_white());
        }
        let start = Instant::now();
        let outcome = scenario.run(engine);
        results.push(ScenarioResult {
            scenario_name: key.clone(),
            description: scenario.description().to_string(),
            passed: outcome.is_ok(),
            failure: outcome.err().map(|err| format!("{err:#}")),
            duration: start.elapsed(),
        });
    }
    results
}

/// What a single sheet run produced, by mode.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReportBody {
    Validate {
        status: SheetStatus,
    },
    Normalize {
        outcome: NormalizeOutcome,
        status: SheetStatus,
    },
    Availability {
        cuts: Vec<CutAvailability>,
    },
    Preview {
        cut_id: CutId,
        cut_name: String,
        availability: CutAvailability,
        would_disable: Vec<CutId>,
        required: Vec<CutId>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetReport {
    pub species: Species,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub seller_filtered: bool,
    pub selections: Vec<CutId>,
    #[serde(flatten)]
    pub body: ReportBody,
}

impl SheetReport {
    /// Whether the run should exit successfully.
    #[must_use]
    pub const fn passed(&self) -> bool {
        match &self.body {
            ReportBody::Validate { status } | ReportBody::Normalize { status, .. } => {
                status.can_finalize
            }
            ReportBody::Availability { .. } | ReportBody::Preview { .. } => true,
        }
    }
}

/// Sheet-level modes the CLI can run against one species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetMode {
    Validate,
    Normalize,
    Availability,
    Preview,
}

/// Stored splits are taken as-is so a broken one still blocks; only a bare
/// selection list gets the even splits `CutSheet::select` would have made.
fn sheet_from(catalog: &SpeciesCatalog, input: &SelectionInput) -> CutSheet {
    let mut allocations = input.allocations.clone();
    if allocations.is_empty() {
        allocations.sync(catalog, &input.selections);
    }
    CutSheet::from_parts(catalog.species(), input.selections.clone(), allocations)
}

fn selection_ids(selections: &SelectionSet) -> Vec<CutId> {
    selections.ids().map(str::to_string).collect()
}

/// Run one sheet mode against a (possibly seller-filtered) catalog.
pub fn run_sheet(
    catalog: &SpeciesCatalog,
    seller_filtered: bool,
    input: &SelectionInput,
    mode: SheetMode,
    preview_cut: Option<&str>,
) -> Result<SheetReport> {
    let body = match mode {
        SheetMode::Validate => {
            let sheet = sheet_from(catalog, input);
            ReportBody::Validate {
                status: sheet.status(catalog),
            }
        }
        SheetMode::Normalize => {
            let mut sheet = sheet_from(catalog, input);
            let outcome = sheet.normalize(catalog)?;
            ReportBody::Normalize {
                status: sheet.status(catalog),
                outcome,
            }
        }
        SheetMode::Availability => ReportBody::Availability {
            cuts: cut_availability(catalog, &input.selections),
        },
        SheetMode::Preview => {
            let Some(cut_id) = preview_cut else {
                bail!("--mode preview needs --cut <id>");
            };
            let Some(cut) = catalog.cut(cut_id) else {
                bail!("'{cut_id}' is not a {} cut", catalog.species());
            };
            ReportBody::Preview {
                cut_id: cut.id.clone(),
                cut_name: cut.name.clone(),
                availability: can_add_cut(catalog, cut_id, &input.selections),
                would_disable: would_disable(catalog, cut_id),
                required: required_cuts(catalog, cut_id)
                    .into_iter()
                    .map(|c| c.id.clone())
                    .collect(),
            }
        }
    };
    Ok(SheetReport {
        species: catalog.species(),
        template: input.template_name.clone(),
        seller_filtered,
        selections: selection_ids(&input.selections),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutsheet_core::SchemaCatalog;

    fn beef() -> &'static SpeciesCatalog {
        SchemaCatalog::builtin().species(Species::Beef).unwrap()
    }

    fn input(ids: &[&str]) -> SelectionInput {
        SelectionInput {
            selections: SelectionSet::from_ids(ids.iter().copied()),
            ..SelectionInput::default()
        }
    }

    #[test]
    fn validate_mode_reports_blocking_errors() {
        let report = run_sheet(beef(), false, &input(&["tbone", "nystrip"]), SheetMode::Validate, None)
            .unwrap();
        assert!(!report.passed());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "validate");
        assert_eq!(json["status"]["validation"]["errors"][0]["kind"], "excludes");
    }

    #[test]
    fn normalize_mode_repairs_the_sheet() {
        let report = run_sheet(beef(), false, &input(&["nystrip"]), SheetMode::Normalize, None)
            .unwrap();
        assert!(report.passed());
        let ReportBody::Normalize { outcome, .. } = &report.body else {
            panic!("expected normalize body");
        };
        assert_eq!(outcome.added, vec!["filet"]);
    }

    #[test]
    fn validate_keeps_a_stored_split_that_misses_100() {
        let stored = crate::common::util::parse_selections(
            r#"{
                "name": "Short rib split",
                "species": "beef",
                "selections": [{"cut_id": "ribeye"}, {"cut_id": "primerib"}],
                "allocations": {"rib": [
                    {"cut_id": "ribeye", "percent": 50},
                    {"cut_id": "primerib", "percent": 25}
                ]}
            }"#,
        )
        .unwrap();
        let report = run_sheet(beef(), false, &stored, SheetMode::Validate, None).unwrap();
        assert!(!report.passed());
        let ReportBody::Validate { status } = &report.body else {
            panic!("expected validate body");
        };
        assert!(status.validation.is_valid);
        assert_eq!(status.incomplete_allocations, vec!["rib"]);

        let repaired = run_sheet(beef(), false, &stored, SheetMode::Normalize, None).unwrap();
        assert!(repaired.passed());

        let bare = run_sheet(beef(), false, &input(&["ribeye", "primerib"]), SheetMode::Validate, None)
            .unwrap();
        assert!(bare.passed());
    }

    #[test]
    fn preview_needs_a_known_cut() {
        let empty = input(&[]);
        assert!(run_sheet(beef(), false, &empty, SheetMode::Preview, None).is_err());
        assert!(run_sheet(beef(), false, &empty, SheetMode::Preview, Some("kobe")).is_err());
        let report = run_sheet(beef(), false, &empty, SheetMode::Preview, Some("filet")).unwrap();
        let ReportBody::Preview { would_disable, required, .. } = &report.body else {
            panic!("expected preview body");
        };
        assert_eq!(would_disable, &vec!["tbone", "porterhouse"]);
        assert_eq!(required, &vec!["nystrip"]);
    }

    #[test]
    fn scenario_runner_skips_unknown_keys() {
        let engine = CutSheetEngine::default();
        let keys = vec!["short-loin".to_string(), "missing".to_string()];
        let results = run_scenarios(&engine, &keys, false);
        assert_eq!(results.len(), 1);
        assert!(results[0].passed);
    }
}

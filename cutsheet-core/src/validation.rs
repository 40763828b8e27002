//! Constraint validation of a selection set against a species catalog.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::{CutChoice, CutId, SchemaCatalog, SpeciesCatalog};
use crate::selection::{ResolvedSelection, SelectionSet};
use crate::seller::NOT_OFFERED_REASON;
use crate::species::Species;

/// Blocking constraint violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    ExclusiveChoice,
    Excludes,
    Requires,
    /// A selected cut the processor has switched off.
    NotOffered,
}

/// Advisory yield conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    ConflictsWith,
    ReducesYield,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub cut_id: CutId,
    pub related_cut_id: CutId,
    /// Body part of an exclusive-choice violation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub message: String,
}

impl ValidationError {
    /// Whether the error concerns both cuts, in either role.
    #[must_use]
    pub fn involves(&self, a: &str, b: &str) -> bool {
        (self.cut_id == a && self.related_cut_id == b)
            || (self.cut_id == b && self.related_cut_id == a)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub kind: WarningKind,
    pub cut_id: CutId,
    pub related_cut_id: CutId,
    pub message: String,
}

/// An unselected cut that cannot currently be added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledOption {
    pub cut_id: CutId,
    pub reason: String,
    /// Selected cut responsible; absent when the seller does not offer it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<CutId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub disabled_options: Vec<DisabledOption>,
}

impl ValidationResult {
    /// Fail-closed result for a species with no catalog.
    #[must_use]
    pub fn unknown_species() -> Self {
        Self::default()
    }

    pub fn errors_of(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &ValidationWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }

    #[must_use]
    pub fn disabled(&self, cut_id: &str) -> Option<&DisabledOption> {
        self.disabled_options.iter().find(|d| d.cut_id == cut_id)
    }
}

/// Validate selections for a species. A species without a catalog yields an
/// invalid, empty result rather than an error.
#[must_use]
pub fn validate(
    schema: &SchemaCatalog,
    species: Species,
    selections: &SelectionSet,
) -> ValidationResult {
    schema
        .species(species)
        .map_or_else(ValidationResult::unknown_species, |catalog| {
            validate_catalog(catalog, selections)
        })
}

/// Validate selections against one catalog (built-in or seller-filtered).
#[must_use]
pub fn validate_catalog(catalog: &SpeciesCatalog, selections: &SelectionSet) -> ValidationResult {
    let selected = ResolvedSelection::resolve(catalog, selections);
    let mut pass = Pass::new(catalog, &selected);
    for cut in &selected.cuts {
        pass.check_offered(cut);
        pass.check_exclusive_choice(cut);
        pass.check_excludes(cut);
        pass.check_requires(cut);
        pass.check_conflicts(cut);
        pass.check_reduces_yield(cut);
    }
    let disabled_options = disabled_options(catalog, &selected);
    ValidationResult {
        is_valid: pass.errors.is_empty(),
        errors: pass.errors,
        warnings: pass.warnings,
        disabled_options,
    }
}

/// Unordered pair key: the same two cuts map to one key whichever side is
/// evaluated first.
fn pair_key<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

struct Pass<'a, 's> {
    catalog: &'a SpeciesCatalog,
    selected: &'s ResolvedSelection<'a>,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
    seen_exclusive: HashSet<(&'a str, &'a str)>,
    seen_excludes: HashSet<(&'a str, &'a str)>,
    seen_conflicts: HashSet<(&'a str, &'a str)>,
    seen_reduces: HashSet<(&'a str, &'a str)>,
}

impl<'a, 's> Pass<'a, 's> {
    fn new(catalog: &'a SpeciesCatalog, selected: &'s ResolvedSelection<'a>) -> Self {
        Self {
            catalog,
            selected,
            errors: Vec::new(),
            warnings: Vec::new(),
            seen_exclusive: HashSet::new(),
            seen_excludes: HashSet::new(),
            seen_conflicts: HashSet::new(),
            seen_reduces: HashSet::new(),
        }
    }

    fn name(&self, cut_id: &'a str) -> &'a str {
        self.catalog.cut_name(cut_id)
    }

    fn check_offered(&mut self, cut: &'a CutChoice) {
        if !cut.disabled {
            return;
        }
        let reason = cut.disabled_reason.as_deref().unwrap_or(NOT_OFFERED_REASON);
        self.errors.push(ValidationError {
            kind: ErrorKind::NotOffered,
            cut_id: cut.id.clone(),
            related_cut_id: cut.id.clone(),
            group_id: None,
            message: format!("{} cannot be selected: {reason}.", cut.name),
        });
    }

    fn check_exclusive_choice(&mut self, cut: &'a CutChoice) {
        let Some(group) = self.catalog.exclusive_group(cut) else {
            return;
        };
        let rival = self.selected.cuts.iter().find(|other| {
            other.id != cut.id
                && self
                    .catalog
                    .exclusive_group(other)
                    .is_some_and(|g| g.id == group.id)
        });
        let Some(rival) = rival else {
            return;
        };
        if !self.seen_exclusive.insert(pair_key(&cut.id, &rival.id)) {
            return;
        }
        self.errors.push(ValidationError {
            kind: ErrorKind::ExclusiveChoice,
            cut_id: cut.id.clone(),
            related_cut_id: rival.id.clone(),
            group_id: Some(group.id.clone()),
            message: format!(
                "Only one {} option can be selected: choose either {} or {}.",
                group.name, cut.name, rival.name
            ),
        });
    }

    fn check_excludes(&mut self, cut: &'a CutChoice) {
        for target in &cut.excludes {
            if !self.selected.contains(target) {
                continue;
            }
            if !self.seen_excludes.insert(pair_key(&cut.id, target)) {
                continue;
            }
            let target_name = self.name(target);
            self.errors.push(ValidationError {
                kind: ErrorKind::Excludes,
                cut_id: cut.id.clone(),
                related_cut_id: target.clone(),
                group_id: None,
                message: format!(
                    "{} cannot be combined with {}: cutting one uses the meat the other needs.",
                    cut.name, target_name
                ),
            });
        }
    }

    fn check_requires(&mut self, cut: &'a CutChoice) {
        for target in &cut.requires {
            if self.selected.contains(target) {
                continue;
            }
            let target_name = self.name(target);
            self.errors.push(ValidationError {
                kind: ErrorKind::Requires,
                cut_id: cut.id.clone(),
                related_cut_id: target.clone(),
                group_id: None,
                message: format!(
                    "{} must be selected together with {}.",
                    cut.name, target_name
                ),
            });
        }
    }

    fn check_conflicts(&mut self, cut: &'a CutChoice) {
        for target in &cut.conflicts_with {
            if !self.selected.contains(target) {
                continue;
            }
            if !self.seen_conflicts.insert(pair_key(&cut.id, target)) {
                continue;
            }
            let target_name = self.name(target);
            self.warnings.push(ValidationWarning {
                kind: WarningKind::ConflictsWith,
                cut_id: cut.id.clone(),
                related_cut_id: target.clone(),
                message: format!(
                    "{} and {} come from the same meat; choosing both reduces the yield of each.",
                    cut.name, target_name
                ),
            });
        }
    }

    fn check_reduces_yield(&mut self, cut: &'a CutChoice) {
        let Some(target) = cut.reduces_yield.as_deref() else {
            return;
        };
        if !self.selected.contains(target) {
            return;
        }
        if !self.seen_reduces.insert(pair_key(&cut.id, target)) {
            return;
        }
        let target_name = self.name(target);
        self.warnings.push(ValidationWarning {
            kind: WarningKind::ReducesYield,
            cut_id: cut.id.clone(),
            related_cut_id: target.to_string(),
            message: format!("Selecting {} reduces the yield of {}.", cut.name, target_name),
        });
    }
}

/// Why an unselected cut cannot be added right now, if it cannot. Shared by
/// validation and the availability resolver.
pub(crate) fn disablement(
    catalog: &SpeciesCatalog,
    selected: &ResolvedSelection<'_>,
    cut: &CutChoice,
) -> Option<DisabledOption> {
    if selected.contains(&cut.id) {
        return None;
    }
    if cut.disabled {
        return Some(DisabledOption {
            cut_id: cut.id.clone(),
            reason: cut
                .disabled_reason
                .clone()
                .unwrap_or_else(|| crate::seller::NOT_OFFERED_REASON.to_string()),
            caused_by: None,
        });
    }
    if let Some(cause) = selected.cuts.iter().find(|s| s.excludes_cut(&cut.id)) {
        return Some(DisabledOption {
            cut_id: cut.id.clone(),
            reason: format!("Not available with {}", cause.name),
            caused_by: Some(cause.id.clone()),
        });
    }
    let group = catalog.exclusive_group(cut)?;
    let cause = selected.cuts.iter().find(|s| {
        catalog
            .exclusive_group(s)
            .is_some_and(|g| g.id == group.id)
    })?;
    Some(DisabledOption {
        cut_id: cut.id.clone(),
        reason: format!(
            "Only one {} option allowed; {} is already selected",
            group.name, cause.name
        ),
        caused_by: Some(cause.id.clone()),
    })
}

fn disabled_options(catalog: &SpeciesCatalog, selected: &ResolvedSelection<'_>) -> Vec<DisabledOption> {
    catalog
        .cuts()
        .iter()
        .filter_map(|cut| disablement(catalog, selected, cut))
        .collect()
}

//! Automatic repair of a selection set: drop what the catalog no longer
//! offers, complete required pairs, and prune later picks that clash with
//! earlier ones.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::{CutChoice, CutId, SchemaCatalog, SpeciesCatalog};
use crate::selection::{Selection, SelectionSet};
use crate::species::Species;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizeOutcome {
    pub selections: SelectionSet,
    pub added: Vec<CutId>,
    pub removed: Vec<CutId>,
    pub messages: Vec<String>,
}

impl NormalizeOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    fn unchanged(selections: &SelectionSet) -> Self {
        Self {
            selections: selections.clone(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Added,
    Removed,
}

#[derive(Debug)]
struct Change {
    kind: ChangeKind,
    cut_id: CutId,
    message: String,
}

/// Normalize selections for a species. A species without a catalog is
/// returned unchanged.
#[must_use]
pub fn normalize(
    schema: &SchemaCatalog,
    species: Species,
    selections: &SelectionSet,
) -> NormalizeOutcome {
    match schema.species(species) {
        Some(catalog) => normalize_catalog(catalog, selections),
        None => {
            log::debug!("no {species} catalog loaded; selections left as given");
            NormalizeOutcome::unchanged(selections)
        }
    }
}

/// Normalize selections against one catalog. Earlier selections win every
/// tie-break, and running the result through again changes nothing.
#[must_use]
pub fn normalize_catalog(catalog: &SpeciesCatalog, selections: &SelectionSet) -> NormalizeOutcome {
    let mut changes = Vec::new();
    let mut working = drop_unavailable(catalog, selections, &mut changes);
    close_required_pairs(catalog, &mut working, &mut changes);
    prune_conflicts(catalog, &mut working, &mut changes);

    // A partner added in this run and pruned again never reached the caller.
    let added_ids: HashSet<CutId> = changes
        .iter()
        .filter(|c| c.kind == ChangeKind::Added)
        .map(|c| c.cut_id.clone())
        .collect();
    let transient: HashSet<CutId> = changes
        .iter()
        .filter(|c| c.kind == ChangeKind::Removed && added_ids.contains(&c.cut_id))
        .map(|c| c.cut_id.clone())
        .collect();
    changes.retain(|c| !transient.contains(&c.cut_id));

    let mut outcome = NormalizeOutcome {
        selections: working,
        ..NormalizeOutcome::default()
    };
    for change in changes {
        log::debug!("normalize {}: {}", catalog.species(), change.message);
        match change.kind {
            ChangeKind::Added => outcome.added.push(change.cut_id),
            ChangeKind::Removed => outcome.removed.push(change.cut_id),
        }
        outcome.messages.push(change.message);
    }
    outcome
}

fn drop_unavailable(
    catalog: &SpeciesCatalog,
    selections: &SelectionSet,
    changes: &mut Vec<Change>,
) -> SelectionSet {
    let mut kept = SelectionSet::new();
    for selection in selections {
        match catalog.cut(&selection.cut_id) {
            Some(cut) if !cut.disabled => {
                kept.add(selection.clone());
            }
            Some(cut) => changes.push(Change {
                kind: ChangeKind::Removed,
                cut_id: cut.id.clone(),
                message: format!(
                    "Removed {}: {}.",
                    cut.name,
                    cut.disabled_reason
                        .as_deref()
                        .unwrap_or(crate::seller::NOT_OFFERED_REASON)
                ),
            }),
            None => changes.push(Change {
                kind: ChangeKind::Removed,
                cut_id: selection.cut_id.clone(),
                message: format!(
                    "Removed {}: it is not part of the {} catalog.",
                    selection.cut_id,
                    catalog.species().display_name().to_lowercase()
                ),
            }),
        }
    }
    kept
}

fn close_required_pairs(
    catalog: &SpeciesCatalog,
    working: &mut SelectionSet,
    changes: &mut Vec<Change>,
) {
    let snapshot: Vec<&CutChoice> = working.ids().filter_map(|id| catalog.cut(id)).collect();
    let mut unsatisfiable: Vec<(&CutChoice, &str)> = Vec::new();
    for cut in snapshot {
        for partner_id in &cut.requires {
            if working.contains(partner_id) {
                continue;
            }
            match catalog.cut(partner_id).filter(|partner| !partner.disabled) {
                Some(partner) => {
                    working.add(Selection::new(partner.id.clone()));
                    changes.push(Change {
                        kind: ChangeKind::Added,
                        cut_id: partner.id.clone(),
                        message: format!(
                            "Added {} because {} requires it.",
                            partner.name, cut.name
                        ),
                    });
                }
                None => unsatisfiable.push((cut, partner_id.as_str())),
            }
        }
    }
    for (cut, partner_id) in unsatisfiable {
        if working.remove(&cut.id).is_some() {
            changes.push(Change {
                kind: ChangeKind::Removed,
                cut_id: cut.id.clone(),
                message: format!(
                    "Removed {}: it requires {}, which is not available.",
                    cut.name,
                    catalog.cut_name(partner_id)
                ),
            });
        }
    }
}

/// Two cuts that cannot both stay: an excludes edge in either direction, or
/// a shared exclusive-choice group.
fn clashes(catalog: &SpeciesCatalog, earlier: &CutChoice, later: &CutChoice) -> bool {
    if earlier.excludes_cut(&later.id) || later.excludes_cut(&earlier.id) {
        return true;
    }
    match (catalog.exclusive_group(earlier), catalog.exclusive_group(later)) {
        (Some(a), Some(b)) => a.id == b.id,
        _ => false,
    }
}

fn prune_conflicts(catalog: &SpeciesCatalog, working: &mut SelectionSet, changes: &mut Vec<Change>) {
    let mut winners: Vec<&CutChoice> = Vec::new();
    let mut losers: HashSet<CutId> = HashSet::new();
    for cut in working.ids().filter_map(|id| catalog.cut(id)) {
        match winners.iter().find(|earlier| clashes(catalog, earlier, cut)) {
            Some(earlier) => {
                losers.insert(cut.id.clone());
                changes.push(Change {
                    kind: ChangeKind::Removed,
                    cut_id: cut.id.clone(),
                    message: format!(
                        "Removed {} because it cannot be combined with {}, which was chosen first.",
                        cut.name, earlier.name
                    ),
                });
            }
            None => winners.push(cut),
        }
    }
    working.retain(|s| !losers.contains(&s.cut_id));

    loop {
        let orphaned: Vec<(&CutChoice, &str)> = working
            .ids()
            .filter_map(|id| catalog.cut(id))
            .filter_map(|cut| {
                cut.requires
                    .iter()
                    .find(|partner| !working.contains(partner))
                    .map(|partner| (cut, partner.as_str()))
            })
            .collect();
        if orphaned.is_empty() {
            break;
        }
        for (cut, partner_id) in orphaned {
            working.remove(&cut.id);
            changes.push(Change {
                kind: ChangeKind::Removed,
                cut_id: cut.id.clone(),
                message: format!(
                    "Removed {} because its required partner {} was removed.",
                    cut.name,
                    catalog.cut_name(partner_id)
                ),
            });
        }
    }
}

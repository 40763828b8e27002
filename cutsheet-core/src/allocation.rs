//! Percentage splits for body parts whose yield may be shared by two cuts.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::catalog::{CutId, GroupingMode, SpeciesCatalog};
use crate::selection::SelectionSet;

/// Granularity of every allocation percentage.
pub const STEP: u8 = 25;

/// Split shares must total 100 within this tolerance.
const TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub cut_id: CutId,
    pub percent: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("unknown body part '{0}'")]
    UnknownPart(String),
    #[error("body part '{0}' does not allow splitting its yield")]
    NotSplitCapable(String),
    #[error("body part '{0}' is not currently split between two cuts")]
    NotSplit(String),
    #[error("cut '{cut_id}' is not an active member of the '{part_id}' split")]
    NotMember { part_id: String, cut_id: CutId },
}

/// Allocations keyed by allow-split body part id. A part is present only
/// while it is split, and its entries then total 100.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationMap {
    parts: BTreeMap<String, Vec<AllocationEntry>>,
}

/// Selected cuts sharing an allow-split part's yield, in selection order.
#[must_use]
pub fn split_members<'s>(
    catalog: &SpeciesCatalog,
    selections: &'s SelectionSet,
    part_id: &str,
) -> Vec<&'s str> {
    selections
        .ids()
        .filter(|id| {
            catalog
                .cut(id)
                .and_then(|cut| catalog.split_part(cut))
                .is_some_and(|part| part.id == part_id)
        })
        .collect()
}

/// Snap a requested percentage into 0..=100 on the nearest step.
#[must_use]
pub const fn snap(percent: u8) -> u8 {
    let clamped = if percent > 100 { 100 } else { percent };
    (clamped + STEP / 2) / STEP * STEP
}

/// Divide `total` evenly on step boundaries; the last share takes the
/// remainder.
fn spread(total: u8, shares: usize) -> Vec<u8> {
    let Ok(count) = u8::try_from(shares) else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }
    let base = total / count / STEP * STEP;
    let mut out = vec![base; shares];
    if let Some(last) = out.last_mut() {
        *last = total - base * (count - 1);
    }
    out
}

fn entries_for<'a, I>(ids: I, shares: &[u8]) -> Vec<AllocationEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter()
        .zip(shares)
        .map(|(cut_id, &percent)| AllocationEntry {
            cut_id: cut_id.to_string(),
            percent,
        })
        .collect()
}

impl AllocationMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[must_use]
    pub fn get(&self, part_id: &str) -> Option<&[AllocationEntry]> {
        self.parts.get(part_id).map(Vec::as_slice)
    }

    #[must_use]
    pub fn percent_of(&self, cut_id: &str) -> Option<u8> {
        self.parts
            .values()
            .flatten()
            .find(|entry| entry.cut_id == cut_id)
            .map(|entry| entry.percent)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AllocationEntry])> {
        self.parts
            .iter()
            .map(|(part, entries)| (part.as_str(), entries.as_slice()))
    }

    /// Record that `cut_id` was just selected. When it is the second member
    /// of its split part, both members start from an even split.
    pub fn on_select(&mut self, catalog: &SpeciesCatalog, selections: &SelectionSet, cut_id: &str) {
        let Some(part) = catalog.cut(cut_id).and_then(|cut| catalog.split_part(cut)) else {
            return;
        };
        let mut members = split_members(catalog, selections, &part.id);
        if members.len() != 2 {
            if members.len() > 2 {
                log::warn!(
                    "{} split part '{}' has {} selected members; allocation left unchanged",
                    catalog.species(),
                    part.id,
                    members.len()
                );
            }
            return;
        }
        // The most recent pick goes last so it absorbs any remainder.
        if let Some(pos) = members.iter().position(|id| *id == cut_id) {
            let recent = members.remove(pos);
            members.push(recent);
        }
        let shares = spread(100, members.len());
        self.parts
            .insert(part.id.clone(), entries_for(members, &shares));
    }

    /// Set one member's share; the other member receives the rest.
    ///
    /// # Errors
    ///
    /// Fails when the part is unknown, cannot be split, is not currently
    /// split, or does not include `cut_id`.
    pub fn set_percentage(
        &mut self,
        catalog: &SpeciesCatalog,
        part_id: &str,
        cut_id: &str,
        percent: u8,
    ) -> Result<(), AllocationError> {
        let part = catalog
            .part(part_id)
            .ok_or_else(|| AllocationError::UnknownPart(part_id.to_string()))?;
        if part.grouping != GroupingMode::AllowSplit {
            return Err(AllocationError::NotSplitCapable(part_id.to_string()));
        }
        let entries = self
            .parts
            .get_mut(part_id)
            .ok_or_else(|| AllocationError::NotSplit(part_id.to_string()))?;
        if !entries.iter().any(|entry| entry.cut_id == cut_id) {
            return Err(AllocationError::NotMember {
                part_id: part_id.to_string(),
                cut_id: cut_id.to_string(),
            });
        }
        let target = snap(percent);
        let rest = spread(100 - target, entries.len() - 1);
        let mut rest = rest.into_iter();
        for entry in entries.iter_mut() {
            entry.percent = if entry.cut_id == cut_id {
                target
            } else {
                rest.next().unwrap_or(0)
            };
        }
        Ok(())
    }

    /// Forget a deselected cut. A part left with fewer than two members is
    /// cleared; otherwise the survivors share the yield evenly again.
    pub fn on_deselect(&mut self, cut_id: &str) {
        let Some(part_id) = self
            .parts
            .iter()
            .find(|(_, entries)| entries.iter().any(|entry| entry.cut_id == cut_id))
            .map(|(part, _)| part.clone())
        else {
            return;
        };
        let Some(entries) = self.parts.get_mut(&part_id) else {
            return;
        };
        entries.retain(|entry| entry.cut_id != cut_id);
        if entries.len() < 2 {
            self.parts.remove(&part_id);
            return;
        }
        let shares = spread(100, entries.len());
        for (entry, share) in entries.iter_mut().zip(shares) {
            entry.percent = share;
        }
    }

    /// Reconcile with the current selections: valid splits are kept,
    /// missing ones start even, and stale parts are dropped.
    pub fn sync(&mut self, catalog: &SpeciesCatalog, selections: &SelectionSet) {
        let mut synced = BTreeMap::new();
        for part in catalog.parts() {
            if part.grouping != GroupingMode::AllowSplit {
                continue;
            }
            let members = split_members(catalog, selections, &part.id);
            if members.len() != 2 {
                continue;
            }
            let existing = self.parts.remove(&part.id).filter(|entries| {
                entries.len() == 2
                    && members
                        .iter()
                        .all(|id| entries.iter().any(|entry| entry.cut_id == *id))
                    && entries.iter().all(|entry| entry.percent % STEP == 0)
                    && entries.iter().map(|entry| u32::from(entry.percent)).sum::<u32>() == 100
            });
            let entries = existing.unwrap_or_else(|| {
                log::debug!("initializing {} split for '{}'", catalog.species(), part.id);
                entries_for(members, &spread(100, 2))
            });
            synced.insert(part.id.clone(), entries);
        }
        self.parts = synced;
    }

    /// Allow-split parts with two or more selected members whose shares do
    /// not total 100. Any such part blocks finalizing the sheet.
    #[must_use]
    pub fn incomplete_allocations(
        &self,
        catalog: &SpeciesCatalog,
        selections: &SelectionSet,
    ) -> Vec<String> {
        catalog
            .parts()
            .into_iter()
            .filter(|part| part.grouping == GroupingMode::AllowSplit)
            .filter_map(|part| {
                let members = split_members(catalog, selections, &part.id);
                if members.len() < 2 {
                    return None;
                }
                let total: f64 = members
                    .iter()
                    .filter_map(|id| {
                        self.get(&part.id)?
                            .iter()
                            .find(|entry| entry.cut_id == *id)
                            .map(|entry| f64::from(entry.percent))
                    })
                    .sum();
                ((total - 100.0).abs() > TOLERANCE).then(|| part.id.clone())
            })
            .collect()
    }
}

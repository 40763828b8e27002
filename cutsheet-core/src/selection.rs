//! Selections and the ordered, id-unique selection set callers own.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::{CutChoice, CutId, SpeciesCatalog};
use crate::params::{ParamOverrides, ResolvedParams};

/// A chosen cut plus any parameter overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub cut_id: CutId,
    #[serde(default, skip_serializing_if = "ParamOverrides::is_empty")]
    pub params: ParamOverrides,
}

impl Selection {
    #[must_use]
    pub fn new(cut_id: impl Into<CutId>) -> Self {
        Self {
            cut_id: cut_id.into(),
            params: ParamOverrides::default(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: ParamOverrides) -> Self {
        self.params = params;
        self
    }
}

/// Ordered selections with unique cut ids. Order is significant: earlier
/// picks win conflict tie-breaks during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Selection>", into = "Vec<Selection>")]
pub struct SelectionSet {
    selections: Vec<Selection>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from bare cut ids; repeated ids keep their first position.
    #[must_use]
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CutId>,
    {
        ids.into_iter().map(Selection::new).collect()
    }

    /// Append a selection. Returns `false` (and leaves the set untouched) when
    /// the cut is already selected.
    pub fn add(&mut self, selection: Selection) -> bool {
        if self.contains(&selection.cut_id) {
            return false;
        }
        self.selections.push(selection);
        true
    }

    pub fn add_id(&mut self, cut_id: impl Into<CutId>) -> bool {
        self.add(Selection::new(cut_id))
    }

    pub fn remove(&mut self, cut_id: &str) -> Option<Selection> {
        let position = self.position(cut_id)?;
        Some(self.selections.remove(position))
    }

    #[must_use]
    pub fn contains(&self, cut_id: &str) -> bool {
        self.selections.iter().any(|s| s.cut_id == cut_id)
    }

    #[must_use]
    pub fn position(&self, cut_id: &str) -> Option<usize> {
        self.selections.iter().position(|s| s.cut_id == cut_id)
    }

    #[must_use]
    pub fn get(&self, cut_id: &str) -> Option<&Selection> {
        self.selections.iter().find(|s| s.cut_id == cut_id)
    }

    pub fn get_mut(&mut self, cut_id: &str) -> Option<&mut Selection> {
        self.selections.iter_mut().find(|s| s.cut_id == cut_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Selection> {
        self.selections.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selections.iter().map(|s| s.cut_id.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Keep only selections matching the predicate, preserving order.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Selection) -> bool,
    {
        self.selections.retain(keep);
    }

    /// Effective parameters of a selected cut under the catalog's schema.
    #[must_use]
    pub fn resolved_params(&self, catalog: &SpeciesCatalog, cut_id: &str) -> Option<ResolvedParams> {
        let selection = self.get(cut_id)?;
        let cut = catalog.cut(cut_id)?;
        Some(cut.parameter_schema().resolve(&selection.params))
    }
}

impl FromIterator<Selection> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = Selection>>(iter: T) -> Self {
        let mut set = Self::new();
        for selection in iter {
            set.add(selection);
        }
        set
    }
}

impl From<Vec<Selection>> for SelectionSet {
    fn from(selections: Vec<Selection>) -> Self {
        selections.into_iter().collect()
    }
}

impl From<SelectionSet> for Vec<Selection> {
    fn from(set: SelectionSet) -> Self {
        set.selections
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a Selection;
    type IntoIter = std::slice::Iter<'a, Selection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Selected cuts resolved against a catalog: unknown ids dropped, original
/// order kept.
#[derive(Debug)]
pub(crate) struct ResolvedSelection<'a> {
    pub cuts: Vec<&'a CutChoice>,
    ids: HashSet<&'a str>,
}

impl<'a> ResolvedSelection<'a> {
    pub fn resolve(catalog: &'a SpeciesCatalog, selections: &SelectionSet) -> Self {
        let mut cuts = Vec::with_capacity(selections.len());
        let mut ids = HashSet::with_capacity(selections.len());
        for selection in selections {
            match catalog.cut(&selection.cut_id) {
                Some(cut) => {
                    cuts.push(cut);
                    ids.insert(cut.id.as_str());
                }
                None => log::debug!(
                    "skipping unknown {} cut '{}'",
                    catalog.species(),
                    selection.cut_id
                ),
            }
        }
        Self { cuts, ids }
    }

    pub fn contains(&self, cut_id: &str) -> bool {
        self.ids.contains(cut_id)
    }
}

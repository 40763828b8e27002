//! Per-species catalogs of body parts and cuts.
//!
//! Catalog data is authored as a tree with inline cut definitions
//! ([`SpeciesCatalogDef`]). Building a [`SpeciesCatalog`] moves every cut into
//! an id-keyed arena and leaves only ids in the body-part tree, so all
//! constraint edges are plain id references resolved through one lookup map.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hasher;
use std::sync::OnceLock;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::params::ParameterSchema;
use crate::species::Species;

mod integrity;
pub mod visit;

pub use integrity::integrity_problems;
use visit::{fold, walk};

pub type CutId = String;

/// Short list of cut ids used for constraint edges.
pub type EdgeList = SmallVec<[CutId; 4]>;

const BEEF_DATA: &str = include_str!("../../data/beef.json");
const PORK_DATA: &str = include_str!("../../data/pork.json");
const LAMB_DATA: &str = include_str!("../../data/lamb.json");
const GOAT_DATA: &str = include_str!("../../data/goat.json");

const BUILTIN_SOURCES: [(Species, &str); 4] = [
    (Species::Beef, BEEF_DATA),
    (Species::Pork, PORK_DATA),
    (Species::Lamb, LAMB_DATA),
    (Species::Goat, GOAT_DATA),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    #[default]
    None,
    /// At most one cut of the part may be selected.
    ExclusiveChoice,
    /// Exactly two cuts may share the part's yield by percentage.
    AllowSplit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutStyle {
    Steak,
    Chop,
    Roast,
    Ground,
    Ribs,
    Stew,
    Bones,
    Organ,
    Cured,
    Sausage,
    Whole,
    Fat,
}

impl CutStyle {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Steak => "steak",
            Self::Chop => "chop",
            Self::Roast => "roast",
            Self::Ground => "ground",
            Self::Ribs => "ribs",
            Self::Stew => "stew",
            Self::Bones => "bones",
            Self::Organ => "organ",
            Self::Cured => "cured",
            Self::Sausage => "sausage",
            Self::Whole => "whole",
            Self::Fat => "fat",
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

/// A product a body part can be processed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutChoice {
    pub id: CutId,
    pub name: String,
    pub style: CutStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hard exclusions: selecting this cut makes these impossible.
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub excludes: EdgeList,
    /// Cuts that must be selected together with this one.
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub requires: EdgeList,
    /// Soft conflicts: both selectable, each yields less.
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub conflicts_with: EdgeList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduces_yield: Option<CutId>,
    /// Exempt from the owning part's grouping rules.
    #[serde(default, skip_serializing_if = "is_false")]
    pub independent: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub specialty: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_fee: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParameterSchema>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<String>,
}

impl CutChoice {
    #[must_use]
    pub fn new(id: impl Into<CutId>, name: impl Into<String>, style: CutStyle) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            style,
            description: None,
            excludes: EdgeList::new(),
            requires: EdgeList::new(),
            conflicts_with: EdgeList::new(),
            reduces_yield: None,
            independent: false,
            specialty: false,
            has_fee: false,
            parameters: None,
            disabled: false,
            disabled_reason: None,
        }
    }

    #[must_use]
    pub fn excluding<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CutId>,
    {
        self.excludes.extend(ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn requiring<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CutId>,
    {
        self.requires.extend(ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn conflicting<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CutId>,
    {
        self.conflicts_with.extend(ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn reducing_yield_of(mut self, id: impl Into<CutId>) -> Self {
        self.reduces_yield = Some(id.into());
        self
    }

    #[must_use]
    pub const fn independent(mut self) -> Self {
        self.independent = true;
        self
    }

    /// Declared parameter schema, or the style default when none is declared.
    #[must_use]
    pub fn parameter_schema(&self) -> Cow<'_, ParameterSchema> {
        self.parameters.as_ref().map_or_else(
            || Cow::Owned(ParameterSchema::for_style(self.style)),
            Cow::Borrowed,
        )
    }

    #[must_use]
    pub fn excludes_cut(&self, cut_id: &str) -> bool {
        self.excludes.iter().any(|id| id == cut_id)
    }
}

/// Authored body part with inline cut definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyPartDef {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub grouping: GroupingMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cuts: Vec<CutChoice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_parts: Vec<BodyPartDef>,
}

/// Authored catalog document for one species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCatalogDef {
    pub species: Species,
    pub primals: Vec<BodyPartDef>,
}

/// Body part in arena form: cuts are referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyPart {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub grouping: GroupingMode,
    pub cuts: Vec<CutId>,
    pub sub_parts: Vec<BodyPart>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{expected} catalog source declares species '{found}'")]
    SpeciesMismatch { expected: Species, found: Species },
    #[error("{species}: body part id '{part_id}' is declared more than once")]
    DuplicatePart { species: Species, part_id: String },
    #[error("{species}: cut '{cut_id}' is listed by unrelated body parts '{first}' and '{second}'")]
    DuplicateCut {
        species: Species,
        cut_id: CutId,
        first: String,
        second: String,
    },
    #[error("{species}: cut '{cut_id}' {relation} unknown cut '{target}'")]
    UnknownReference {
        species: Species,
        cut_id: CutId,
        relation: &'static str,
        target: CutId,
    },
    #[error("{species}: cut '{cut_id}' {relation} itself")]
    SelfReference {
        species: Species,
        cut_id: CutId,
        relation: &'static str,
    },
    #[error("{species}: '{cut_id}' requires '{target}' but '{target}' does not require it back")]
    AsymmetricRequires {
        species: Species,
        cut_id: CutId,
        target: CutId,
    },
    #[error("{species}: requires chain '{cut_id}' -> '{via}' -> '{target}' is deeper than one level")]
    RequiresChain {
        species: Species,
        cut_id: CutId,
        via: CutId,
        target: CutId,
    },
    #[error("{species}: catalog could not be serialized for fingerprinting: {source}")]
    Fingerprint {
        species: Species,
        source: serde_json::Error,
    },
    #[error("{species}: cut '{cut_id}' declares an invalid {param} option set")]
    InvalidParameter {
        species: Species,
        cut_id: CutId,
        param: &'static str,
    },
}

/// Immutable catalog for one species.
#[derive(Debug, Clone)]
pub struct SpeciesCatalog {
    species: Species,
    primals: Vec<BodyPart>,
    cuts: Vec<CutChoice>,
    index: HashMap<CutId, usize>,
    /// Deepest body part listing each cut.
    owners: HashMap<CutId, String>,
    /// Child-index path to each body part.
    part_paths: HashMap<String, Vec<usize>>,
}

impl SpeciesCatalog {
    /// Parse and build a catalog, running the integrity check.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the catalog violates an
    /// integrity rule.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let def: SpeciesCatalogDef = serde_json::from_str(json)?;
        Self::from_def(def)
    }

    /// Build a catalog from its authored form, running the integrity check.
    ///
    /// # Errors
    ///
    /// Returns the first structural or integrity problem found.
    pub fn from_def(def: SpeciesCatalogDef) -> Result<Self, CatalogError> {
        let catalog = Self::assemble(def)?;
        match integrity_problems(&catalog).into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(catalog),
        }
    }

    /// Build the arena and indexes without checking constraint edges. Used for
    /// derived views (seller filters) where edges may point at pruned cuts.
    pub(crate) fn assemble(def: SpeciesCatalogDef) -> Result<Self, CatalogError> {
        let mut cuts = Vec::new();
        let mut index = HashMap::new();
        let primals = def
            .primals
            .into_iter()
            .map(|part| absorb(part, &mut cuts, &mut index))
            .collect();
        let mut catalog = Self {
            species: def.species,
            primals,
            cuts,
            index,
            owners: HashMap::new(),
            part_paths: HashMap::new(),
        };
        catalog.resolve_structure()?;
        Ok(catalog)
    }

    fn resolve_structure(&mut self) -> Result<(), CatalogError> {
        let species = self.species;
        let mut owners: HashMap<CutId, String> = HashMap::new();
        let mut part_paths: HashMap<String, Vec<usize>> = HashMap::new();
        let mut problem: Option<CatalogError> = None;

        walk(&self.primals, &mut |visit| {
            if problem.is_some() {
                return;
            }
            let part = visit.part;
            if part_paths
                .insert(part.id.clone(), visit.path.to_vec())
                .is_some()
            {
                problem = Some(CatalogError::DuplicatePart {
                    species,
                    part_id: part.id.clone(),
                });
                return;
            }
            for cut_id in &part.cuts {
                match owners.get(cut_id).cloned() {
                    None => {
                        owners.insert(cut_id.clone(), part.id.clone());
                    }
                    Some(owner) if owner != part.id && visit.is_descendant_of(&owner) => {
                        owners.insert(cut_id.clone(), part.id.clone());
                    }
                    Some(owner) => {
                        problem = Some(CatalogError::DuplicateCut {
                            species,
                            cut_id: cut_id.clone(),
                            first: owner,
                            second: part.id.clone(),
                        });
                        return;
                    }
                }
            }
        });

        if let Some(problem) = problem {
            return Err(problem);
        }
        self.owners = owners;
        self.part_paths = part_paths;
        Ok(())
    }

    #[must_use]
    pub const fn species(&self) -> Species {
        self.species
    }

    #[must_use]
    pub fn primals(&self) -> &[BodyPart] {
        &self.primals
    }

    /// Every cut in catalog order.
    #[must_use]
    pub fn cuts(&self) -> &[CutChoice] {
        &self.cuts
    }

    #[must_use]
    pub fn cut(&self, cut_id: &str) -> Option<&CutChoice> {
        self.index.get(cut_id).and_then(|&slot| self.cuts.get(slot))
    }

    #[must_use]
    pub fn contains(&self, cut_id: &str) -> bool {
        self.index.contains_key(cut_id)
    }

    /// Display name of a cut, falling back to the raw id for unknown cuts.
    #[must_use]
    pub fn cut_name<'a>(&'a self, cut_id: &'a str) -> &'a str {
        self.cut(cut_id).map_or(cut_id, |cut| cut.name.as_str())
    }

    #[must_use]
    pub fn part(&self, part_id: &str) -> Option<&BodyPart> {
        let path = self.part_paths.get(part_id)?;
        let (first, rest) = path.split_first()?;
        let mut node = self.primals.get(*first)?;
        for idx in rest {
            node = node.sub_parts.get(*idx)?;
        }
        Some(node)
    }

    /// The body part that owns a cut. When a cut is listed by a part and one of
    /// its sub-parts, the sub-part owns it.
    #[must_use]
    pub fn owner(&self, cut_id: &str) -> Option<&BodyPart> {
        self.owners
            .get(cut_id)
            .and_then(|part_id| self.part(part_id))
    }

    /// Exclusive-choice group a cut competes in, if any.
    #[must_use]
    pub fn exclusive_group(&self, cut: &CutChoice) -> Option<&BodyPart> {
        if cut.independent {
            return None;
        }
        self.owner(&cut.id)
            .filter(|part| part.grouping == GroupingMode::ExclusiveChoice)
    }

    /// Allow-split part a cut can share yield in, if any.
    #[must_use]
    pub fn split_part(&self, cut: &CutChoice) -> Option<&BodyPart> {
        if cut.independent {
            return None;
        }
        self.owner(&cut.id)
            .filter(|part| part.grouping == GroupingMode::AllowSplit)
    }

    /// Non-independent cuts owned by `part_id`, in catalog order. These are the
    /// members bound by the part's grouping mode.
    pub fn group_members<'a>(&'a self, part_id: &'a str) -> impl Iterator<Item = &'a CutChoice> {
        self.cuts.iter().filter(move |cut| {
            !cut.independent
                && self
                    .owners
                    .get(&cut.id)
                    .is_some_and(|owner| owner == part_id)
        })
    }

    /// Every body part in pre-order.
    #[must_use]
    pub fn parts(&self) -> Vec<&BodyPart> {
        let mut parts = Vec::new();
        walk(&self.primals, &mut |visit| parts.push(visit.part));
        parts
    }

    /// Rebuild the authored form, with full cut definitions inline.
    #[must_use]
    pub fn to_def(&self) -> SpeciesCatalogDef {
        let primals = self
            .primals
            .iter()
            .map(|primal| {
                fold(primal, &mut |part, sub_parts| BodyPartDef {
                    id: part.id.clone(),
                    name: part.name.clone(),
                    description: part.description.clone(),
                    grouping: part.grouping,
                    cuts: part
                        .cuts
                        .iter()
                        .filter_map(|id| self.cut(id).cloned())
                        .collect(),
                    sub_parts,
                })
            })
            .collect();
        SpeciesCatalogDef {
            species: self.species,
            primals,
        }
    }

    /// Stable xxHash64 of the catalog's serialized form. Identifies a catalog
    /// revision, e.g. to detect that a saved template predates a data change.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be serialized for hashing.
    pub fn fingerprint(&self) -> Result<u64, CatalogError> {
        let bytes =
            serde_json::to_vec(&self.to_def()).map_err(|source| CatalogError::Fingerprint {
                species: self.species,
                source,
            })?;
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&bytes);
        Ok(hasher.finish())
    }
}

fn absorb(
    def: BodyPartDef,
    cuts: &mut Vec<CutChoice>,
    index: &mut HashMap<CutId, usize>,
) -> BodyPart {
    let mut ids = Vec::with_capacity(def.cuts.len());
    for cut in def.cuts {
        ids.push(cut.id.clone());
        // First definition wins when a cut is re-listed by a sub-part.
        if !index.contains_key(&cut.id) {
            index.insert(cut.id.clone(), cuts.len());
            cuts.push(cut);
        }
    }
    let sub_parts = def
        .sub_parts
        .into_iter()
        .map(|child| absorb(child, cuts, index))
        .collect();
    BodyPart {
        id: def.id,
        name: def.name,
        description: def.description,
        grouping: def.grouping,
        cuts: ids,
        sub_parts,
    }
}

/// Catalogs for every loaded species.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    catalogs: BTreeMap<Species, SpeciesCatalog>,
}

impl SchemaCatalog {
    /// Process-wide built-in catalog, parsed on first use. A load failure is
    /// logged and yields an empty catalog, so every species validates
    /// fail-closed.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static CATALOG: OnceLock<SchemaCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            Self::load_from_static().unwrap_or_else(|err| {
                log::error!("built-in cut catalog failed to load: {err}");
                Self::default()
            })
        })
    }

    /// Parse the catalogs compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if any built-in catalog is malformed or inconsistent.
    pub fn load_from_static() -> Result<Self, CatalogError> {
        let mut schema = Self::default();
        for (species, json) in BUILTIN_SOURCES {
            let catalog = SpeciesCatalog::from_json(json)?;
            if catalog.species() != species {
                return Err(CatalogError::SpeciesMismatch {
                    expected: species,
                    found: catalog.species(),
                });
            }
            schema.insert(catalog);
        }
        Ok(schema)
    }

    #[must_use]
    pub fn from_catalogs<I>(catalogs: I) -> Self
    where
        I: IntoIterator<Item = SpeciesCatalog>,
    {
        let mut schema = Self::default();
        for catalog in catalogs {
            schema.insert(catalog);
        }
        schema
    }

    /// Add or replace the catalog for its species.
    pub fn insert(&mut self, catalog: SpeciesCatalog) -> Option<SpeciesCatalog> {
        self.catalogs.insert(catalog.species(), catalog)
    }

    #[must_use]
    pub fn species(&self, species: Species) -> Option<&SpeciesCatalog> {
        self.catalogs.get(&species)
    }

    pub fn available_species(&self) -> impl Iterator<Item = Species> + '_ {
        self.catalogs.keys().copied()
    }
}

//! Per-cut processing parameters: thickness, package count, weight and toggles.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::CutStyle;

/// Enumerated choices for one parameter plus the value used when the caller
/// gives none (or gives one outside the set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet<T> {
    pub options: Vec<T>,
    pub default: T,
}

impl<T> OptionSet<T>
where
    T: Clone + PartialEq,
{
    #[must_use]
    pub fn new(options: Vec<T>, default: T) -> Self {
        Self { options, default }
    }

    /// Pick the requested value when it is one of the options, else the default.
    #[must_use]
    pub fn resolve(&self, requested: Option<&T>) -> T {
        requested
            .filter(|value| self.options.contains(value))
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !self.options.is_empty() && self.options.contains(&self.default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleParam {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub default: bool,
}

impl ToggleParam {
    fn new(key: &str, label: &str, default: bool) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            default,
        }
    }
}

/// Parameter schema declared by a cut. Absent in the catalog data means the
/// style's default schema applies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<OptionSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_count: Option<OptionSet<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<OptionSet<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toggles: Vec<ToggleParam>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

impl ParameterSchema {
    #[must_use]
    pub fn for_style(style: CutStyle) -> Self {
        match style {
            CutStyle::Steak | CutStyle::Chop => Self {
                thickness: Some(OptionSet::new(
                    strings(&["1/2\"", "3/4\"", "1\"", "1 1/4\"", "1 1/2\"", "2\""]),
                    "1\"".to_string(),
                )),
                package_count: Some(OptionSet::new(vec![1, 2, 3, 4], 2)),
                ..Self::default()
            },
            CutStyle::Roast | CutStyle::Whole => Self {
                weight: Some(OptionSet::new(
                    strings(&["2-3 lb", "3-4 lb", "4-5 lb"]),
                    "3-4 lb".to_string(),
                )),
                ..Self::default()
            },
            CutStyle::Ground => Self {
                weight: Some(OptionSet::new(
                    strings(&["1 lb", "2 lb"]),
                    "1 lb".to_string(),
                )),
                toggles: vec![ToggleParam::new("patties", "Form into patties", false)],
                ..Self::default()
            },
            CutStyle::Sausage => Self {
                weight: Some(OptionSet::new(
                    strings(&["1 lb", "2 lb"]),
                    "1 lb".to_string(),
                )),
                toggles: vec![ToggleParam::new("links", "Stuff into links", false)],
                ..Self::default()
            },
            CutStyle::Ribs => Self {
                package_count: Some(OptionSet::new(vec![1, 2], 1)),
                ..Self::default()
            },
            CutStyle::Stew => Self {
                weight: Some(OptionSet::new(
                    strings(&["1 lb", "2 lb"]),
                    "1 lb".to_string(),
                )),
                ..Self::default()
            },
            CutStyle::Cured => Self {
                toggles: vec![ToggleParam::new("sliced", "Sliced", true)],
                ..Self::default()
            },
            CutStyle::Bones | CutStyle::Organ | CutStyle::Fat => Self::default(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thickness.is_none()
            && self.package_count.is_none()
            && self.weight.is_none()
            && self.toggles.is_empty()
    }

    /// Names of parameters whose option set is empty or whose default is not
    /// one of the options.
    #[must_use]
    pub fn inconsistencies(&self) -> Vec<&'static str> {
        let mut bad = Vec::new();
        if self.thickness.as_ref().is_some_and(|set| !set.is_consistent()) {
            bad.push("thickness");
        }
        if self
            .package_count
            .as_ref()
            .is_some_and(|set| !set.is_consistent())
        {
            bad.push("package_count");
        }
        if self.weight.as_ref().is_some_and(|set| !set.is_consistent()) {
            bad.push("weight");
        }
        bad
    }

    /// Resolve caller overrides against this schema. Overrides for parameters
    /// the schema does not declare, or values outside the option set, fall
    /// back to the declared defaults.
    #[must_use]
    pub fn resolve(&self, overrides: &ParamOverrides) -> ResolvedParams {
        let toggles = self
            .toggles
            .iter()
            .map(|toggle| {
                let value = overrides
                    .toggles
                    .get(&toggle.key)
                    .copied()
                    .unwrap_or(toggle.default);
                (toggle.key.clone(), value)
            })
            .collect();
        ResolvedParams {
            thickness: self
                .thickness
                .as_ref()
                .map(|set| set.resolve(overrides.thickness.as_ref())),
            package_count: self
                .package_count
                .as_ref()
                .map(|set| set.resolve(overrides.package_count.as_ref())),
            weight: self
                .weight
                .as_ref()
                .map(|set| set.resolve(overrides.weight.as_ref())),
            toggles,
        }
    }
}

/// Caller-supplied parameter values attached to a selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParamOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub toggles: BTreeMap<String, bool>,
}

impl ParamOverrides {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thickness.is_none()
            && self.package_count.is_none()
            && self.weight.is_none()
            && self.toggles.is_empty()
    }
}

/// Effective parameter values for one selected cut.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedParams {
    pub thickness: Option<String>,
    pub package_count: Option<u8>,
    pub weight: Option<String>,
    pub toggles: BTreeMap<String, bool>,
}

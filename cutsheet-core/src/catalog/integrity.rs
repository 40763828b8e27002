//! Constraint-edge integrity rules for authored catalogs.
use super::{CatalogError, CutChoice, SpeciesCatalog};

/// Every integrity problem in a catalog, in catalog order.
#[must_use]
pub fn integrity_problems(catalog: &SpeciesCatalog) -> Vec<CatalogError> {
    let mut problems = Vec::new();
    for cut in catalog.cuts() {
        check_edges(catalog, cut, &mut problems);
        check_requires(catalog, cut, &mut problems);
        for param in cut.parameter_schema().inconsistencies() {
            problems.push(CatalogError::InvalidParameter {
                species: catalog.species(),
                cut_id: cut.id.clone(),
                param,
            });
        }
    }
    problems
}

fn check_edges(catalog: &SpeciesCatalog, cut: &CutChoice, problems: &mut Vec<CatalogError>) {
    let species = catalog.species();
    let edges = cut
        .excludes
        .iter()
        .map(|target| ("excludes", target))
        .chain(cut.requires.iter().map(|target| ("requires", target)))
        .chain(cut.conflicts_with.iter().map(|target| ("conflicts with", target)))
        .chain(cut.reduces_yield.iter().map(|target| ("reduces the yield of", target)));
    for (relation, target) in edges {
        if *target == cut.id {
            problems.push(CatalogError::SelfReference {
                species,
                cut_id: cut.id.clone(),
                relation,
            });
        } else if !catalog.contains(target) {
            problems.push(CatalogError::UnknownReference {
                species,
                cut_id: cut.id.clone(),
                relation,
                target: target.clone(),
            });
        }
    }
}

fn check_requires(catalog: &SpeciesCatalog, cut: &CutChoice, problems: &mut Vec<CatalogError>) {
    let species = catalog.species();
    for target_id in &cut.requires {
        let Some(target) = catalog.cut(target_id) else {
            continue;
        };
        if !target.requires.iter().any(|id| *id == cut.id) {
            problems.push(CatalogError::AsymmetricRequires {
                species,
                cut_id: cut.id.clone(),
                target: target_id.clone(),
            });
        }
        if let Some(beyond) = target.requires.iter().find(|id| **id != cut.id) {
            problems.push(CatalogError::RequiresChain {
                species,
                cut_id: cut.id.clone(),
                via: target_id.clone(),
                target: beyond.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BodyPartDef, CutStyle, GroupingMode, SpeciesCatalogDef};
    use crate::params::{OptionSet, ParameterSchema};
    use crate::species::Species;

    fn catalog_with(cuts: Vec<CutChoice>) -> SpeciesCatalog {
        SpeciesCatalog::assemble(SpeciesCatalogDef {
            species: Species::Pork,
            primals: vec![BodyPartDef {
                id: "belly".to_string(),
                name: "Belly".to_string(),
                description: None,
                grouping: GroupingMode::None,
                cuts,
                sub_parts: Vec::new(),
            }],
        })
        .unwrap()
    }

    #[test]
    fn clean_catalog_has_no_problems() {
        let catalog = catalog_with(vec![
            CutChoice::new("a", "A", CutStyle::Steak).requiring(["b"]),
            CutChoice::new("b", "B", CutStyle::Steak).requiring(["a"]),
        ]);
        assert!(integrity_problems(&catalog).is_empty());
    }

    #[test]
    fn unknown_and_self_references_are_reported() {
        let catalog = catalog_with(vec![
            CutChoice::new("a", "A", CutStyle::Steak).excluding(["ghost"]),
            CutChoice::new("b", "B", CutStyle::Steak).conflicting(["b"]),
        ]);
        let problems = integrity_problems(&catalog);
        assert_eq!(problems.len(), 2);
        assert!(matches!(
            problems[0],
            CatalogError::UnknownReference { ref target, .. } if target == "ghost"
        ));
        assert!(matches!(problems[1], CatalogError::SelfReference { .. }));
    }

    #[test]
    fn asymmetric_and_chained_requires_are_reported() {
        let catalog = catalog_with(vec![
            CutChoice::new("a", "A", CutStyle::Steak).requiring(["b"]),
            CutChoice::new("b", "B", CutStyle::Steak).requiring(["c"]),
            CutChoice::new("c", "C", CutStyle::Steak),
        ]);
        let problems = integrity_problems(&catalog);
        assert!(problems
            .iter()
            .any(|p| matches!(p, CatalogError::AsymmetricRequires { cut_id, .. } if cut_id == "a")));
        assert!(problems
            .iter()
            .any(|p| matches!(p, CatalogError::RequiresChain { target, .. } if target == "c")));
    }

    #[test]
    fn bad_parameter_defaults_are_reported() {
        let mut cut = CutChoice::new("a", "A", CutStyle::Steak);
        cut.parameters = Some(ParameterSchema {
            weight: Some(OptionSet::new(vec!["1 lb".to_string()], "5 lb".to_string())),
            ..ParameterSchema::default()
        });
        let problems = integrity_problems(&catalog_with(vec![cut]));
        assert!(matches!(
            problems.as_slice(),
            [CatalogError::InvalidParameter { param: "weight", .. }]
        ));
    }
}

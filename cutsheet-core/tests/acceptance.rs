use cutsheet_core::{
    CutSheetEngine, ErrorKind, SchemaCatalog, SelectionSet, SellerCatalogConfig, Species,
    WarningKind, normalize_catalog,
};

fn engine() -> CutSheetEngine<'static> {
    CutSheetEngine::default()
}

fn set(ids: &[&str]) -> SelectionSet {
    SelectionSet::from_ids(ids.iter().copied())
}

#[test]
fn empty_selection_is_valid_for_every_species() {
    let engine = engine();
    for species in Species::ALL {
        let result = engine.validate(species, &SelectionSet::new());
        assert!(result.is_valid, "{species}");
        assert!(result.errors.is_empty(), "{species}");
        assert!(result.warnings.is_empty(), "{species}");
    }
}

#[test]
fn short_loin_walkthrough() {
    let engine = engine();

    let result = engine.validate(Species::Beef, &set(&["tbone"]));
    assert!(result.is_valid);
    let strip = result.disabled("nystrip").expect("strip disabled by tbone");
    assert_eq!(strip.caused_by.as_deref(), Some("tbone"));

    let result = engine.validate(Species::Beef, &set(&["tbone", "nystrip"]));
    assert!(!result.is_valid);
    let excludes: Vec<_> = result.errors_of(ErrorKind::Excludes).collect();
    assert_eq!(excludes.len(), 1);
    assert!(excludes[0].involves("tbone", "nystrip"));

    let result = engine.validate(Species::Beef, &set(&["nystrip"]));
    assert!(!result.is_valid);
    let requires: Vec<_> = result.errors_of(ErrorKind::Requires).collect();
    assert_eq!(requires.len(), 1);
    assert_eq!(requires[0].related_cut_id, "filet");
    assert!(requires[0].message.contains("Filet Mignon"));

    let result = engine.validate(Species::Beef, &set(&["nystrip", "filet"]));
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
}

#[test]
fn excludes_is_reported_from_either_side() {
    let engine = engine();
    for ids in [["bacon", "fresh_belly"], ["fresh_belly", "bacon"]] {
        let result = engine.validate(Species::Pork, &set(&ids));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::Excludes);
        assert!(result.errors[0].involves("bacon", "fresh_belly"));
    }
    assert!(engine.validate(Species::Pork, &set(&["fresh_belly"])).is_valid);
}

#[test]
fn rib_conflict_is_a_single_warning() {
    let result = engine().validate(Species::Beef, &set(&["ribeye", "primerib"]));
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, WarningKind::ConflictsWith);
}

#[test]
fn reduces_yield_warns_without_blocking() {
    let result = engine().validate(Species::Pork, &set(&["bacon", "spare_ribs"]));
    assert!(result.is_valid);
    assert_eq!(result.warnings_of(WarningKind::ReducesYield).count(), 1);
}

#[test]
fn exclusive_groups_allow_one_pick_each() {
    let engine = engine();
    let result = engine.validate(Species::Lamb, &set(&["rack_of_lamb", "rib_chops"]));
    assert!(!result.is_valid);
    let error = &result.errors[0];
    assert_eq!(error.kind, ErrorKind::ExclusiveChoice);
    assert_eq!(error.group_id.as_deref(), Some("rack"));

    let one_each = set(&[
        "rack_of_lamb",
        "lamb_loin_chops",
        "lamb_shoulder_roast",
        "lamb_riblets",
    ]);
    assert!(engine.validate(Species::Lamb, &one_each).is_valid);

    // Sub-part groups bind their own members only.
    let pork = set(&["butt_roast", "picnic_smoked"]);
    assert!(engine.validate(Species::Pork, &pork).is_valid);
}

#[test]
fn independent_cuts_escape_their_group() {
    let engine = engine();
    let result = engine.validate(Species::Beef, &set(&["round_steak", "eye_of_round"]));
    assert!(result.is_valid);
    let result = engine.validate(Species::Beef, &set(&["top_sirloin_steak", "tri_tip"]));
    assert!(result.is_valid);
}

#[test]
fn would_disable_previews_excludes_and_siblings() {
    let engine = engine();
    let preview = engine.would_disable(Species::Pork, "pork_chops");
    assert_eq!(preview, vec!["pork_tenderloin", "baby_back_ribs"]);

    let preview = engine.would_disable(Species::Beef, "round_steak");
    assert_eq!(preview, vec!["round_roast", "cube_steak", "round_ground"]);
}

#[test]
fn unknown_ids_are_ignored() {
    let result = engine().validate(Species::Goat, &set(&["goat_rack", "no_such_cut"]));
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
}

#[test]
fn normalization_is_idempotent_across_catalogs() {
    let schema = SchemaCatalog::load_from_static().unwrap();
    for species in Species::ALL {
        let catalog = schema.species(species).unwrap();
        // Every cut at once is the worst case for pruning.
        let everything = SelectionSet::from_ids(catalog.cuts().iter().map(|c| c.id.clone()));
        let once = normalize_catalog(catalog, &everything);
        assert!(
            schema_validates(catalog, &once.selections),
            "{species} normalized set should validate"
        );
        let twice = normalize_catalog(catalog, &once.selections);
        assert_eq!(twice.selections, once.selections, "{species}");
        assert!(twice.added.is_empty() && twice.removed.is_empty(), "{species}");
    }
}

fn schema_validates(catalog: &cutsheet_core::SpeciesCatalog, selections: &SelectionSet) -> bool {
    cutsheet_core::validate_catalog(catalog, selections).is_valid
}

#[test]
fn seller_view_runs_the_same_rules() {
    let engine = engine();
    let config: SellerCatalogConfig = serde_json::from_str(
        r#"{"enabled_species":["pork"],"disabled_cuts":["bacon"],"notes":"Smoking on Fridays"}"#,
    )
    .unwrap();
    assert!(engine.apply_config(Species::Beef, Some(&config)).is_none());

    let view = engine.apply_config(Species::Pork, Some(&config)).unwrap();
    let result = view.validate(&set(&["fresh_belly"]));
    assert!(result.is_valid);
    let bacon = result.disabled("bacon").unwrap();
    assert!(bacon.caused_by.is_none());
}

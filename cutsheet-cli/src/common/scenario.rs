//! Built-in acceptance scenarios run against the shipped catalogs.
use anyhow::{Context, Result, ensure};

use cutsheet_core::{
    CutSheet, CutSheetEngine, ErrorKind, SelectionSet, SellerCatalogConfig, Species, WarningKind,
    integrity_problems, normalize_catalog, validate_catalog,
};

type Check = fn(&CutSheetEngine<'_>) -> Result<()>;

#[derive(Clone, Copy)]
pub struct CatalogScenario {
    key: &'static str,
    description: &'static str,
    smoke: bool,
    check: Check,
}

impl CatalogScenario {
    const fn new(key: &'static str, description: &'static str, check: Check) -> Self {
        Self {
            key,
            description,
            smoke: false,
            check,
        }
    }

    const fn smoke(mut self) -> Self {
        self.smoke = true;
        self
    }

    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    pub fn run(&self, engine: &CutSheetEngine<'_>) -> Result<()> {
        (self.check)(engine)
    }
}

pub fn catalog_scenarios() -> Vec<CatalogScenario> {
    vec![
        CatalogScenario::new(
            "catalog-integrity",
            "Every built-in catalog passes the integrity check",
            catalog_integrity,
        )
        .smoke(),
        CatalogScenario::new(
            "empty-selections",
            "An empty selection is valid for every species",
            empty_selections,
        )
        .smoke(),
        CatalogScenario::new(
            "short-loin",
            "T-bone, strip and filet walk through excludes and requires",
            short_loin,
        )
        .smoke(),
        CatalogScenario::new(
            "rib-conflict",
            "Ribeye with prime rib is valid with one conflict warning",
            rib_conflict,
        )
        .smoke(),
        CatalogScenario::new(
            "pork-belly",
            "Bacon and fresh belly exclude each other",
            pork_belly,
        ),
        CatalogScenario::new(
            "exclusive-groups",
            "One cut per exclusive group, independent cuts exempt",
            exclusive_groups,
        ),
        CatalogScenario::new(
            "would-disable",
            "Previews list excludes and group siblings",
            would_disable_preview,
        ),
        CatalogScenario::new(
            "normalize-idempotent",
            "Normalizing every cut at once settles in one pass",
            normalize_idempotent,
        ),
        CatalogScenario::new(
            "seller-filter",
            "Seller overlays disable cuts and prune empty parts",
            seller_filter,
        ),
        CatalogScenario::new(
            "allocation-split",
            "Split parts start even, stay at 100 and clear on deselect",
            allocation_split,
        ),
    ]
}

pub fn find_scenario(key: &str) -> Option<CatalogScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog_scenarios()
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

pub fn smoke_keys() -> Vec<&'static str> {
    catalog_scenarios()
        .iter()
        .filter(|scenario| scenario.smoke)
        .map(|scenario| scenario.key)
        .collect()
}

pub fn all_keys() -> Vec<&'static str> {
    catalog_scenarios()
        .iter()
        .map(|scenario| scenario.key)
        .collect()
}

fn ids(cuts: &[&str]) -> SelectionSet {
    SelectionSet::from_ids(cuts.iter().copied())
}

fn catalog_integrity(engine: &CutSheetEngine<'_>) -> Result<()> {
    for species in Species::ALL {
        let catalog = engine
            .catalog(species)
            .with_context(|| format!("{species} catalog missing"))?;
        let problems = integrity_problems(catalog);
        ensure!(problems.is_empty(), "{species}: {}", problems[0]);
    }
    Ok(())
}

fn empty_selections(engine: &CutSheetEngine<'_>) -> Result<()> {
    for species in Species::ALL {
        let result = engine.validate(species, &SelectionSet::new());
        ensure!(result.is_valid, "{species}: empty selection should be valid");
        ensure!(
            result.errors.is_empty() && result.warnings.is_empty(),
            "{species}: empty selection should report nothing"
        );
    }
    Ok(())
}

fn short_loin(engine: &CutSheetEngine<'_>) -> Result<()> {
    let beef = Species::Beef;
    ensure!(
        engine.validate(beef, &ids(&["tbone"])).is_valid,
        "T-bone alone should be valid"
    );

    let result = engine.validate(beef, &ids(&["tbone", "nystrip"]));
    ensure!(!result.is_valid, "T-bone with strip should be invalid");
    ensure!(
        result
            .errors_of(ErrorKind::Excludes)
            .any(|e| e.involves("tbone", "nystrip")),
        "expected an excludes error naming tbone and nystrip"
    );

    let result = engine.validate(beef, &ids(&["nystrip"]));
    ensure!(
        result
            .errors_of(ErrorKind::Requires)
            .any(|e| e.related_cut_id == "filet"),
        "strip alone should require filet"
    );

    ensure!(
        engine.validate(beef, &ids(&["nystrip", "filet"])).is_valid,
        "strip with filet should be valid"
    );
    Ok(())
}

fn rib_conflict(engine: &CutSheetEngine<'_>) -> Result<()> {
    let result = engine.validate(Species::Beef, &ids(&["ribeye", "primerib"]));
    ensure!(result.is_valid, "soft conflicts must not block");
    ensure!(
        result.warnings.len() == 1,
        "expected exactly one warning, got {}",
        result.warnings.len()
    );
    ensure!(
        result.warnings[0].kind == WarningKind::ConflictsWith,
        "expected a conflictsWith warning"
    );
    Ok(())
}

fn pork_belly(engine: &CutSheetEngine<'_>) -> Result<()> {
    let result = engine.validate(Species::Pork, &ids(&["bacon", "fresh_belly"]));
    ensure!(
        result.errors_of(ErrorKind::Excludes).count() == 1,
        "bacon and fresh belly should produce one excludes error"
    );
    ensure!(
        engine.validate(Species::Pork, &ids(&["fresh_belly"])).is_valid,
        "fresh belly alone should be valid"
    );
    Ok(())
}

fn exclusive_groups(engine: &CutSheetEngine<'_>) -> Result<()> {
    let result = engine.validate(Species::Lamb, &ids(&["rack_of_lamb", "rib_chops"]));
    ensure!(
        result.errors_of(ErrorKind::ExclusiveChoice).count() == 1,
        "two rack cuts should produce one exclusive-choice error"
    );
    let one_each = ids(&["rack_of_lamb", "lamb_loin_chops", "lamb_shoulder_roast"]);
    ensure!(
        engine.validate(Species::Lamb, &one_each).is_valid,
        "one cut per group should be valid"
    );
    ensure!(
        engine
            .validate(Species::Beef, &ids(&["round_steak", "eye_of_round"]))
            .is_valid,
        "independent cuts should not compete in their group"
    );
    Ok(())
}

fn would_disable_preview(engine: &CutSheetEngine<'_>) -> Result<()> {
    let preview = engine.would_disable(Species::Beef, "tbone");
    ensure!(
        preview == ["nystrip", "filet"],
        "tbone should disable strip and filet, got {preview:?}"
    );
    let preview = engine.would_disable(Species::Lamb, "lamb_loin_chops");
    ensure!(
        preview == ["lamb_loin_roast", "lamb_saddle"],
        "loin chops should disable loin siblings, got {preview:?}"
    );
    ensure!(
        engine.would_disable(Species::Beef, "no_such_cut").is_empty(),
        "unknown cuts disable nothing"
    );
    Ok(())
}

fn normalize_idempotent(engine: &CutSheetEngine<'_>) -> Result<()> {
    for species in Species::ALL {
        let catalog = engine
            .catalog(species)
            .with_context(|| format!("{species} catalog missing"))?;
        let everything = SelectionSet::from_ids(catalog.cuts().iter().map(|c| c.id.clone()));
        let once = normalize_catalog(catalog, &everything);
        ensure!(
            validate_catalog(catalog, &once.selections).is_valid,
            "{species}: normalized selections should validate"
        );
        let twice = normalize_catalog(catalog, &once.selections);
        ensure!(
            twice.selections == once.selections && !twice.changed(),
            "{species}: second normalization changed the set"
        );
    }
    Ok(())
}

fn seller_filter(engine: &CutSheetEngine<'_>) -> Result<()> {
    let config = SellerCatalogConfig {
        disabled_cuts: ["butt_roast", "butt_steaks", "butt_ground", "bacon"]
            .into_iter()
            .map(String::from)
            .collect(),
        ..SellerCatalogConfig::default()
    };
    let view = engine
        .apply_config(Species::Pork, Some(&config))
        .context("pork should be offered")?;
    ensure!(view.part("butt").is_none(), "butt should be pruned");
    ensure!(view.part("shoulder").is_some(), "shoulder keeps its picnic");
    ensure!(!view.is_cut_enabled("bacon"), "bacon should be disabled");
    ensure!(view.is_cut_enabled("fresh_belly"), "fresh belly stays enabled");

    let beef_only = SellerCatalogConfig {
        enabled_species: Some([Species::Beef].into_iter().collect()),
        ..SellerCatalogConfig::default()
    };
    ensure!(
        engine.apply_config(Species::Pork, Some(&beef_only)).is_none(),
        "pork should not be offered by a beef-only seller"
    );
    Ok(())
}

fn allocation_split(engine: &CutSheetEngine<'_>) -> Result<()> {
    let beef = engine
        .catalog(Species::Beef)
        .context("beef catalog missing")?;
    let mut sheet = CutSheet::new(Species::Beef);
    sheet.select_id(beef, "ribeye")?;
    sheet.select_id(beef, "primerib")?;
    let total: u32 = sheet
        .allocations()
        .get("rib")
        .context("rib should be split")?
        .iter()
        .map(|entry| u32::from(entry.percent))
        .sum();
    ensure!(total == 100, "split should total 100, got {total}");

    sheet.set_split(beef, "rib", "ribeye", 75)?;
    ensure!(
        sheet.allocations().percent_of("primerib") == Some(25),
        "setting ribeye to 75 should leave 25 for prime rib"
    );

    sheet.deselect("primerib")?;
    ensure!(
        sheet.allocations().get("rib").is_none(),
        "deselecting should clear the split"
    );
    ensure!(sheet.status(beef).can_finalize, "sheet should finalize");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_passes_on_builtin_catalogs() {
        let engine = CutSheetEngine::default();
        for scenario in catalog_scenarios() {
            if let Err(err) = scenario.run(&engine) {
                panic!("{} failed: {err:#}", scenario.key());
            }
        }
    }

    #[test]
    fn keys_are_unique_and_smoke_is_a_subset() {
        let keys = all_keys();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), keys.len());
        assert!(smoke_keys().iter().all(|key| keys.contains(key)));
        assert!(find_scenario("short-loin").is_some());
        assert!(find_scenario("nope").is_none());
    }
}

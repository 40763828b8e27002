mod common;
mod logic;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::scenario::{all_keys, list_scenarios, smoke_keys};
use common::{SelectionInput, load_selections, load_seller_config, split_csv};
use cutsheet_core::catalog::visit::walk;
use cutsheet_core::{
    CutSheetEngine, GroupingMode, SchemaCatalog, SelectionSet, Species, SpeciesCatalog,
};
use logic::{ScenarioResult, SheetMode, SheetReport, run_scenarios, run_sheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Validate selections and report errors, warnings and allocations
    Validate,
    /// Repair selections: add required partners, drop conflicting later picks
    Normalize,
    /// Availability of every cut under the current selections
    Availability,
    /// What selecting --cut would disable and require
    Preview,
    /// Run built-in acceptance scenarios
    Scenarios,
}

impl Mode {
    const fn sheet_mode(self) -> Option<SheetMode> {
        match self {
            Self::Validate => Some(SheetMode::Validate),
            Self::Normalize => Some(SheetMode::Normalize),
            Self::Availability => Some(SheetMode::Availability),
            Self::Preview => Some(SheetMode::Preview),
            Self::Scenarios => None,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "cutsheet", version)]
#[command(about = "Validate, repair and preview livestock cut sheets")]
struct Args {
    /// What to do with the selections
    #[arg(long, value_enum, default_value_t = Mode::Validate)]
    mode: Mode,

    /// Species: beef, pork, lamb or goat
    #[arg(long)]
    species: Option<String>,

    /// Selected cut ids (comma-separated)
    #[arg(long, conflicts_with = "selections")]
    cuts: Option<String>,

    /// JSON file holding a selection array or a saved template
    #[arg(long)]
    selections: Option<PathBuf>,

    /// Seller catalog config (JSON) applied before anything runs
    #[arg(long)]
    seller: Option<PathBuf>,

    /// Cut to preview (preview mode only)
    #[arg(long)]
    cut: Option<String>,

    /// Scenarios to run (comma-separated; "smoke" and "all" expand)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List species with their cut counts and exit
    #[arg(long)]
    list_species: bool,

    /// List the catalog tree for --species and exit
    #[arg(long)]
    list_cuts: bool,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let schema = SchemaCatalog::builtin();
    if schema.available_species().next().is_none() {
        bail!("built-in cut catalog is empty; see the error log for the load failure");
    }
    let engine = CutSheetEngine::new(schema);

    if maybe_list(&args, &engine)? {
        return Ok(());
    }

    if args.report == "console" && args.output.is_none() {
        announce_banner();
    }

    let passed = match args.mode.sheet_mode() {
        None => {
            let start_time = Instant::now();
            let keys = expand_scenarios(&args.scenarios);
            let results = run_scenarios(&engine, &keys, args.verbose);
            write_scenario_reports(&args, &results, start_time)?;
            !results.is_empty() && results.iter().all(|r| r.passed)
        }
        Some(mode) => {
            let report = run_sheet_mode(&args, &engine, mode)?;
            write_sheet_report(&args, &report)?;
            report.passed()
        }
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_species(raw: Option<&str>) -> Result<Option<Species>> {
    raw.map(str::parse::<Species>)
        .transpose()
        .context("invalid --species")
}

fn read_input(args: &Args) -> Result<SelectionInput> {
    if let Some(path) = &args.selections {
        return load_selections(path);
    }
    let ids = args.cuts.as_deref().map(split_csv).unwrap_or_default();
    Ok(SelectionInput {
        selections: SelectionSet::from_ids(ids),
        ..SelectionInput::default()
    })
}

fn run_sheet_mode(args: &Args, engine: &CutSheetEngine<'_>, mode: SheetMode) -> Result<SheetReport> {
    let input = read_input(args)?;
    let species = match (parse_species(args.species.as_deref())?, input.species) {
        (Some(flag), Some(stored)) if flag != stored => {
            bail!("--species {flag} does not match the template species {stored}")
        }
        (Some(species), _) | (None, Some(species)) => species,
        (None, None) => bail!("--species is required unless --selections names a template"),
    };

    let config = args.seller.as_deref().map(load_seller_config).transpose()?;
    let view = engine
        .apply_config(species, config.as_ref())
        .with_context(|| format!("the {species} catalog is not offered"))?;
    if args.verbose {
        log::info!(
            "running {mode:?} on {} {species} selections",
            input.selections.len()
        );
    }
    run_sheet(&view, view.is_filtered(), &input, mode, args.cut.as_deref())
}

fn maybe_list(args: &Args, engine: &CutSheetEngine<'_>) -> Result<bool> {
    if !(args.list_species || args.list_cuts || args.list_scenarios) {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    if args.list_species {
        writeln!(output_target.writer(), "Available species:")?;
        for species in engine.schema().available_species() {
            let count = engine.catalog(species).map_or(0, |c| c.cuts().len());
            writeln!(output_target.writer(), "  {:10} - {count} cuts", species.key())?;
        }
    }
    if args.list_cuts {
        let Some(species) = parse_species(args.species.as_deref())? else {
            bail!("--list-cuts needs --species");
        };
        let catalog = engine
            .catalog(species)
            .with_context(|| format!("no {species} catalog loaded"))?;
        write_catalog_tree(output_target.writer(), catalog)?;
    }
    if args.list_scenarios {
        writeln!(output_target.writer(), "Available scenarios:")?;
        for (key, description) in list_scenarios() {
            writeln!(output_target.writer(), "  {key:25} - {description}")?;
        }
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn grouping_label(grouping: GroupingMode) -> &'static str {
    match grouping {
        GroupingMode::None => "",
        GroupingMode::ExclusiveChoice => " [choose one]",
        GroupingMode::AllowSplit => " [split allowed]",
    }
}

fn write_catalog_tree(w: &mut dyn Write, catalog: &SpeciesCatalog) -> std::io::Result<()> {
    writeln!(w, "{} catalog:", catalog.species().display_name())?;
    let mut result = Ok(());
    walk(catalog.primals(), &mut |visit| {
        if result.is_err() {
            return;
        }
        let indent = "  ".repeat(visit.depth() + 1);
        result = writeln!(
            w,
            "{indent}{} ({}){}",
            visit.part.name,
            visit.part.id,
            grouping_label(visit.part.grouping)
        )
        .and_then(|()| {
            for cut_id in &visit.part.cuts {
                let Some(cut) = catalog.cut(cut_id) else {
                    continue;
                };
                let mut flags = Vec::new();
                if cut.independent {
                    flags.push("independent");
                }
                if cut.specialty {
                    flags.push("specialty");
                }
                if cut.has_fee {
                    flags.push("fee");
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                };
                writeln!(
                    w,
                    "{indent}  - {:24} {} ({}){flags}",
                    cut.id,
                    cut.name,
                    cut.style.label()
                )?;
            }
            Ok(())
        });
    });
    result
}

fn announce_banner() {
    println!("{}", "🥩 Cut Sheet Engine".bright_cyan().bold());
    println!("{}", "===================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios: Vec<String> = Vec::new();
    for token in split_csv(scenarios_arg) {
        let expanded: Vec<&str> = match token.as_str() {
            "all" => all_keys(),
            "smoke" => smoke_keys(),
            other => vec![other],
        };
        for key in expanded {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn write_sheet_report(args: &Args, report: &SheetReport) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, report)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, report)?,
        _ => logic::reports::generate_console_report(&mut output_target, report)?,
    }
    output_target.flush_inner()?;
    Ok(())
}

fn write_scenario_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Cut Sheet Scenario Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_scenario_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_scenario_console_report(
                    &mut output_target,
                    results,
                    duration,
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

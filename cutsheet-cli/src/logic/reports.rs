use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use cutsheet_core::{CutAvailability, NormalizeOutcome, SheetStatus};

use super::{ReportBody, ScenarioResult, SheetReport};

pub fn generate_json_report<T>(w: &mut dyn Write, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let json_output = serde_json::to_string_pretty(value)?;
    writeln!(w, "{json_output}")?;
    Ok(())
}

pub fn generate_console_report(w: &mut dyn Write, report: &SheetReport) -> Result<()> {
    writeln!(w)?;
    let title = report.template.as_deref().map_or_else(
        || format!("📋 {} cut sheet", report.species.display_name()),
        |name| format!("📋 {} cut sheet: {name}", report.species.display_name()),
    );
    writeln!(w, "{}", title.bright_cyan().bold())?;
    writeln!(w, "{}", "==============================".cyan())?;
    if report.seller_filtered {
        writeln!(w, "Catalog: seller view")?;
    }
    if report.selections.is_empty() {
        writeln!(w, "Selections: (none)")?;
    } else {
        writeln!(w, "Selections: {}", report.selections.join(", "))?;
    }
    writeln!(w)?;

    match &report.body {
        ReportBody::Validate { status } => console_status(w, status)?,
        ReportBody::Normalize { outcome, status } => {
            console_outcome(w, outcome)?;
            console_status(w, status)?;
        }
        ReportBody::Availability { cuts } => {
            for cut in cuts {
                console_availability(w, cut)?;
            }
        }
        ReportBody::Preview {
            cut_id,
            cut_name,
            availability,
            would_disable,
            required,
        } => {
            writeln!(w, "{} ({cut_id})", cut_name.bold())?;
            console_availability(w, availability)?;
            if would_disable.is_empty() {
                writeln!(w, "Selecting it disables nothing.")?;
            } else {
                writeln!(w, "Selecting it disables: {}", would_disable.join(", ").yellow())?;
            }
            if !required.is_empty() {
                writeln!(w, "Must be selected with: {}", required.join(", "))?;
            }
        }
    }
    Ok(())
}

fn console_status(w: &mut dyn Write, status: &SheetStatus) -> Result<()> {
    let validation = &status.validation;
    for error in &validation.errors {
        writeln!(w, "{} {}", "❌".red(), error.message.red())?;
    }
    for warning in &validation.warnings {
        writeln!(w, "{} {}", "⚠️ ".yellow(), warning.message.yellow())?;
    }
    for part in &status.incomplete_allocations {
        writeln!(
            w,
            "{} {}",
            "❌".red(),
            format!("Allocation for {part} does not total 100%.").red()
        )?;
    }
    if !validation.disabled_options.is_empty() {
        writeln!(w, "Unavailable cuts: {}", validation.disabled_options.len())?;
    }
    let verdict = if status.can_finalize {
        "✅ READY".green()
    } else {
        "❌ BLOCKED".red()
    };
    writeln!(
        w,
        "{} {} error(s), {} warning(s)",
        verdict,
        validation.errors.len(),
        validation.warnings.len()
    )?;
    Ok(())
}

fn console_outcome(w: &mut dyn Write, outcome: &NormalizeOutcome) -> Result<()> {
    if outcome.messages.is_empty() {
        writeln!(w, "No changes needed.")?;
    }
    for message in &outcome.messages {
        writeln!(w, "🔧 {message}")?;
    }
    let ids: Vec<&str> = outcome.selections.ids().collect();
    writeln!(w, "Normalized: {}", ids.join(", "))?;
    writeln!(w)?;
    Ok(())
}

fn console_availability(w: &mut dyn Write, cut: &CutAvailability) -> Result<()> {
    if cut.available {
        writeln!(w, "  {} {}", "✓".green(), cut.cut_id)?;
    } else {
        let reason = cut.reason.as_deref().unwrap_or("unavailable");
        writeln!(w, "  {} {} - {}", "✗".red(), cut.cut_id, reason.dimmed())?;
    }
    Ok(())
}

pub fn generate_markdown_report(w: &mut dyn Write, report: &SheetReport) -> Result<()> {
    writeln!(w, "# {} Cut Sheet\n", report.species.display_name())?;
    if let Some(name) = &report.template {
        writeln!(w, "- **Template**: {name}")?;
    }
    writeln!(
        w,
        "- **Catalog**: {}",
        if report.seller_filtered { "seller view" } else { "built-in" }
    )?;
    writeln!(w, "- **Selections**: {}\n", report.selections.len())?;

    match &report.body {
        ReportBody::Validate { status } => markdown_status(w, status)?,
        ReportBody::Normalize { outcome, status } => {
            writeln!(w, "## Changes\n")?;
            if outcome.messages.is_empty() {
                writeln!(w, "_No changes needed._\n")?;
            } else {
                for message in &outcome.messages {
                    writeln!(w, "- {message}")?;
                }
                writeln!(w)?;
            }
            markdown_status(w, status)?;
        }
        ReportBody::Availability { cuts } => {
            writeln!(w, "| Cut | Available | Reason |")?;
            writeln!(w, "|-----|-----------|--------|")?;
            for cut in cuts {
                writeln!(
                    w,
                    "| {} | {} | {} |",
                    cut.cut_id,
                    if cut.available { "yes" } else { "no" },
                    cut.reason.as_deref().unwrap_or("")
                )?;
            }
        }
        ReportBody::Preview {
            cut_id,
            cut_name,
            availability,
            would_disable,
            required,
        } => {
            writeln!(w, "## {cut_name} (`{cut_id}`)\n")?;
            writeln!(
                w,
                "- **Available**: {}",
                if availability.available { "yes" } else { "no" }
            )?;
            writeln!(w, "- **Disables**: {}", would_disable.join(", "))?;
            writeln!(w, "- **Requires**: {}", required.join(", "))?;
        }
    }
    Ok(())
}

fn markdown_status(w: &mut dyn Write, status: &SheetStatus) -> Result<()> {
    let validation = &status.validation;
    writeln!(w, "## Status\n")?;
    writeln!(
        w,
        "- **Ready to finalize**: {}",
        if status.can_finalize { "✅" } else { "❌" }
    )?;
    writeln!(w, "- **Errors**: {}", validation.errors.len())?;
    writeln!(w, "- **Warnings**: {}\n", validation.warnings.len())?;
    for error in &validation.errors {
        writeln!(w, "- ❌ {}", error.message)?;
    }
    for warning in &validation.warnings {
        writeln!(w, "- ⚠️ {}", warning.message)?;
    }
    for part in &status.incomplete_allocations {
        writeln!(w, "- ❌ Allocation for {part} does not total 100%.")?;
    }
    Ok(())
}

pub fn generate_scenario_console_report(
    w: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(w)?;
    writeln!(w, "{}", "📊 Scenario Results Summary".bright_cyan().bold())?;
    writeln!(w, "{}", "==========================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(w, "Total scenarios: {total}")?;
    writeln!(w, "Passed: {}", passed.to_string().green())?;
    writeln!(w, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(w, "Total time: {total_duration:?}")?;
    writeln!(w)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(w, "{} {}", status, result.scenario_name.bold())?;
        writeln!(w, "   {}", result.description)?;
        if let Some(failure) = &result.failure {
            writeln!(w, "   • {}", failure.red())?;
        }
    }
    Ok(())
}

pub fn generate_scenario_markdown_report(w: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(w, "# Cut Sheet Scenario Results\n")?;
    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(w, "## Summary\n")?;
    writeln!(w, "- **Total scenarios**: {total}")?;
    writeln!(w, "- **Passed**: {passed}")?;
    writeln!(w, "- **Failed**: {}\n", total - passed)?;
    writeln!(w, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(w, "### {} {}\n", status, result.scenario_name)?;
        writeln!(w, "- {}", result.description)?;
        writeln!(w, "- **Time**: {:?}", result.duration)?;
        if let Some(failure) = &result.failure {
            writeln!(w, "- **Failure**: {failure}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

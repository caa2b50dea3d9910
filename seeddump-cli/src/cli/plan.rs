//! Plan command handler

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use colored::*;

use super::{Cli, OutputFormat, PlanArgs, open_catalog};
use crate::catalog;
use crate::emit::{EmissionPlan, PlanEmitter};
use crate::plan::{DependencyGraph, ScheduleReport, Scheduler};

/// Handle the plan command
pub async fn handle_plan_command(cli: &Cli, args: &PlanArgs) -> Result<()> {
    let config = cli.run_config(args.settings())?;
    let catalog = open_catalog(&config).await?;
    let start = Instant::now();

    let types = catalog::select_candidates(&catalog, config.selector.as_deref()).await?;
    let graph = DependencyGraph::from_catalog(&catalog, &types)
        .await
        .context("Failed to build dependency graph")?;

    // Stopping is only safe between emissions, so Ctrl-C just raises a flag
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::SeqCst);
        }
    });

    let mut emitter = PlanEmitter::new();
    let mut scheduler =
        Scheduler::new(types, &graph, config.options.clone()).with_scan_order(config.scan_order);
    let report = scheduler
        .run_while(&mut emitter, || !interrupted.load(Ordering::SeqCst))
        .await
        .unwrap_or_else(|never| match never {});

    log::info!(
        "Planned {} entity types in {:.2}ms",
        report.emissions.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let plan = emitter.into_plan();
    let formatted = match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?
        }
        OutputFormat::Text => format_plan_text(&plan, &report, &config.options.destination.display().to_string()),
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &formatted)
                .with_context(|| format!("Failed to write plan to: {}", path.display()))?;
            log::info!("Plan written to: {}", path.display());
        }
        None => println!("{}", formatted),
    }

    if !report.completed {
        anyhow::bail!(
            "Interrupted with {} entity types not planned",
            scheduler.state().to_dump().len()
        );
    }
    Ok(())
}

/// Render a plan as a numbered list
pub fn format_plan_text(plan: &EmissionPlan, report: &ScheduleReport, destination: &str) -> String {
    let mut out = format!(
        "{} {} entity types into {}\n",
        "Dump order:".bold(),
        plan.len(),
        destination.cyan()
    );

    if plan.is_empty() {
        out.push_str(&format!("  {}\n", "nothing to dump".dimmed()));
        return out;
    }

    let width = plan.emissions.iter().map(|e| e.entity.len()).max().unwrap_or(0);
    for (emission, scheduled) in plan.emissions.iter().zip(&report.emissions) {
        let mode = if emission.options.append {
            "append".normal()
        } else {
            "create".green()
        };
        let note = if scheduled.forced {
            format!("  {}", "(dependency cycle)".yellow())
        } else {
            String::new()
        };
        out.push_str(&format!(
            "  {:>3}. {:<width$}  {}{}\n",
            emission.position + 1,
            emission.entity,
            mode,
            note,
            width = width
        ));
    }

    let forced = report.forced_count();
    if forced > 0 {
        out.push_str(&format!(
            "{} {} entity types were dumped before all of their dependencies\n",
            "warning:".yellow().bold(),
            forced
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntityType;
    use crate::emit::{EmitOptions, PlannedEmission};
    use crate::plan::ScheduledEmission;

    fn fixture(forced_second: bool) -> (EmissionPlan, ScheduleReport) {
        let names = ["users", "posts"];
        let plan = EmissionPlan {
            emissions: names
                .iter()
                .enumerate()
                .map(|(position, name)| PlannedEmission {
                    position,
                    entity: name.to_string(),
                    options: EmitOptions {
                        append: position > 0,
                        ..EmitOptions::default()
                    },
                })
                .collect(),
        };
        let report = ScheduleReport {
            emissions: names
                .iter()
                .enumerate()
                .map(|(position, name)| ScheduledEmission {
                    entity: EntityType::new(*name, true),
                    append: position > 0,
                    forced: forced_second && position == 1,
                })
                .collect(),
            completed: true,
        };
        (plan, report)
    }

    #[test]
    fn test_text_lists_every_emission() {
        colored::control::set_override(false);
        let (plan, report) = fixture(false);
        let text = format_plan_text(&plan, &report, "db/seeds.sql");

        assert!(text.starts_with("Dump order: 2 entity types into db/seeds.sql"));
        assert!(text.contains("1. users  create"));
        assert!(text.contains("2. posts  append"));
        assert!(!text.contains("warning"));
    }

    #[test]
    fn test_text_flags_cycle_breaks() {
        colored::control::set_override(false);
        let (plan, report) = fixture(true);
        let text = format_plan_text(&plan, &report, "db/seeds.sql");

        assert!(text.contains("(dependency cycle)"));
        assert!(text.contains("warning: 1 entity types"));
    }

    #[test]
    fn test_text_for_empty_plan() {
        colored::control::set_override(false);
        let text = format_plan_text(&EmissionPlan::default(), &ScheduleReport::default(), "out.sql");
        assert!(text.contains("nothing to dump"));
    }
}

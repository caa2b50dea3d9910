//! Graph command handler

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;

use super::{Cli, GraphArgs, OutputFormat, open_catalog};
use crate::catalog::{self, Reference};
use crate::plan::{DependencyCategory, DependencyGraph};

/// Serializable view of one graph node
#[derive(Debug, Serialize)]
struct NodeView<'a> {
    entity: &'a str,
    category: DependencyCategory,
    dependencies: &'a [String],
    dependents: &'a [String],
    references: &'a [Reference],
}

/// Handle the graph command
pub async fn handle_graph_command(cli: &Cli, args: &GraphArgs) -> Result<()> {
    let flags = crate::config::Settings {
        models: args.selection.models.clone(),
        ..Default::default()
    };
    let config = cli.run_config(flags)?;
    let catalog = open_catalog(&config).await?;

    let types = catalog::select_candidates(&catalog, config.selector.as_deref()).await?;
    let graph = DependencyGraph::from_catalog(&catalog, &types)
        .await
        .context("Failed to build dependency graph")?;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&node_views(&graph))
            .context("Failed to serialize graph")?,
        OutputFormat::Text => format_graph_text(&graph),
    };
    println!("{}", output);
    Ok(())
}

fn node_views(graph: &DependencyGraph) -> Vec<NodeView<'_>> {
    graph
        .entities()
        .iter()
        .map(|entity| NodeView {
            entity: &entity.name,
            category: graph.categorize(&entity.name),
            dependencies: graph.dependencies(&entity.name),
            dependents: graph.dependents(&entity.name),
            references: graph.references(&entity.name),
        })
        .collect()
}

/// Render each entity with its category and references
pub fn format_graph_text(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    for entity in graph.entities() {
        let category = graph.categorize(&entity.name);
        out.push_str(&format!(
            "{} {} {}\n",
            category.symbol(),
            entity.name.bold(),
            format!("[{}]", category.label()).dimmed()
        ));

        for reference in graph.references(&entity.name) {
            let suffix = if reference.target == entity.name {
                " (self)".dimmed().to_string()
            } else if !graph.contains(&reference.target) {
                " (not selected)".dimmed().to_string()
            } else {
                String::new()
            };
            out.push_str(&format!(
                "    {} -> {}{}\n",
                reference.field,
                reference.target.cyan(),
                suffix
            ));
        }
    }
    out
}

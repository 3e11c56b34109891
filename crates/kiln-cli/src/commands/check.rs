//! `kiln check`: resolve the descriptor and print where every source file
//! goes, without cleaning or writing anything.

use std::io::Write;

use kiln_config::ConfigOverrides;
use kiln_pipeline::{Action, Descriptor, SourceListing, TransformRegistry};
use serde::Serialize;

use crate::cli::CheckArgs;
use crate::commands::utils;
use crate::error::{Result, ResultExt};
use crate::ui;

/// One row of the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRow {
    pub source: String,
    pub rule: String,
    pub chain: Vec<String>,
    /// Where the result lands; `None` when the file only feeds an entry
    pub output: Option<String>,
}

pub async fn execute(args: CheckArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        mode: args.mode.clone(),
        ..Default::default()
    };
    let project = utils::load_project(&args.project, &overrides)?;

    let listing = SourceListing::for_config(&project.root, &project.config)?;
    let descriptor = Descriptor::resolve(&project.config, project.mode, &listing)?;
    TransformRegistry::from_config(&project.config).check(&descriptor)?;

    let rows = routing_table(&descriptor);
    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &rows)?;
        writeln!(stdout).context("Writing routing table")?;
    } else {
        for line in render_table(&rows) {
            writeln!(stdout, "{line}").context("Writing routing table")?;
        }
    }

    for path in &descriptor.unhandled {
        ui::warning(&format!("{} matches no rule", path.display()));
    }
    ui::success(&format!(
        "{} file(s) routed for {} mode",
        rows.len(),
        descriptor.mode
    ));
    Ok(())
}

/// Routing table rows, sorted by source path.
pub fn routing_table(descriptor: &Descriptor) -> Vec<RouteRow> {
    descriptor
        .routes
        .iter()
        .map(|route| {
            let output = match &route.action {
                Action::Entry { output, .. }
                | Action::Template { output }
                | Action::Emit { output }
                | Action::Copy { output } => Some(output.clone()),
                Action::Stylesheet => descriptor.stylesheet.clone(),
                Action::Claimed => None,
            };
            RouteRow {
                source: kiln_pipeline::listing::slash_path(&route.source),
                rule: route.rule.clone().unwrap_or_else(|| "-".to_string()),
                chain: route.chain.clone(),
                output,
            }
        })
        .collect()
}

/// Fixed-width text lines for the routing table.
pub fn render_table(rows: &[RouteRow]) -> Vec<String> {
    let source_width = rows.iter().map(|r| r.source.len()).max().unwrap_or(0);
    let rule_width = rows.iter().map(|r| r.rule.len()).max().unwrap_or(0);

    rows.iter()
        .map(|row| {
            let chain = if row.chain.is_empty() {
                "copy".to_string()
            } else {
                row.chain.join(" > ")
            };
            let output = row.output.as_deref().unwrap_or("(bundled)");
            format!(
                "{:<source_width$}  {:<rule_width$}  {} -> {}",
                row.source, row.rule, chain, output
            )
        })
        .collect()
}

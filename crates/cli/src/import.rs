//! `rdesk import` — mapping guess, preview and apply for one spreadsheet.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde::Serialize;

use resortdesk_recon::classify::status_counts;
use resortdesk_recon::mapper::resolve;
use resortdesk_recon::normalize::format_cents;
use resortdesk_recon::wire::{ErrorBody, PreviewResponse};
use resortdesk_recon::{
    guess_mapping, ApplyOutcome, ColumnMapping, DecisionEntry, Decisions, Field, Grid, ImportError, KeywordConfig,
    MatchResult, Outcome,
};

use crate::exit_codes::EXIT_ROW_ERRORS;
use crate::{CliError, Context};

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Show which header feeds which field
    #[command(after_help = "\
Examples:
  rdesk import mapping prices.xlsx
  rdesk import mapping prices.csv --json
  rdesk import mapping prices.csv --sale-col 'Tarife'")]
    Mapping {
        /// Spreadsheet (.csv, .tsv, .txt, .xlsx, .xlsm, .xls, .xlsb, .ods)
        file: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Classify every row against the catalog without writing anything
    #[command(after_help = "\
Examples:
  rdesk import preview prices.xlsx
  rdesk import preview prices.csv --json
  rdesk import preview prices.csv --output preview.json

Statuses:
  MATCH       same product, prices differ (updated on apply)
  NO_CHANGE   same product, same prices
  UNMATCHED   similar product exists, or row is invalid (skipped unless decided)
  NEW         nothing similar (created on apply unless decided)")]
    Preview {
        file: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Write the import into the catalog
    #[command(after_help = "\
Examples:
  rdesk import apply prices.xlsx
  rdesk import apply prices.csv --decisions decisions.json --json
  rdesk import apply prices.csv --strict

Decisions file: a JSON array of per-row overrides, e.g.
  [{\"row\": 3, \"action\": \"link\", \"linkProductId\": 2},
   {\"row\": 7, \"action\": \"skip\"}]

Rows are reclassified against the live catalog. Rows without a decision
use the default: NEW rows are created, UNMATCHED rows are skipped.")]
    Apply {
        file: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,

        /// JSON file with per-row decisions
        #[arg(long, value_name = "FILE")]
        decisions: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,

        /// Exit 7 when any row ends in error
        #[arg(long)]
        strict: bool,
    },
}

/// Per-field header overrides. Set fields win over the guessed mapping.
#[derive(Args, Debug, Default, Clone)]
pub struct ColumnArgs {
    /// Header holding the product name
    #[arg(long, value_name = "HEADER")]
    pub name_col: Option<String>,

    /// Header holding the purchase price
    #[arg(long, value_name = "HEADER")]
    pub purchase_col: Option<String>,

    /// Header holding the sale price
    #[arg(long, value_name = "HEADER")]
    pub sale_col: Option<String>,

    /// Header holding the product group
    #[arg(long, value_name = "HEADER")]
    pub group_col: Option<String>,
}

impl ColumnArgs {
    fn overrides(&self) -> ColumnMapping {
        ColumnMapping {
            name_col: self.name_col.clone(),
            purchase_col: self.purchase_col.clone(),
            sale_col: self.sale_col.clone(),
            group_col: self.group_col.clone(),
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct OutputArgs {
    /// Output JSON to stdout instead of a table
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON result to a file
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

pub fn cmd_import(cmd: ImportCommands, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        ImportCommands::Mapping { file, columns, json } => cmd_mapping(&file, &columns, json, ctx),
        ImportCommands::Preview { file, columns, output } => cmd_preview(&file, &columns, &output, ctx),
        ImportCommands::Apply { file, columns, decisions, output, strict } => {
            cmd_apply(&file, &columns, decisions.as_deref(), &output, strict, ctx)
        }
    }
}

// ============================================================================
// mapping
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingReport<'a> {
    file: String,
    headers: &'a [String],
    rows: usize,
    mapping: &'a ColumnMapping,
    unmapped: Vec<Field>,
    complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn cmd_mapping(file: &Path, columns: &ColumnArgs, json: bool, ctx: &Context) -> Result<(), CliError> {
    let grid = load_grid(file, json)?;
    let mapping = effective_mapping(&grid, columns, &ctx.settings.import.keywords);
    let error = resolve(&mapping, &grid.headers).err().map(|e| e.to_string());

    let report = MappingReport {
        file: file.display().to_string(),
        headers: &grid.headers,
        rows: grid.rows.len(),
        mapping: &mapping,
        unmapped: Field::ALL.into_iter().filter(|f| mapping.get(*f).is_none()).collect(),
        complete: error.is_none(),
        error,
    };

    if json {
        println!("{}", to_json(&report)?);
    } else {
        for field in Field::ALL {
            println!("{:<10} {}", field.to_string(), mapping.get(field).unwrap_or("(not mapped)"));
        }
    }

    eprintln!("{}: {} columns, {} data rows", report.file, grid.headers.len(), report.rows);
    if let Some(err) = &report.error {
        eprintln!("mapping incomplete: {err}");
    }
    Ok(())
}

// ============================================================================
// preview
// ============================================================================

fn cmd_preview(file: &Path, columns: &ColumnArgs, output: &OutputArgs, ctx: &Context) -> Result<(), CliError> {
    let grid = load_grid(file, output.json)?;
    let mapping = effective_mapping(&grid, columns, &ctx.settings.import.keywords);
    let catalog = ctx.open_catalog()?;

    let items = resortdesk_recon::engine::preview(&catalog, &grid, &mapping, &ctx.settings.import)
        .map_err(|e| request_failure(e, output.json))?;

    let response = PreviewResponse { items };
    write_json(&response, output)?;
    if !output.json {
        print_preview(&response.items);
    }

    let counts = status_counts(&response.items)
        .into_iter()
        .map(|(status, n)| format!("{n} {status}"))
        .collect::<Vec<_>>()
        .join(", ");
    eprintln!("preview: {} rows ({counts})", response.items.len());
    Ok(())
}

fn print_preview(items: &[MatchResult]) {
    println!("{:<5} {:<10} {:<28} {:>10} {:>10}  CATALOG", "ROW", "STATUS", "NAME", "PURCHASE", "SALE");
    for item in items {
        let catalog = if let Some(err) = &item.validation_error {
            format!("invalid: {err}")
        } else if let Some(p) = &item.matched_product {
            format!("#{} {} ({:.1})", p.id, p.name, item.similarity.unwrap_or(100.0))
        } else if let Some(p) = &item.suggested_product {
            format!("? #{} {} ({:.1})", p.id, p.name, item.suggested_similarity.unwrap_or(0.0))
        } else {
            String::new()
        };
        println!(
            "{:<5} {:<10} {:<28} {:>10} {:>10}  {}",
            item.row,
            item.status.to_string(),
            clip(&item.name, 28),
            item.purchase_cents.map(format_cents).unwrap_or_default(),
            item.sale_cents.map(format_cents).unwrap_or_default(),
            catalog,
        );
    }
}

// ============================================================================
// apply
// ============================================================================

fn cmd_apply(
    file: &Path,
    columns: &ColumnArgs,
    decisions_file: Option<&Path>,
    output: &OutputArgs,
    strict: bool,
    ctx: &Context,
) -> Result<(), CliError> {
    let grid = load_grid(file, output.json)?;
    let mapping = effective_mapping(&grid, columns, &ctx.settings.import.keywords);
    let decisions = match decisions_file {
        Some(path) => load_decisions(path)?,
        None => Decisions::new(),
    };
    let mut catalog = ctx.open_catalog()?;

    let outcome = resortdesk_recon::engine::apply(&mut catalog, &grid, &mapping, &decisions, &ctx.settings.import)
        .map_err(|e| request_failure(e, output.json))?;

    write_json(&outcome, output)?;
    if !output.json {
        print_outcome(&outcome);
    }

    let s = &outcome.summary;
    eprintln!(
        "import: {} rows, {} matched, {} updated, {} unchanged, {} created, {} errors",
        s.total, s.matched, s.updated, s.unchanged, s.created, s.errors,
    );

    if strict && s.errors > 0 {
        return Err(CliError::new(EXIT_ROW_ERRORS, format!("{} row(s) failed", s.errors))
            .with_hint("successful rows were committed; fix the failed rows and apply again"));
    }
    Ok(())
}

fn print_outcome(outcome: &ApplyOutcome) {
    println!("{:<5} {:<10} {:<10} {:>8}  ERROR", "ROW", "STATUS", "OUTCOME", "PRODUCT");
    for row in &outcome.rows {
        if row.outcome == Outcome::Skipped && row.error.is_none() {
            continue;
        }
        println!(
            "{:<5} {:<10} {:<10} {:>8}  {}",
            row.row,
            row.status.to_string(),
            row.outcome.to_string(),
            row.product_id.map(|id| format!("#{id}")).unwrap_or_default(),
            row.error.as_deref().unwrap_or(""),
        );
    }
}

fn load_decisions(path: &Path) -> Result<Decisions, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::usage(format!("cannot read {}: {e}", path.display())))?;
    let entries: Vec<DecisionEntry> = serde_json::from_str(&text).map_err(|e| {
        CliError::usage(format!("invalid decisions file {}: {e}", path.display()))
            .with_hint("expected a JSON array like [{\"row\": 3, \"action\": \"skip\"}]")
    })?;
    tracing::debug!(count = entries.len(), "decisions loaded");
    Ok(Decisions::from_entries(&entries))
}

// ============================================================================
// shared
// ============================================================================

fn load_grid(file: &Path, json: bool) -> Result<Grid, CliError> {
    resortdesk_io::read_grid(file).map_err(|e| request_failure(ImportError::from(e), json))
}

/// Whole-request failure. Under `--json` stdout still carries one value: the
/// error body.
fn request_failure(err: ImportError, json: bool) -> CliError {
    if json {
        match to_json(&ErrorBody::from(&err)) {
            Ok(body) => println!("{body}"),
            Err(e) => tracing::warn!(error = %e.message, "cannot render error body"),
        }
    }
    CliError::from(err)
}

/// Guessed mapping with the operator's overrides on top.
///
/// Overrides naming a header that is not in the file are kept so the
/// preview/apply step reports them instead of silently guessing.
fn effective_mapping(grid: &Grid, columns: &ColumnArgs, keywords: &KeywordConfig) -> ColumnMapping {
    let overrides = columns.overrides();
    guess_mapping(&grid.headers, Some(&overrides), keywords)
        .mapping
        .overlay(&overrides)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::io(format!("JSON serialization error: {e}")))
}

fn write_json<T: Serialize>(value: &T, output: &OutputArgs) -> Result<(), CliError> {
    let json = to_json(value)?;
    if let Some(path) = &output.output {
        fs::write(path, &json).map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    if output.json {
        println!("{json}");
    }
    Ok(())
}

pub fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

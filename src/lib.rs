pub mod ast;
pub mod blocks;
pub mod codegen;
pub mod context;
pub mod document;
pub mod lexer;
pub mod lookup;
pub mod parser;
pub mod sanitize;
pub mod semantic;
pub mod serialization;

#[cfg(not(target_arch = "wasm32"))]
pub mod autosave;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

use anyhow::{Context, Result};
use ast::Workspace;
use codegen::{generate_workspace_with_options, CodegenOptions};
use std::path::{Path, PathBuf};

#[cfg(all(target_arch = "wasm32", feature = "wasm-bindings"))]
pub mod wasm;

#[cfg(not(target_arch = "wasm32"))]
pub fn run_cli(args: &cli::Args) -> Result<()> {
    let lookup = match &args.library {
        Some(dir) => {
            let library = lookup::Library::new(dir);
            lookup::LookupData::collect(&library, &library)
        }
        None => lookup::LookupData::default(),
    };

    if args.definitions {
        let definitions = blocks::definitions_json(&lookup);
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    let input = args
        .input
        .as_deref()
        .context("An INPUT file is required unless --definitions is given.")?;

    let total_stages = 4 + usize::from(args.output.is_some());
    let progress = CliProgress::new("Generate", total_stages);
    let mut stage = 0usize;

    stage += 1;
    progress.emit(stage, "Resolving input path");
    let input = canonicalize_file(input)?;

    stage += 1;
    progress.emit(stage, "Reading block data");
    let workspace = load_workspace(&input)?;

    stage += 1;
    progress.emit(stage, "Checking blocks");
    let mut report = semantic::analyze(&workspace);
    if args.library.is_some() {
        report
            .warnings
            .extend(semantic::check_roster(&workspace, &lookup).warnings);
    }
    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }
    if args.check && !report.is_clean() {
        anyhow::bail!(
            "{} block warning(s) in '{}'.",
            report.warnings.len(),
            pretty_path(&input)
        );
    }

    stage += 1;
    progress.emit(stage, "Generating source");
    let options = CodegenOptions::default();
    let source = generate_workspace_with_options(&workspace, &options);

    match &args.output {
        Some(output) => {
            stage += 1;
            progress.emit(stage, "Writing output");
            let content = if args.source_only {
                source
            } else {
                document::render_document(&source, &workspace)
            };
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(output, content)
                .with_context(|| format!("Failed to write '{}'.", output.display()))?;
        }
        None => print!("{}", source),
    }

    Ok(())
}

/// Reads block data from a workspace JSON file or a saved script document.
pub fn load_workspace(path: &Path) -> Result<Workspace> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'.", path.display()))?;
        return serialization::parse_workspace(&raw)
            .with_context(|| format!("Invalid workspace JSON in '{}'.", pretty_path(path)));
    }
    document::read_document(path)?.workspace.with_context(|| {
        format!(
            "'{}' has no block data (no visual representation available).",
            pretty_path(path)
        )
    })
}

/// Workspace JSON in, generated source out.
pub fn generate_source(workspace_json: &str) -> Result<String> {
    let workspace = serialization::parse_workspace(workspace_json)?;
    Ok(generate_workspace_with_options(&workspace, &CodegenOptions::default()))
}

pub fn canonicalize_file(path: &Path) -> Result<PathBuf> {
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!("Input file not found: '{}'.", path.display()));
    }
    Ok(path.canonicalize()?)
}

fn pretty_path(path: &Path) -> String {
    let raw = path.display().to_string();
    if let Some(stripped) = raw.strip_prefix(r"\\?\") {
        stripped.to_string()
    } else {
        raw
    }
}

#[cfg(not(target_arch = "wasm32"))]
struct CliProgress {
    prefix: &'static str,
    total: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliProgress {
    fn new(prefix: &'static str, total: usize) -> Self {
        Self {
            prefix,
            total: total.max(1),
        }
    }

    fn emit(&self, step: usize, label: &str) {
        let step = step.clamp(1, self.total);
        let bar = render_progress_bar(step, self.total, 14);
        eprintln!(
            "[{}] {}... ({}/{}) {}",
            self.prefix, label, step, self.total, bar
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render_progress_bar(step: usize, total: usize, width: usize) -> String {
    let width = width.max(1);
    let filled = ((step * width) + (total / 2)) / total;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < filled { '=' } else { '-' });
    }
    s.push(']');
    s
}

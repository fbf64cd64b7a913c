// src/cli.rs
//! Minimal CLI: check / normalize JSON documents against a schema.
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::Invalid;
use crate::json;
use crate::load;
use crate::node::SchemaNode;
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON documents against a schema description, reporting every
/// problem per document, or emit the normalized wire form
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// deserialize each input and report ok or the flattened failure report
    Check(CheckArgs),
    /// deserialize then re-serialize each input, emitting the normalized form
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// schema description file (JSON)
    #[arg(long, short)]
    schema: PathBuf,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Check(args) => check(&args.input_settings),
            Command::Normalize(args) => normalize(&args.input_settings, args.out.as_deref()),
        }
    }
}

fn check(settings: &InputSettings) -> anyhow::Result<()> {
    let schema = load_schema(&settings.schema)?;
    let paths = resolve_file_path_patterns(&settings.input)?;

    // One schema tree, many readers: nodes are immutable after load.
    let failed: usize = paths
        .par_iter()
        .map(|path| match read_document(path) {
            Ok(doc) => match schema.deserialize(&doc) {
                Ok(_) => {
                    println!("{} {}", "ok".green(), path.display());
                    0
                }
                Err(invalid) => {
                    println!("{}", render_report(path, &invalid));
                    1
                }
            },
            Err(err) => {
                eprintln!("{} {}: {err:#}", "error".red(), path.display());
                1
            }
        })
        .sum();

    if failed > 0 {
        anyhow::bail!("{failed} of {} input(s) failed", paths.len());
    }
    Ok(())
}

fn normalize(settings: &InputSettings, out_dir: Option<&Path>) -> anyhow::Result<()> {
    let schema = load_schema(&settings.schema)?;
    let paths = resolve_file_path_patterns(&settings.input)?;

    for path in &paths {
        let doc = read_document(path)?;
        let appstruct = schema
            .deserialize(&doc)
            .map_err(|invalid| anyhow::anyhow!("{}", render_report(path, &invalid)))?;
        let cstruct = schema
            .serialize(&appstruct)
            .map_err(|invalid| anyhow::anyhow!("{}", render_report(path, &invalid)))?;
        let rendered = serde_json::to_string_pretty(&json::to_json(&cstruct))?;

        match out_dir {
            Some(dir) => {
                let file_name = path
                    .file_name()
                    .with_context(|| format!("input {} has no file name", path.display()))?;
                std::fs::create_dir_all(dir)?;
                std::fs::write(dir.join(file_name), &rendered)?;
            }
            None => println!("{rendered}"),
        }
    }
    Ok(())
}

fn load_schema(path: &Path) -> anyhow::Result<SchemaNode> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;
    Ok(load::from_str(&src)?)
}

fn read_document(path: &Path) -> anyhow::Result<Value> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    let doc = serde_json::from_str::<serde_json::Value>(&src)
        .with_context(|| format!("failed to parse JSON input {}", path.display()))?;
    Ok(json::from_json(&doc))
}

// Buffer the whole per-file report so parallel output never interleaves.
fn render_report(path: &Path, invalid: &Invalid) -> String {
    let mut out = format!("{} {}", "failed".red(), path.display());
    for (key, msg) in invalid.flatten() {
        if key.is_empty() {
            out.push_str(&format!("\n  {msg}"));
        } else {
            out.push_str(&format!("\n  {}: {msg}", key.yellow()));
        }
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // An explicit glob that matches nothing is an error, not a no-op.
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

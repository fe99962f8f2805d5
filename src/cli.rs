//! Minimal CLI: JSON/NDJSON → (structure JSON | outline)
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, Args};
use rayon::prelude::*;
use serde_json::Value;

use crate::builder::StructureBuilder;
use crate::loose::Loose;
use crate::structure::Structure;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build typed Map/FixedList structure trees from loose JSON documents
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// build and print each document's structure as JSON
    Build(BuildOut),
    /// build and print a tree outline showing each node's kind
    Outline(OutlineOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct BuildSettings {
    /// JSON config file, e.g. {"max_depth": 64}
    #[arg(long)]
    config: Option<PathBuf>,

    /// reject documents nested deeper than this (overrides the config file)
    #[arg(long)]
    max_depth: Option<usize>,

    /// pass scalar documents through unchanged instead of rejecting them
    #[arg(long, default_value_t = false)]
    leaves: bool,
}

#[derive(clap::Parser, Debug)]
struct BuildOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    build_settings: BuildSettings,

    /// pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct OutlineOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    build_settings: BuildSettings,
}

/// One loaded input document and where it came from.
#[derive(Debug, Clone, PartialEq)]
struct Document {
    origin: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            for (origin, value) in self.parse_source(&source, &source_path_str)? {
                for value in self.preprocess(value, &origin)? {
                    out.push(Document { origin: origin.clone(), value });
                }
            }
        }
        tracing::debug!(documents = out.len(), "inputs loaded");
        Ok(out)
    }

    /// Parsed documents paired with their origin (`path` or `path:line`).
    fn parse_source(&self, source: &str, source_path_str: &str) -> Result<Vec<(String, Value)>> {
        if !self.ndjson {
            let value = serde_json::from_str::<Value>(source)
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            return Ok(vec![(source_path_str.to_string(), value)]);
        }
        source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(lno, line)| {
                let origin = format!("{source_path_str}:{}", lno + 1);
                let value = serde_json::from_str::<Value>(line)
                    .with_context(|| format!("failed to parse NDJSON line ({origin})"))?;
                Ok((origin, value))
            })
            .collect()
    }

    fn preprocess(&self, value: Value, origin: &str) -> Result<Vec<Value>> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} not found in {origin}"))?,
        };
        match self.jq_expr.as_deref() {
            None => Ok(vec![value]),
            Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &value).with_context(|| {
                format!("failed to apply jq expression to source file ({origin})")
            }),
        }
    }
}

impl BuildSettings {
    fn build_all(&self, documents: Vec<Document>) -> Result<Vec<Structure>> {
        let options = crate::config::resolve_options(self.config.as_deref(), self.max_depth)?;
        let builder = StructureBuilder::new(options);
        documents
            .into_par_iter()
            .map(|doc| {
                let data = Loose::from(doc.value);
                let built = if self.leaves { builder.convert(data) } else { builder.build(data) };
                built.with_context(|| format!("failed to build structure for {}", doc.origin))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn verbose(&self) -> bool {
        self.verbose
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Build(target) => {
                let documents = target.input_settings.load_documents()?;
                let structures = target.build_settings.build_all(documents)?;
                let rendered = render_json(&structures, target.pretty)?;
                write_output(target.out.as_deref(), &rendered)
            }
            Command::Outline(target) => {
                let documents = target.input_settings.load_documents()?;
                let origins: Vec<String> = documents.iter().map(|d| d.origin.clone()).collect();
                let structures = target.build_settings.build_all(documents)?;
                for (origin, structure) in origins.iter().zip(&structures) {
                    if structures.len() > 1 {
                        println!("# {origin}");
                    }
                    print!("{}", crate::outline::render(structure));
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// A single document renders as itself; several render as a JSON array.
fn render_json(structures: &[Structure], pretty: bool) -> Result<String> {
    let rendered = match (structures, pretty) {
        ([one], true) => serde_json::to_string_pretty(one),
        ([one], false) => serde_json::to_string(one),
        (all, true) => serde_json::to_string_pretty(all),
        (all, false) => serde_json::to_string(all),
    };
    rendered.context("failed to serialize structure")
}

fn write_output(out: Option<&Path>, rendered: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("loose-shape-{name}-{}", std::process::id()));
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
        fn write(&self, file: &str, contents: &str) -> String {
            let path = self.0.join(file);
            std::fs::write(&path, contents).unwrap();
            path.to_string_lossy().to_string()
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn settings(input: Vec<String>) -> InputSettings {
        InputSettings { ndjson: false, json_pointer: None, jq_expr: None, input }
    }

    fn build_settings() -> BuildSettings {
        BuildSettings { config: None, max_depth: None, leaves: false }
    }

    #[test]
    fn parses_build_command_line() {
        let cli = CommandLineInterface::try_parse_from([
            "loose-shape", "build", "-i", "a.json", "b.json", "--max-depth", "4", "--pretty", "-v",
        ])
        .unwrap();
        assert!(cli.verbose());
        let Command::Build(target) = cli.cmd else { panic!("expected build") };
        assert_eq!(target.input_settings.input, vec!["a.json", "b.json"]);
        assert_eq!(target.build_settings.max_depth, Some(4));
        assert!(target.pretty);
    }

    #[test]
    fn ndjson_lines_become_documents() {
        let tmp = TempDir::new("ndjson");
        let path = tmp.write("rows.ndjson", "{\"a\": 1}\n\n[1, 2]\n");
        let mut s = settings(vec![path.clone()]);
        s.ndjson = true;
        let docs = s.load_documents().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].origin, format!("{path}:3"));
        assert_eq!(docs[1].value, json!([1, 2]));
    }

    #[test]
    fn json_pointer_selects_subtree() {
        let tmp = TempDir::new("pointer");
        let path = tmp.write("doc.json", r#"{"data": {"items": [1, 2]}}"#);
        let mut s = settings(vec![path]);
        s.json_pointer = Some("/data/items".into());
        assert_eq!(s.load_documents().unwrap()[0].value, json!([1, 2]));
        s.json_pointer = Some("/missing".into());
        assert!(s.load_documents().is_err());
    }

    #[test]
    fn glob_inputs_expand_and_empty_matches_fail() {
        let tmp = TempDir::new("glob");
        tmp.write("one.json", "[1]");
        tmp.write("two.json", "{\"k\": 2}");
        let pattern = tmp.0.join("*.json").to_string_lossy().to_string();
        assert_eq!(resolve_file_path_patterns([&pattern]).unwrap().len(), 2);
        let none = tmp.0.join("*.yaml").to_string_lossy().to_string();
        assert!(resolve_file_path_patterns([&none]).is_err());
    }

    #[test]
    fn builds_documents_and_renders_json() {
        let docs = vec![
            Document { origin: "a".into(), value: json!({"0": "x", "1": "y"}) },
            Document { origin: "b".into(), value: json!({"0": "x", "k": "y"}) },
        ];
        let structures = build_settings().build_all(docs).unwrap();
        assert_eq!(render_json(&structures, false).unwrap(), r#"[["x","y"],{"0":"x","k":"y"}]"#);
        assert_eq!(render_json(&structures[..1], false).unwrap(), r#"["x","y"]"#);
    }

    #[test]
    fn scalar_documents_need_leaves_flag() {
        let doc = || vec![Document { origin: "s".into(), value: json!(7) }];
        let err = build_settings().build_all(doc()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to build structure for s"));

        let mut leaves = build_settings();
        leaves.leaves = true;
        assert_eq!(render_json(&leaves.build_all(doc()).unwrap(), false).unwrap(), "7");
    }

    #[test]
    fn build_writes_output_file() {
        let tmp = TempDir::new("out");
        let input = tmp.write("in.json", r#"[{"a": [1]}]"#);
        let out = tmp.0.join("nested/out.json");
        let cli = CommandLineInterface::try_parse_from([
            "loose-shape", "build", "-i", &input, "-o", &out.to_string_lossy(),
        ])
        .unwrap();
        cli.run().unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), r#"[{"a":[1]}]"#);
    }
}

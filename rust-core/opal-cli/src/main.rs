// SPDX-License-Identifier: PMPL-1.0-or-later
//! opal: command-line front end for OPAL.
//!
//! - `canon`: print the canonical form of a query body
//! - `equiv`: decide whether two query bodies are equivalent
//! - `translate`: turn a filter mapping into a search body
//! - `find`: run a filter against a live index
//!
//! JSON input is read from a file, or from stdin when the path is `-` or
//! omitted. Logging goes to stderr and follows `RUST_LOG`.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use opal_index::{BackendConfig, HttpBackend, Index, IndexConfig, SearchInput};
use opal_normalizer::Canonicalizer;
use opal_query::{FilterTranslator, Limit, ScoredQuery, TranslatorConfig};
use serde_json::Value;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Structured boolean queries for OpenSearch-compatible engines.
#[derive(Parser, Debug)]
#[command(name = "opal", version = VERSION, about = "Build, compare and run OPAL queries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the canonical form of a query body.
    Canon {
        /// JSON file holding the body (stdin when omitted).
        file: Option<PathBuf>,
    },

    /// Check whether two query bodies are logically equivalent.
    Equiv {
        a: PathBuf,
        b: PathBuf,
        /// Print both canonical forms as well as the verdict.
        #[arg(long, short)]
        verbose: bool,
    },

    /// Translate a filter mapping into a search body.
    Translate {
        /// JSON file holding the filter (stdin when omitted).
        file: Option<PathBuf>,
        /// Cap the number of results.
        #[arg(long)]
        limit: Option<u64>,
        /// Compare numbers as both floats and integers.
        #[arg(long)]
        dual_typed: bool,
    },

    /// Run a filter against an index and print the hits.
    Find {
        /// JSON file holding the filter (every document when omitted).
        filter: Option<PathBuf>,
        /// Engine URL; falls back to OPAL_URL.
        #[arg(long)]
        url: Option<String>,
        /// Index to search.
        #[arg(long)]
        index: String,
        /// Cap the number of results.
        #[arg(long)]
        limit: Option<u64>,
        /// Print the whole engine response instead of the hits.
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Canon { file } => {
            let body = read_json(file.as_ref())?;
            println!("{}", Canonicalizer::new().canonicalize(&body)?);
        }

        Command::Equiv { a, b, verbose } => {
            let canonicalizer = Canonicalizer::new();
            let left = canonicalizer.canonicalize(&read_json(Some(&a))?)?;
            let right = canonicalizer.canonicalize(&read_json(Some(&b))?)?;
            if verbose {
                println!("{} {}", "A:".bold(), left);
                println!("{} {}", "B:".bold(), right);
            }
            if left == right {
                println!("{}", "equivalent".green().bold());
            } else {
                println!("{}", "not equivalent".red().bold());
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Translate {
            file,
            limit,
            dual_typed,
        } => {
            let config = if dual_typed {
                TranslatorConfig::dual_typed()
            } else {
                TranslatorConfig::default()
            };
            let filter = read_json(file.as_ref())?;
            let condition = FilterTranslator::new(config).translate(&filter)?;
            let query = match limit {
                Some(n) => condition & Limit::new(n)?,
                None => ScoredQuery::new(condition),
            };
            println!("{}", serde_json::to_string_pretty(&query.to_body())?);
        }

        Command::Find {
            filter,
            url,
            index,
            limit,
            raw,
        } => {
            let mut backend_config = BackendConfig::from_env()?;
            if let Some(url) = url {
                backend_config.url = url;
            }
            let backend = HttpBackend::new(&backend_config)?;
            let index = Index::open(backend, IndexConfig::new(index)).await?;

            let filter = match filter {
                Some(path) => read_json(Some(&path))?,
                None => Value::Null,
            };
            let input = match limit {
                Some(n) => {
                    let condition = FilterTranslator::new(index.config().translator.clone())
                        .translate(&filter)?;
                    SearchInput::Scored(condition & Limit::new(n)?)
                }
                None => SearchInput::Filter(filter),
            };
            tracing::debug!(body = %index.search_body(input.clone())?, "search body");

            let output = if raw {
                index.find_raw(input).await?
            } else {
                Value::Array(index.find(input).await?)
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn read_json(path: Option<&PathBuf>) -> Result<Value, Box<dyn std::error::Error>> {
    let text = match path {
        Some(p) if p.as_os_str() != "-" => fs::read_to_string(p)
            .map_err(|e| format!("cannot read {}: {e}", p.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&text)?)
}

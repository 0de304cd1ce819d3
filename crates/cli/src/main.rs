//! Cascade CLI: build the lexical index and run retrieval from a shell.
//!
//! ```bash
//! cascade config init
//! cascade build --corpus lore.jsonl
//! cascade search "оружие орков" -n 10
//! cascade query "какое оружие у орков" --json
//! ```

mod commands;
mod corpus;
mod format;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use cascade_core::{CascadeConfig, CascadeError, CascadeResult, CONFIG_FILE_NAME};
use cascade_intelligence::{ApiReranker, CascadeRetriever};
use cascade_search::{IndexStore, LexicalIndex};
use clap::ArgMatches;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_hits, format_results, OutputMode};

fn main() {
    let matches = build_cli().get_matches();

    init_tracing(matches.get_flag("verbose"));

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match run(&matches, mode) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "cascade=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config_path(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

fn run(matches: &ArgMatches, mode: OutputMode) -> CascadeResult<String> {
    let config_path = config_path(matches);

    match matches.subcommand() {
        Some(("config", sub)) => match sub.subcommand() {
            Some(("init", init)) => {
                let path = init.get_one::<PathBuf>("path").cloned().unwrap_or(config_path);
                config_init(&path)
            }
            _ => Err(CascadeError::invalid_input("unknown config subcommand")),
        },
        Some(("build", sub)) => {
            let config = CascadeConfig::from_file_or_default(&config_path)?;
            let corpus = sub
                .get_one::<PathBuf>("corpus")
                .ok_or_else(|| CascadeError::invalid_input("--corpus is required"))?;
            build(&config, corpus, mode)
        }
        Some(("search", sub)) => {
            let config = CascadeConfig::from_file_or_default(&config_path)?;
            let query = required_query(sub)?;
            let limit = sub
                .get_one::<usize>("limit")
                .copied()
                .unwrap_or(config.top_k_stage1);
            search(&config, query, limit, mode)
        }
        Some(("query", sub)) => {
            let config = CascadeConfig::from_file_or_default(&config_path)?;
            query(config, required_query(sub)?, mode)
        }
        _ => Err(CascadeError::invalid_input("no command given; see --help")),
    }
}

fn required_query(matches: &ArgMatches) -> CascadeResult<&str> {
    matches
        .get_one::<String>("query")
        .map(String::as_str)
        .ok_or_else(|| CascadeError::invalid_input("query is required"))
}

fn config_init(path: &Path) -> CascadeResult<String> {
    if CascadeConfig::write_default_if_missing(path)? {
        Ok(format!("Wrote default config to {}", path.display()))
    } else {
        Ok(format!("{} already exists; left unchanged", path.display()))
    }
}

fn build(config: &CascadeConfig, corpus_path: &Path, mode: OutputMode) -> CascadeResult<String> {
    let documents = corpus::read_corpus(corpus_path)?;
    if documents.is_empty() {
        eprintln!("warning: {}", CascadeError::EmptyCorpus);
    }

    let store = IndexStore::new(&config.index);
    let index = store.rebuild(documents)?;

    Ok(match mode {
        OutputMode::Json => serde_json::json!({
            "path": store.path().display().to_string(),
            "documents": index.total_docs(),
            "terms": index.term_count(),
        })
        .to_string(),
        OutputMode::Human => format!(
            "Indexed {} documents ({} terms) into {}",
            index.total_docs(),
            index.term_count(),
            store.path().display()
        ),
    })
}

fn search(config: &CascadeConfig, query: &str, limit: usize, mode: OutputMode) -> CascadeResult<String> {
    let store = IndexStore::open(&config.index)?;
    let terms = store.normalizer().normalize(query);
    let hits = LexicalIndex::search(&store, &terms, limit)?;
    Ok(format_hits(&hits, mode))
}

fn query(config: CascadeConfig, query: &str, mode: OutputMode) -> CascadeResult<String> {
    let model = config.model.as_ref().ok_or_else(|| {
        CascadeError::scorer("no [model] section configured; add a reranker endpoint to the config")
    })?;
    let reranker = Arc::new(ApiReranker::from_config(model));

    let store = IndexStore::open(&config.index)?;
    let normalizer = store.normalizer();
    let retriever = CascadeRetriever::new(Arc::new(store), reranker, normalizer, config)?;

    let (results, stats) = retriever.retrieve_traced(query)?;
    Ok(format_results(&results, &stats, mode))
}

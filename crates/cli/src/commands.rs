//! Clap command tree definition.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("cascade")
        .about("Cascade retrieval: BM25 search, PRF expansion, cross-encoder rerank")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Config file path (default: cascade.toml)")
                .value_parser(value_parser!(std::path::PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log pipeline stages to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(build_config())
        .subcommand(build_build())
        .subcommand(build_search())
        .subcommand(build_query())
}

// =========================================================================
// Config
// =========================================================================

fn build_config() -> Command {
    Command::new("config")
        .about("Configuration file management")
        .subcommand_required(true)
        .subcommand(
            Command::new("init")
                .about("Write the default config file if it does not exist")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .help("Where to write (default: the --config path)")
                        .value_parser(value_parser!(std::path::PathBuf)),
                ),
        )
}

// =========================================================================
// Build
// =========================================================================

fn build_build() -> Command {
    Command::new("build")
        .about("Build the lexical index from a corpus and persist it")
        .arg(
            Arg::new("corpus")
                .long("corpus")
                .required(true)
                .help("JSON Lines corpus: one {\"id\", \"text\", \"metadata\"} object per line")
                .value_parser(value_parser!(std::path::PathBuf)),
        )
}

// =========================================================================
// Search / Query
// =========================================================================

fn build_search() -> Command {
    Command::new("search")
        .about("Single-pass lexical lookup (no expansion, no rerank)")
        .arg(Arg::new("query").required(true).help("Search query"))
        .arg(
            Arg::new("limit")
                .long("limit")
                .short('n')
                .help("Number of results (default: top_k_stage1)")
                .value_parser(value_parser!(usize)),
        )
}

fn build_query() -> Command {
    Command::new("query")
        .about("Full cascade retrieval using the configured [model] reranker")
        .arg(Arg::new("query").required(true).help("Question to retrieve passages for"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["cascade", "search", "орки", "--json", "-n", "3"])
            .unwrap();
        assert!(matches.get_flag("json"));
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "search");
        assert_eq!(sub.get_one::<String>("query").unwrap(), "орки");
        assert_eq!(*sub.get_one::<usize>("limit").unwrap(), 3);
    }

    #[test]
    fn test_build_requires_corpus() {
        assert!(build_cli().try_get_matches_from(["cascade", "build"]).is_err());
    }

    #[test]
    fn test_config_init_path() {
        let matches = build_cli()
            .try_get_matches_from(["cascade", "config", "init", "--path", "x.toml"])
            .unwrap();
        let (_, config) = matches.subcommand().unwrap();
        let (name, init) = config.subcommand().unwrap();
        assert_eq!(name, "init");
        assert_eq!(
            init.get_one::<std::path::PathBuf>("path").unwrap(),
            &std::path::PathBuf::from("x.toml")
        );
    }
}

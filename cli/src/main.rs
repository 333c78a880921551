//! Command-line driver for the hanseg analysis engine.
//!
//! Tokenizes files (or stdin) and prints one token per line, or a JSON
//! array with `--json`. Dictionary paths and filter switches map directly
//! onto the core configuration.

use anyhow::{bail, Context};
use clap::Parser;
use hanseg_core::{AnalysisContext, AnalyzerKind, Config, Token, Tokenizer};
use std::io::{BufReader, Read};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hanseg", about = "Streaming Chinese word segmentation")]
struct Args {
    /// Analyzer variant: standard, index, nlp, crf, n_short, dijkstra, speed
    #[arg(long, default_value = "standard")]
    analyzer: String,

    /// Custom dictionary text file (one `word [tag freq]*` per line)
    #[arg(long)]
    custom_dict: Option<PathBuf>,

    /// Stop word text file (one word per line)
    #[arg(long)]
    stop_dict: Option<PathBuf>,

    /// Remote dictionary TOML config file
    #[arg(long)]
    remote_config: Option<PathBuf>,

    /// Enable stop-word and punctuation filtering
    #[arg(long)]
    stop_filter: bool,

    /// Fold full-width characters and lowercase ASCII before segmentation
    #[arg(long)]
    normalize: bool,

    /// Stem foreign-language terms with the Porter stemmer
    #[arg(long)]
    stem: bool,

    /// Print tokens as a JSON array instead of one line per token
    #[arg(long)]
    json: bool,

    /// Files to tokenize; stdin when empty
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let Some(kind) = AnalyzerKind::parse(&args.analyzer) else {
        bail!("unknown analyzer `{}`", args.analyzer);
    };

    let config = Config {
        enable_stop_dictionary: args.stop_filter,
        enable_normalization: args.normalize,
        enable_porter_stemming: args.stem,
        enable_remote_dict: args.remote_config.is_some(),
        custom_dict_path: args.custom_dict.clone(),
        stop_dict_path: args.stop_dict.clone(),
        remote_config_path: args.remote_config.clone(),
        ..Config::default()
    };

    let context = AnalysisContext::initialize(config).context("initialize analysis context")?;
    let analyzer = context
        .analyzer(kind)
        .with_context(|| format!("build analyzer `{}`", args.analyzer))?;

    if args.files.is_empty() {
        let stdin = std::io::stdin();
        let mut tokenizer = analyzer.tokenizer(stdin.lock());
        print_tokens(&mut tokenizer, args.json)?;
    } else {
        for path in &args.files {
            let file = std::fs::File::open(path)
                .with_context(|| format!("open {}", path.display()))?;
            let mut tokenizer = analyzer.tokenizer(BufReader::new(file));
            print_tokens(&mut tokenizer, args.json)?;
        }
    }
    Ok(())
}

fn print_tokens<R: Read>(tokenizer: &mut Tokenizer<R>, json: bool) -> anyhow::Result<()> {
    if json {
        let mut tokens: Vec<Token> = Vec::new();
        while let Some(token) = tokenizer.next_token()? {
            tokens.push(token);
        }
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        while let Some(token) = tokenizer.next_token()? {
            println!(
                "{}\t[{},{})\t{}\t+{}",
                token.text,
                token.start_offset,
                token.end_offset,
                token.token_type,
                token.position_increment
            );
        }
        eprintln!("-- field end at offset {}", tokenizer.end());
    }
    Ok(())
}

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use finrag_core::config::Settings;
use finrag_core::error::Error;
use finrag_core::types::{CollectionKey, DocumentClass};
use finrag_retrieve::{source_citations, Retriever};

fn usage(program: &str) {
    eprintln!("Usage: {program} <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  ingest <path> [--class filing|transcript|news] [--collection NAME]");
    eprintln!("      Index a file, or every .txt/.md under a directory.");
    eprintln!("  query <text> [--top-k N] [--collection NAME]");
    eprintln!("      Retrieve the closest passages for a query.");
    eprintln!("  stats");
    eprintln!("      Show document count and dimension of the default index.");
    eprintln!();
    eprintln!("Collections are named TICKER_FILINGTYPE_YEAR, e.g. AAPL_10-K_2023.");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("finrag").to_string();
    if args.len() < 2 {
        usage(&program);
        return ExitCode::FAILURE;
    }

    let result = match args[1].as_str() {
        "ingest" => cmd_ingest(&args[2..]),
        "query" => cmd_query(&args[2..]),
        "stats" => cmd_stats(),
        "help" | "--help" | "-h" => {
            usage(&program);
            return ExitCode::SUCCESS;
        }
        other => {
            eprintln!("Unknown command: {other}");
            usage(&program);
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            match e.downcast_ref::<Error>() {
                Some(Error::Configuration(_)) => {
                    eprintln!("Hint: set FINRAG_API_KEY or edit finrag.toml, then retry.");
                }
                Some(Error::QuotaExceeded(_)) => {
                    eprintln!("Hint: the provider rejected the request for quota reasons; no local state was changed.");
                }
                _ => {}
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_ingest(args: &[String]) -> anyhow::Result<()> {
    let mut path: Option<PathBuf> = None;
    let mut class = DocumentClass::Filing;
    let mut collection: Option<CollectionKey> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--class" | "-c" => {
                let value = flag_value(args, &mut i, "--class")?;
                class = DocumentClass::parse(&value)
                    .ok_or_else(|| anyhow::anyhow!("unknown class `{value}`, expected filing, transcript, or news"))?;
            }
            "--collection" => {
                let value = flag_value(args, &mut i, "--collection")?;
                collection = Some(value.parse::<CollectionKey>()?);
            }
            arg if !arg.starts_with('-') => path = Some(PathBuf::from(arg)),
            other => anyhow::bail!("unknown option `{other}`"),
        }
        i += 1;
    }
    let path = path.ok_or_else(|| anyhow::anyhow!("ingest requires a file or directory path"))?;

    let settings = Settings::load()?;
    let mut engine = Retriever::load_default(settings)?;

    let files = gather_files(&path)?;
    if files.is_empty() {
        anyhow::bail!("no .txt or .md files found under {}", path.display());
    }

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut total_chunks = 0usize;
    for file in &files {
        bar.set_message(file.display().to_string());
        total_chunks += match &collection {
            Some(key) => engine.ingest_file_into(key, file, class)?,
            None => engine.ingest_file(file, class)?,
        };
        bar.inc(1);
    }
    bar.finish_and_clear();

    if collection.is_none() {
        engine.save()?;
    }
    println!("Indexed {} file(s), {} chunk(s)", files.len(), total_chunks);
    if let Some(key) = collection {
        println!("Collection: {key}");
    }
    Ok(())
}

fn cmd_query(args: &[String]) -> anyhow::Result<()> {
    let mut query: Option<String> = None;
    let mut top_k: Option<usize> = None;
    let mut collection: Option<CollectionKey> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--top-k" | "-k" => {
                let value = flag_value(args, &mut i, "--top-k")?;
                top_k = Some(value.parse().map_err(|_| anyhow::anyhow!("--top-k requires a number"))?);
            }
            "--collection" => {
                let value = flag_value(args, &mut i, "--collection")?;
                collection = Some(value.parse::<CollectionKey>()?);
            }
            arg if !arg.starts_with('-') => query = Some(arg.to_string()),
            other => anyhow::bail!("unknown option `{other}`"),
        }
        i += 1;
    }
    let query = query.ok_or_else(|| anyhow::anyhow!("query requires the query text"))?;

    let settings = Settings::load()?;
    let engine = Retriever::load_default(settings)?;

    let passages = match &collection {
        Some(key) => engine.retrieve_by_name(key, &query, top_k)?,
        None => engine.retrieve_text(&query, top_k)?,
    };

    if passages.is_empty() {
        println!("No passages found for: \"{query}\"");
        return Ok(());
    }
    println!("Found {} passage(s) for: \"{query}\"", passages.len());
    for (i, p) in passages.iter().enumerate() {
        let filename = p.metadata.get("filename").map(String::as_str).unwrap_or("<unknown>");
        println!("\n  {}. distance={:.4}  source={}", i + 1, p.distance, filename);
        println!("     {}", preview(&p.text, 240));
    }
    let sources = source_citations(&passages);
    if !sources.is_empty() {
        println!("\nSources: {}", sources.join(", "));
    }
    Ok(())
}

fn cmd_stats() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let engine = Retriever::load_default(settings)?;
    let stats = engine.stats();
    println!("Documents: {}", stats.num_documents);
    println!("Dimension: {}", stats.dimension);
    println!("Index built: {}", stats.index_exists);
    println!("Store path: {}", engine.settings().vector_db_dir().display());
    Ok(())
}

fn flag_value(args: &[String], i: &mut usize, flag: &str) -> anyhow::Result<String> {
    if *i + 1 >= args.len() {
        anyhow::bail!("{flag} requires a value");
    }
    *i += 1;
    Ok(args[*i].clone())
}

fn gather_files(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("path does not exist: {}", path.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("txt") | Some("md")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}…")
}

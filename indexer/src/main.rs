use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use docsearch_core::{paginate, process_queries, DocId, DocumentStatus, ExecutionPolicy, SearchEngine};
use docsearch_indexer::load_documents;
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Load documents into an in-memory TF-IDF index and query it", long_about = None)]
struct Cli {
    /// Input path (file or directory of .json/.jsonl documents)
    #[arg(long, global = true, default_value = "./documents")]
    input: PathBuf,
    /// Space-separated stop words
    #[arg(long, global = true, default_value = "")]
    stop_words: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

impl From<StatusArg> for DocumentStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Actual => DocumentStatus::Actual,
            StatusArg::Irrelevant => DocumentStatus::Irrelevant,
            StatusArg::Banned => DocumentStatus::Banned,
            StatusArg::Removed => DocumentStatus::Removed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run queries and print the ranked documents page by page
    Search {
        /// Query text; may be repeated
        #[arg(long = "query", short = 'q')]
        queries: Vec<String>,
        /// File with one query per line
        #[arg(long)]
        queries_file: Option<PathBuf>,
        /// Only documents with this status
        #[arg(long, value_enum, default_value_t = StatusArg::Actual)]
        status: StatusArg,
        /// Rank each query with the parallel strategy
        #[arg(long, default_value_t = false)]
        parallel: bool,
        /// Documents per printed page
        #[arg(long, default_value_t = 2)]
        page_size: usize,
    },
    /// Show which query words occur in one document
    Match {
        #[arg(long, short = 'q')]
        query: String,
        #[arg(long)]
        id: DocId,
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Print the document count and per-document term counts
    Stats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let mut engine = SearchEngine::from_stop_words_text(&cli.stop_words)?;
    load_documents(&mut engine, &cli.input)?;

    match cli.command {
        Commands::Search { mut queries, queries_file, status, parallel, page_size } => {
            if let Some(path) = queries_file {
                queries.extend(read_queries(&path)?);
            }
            if queries.is_empty() {
                bail!("no queries given; use --query or --queries-file");
            }
            run_search(&engine, &queries, status.into(), policy(parallel), page_size)
        }
        Commands::Match { query, id, parallel } => {
            let (words, status) = engine.match_document_with(policy(parallel), &query, id)?;
            println!("{{ document_id = {id}, status = {status:?}, words = [{}] }}", words.join(" "));
            Ok(())
        }
        Commands::Stats => {
            println!("documents: {}", engine.document_count());
            println!("terms: {}", engine.index().term_count());
            for &id in &engine {
                println!("  {id}: {} terms", engine.word_frequencies(id).len());
            }
            Ok(())
        }
    }
}

fn policy(parallel: bool) -> ExecutionPolicy {
    if parallel {
        ExecutionPolicy::Parallel
    } else {
        ExecutionPolicy::Sequential
    }
}

fn read_queries(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(text.lines().filter(|l| !l.trim().is_empty()).map(str::to_string).collect())
}

fn run_search(
    engine: &SearchEngine,
    queries: &[String],
    status: DocumentStatus,
    policy: ExecutionPolicy,
    page_size: usize,
) -> Result<()> {
    let results = if status == DocumentStatus::Actual && policy == ExecutionPolicy::Sequential {
        process_queries(engine, queries)?
    } else {
        queries
            .iter()
            .map(|q| engine.find_top_documents_with_status(policy, q, status))
            .collect::<Result<Vec<_>, _>>()?
    };
    for (query, documents) in queries.iter().zip(&results) {
        println!("query: {query} ({} found)", documents.len());
        for (page_no, page) in paginate(documents, page_size).iter().enumerate() {
            println!("  page {}: {page}", page_no + 1);
        }
    }
    Ok(())
}

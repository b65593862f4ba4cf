use anyhow::{Context, Result};
use be_indexer::{
    parse_documents, Assignments, BadConjunctionPolicy, ConjunctionCollector, FieldOption,
    IndexBuilder, IndexLayout, IndexerSettings, QueryParsePolicy, RetrieveOptions,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "be-indexer")]
#[command(about = "Index boolean-expression documents and match an assignment against them", long_about = None)]
struct Args {
    /// Documents file: a JSON array or one JSON document per line
    #[arg(long, env = "BE_INDEXER_DOCS")]
    docs: PathBuf,

    /// Query assignment as a JSON object, e.g. '{"age": 20, "city": ["bj"]}'
    #[arg(long)]
    query: String,

    /// Index layout (size_grouped, compacted, bitmap)
    #[arg(long, env = "BE_INDEXER_LAYOUT", default_value = "size_grouped")]
    layout: String,

    /// Optional settings file (JSON); flags below override it
    #[arg(long, env = "BE_INDEXER_CONFIG")]
    config: Option<PathBuf>,

    /// Field configuration as name=holder:parser, repeatable
    #[arg(long = "field", value_name = "NAME=HOLDER:PARSER")]
    fields: Vec<String>,

    /// Drop conjunctions whose values fail to parse instead of aborting
    #[arg(long)]
    skip_bad: bool,

    /// Fail the query when a value cannot be parsed
    #[arg(long)]
    strict: bool,

    /// Log matched posting lists
    #[arg(long)]
    dump_entries: bool,

    /// Log every merge step
    #[arg(long)]
    dump_steps: bool,
}

fn parse_layout(name: &str) -> Result<IndexLayout> {
    match name.to_lowercase().replace('-', "_").as_str() {
        "size_grouped" => Ok(IndexLayout::SizeGrouped),
        "compacted" => Ok(IndexLayout::Compacted),
        "bitmap" => Ok(IndexLayout::Bitmap),
        other => anyhow::bail!("unknown layout '{}'", other),
    }
}

fn parse_field(raw: &str) -> Result<(String, FieldOption)> {
    let (name, option) = raw
        .split_once('=')
        .with_context(|| format!("field '{}' must look like name=holder:parser", raw))?;
    let (holder, parser) = option.split_once(':').unwrap_or((option, "common"));
    Ok((name.to_string(), FieldOption::new(holder, parser)))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Starting be-indexer v{}", be_indexer::VERSION);

    let mut settings = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading settings {:?}", path))?;
            IndexerSettings::from_json(&raw)?
        }
        None => IndexerSettings::default(),
    };
    settings.layout = parse_layout(&args.layout)?;
    if args.skip_bad {
        settings.bad_conjunction = BadConjunctionPolicy::SkipBadConjunction;
    }
    if args.strict {
        settings.query_parse = QueryParsePolicy::Strict;
    }

    let mut builder = IndexBuilder::new(settings);
    for raw in &args.fields {
        let (name, option) = parse_field(raw)?;
        builder.configure_field(&name, option)?;
    }

    let raw = std::fs::read_to_string(&args.docs)
        .with_context(|| format!("reading documents {:?}", args.docs))?;
    let docs = parse_documents(&raw)?;
    builder.add_documents(&docs)?;
    let build_stats = builder.stats().clone();
    let index = builder.build()?;
    info!(
        documents = build_stats.documents,
        skipped = build_stats.skipped_conjunctions,
        "Index ready"
    );

    let assignments: Assignments =
        serde_json::from_str(&args.query).context("query must be a JSON object")?;
    let mut options = RetrieveOptions::default();
    options.dump_entries = args.dump_entries;
    options.dump_steps = args.dump_steps;

    let mut collector = ConjunctionCollector::new();
    index.retrieve_with_collector(&assignments, &mut collector, &options)?;

    let hits: Vec<serde_json::Value> = collector
        .doc_ids()
        .into_iter()
        .map(|id| serde_json::json!({ "id": id, "conjunctions": collector.conjunctions(id) }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

use clap::{ArgGroup, Args, Parser, Subcommand};
use crosstopic_annotate::{
    augment_generation, AbstractFetcher, AnnotationParams, AugmentConfig, MediaDownloader,
    SpotlightClient, DEFAULT_ENDPOINT,
};
use crosstopic_core::{
    build_corpus, BuildConfig, CorpusMap, Error, SimilarityMatch, SkippedDocument, SparseVector,
    Tokenizer, TokenizerConfig, TopicIndex, TopicModel, TrainingConfig, Vocabulary,
};
use crosstopic_storage::{artifacts, CorpusGeneration, GenerationStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Cross-corpus topic similarity pipeline
#[derive(Parser, Debug)]
#[command(name = "crosstopic")]
#[command(about = "Build corpora, train topic models, and rank documents across collections", long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(short, long, global = true, default_value = "./data")]
    data_dir: PathBuf,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a directory of documents and persist it as a corpus generation
    Build(BuildArgs),
    /// Train a topic model over a stored generation
    Train(TrainArgs),
    /// Rank one generation's documents against another in topic space
    Query(QueryArgs),
    /// Annotate a generation's documents and fetch entity abstracts
    Augment(AugmentArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Directory of input documents, one file per document
    #[arg(long)]
    input_dir: PathBuf,

    /// Name of the generation to write
    #[arg(long)]
    name: String,

    /// Reuse the vocabulary of an existing generation instead of building one
    #[arg(long)]
    vocab_from: Option<String>,

    /// File of additional whitespace-separated stopwords
    #[arg(long)]
    extra_stopwords: Option<PathBuf>,

    /// Prune tokens weighing less than this within their document
    #[arg(long, default_value_t = 0.05, conflicts_with = "no_weighting")]
    min_weight: f64,

    /// Skip TF-IDF weighting and pruning entirely
    #[arg(long)]
    no_weighting: bool,

    /// Append abstracts stored by this generation's augmentation run
    #[arg(long)]
    augment_from: Option<String>,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Generation to train over
    #[arg(long)]
    generation: String,

    /// Number of topics
    #[arg(long, default_value_t = 150)]
    topics: usize,

    /// Refresh the topic estimate every this many chunks; 0 refreshes per pass
    #[arg(long, default_value_t = 1)]
    update_every: usize,

    /// Documents visited per chunk
    #[arg(long, default_value_t = 80)]
    chunksize: usize,

    /// Full sweeps over the corpus
    #[arg(long, default_value_t = 7)]
    passes: usize,

    /// Sampler seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["row", "object_id"])))]
struct QueryArgs {
    /// Generation to search; its topic model ranks the candidates
    #[arg(long)]
    index: String,

    /// Generation the query document comes from
    #[arg(long)]
    corpus: String,

    /// Metadata table for the query generation
    #[arg(long)]
    metadata: PathBuf,

    /// Query by corpus row
    #[arg(long)]
    row: Option<usize>,

    /// Query by external object id
    #[arg(long)]
    object_id: Option<String>,

    /// Keep only the best K matches
    #[arg(long)]
    limit: Option<usize>,

    /// Print matches as JSON
    #[arg(long)]
    json: bool,

    /// Also report the dominant topic of the query and each match
    #[arg(long)]
    topics: bool,

    /// Download the query object's media file into this directory
    #[arg(long, requires = "media_base_url")]
    media_dir: Option<PathBuf>,

    /// Media repository base URL; the media id is appended
    #[arg(long, requires = "media_dir")]
    media_base_url: Option<String>,

    /// File extension for downloaded media
    #[arg(long, default_value = ".jpg")]
    media_ext: String,
}

#[derive(Args, Debug)]
struct AugmentArgs {
    /// Generation to annotate
    #[arg(long)]
    generation: String,

    /// Annotation service endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Annotation confidence threshold
    #[arg(long, default_value_t = 0.4)]
    confidence: f64,

    /// Annotation support threshold
    #[arg(long, default_value_t = 20)]
    support: u32,

    /// Spotter the service should use
    #[arg(long, default_value = "LingPipeSpotter")]
    spotter: String,

    /// Annotation requests in flight at once
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("crosstopic v{}", env!("CARGO_PKG_VERSION"));
    let store = GenerationStore::new(&cli.data_dir)?;

    match cli.command {
        Command::Build(args) => run_build(&store, args),
        Command::Train(args) => run_train(&store, args),
        Command::Query(args) => run_query(&store, args).await,
        Command::Augment(args) => run_augment(&store, args).await,
    }
}

fn run_build(store: &GenerationStore, args: BuildArgs) -> anyhow::Result<()> {
    let tokenizer = Tokenizer::new(TokenizerConfig {
        extra_stopwords: args.extra_stopwords,
        noun_only: false,
    })?;
    let reused = match args.vocab_from.as_deref() {
        Some(name) => Some(store.load(name)?),
        None => None,
    };
    let (documents, unreadable) =
        read_documents(store, &args.input_dir, args.augment_from.as_deref())?;
    info!(
        "Building generation '{}' from {} files",
        args.name,
        documents.len()
    );

    let config = BuildConfig {
        apply_tfidf: !args.no_weighting,
        min_weight: if args.no_weighting { 0.0 } else { args.min_weight },
    };
    let mut outcome = build_corpus(
        &tokenizer,
        &documents,
        reused.as_ref().map(|g| g.vocabulary()),
        &config,
    );
    outcome.report.total += unreadable.len();
    outcome.report.skipped.extend(unreadable);

    let kept = outcome.documents.len();
    let tokens = outcome.vocabulary.len();
    let generation = CorpusGeneration::new(
        args.name,
        outcome.vocabulary,
        outcome.documents,
        outcome.corpus,
        outcome.tfidf,
        args.vocab_from,
    )?;
    let saved = store.save(generation)?;
    info!(
        "Generation '{}' built: {} documents, {} vocabulary tokens, {} skipped",
        saved.name(),
        kept,
        tokens,
        outcome.report.skipped.len()
    );
    Ok(())
}

/// Reads every regular file under `input_dir` in filename order. Unreadable
/// or undecodable files are skipped and reported, not fatal.
fn read_documents(
    store: &GenerationStore,
    input_dir: &Path,
    augment_from: Option<&str>,
) -> anyhow::Result<(Vec<(String, String)>, Vec<SkippedDocument>)> {
    let mut paths: Vec<PathBuf> = fs::read_dir(input_dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut documents = Vec::new();
    let mut skipped = Vec::new();
    for path in paths {
        let Some(name) = path.file_name() else {
            continue;
        };
        let name = name.to_string_lossy().into_owned();
        let mut text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(document = %name, error = %e, "skipping unreadable file");
                skipped.push(SkippedDocument {
                    name,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if let Some(generation) = augment_from {
            if let Some(abstract_text) = store.read_abstract(generation, &name)? {
                text.push(' ');
                text.push_str(&abstract_text);
            }
        }
        documents.push((name, text));
    }
    Ok((documents, skipped))
}

fn run_train(store: &GenerationStore, args: TrainArgs) -> anyhow::Result<()> {
    let generation = store.load(&args.generation)?;
    let config = TrainingConfig {
        num_topics: args.topics,
        update_every: args.update_every,
        chunksize: args.chunksize,
        passes: args.passes,
        seed: args.seed,
        ..TrainingConfig::default()
    };
    info!(
        "Training {} topics over generation '{}' ({} documents)",
        config.num_topics,
        generation.name(),
        generation.len()
    );
    let model = TopicModel::train(
        generation.corpus(),
        generation.vocabulary().len(),
        generation.name(),
        &config,
    )?;
    store.save_topic_model(generation.name(), &model)?;
    info!("Topic model for '{}' saved", generation.name());
    Ok(())
}

async fn run_query(store: &GenerationStore, args: QueryArgs) -> anyhow::Result<()> {
    let index = store.load(&args.index)?;
    let corpus = store.load(&args.corpus)?;
    let model = store.load_topic_model(&index)?;
    let metadata = artifacts::read_metadata_table(&args.metadata)?;
    let map = CorpusMap::new(corpus.documents(), &metadata);

    let row = if let Some(row) = args.row {
        row
    } else if let Some(object_id) = args.object_id.as_deref() {
        map.row_for_object_id(object_id).ok_or_else(|| {
            anyhow::anyhow!(
                "no document with object id '{object_id}' in generation '{}'",
                args.corpus
            )
        })?
    } else {
        anyhow::bail!("one of --row or --object-id is required");
    };
    let query_doc = corpus.document_name(row)?.to_string();
    let meta = metadata
        .get(&query_doc)
        .ok_or_else(|| Error::DocumentNotFound(query_doc.clone()))?;

    let topic_index = TopicIndex::build(&model, index.corpus());
    let query_topics = model.dense_topics(&corpus.corpus()[row]);
    let ranked = topic_index.query(&query_topics, args.limit);
    info!(
        "Ranked {} of {} candidates for '{}'",
        ranked.len(),
        topic_index.len(),
        query_doc
    );

    let mut matches = Vec::with_capacity(ranked.len());
    for (index_row, score) in ranked {
        matches.push(SimilarityMatch {
            score,
            index_doc: index.document_name(index_row)?.to_string(),
            query_doc: query_doc.clone(),
            query_object_id: meta.object_id.clone(),
            index_row,
            query_row: row,
            media_id: meta.media_id.clone(),
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else {
        println!(
            "query: {} (row {}, object {})",
            query_doc, row, meta.object_id
        );
        for m in &matches {
            println!("{:.6}\t{}\t{}", m.score, m.index_doc, m.index_row);
        }
    }

    if args.topics {
        if let Some((topic, tokens)) =
            dominant_topic(&model, &corpus.corpus()[row], index.vocabulary())
        {
            println!("query topic {topic}: {tokens}");
        }
        for m in &matches {
            if let Some((topic, tokens)) =
                dominant_topic(&model, &index.corpus()[m.index_row], index.vocabulary())
            {
                println!("{} topic {topic}: {tokens}", m.index_doc);
            }
        }
    }

    if let (Some(dir), Some(base_url)) = (&args.media_dir, &args.media_base_url) {
        if meta.media_id.is_empty() {
            warn!(document = %query_doc, "no media id recorded; skipping media download");
        } else {
            let downloader = MediaDownloader::new()?;
            let path = downloader
                .download(base_url, &meta.media_id, &args.media_ext, dir)
                .await?;
            info!("Media file stored at {}", path.display());
        }
    }
    Ok(())
}

/// Highest-weight topic of a document plus that topic's top tokens.
fn dominant_topic(
    model: &TopicModel,
    vector: &SparseVector,
    vocabulary: &Vocabulary,
) -> Option<(usize, String)> {
    let &(topic, _) = model.transform(vector).first()?;
    let tokens = model.top_tokens(topic, 10, vocabulary).ok()?;
    let joined = tokens
        .into_iter()
        .map(|(token, _)| token)
        .collect::<Vec<_>>()
        .join(" ");
    Some((topic, joined))
}

async fn run_augment(store: &GenerationStore, args: AugmentArgs) -> anyhow::Result<()> {
    let generation = store.load(&args.generation)?;
    let params = AnnotationParams {
        confidence: args.confidence,
        support: args.support,
        spotter: args.spotter,
        ..AnnotationParams::default()
    };
    let client = Arc::new(SpotlightClient::new(args.endpoint, params)?);
    let fetcher = AbstractFetcher::new()?;
    let config = AugmentConfig {
        concurrency: args.concurrency,
        ..AugmentConfig::default()
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let listener = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received; finishing the current wave");
            listener.store(true, Ordering::Relaxed);
        }
    });

    let report = augment_generation(store, &generation, client, &fetcher, &config, &cancel).await?;
    info!(
        "Augmentation of '{}' complete: {} annotated, {} skipped, {} unmatched{}",
        generation.name(),
        report.annotated,
        report.skipped,
        report.unmatched,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    Ok(())
}

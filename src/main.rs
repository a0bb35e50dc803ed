use anyhow::Context;
use clap::Parser;
use distrec::{
    finalize, transform, AnnBackend, EmbeddingRecommender, FlatBackend, HnswBackend,
    InMemoryEmbeddings, ItemId, Recommender, ResolutionPolicy, Selection, Settings,
    SimilarityIndex, Space,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Recommend items from a history of item ids
#[derive(Parser, Debug)]
#[command(name = "distrec")]
#[command(about = "Embedding-history recommender", long_about = None)]
struct Args {
    /// JSON array of item embeddings; the row index is the item id
    #[arg(short, long)]
    embeddings: PathBuf,

    /// JSON settings file ({"index": {...}, "recommender": {...}})
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated history item ids
    #[arg(long, value_delimiter = ',', required = true)]
    history: Vec<ItemId>,

    /// Number of recommendations
    #[arg(short, long)]
    k: Option<usize>,

    /// Over-fetch multiplier (>= 1.0)
    #[arg(long)]
    sample_weight: Option<f64>,

    /// Similarity space: l2, ip or cosine
    #[arg(long)]
    space: Option<Space>,

    /// Query-time search breadth
    #[arg(long)]
    search_breadth: Option<usize>,

    /// Sample the final items with this seed instead of taking the top k
    #[arg(long)]
    seed: Option<u64>,

    /// Skip history ids without an embedding instead of failing
    #[arg(long)]
    skip_unresolved: bool,

    /// Use exact search instead of the HNSW graph
    #[arg(long)]
    exact: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_json_file(path)
                .with_context(|| format!("loading settings from {:?}", path))?,
            None => Settings::default(),
        };

        if let Some(k) = self.k {
            settings.recommender.k = k;
        }
        if let Some(sample_weight) = self.sample_weight {
            settings.recommender.sample_weight = sample_weight;
        }
        if let Some(space) = self.space {
            settings.index.space = space;
        }
        if let Some(search_breadth) = self.search_breadth {
            settings.index.search_breadth = search_breadth;
        }
        if let Some(seed) = self.seed {
            settings.recommender.selection = Selection::Sample { seed };
        }
        if self.skip_unresolved {
            settings.recommender.resolution = ResolutionPolicy::Skip;
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn run<B: AnnBackend>(table: InMemoryEmbeddings, settings: Settings, history: &[ItemId]) -> anyhow::Result<()> {
    let index = SimilarityIndex::<B>::build_with(table.as_slice(), &settings.index)?;
    info!("Index built: {} items, dim {}, space {}", index.len(), index.dim(), index.space());

    let config = settings.recommender;
    let recommender = EmbeddingRecommender::new(Arc::new(index), table, config.clone())?;

    let scores = recommender.recommend(history)?;
    let picked = finalize(&scores, history, config.k, config.selection)?;

    for (id, score) in transform::rank(&picked) {
        println!("{}", serde_json::json!({ "id": id, "score": score }));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting distrec v{}", env!("CARGO_PKG_VERSION"));

    let settings = args.settings()?;
    let table = InMemoryEmbeddings::from_json_file(&args.embeddings)
        .with_context(|| format!("loading embeddings from {:?}", args.embeddings))?;
    info!("Loaded {} embeddings from {:?}", table.len(), args.embeddings);

    if args.exact {
        run::<FlatBackend>(table, settings, &args.history)
    } else {
        run::<HnswBackend>(table, settings, &args.history)
    }
}

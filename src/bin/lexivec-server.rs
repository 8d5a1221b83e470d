//! LEXIVEC Server Binary
//!
//! Word embedding server. Loads a model in the background by default and
//! reports unavailable until it is ready; `--preload` blocks startup on
//! the load instead.

use std::path::PathBuf;

use clap::Parser;
use lexivec::model::{FetchConfig, ModelFetcher, ModelSource};
use lexivec::server::{Config, Server};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// LEXIVEC Server - Word Embedding API
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Port number
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Vocabulary index file (one token per line)
    #[arg(long, default_value = "model_cache/model.vocab")]
    vocab: PathBuf,

    /// Vector matrix file (.npy)
    #[arg(long, default_value = "model_cache/model.vectors.npy")]
    vectors: PathBuf,

    /// Load from a GloVe text file instead of vocab + npy
    #[arg(long, conflicts_with_all = ["vocab", "vectors", "download_from"])]
    text: Option<PathBuf>,

    /// Model name reported by the info endpoint
    #[arg(long, default_value = "glove-wiki-gigaword-300")]
    model_name: String,

    /// Download missing model files from this base URL before loading;
    /// --vocab and --vectors then name files inside the cache directory
    #[arg(long)]
    download_from: Option<String>,

    /// Cache directory for downloaded model files
    #[arg(long, default_value = "model_cache")]
    cache_dir: PathBuf,

    /// Finish loading the model before accepting requests
    #[arg(long, default_value_t = false)]
    preload: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lexivec=info".parse()?))
        .init();

    let args = Args::parse();

    let source = match args.text {
        Some(path) => ModelSource::Text { path },
        None => {
            let (vocab, vectors) = match args.download_from {
                Some(base_url) => {
                    let file_name = |p: &PathBuf| -> anyhow::Result<String> {
                        Ok(p.file_name()
                            .ok_or_else(|| anyhow::anyhow!("bad model file name: {:?}", p))?
                            .to_string_lossy()
                            .into_owned())
                    };
                    let vocab_name = file_name(&args.vocab)?;
                    let vectors_name = file_name(&args.vectors)?;

                    info!("fetching model files from {}", base_url);
                    let fetcher = ModelFetcher::new(
                        FetchConfig::new(base_url, vec![vocab_name, vectors_name])
                            .with_cache_dir(&args.cache_dir),
                    );
                    let mut paths = fetcher.ensure_local().await?.into_iter();
                    (paths.next().unwrap(), paths.next().unwrap())
                }
                None => (args.vocab, args.vectors),
            };
            ModelSource::Npy { vocab, vectors }
        }
    };

    let config = Config::default()
        .with_bind(&args.bind)
        .with_port(args.port)
        .with_model_name(&args.model_name)
        .with_preload(args.preload);

    info!(
        "Starting lexivec server on {}:{} (preload: {})",
        args.bind, args.port, args.preload
    );

    let server = Server::new(config);
    server.run(source).await?;

    Ok(())
}

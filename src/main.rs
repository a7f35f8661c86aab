use animeshare::clipboard::SystemClipboard;
use animeshare::config::{ExportConfig, Settings};
use animeshare::errors::ShareError;
use animeshare::gesture::TitleCopier;
use animeshare::logger::initialize_logger;
use animeshare::notify::{Notifier, TracingNotifier};
use animeshare::render::{HtmlListView, ListView};
use animeshare::share_list::lock;
use animeshare::{ExportOutcome, ExportPipeline, ListManager, ShareEntry};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[arg(short = 'c', long, global = true, env = "ANIMESHARE_CONFIG", help = "JSON settings file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: SubCommands,
}

#[derive(Subcommand, Debug, Clone)]
enum SubCommands {
    Export(ExportArgs),
    Render(RenderArgs),
    CopyTitle(CopyTitleArgs),
}

#[derive(Parser, Debug, Clone)]
struct ExportArgs {
    #[arg(help = "JSON file holding an array of share entries")]
    entries: PathBuf,
    #[arg(short = 'o', long, env = "ANIMESHARE_DOWNLOAD_DIR")]
    out_dir: Option<PathBuf>,
    #[arg(long, env = "ANIMESHARE_PIXEL_RATIO")]
    pixel_ratio: Option<f32>,
    #[arg(long)]
    image_timeout_ms: Option<u64>,
    #[arg(long)]
    rasterize_timeout_ms: Option<u64>,
}

#[derive(Parser, Debug, Clone)]
struct RenderArgs {
    entries: PathBuf,
    #[arg(short = 'o', long, help = "Write the HTML here instead of stdout")]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
struct CopyTitleArgs {
    title: String,
    #[arg(short = 'y', long, help = "Answer yes to the copy prompt")]
    yes: bool,
    #[arg(long, help = "Copy without asking")]
    no_confirm: bool,
}

async fn load_entries(path: &Path) -> Result<Vec<ShareEntry>, ShareError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ShareError::FileError(format!("{}: {}", path.display(), e)))?;
    let entries: Vec<ShareEntry> = serde_json::from_str(&raw)?;
    Ok(entries)
}

fn build_manager(
    entries: Vec<ShareEntry>,
    view: Box<dyn ListView>,
    notifier: Arc<dyn Notifier>,
    config: ExportConfig,
) -> ListManager {
    let mut manager = ListManager::new(view, notifier, config);
    for entry in entries {
        if let Err(e) = manager.add(entry) {
            warn!("Skipping entry: {}", e);
        }
    }
    manager
}

async fn run(cli_args: CliArgs) -> Result<(), ShareError> {
    let settings = match &cli_args.config {
        Some(path) => Settings::load(path).await?,
        None => Settings::default(),
    };

    match cli_args.cmd {
        SubCommands::Export(args) => {
            let mut config = settings.export;
            if let Some(ratio) = args.pixel_ratio {
                config.device_pixel_ratio = ratio;
            }
            if let Some(ms) = args.image_timeout_ms {
                config.image_timeout_ms = ms;
            }
            if let Some(ms) = args.rasterize_timeout_ms {
                config.rasterize_timeout_ms = ms;
            }
            if let Some(dir) = args.out_dir {
                config.download_dir = dir;
            }
            let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier::new(true));
            let entries = load_entries(&args.entries).await?;
            let shared = build_manager(
                entries,
                Box::new(HtmlListView::new()),
                Arc::clone(&notifier),
                config.clone(),
            )
            .into_shared();

            let pipeline = ExportPipeline::with_system(config, notifier);
            match pipeline.run(&shared).await {
                ExportOutcome::CopiedImage => info!("Share list image is on the clipboard"),
                ExportOutcome::SavedFile { path, text_copied } => {
                    info!("Share list image saved to {:?} (text copied: {})", path, text_copied)
                }
                ExportOutcome::TextFallback { copied } => {
                    info!("Image export failed, text copied: {}", copied)
                }
                ExportOutcome::Empty | ExportOutcome::Busy => {}
            }
            info!("{} entries left in share list", lock(&shared).len());
        }
        SubCommands::Render(args) => {
            let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier::default());
            let entries = load_entries(&args.entries).await?;
            let view = Arc::new(Mutex::new(HtmlListView::new()));
            build_manager(entries, Box::new(Arc::clone(&view)), notifier, settings.export);

            let document = view.lock().unwrap_or_else(PoisonError::into_inner).document();
            match args.output {
                Some(path) => tokio::fs::write(&path, document).await?,
                None => println!("{}", document),
            }
        }
        SubCommands::CopyTitle(args) => {
            let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier::new(args.yes));
            let mut config = settings.gesture;
            if args.no_confirm {
                config.confirm_on_click = false;
            }
            let copier = TitleCopier::new(Arc::new(SystemClipboard::new()), notifier, config);
            copier.click(&args.title).await;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli_args = CliArgs::parse();
    initialize_logger();

    if let Err(e) = run(cli_args).await {
        error!("animeshare failed: {}", e);
    }
}

use std::{
    cell::RefCell,
    collections::BTreeMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wavyte_overlay::{
    AnnotationSet, CpuInkSurface, Engine, EngineConfig, EngineState, EngineSurfaces,
    MemoryBackend, MemoryTarget, PageSize, RecordingInkSurface, RoutingSummary, SceneHost,
    SceneSnapshot, SharedInkSurface,
};

const DOCUMENT: &str = "memory://cli-document";

/// Upper bound on the synthetic document's length. Annotations on later pages are never displayed.
const MAX_PAGES: u32 = 10_000;

#[derive(Parser, Debug)]
#[command(name = "wavyte-overlay", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate an annotation set, then print a per-page summary.
    Validate(ValidateArgs),
    /// Print the overlay scene for one page at one instant as JSON.
    State(SceneArgs),
    /// Rasterize the ink layer for one page at one instant as a PNG.
    Ink(InkArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Annotation set JSON.
    #[arg(long)]
    annotations: PathBuf,
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Annotation set JSON.
    #[arg(long)]
    annotations: PathBuf,

    /// Page to display (1-indexed).
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Timeline position in seconds.
    #[arg(long)]
    at: f64,

    /// Page width in points.
    #[arg(long, default_value_t = PageSize::LETTER.width)]
    width: f64,

    /// Page height in points.
    #[arg(long, default_value_t = PageSize::LETTER.height)]
    height: f64,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InkArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Device pixel ratio (overrides the config file).
    #[arg(long)]
    dpr: Option<f64>,
}

#[derive(serde::Serialize)]
struct StateReport<'a> {
    state: &'a EngineState,
    routing: RoutingSummary,
    scene: SceneSnapshot,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::State(args) => cmd_state(args),
        Command::Ink(args) => cmd_ink(args),
    }
}

fn read_annotations(path: &Path) -> anyhow::Result<AnnotationSet> {
    let set = AnnotationSet::from_path(path)
        .with_context(|| format!("load annotations '{}'", path.display()))?;
    set.validate()
        .with_context(|| format!("validate annotations '{}'", path.display()))?;
    Ok(set)
}

fn read_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::from_path(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let set = read_annotations(&args.annotations)?;

    let mut per_page: BTreeMap<u32, BTreeMap<&'static str, usize>> = BTreeMap::new();
    let mut unknown = 0usize;
    for a in set.as_slice() {
        match a.page() {
            Some(page) => *per_page.entry(page).or_default().entry(a.kind_name()).or_default() += 1,
            None => unknown += 1,
        }
    }

    println!("{} annotations, ok", set.len());
    for (page, kinds) in &per_page {
        let parts: Vec<String> = kinds.iter().map(|(k, n)| format!("{k}={n}")).collect();
        println!("page {page}: {}", parts.join(" "));
    }
    if unknown > 0 {
        println!("unknown kinds (ignored): {unknown}");
    }
    Ok(())
}

/// Build an engine over an in-memory document with enough pages for `set` and `args.page`, then
/// display the page at `args.at`. The overlays live as long as the returned engine.
fn drive_engine(
    args: &SceneArgs,
    set: AnnotationSet,
    mut config: EngineConfig,
    host: Rc<RefCell<SceneHost>>,
    ink: SharedInkSurface,
) -> anyhow::Result<(Engine<MemoryBackend>, RoutingSummary)> {
    anyhow::ensure!(
        (1..=MAX_PAGES).contains(&args.page),
        "--page must be between 1 and {MAX_PAGES}, got {}",
        args.page
    );
    let pages = set.max_page().min(MAX_PAGES).max(args.page);
    let backend = MemoryBackend::new().with_document(
        DOCUMENT,
        vec![PageSize::new(args.width, args.height); pages as usize],
    );
    config.initial_page = args.page;
    let engine = Engine::new(
        backend,
        EngineSurfaces {
            page_target: MemoryTarget::new(),
            host,
            ink,
        },
        config,
    )?;

    pollster::block_on(engine.load_document(DOCUMENT))?;
    let routing = engine.set_annotations(set)?;
    engine.set_time(args.at)?;
    Ok((engine, routing))
}

fn cmd_state(args: SceneArgs) -> anyhow::Result<()> {
    let set = read_annotations(&args.annotations)?;
    let config = read_config(args.config.as_deref())?;
    let host = SceneHost::shared();

    let (engine, routing) = drive_engine(
        &args,
        set,
        config,
        host.clone(),
        RecordingInkSurface::shared(),
    )?;

    let state = engine.state();
    let report = StateReport {
        state: &state,
        routing,
        scene: host.borrow().snapshot(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize scene")?
    );
    Ok(())
}

fn cmd_ink(args: InkArgs) -> anyhow::Result<()> {
    let set = read_annotations(&args.scene.annotations)?;
    let mut config = read_config(args.scene.config.as_deref())?;
    if let Some(dpr) = args.dpr {
        config.device_pixel_ratio = dpr;
    }
    let surface = Rc::new(RefCell::new(CpuInkSurface::new()));

    let (engine, _) = drive_engine(
        &args.scene,
        set,
        config,
        SceneHost::shared(),
        surface.clone(),
    )?;
    let state = engine.state();

    let surface = surface.borrow();
    surface.save_png(&args.out)?;
    let (w, h) = surface.size();
    eprintln!(
        "wrote {} ({w}x{h}, page {}, t={})",
        args.out.display(),
        state.current_page.unwrap_or(0),
        state.current_time
    );
    Ok(())
}

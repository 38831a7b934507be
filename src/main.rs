use std::fs::File;
use std::path::PathBuf;
use std::sync::{Mutex, mpsc};
use std::{env, io, process};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dataflow_animation::{
    Animation, ConfigStore, Renderer,
    backend::{HeadlessBackend, TerminalBackend},
    script::ScriptAnimation,
    watcher::SourceWatcher,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const PLAY_USAGE: &str =
    "dataflow-animation play <script.json> [--config <config.json>] [--no-watch]";
const CHECK_USAGE: &str = "dataflow-animation check <script.json> [--config <config.json>]";

const LOG_FILE: &str = "dataflow-animation.log";

struct Options {
    script: PathBuf,
    config: Option<PathBuf>,
    watch: bool,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>, usage: &str) -> Result<Self> {
        let script = PathBuf::from(args.next().context(usage.to_string())?);
        let mut options = Options {
            script,
            config: None,
            watch: true,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    options.config = Some(PathBuf::from(args.next().context(usage.to_string())?))
                }
                "--no-watch" => options.watch = false,
                other => bail!("Unknown argument {other:?}\n\nUsage:\n  {usage}"),
            }
        }
        Ok(options)
    }

    fn config_store(&self) -> ConfigStore {
        let store = ConfigStore::new();
        match &self.config {
            Some(path) => store.with_file(path),
            None => store,
        }
    }

    fn watched_files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.script.clone()];
        files.extend(self.config.iter().cloned());
        files
    }
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);

    match args.next().as_deref() {
        Some("play") => play(Options::parse(args, PLAY_USAGE)?),
        Some("check") => check(Options::parse(args, CHECK_USAGE)?),
        _ => bail!(
            "Dataflow Animation: live data-flow diagrams in the terminal\n\nUsage:\n  {PLAY_USAGE}\n  {CHECK_USAGE}"
        ),
    }
}

/// Logs go to a file while the terminal is taken over, stderr otherwise.
fn init_logging(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if to_file {
        let path = env::var("DATAFLOW_LOG_FILE").unwrap_or_else(|_| LOG_FILE.into());
        let file = File::create(&path).with_context(|| format!("Failed to create {path}"))?;
        builder.with_writer(Mutex::new(file)).with_ansi(false).init();
    } else {
        builder.with_writer(io::stderr).init();
    }
    Ok(())
}

fn play(options: Options) -> Result<()> {
    init_logging(true)?;
    info!(script = %options.script.display(), "Starting");

    let mut renderer = Renderer::new(TerminalBackend::new(), options.config_store());
    let script = options.script.clone();
    renderer.set_animation_source(move || Animation::new(ScriptAnimation::new(&script)));
    // A broken script still opens the window; fix the file and it reloads.
    let _ = renderer.set_animation(Some(Animation::new(ScriptAnimation::new(&options.script))));

    let _watcher = if options.watch {
        let (sender, receiver) = mpsc::channel();
        match SourceWatcher::spawn(&options.watched_files(), sender) {
            Ok(watcher) => {
                renderer.set_reload_receiver(receiver);
                Some(watcher)
            }
            Err(e) => {
                warn!("Live reload disabled: {e:#}");
                None
            }
        }
    } else {
        None
    };

    renderer.run().context("Rendering failed")?;
    Ok(())
}

fn check(options: Options) -> Result<()> {
    init_logging(false)?;

    let mut renderer = Renderer::new(HeadlessBackend::new(), options.config_store());
    renderer.init()?;
    renderer.set_animation(Some(Animation::new(ScriptAnimation::new(&options.script))))?;

    let engine = renderer
        .animation()
        .map(Animation::engine)
        .context("No animation attached")?;
    eprintln!(
        "Built {} entities, {} information overlays and {} steps ({} ms) from {}",
        engine.entities().len(),
        engine.information().len(),
        engine.steps().len(),
        engine.sequence_end_ms(),
        options.script.display(),
    );
    Ok(())
}

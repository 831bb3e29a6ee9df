// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod data;
mod error;
mod events;
mod monitor;
mod settings;
mod source;
mod ui;

use app::App;
use data::duration::parse_duration;
use data::{Direction, Transition};
use monitor::{FlowMonitor, MonitorEvent};
use settings::{PolicyKind, Settings};
use source::{SamplerConfig, SourceControl, SourceEvent, SourceHub};

/// How often the TUI redraws and drains source events.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DirectionArg {
    Above,
    Below,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Above => Direction::Above,
            DirectionArg::Below => Direction::Below,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "drainwatch")]
#[command(about = "Terminal dashboard for drainage flow monitoring and clog detection")]
struct Args {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Flow meter endpoint (empty for synthetic data)
    #[arg(long)]
    flow_url: Option<String>,

    /// Drain camera stream (empty for mock)
    #[arg(long)]
    camera_url: Option<String>,

    /// Bot interface (empty for mock)
    #[arg(long)]
    bot_url: Option<String>,

    /// Clog threshold in L/min
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Threshold policy
    #[arg(long, value_enum)]
    policy: Option<PolicyKind>,

    /// Which side of the threshold is a fault (defaults from the policy)
    #[arg(long, value_enum)]
    direction: Option<DirectionArg>,

    /// Debounce window for the debounced policy (e.g., "5s")
    #[arg(long)]
    debounce: Option<String>,

    /// Sampling interval (e.g., "2s", "500ms")
    #[arg(short, long)]
    interval: Option<String>,

    /// Run without the terminal UI, logging to stderr
    #[arg(long)]
    headless: bool,

    /// Stop after this many samples (headless only)
    #[arg(long, requires = "headless")]
    ticks: Option<u64>,

    /// Write a JSON snapshot here on exit (headless only)
    #[arg(short, long, requires = "headless")]
    export: Option<PathBuf>,

    /// Log file used in TUI mode
    #[arg(long, default_value = "drainwatch.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let settings = resolve_settings(&args)?;
    let monitor = FlowMonitor::new(
        settings.endpoints(),
        settings.threshold,
        settings.policy(),
        settings.rounding,
    )?;
    info!(
        "Starting: threshold {} L/min, {:?}, sampling every {:?}",
        settings.threshold,
        settings.policy(),
        settings.update_interval
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
    let _guard = rt.enter();

    let hub = SourceHub::start(
        settings.timing(),
        SamplerConfig::new(settings.endpoints().flow_url, monitor.generation()),
    )?;

    if args.headless {
        rt.block_on(run_headless(Box::new(hub), monitor, args.ticks, args.export.as_deref()))
    } else {
        run_tui(Box::new(hub), monitor)
    }
}

/// Settings file and environment first, then command-line overrides.
fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref())?;

    if let Some(url) = &args.flow_url {
        settings.flow_url = url.clone();
    }
    if let Some(url) = &args.camera_url {
        settings.camera_url = url.clone();
    }
    if let Some(url) = &args.bot_url {
        settings.bot_url = url.clone();
    }
    if let Some(threshold) = args.threshold {
        settings.threshold = threshold;
    }
    if let Some(policy) = args.policy {
        settings.policy = policy;
    }
    if let Some(direction) = args.direction {
        settings.direction = Some(direction.into());
    }
    if let Some(debounce) = &args.debounce {
        settings.debounce = parse_duration(debounce).context("Invalid --debounce")?;
    }
    if let Some(interval) = &args.interval {
        settings.update_interval = parse_duration(interval).context("Invalid --interval")?;
    }

    settings.validate()?;
    Ok(settings)
}

/// The terminal belongs to the UI, so TUI mode logs to a file.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if args.headless {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
    } else {
        let file = File::create(&args.log_file)
            .with_context(|| format!("Failed to create log file {}", args.log_file.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

/// Drive the monitor without a terminal UI until Ctrl-C or `ticks` samples.
async fn run_headless(
    mut source: Box<dyn SourceControl>,
    mut monitor: FlowMonitor,
    ticks: Option<u64>,
    export: Option<&Path>,
) -> Result<()> {
    for request in monitor.probe_requests() {
        source.probe(request);
    }

    let mut samples = 0u64;
    let mut poll = tokio::time::interval(FRAME_INTERVAL);

    'outer: loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = poll.tick() => {
                while let Some(event) = source.poll() {
                    let is_sample = matches!(event, SourceEvent::Sample { .. });
                    for outcome in monitor.apply(event, Instant::now()) {
                        if let MonitorEvent::Reading(reading) = outcome {
                            info!(
                                "Flow {} L/min, zone {:?}, state {}",
                                reading.flow_rate,
                                monitor.zone(),
                                monitor.warning_state().label()
                            );
                        }
                    }
                    if is_sample {
                        samples += 1;
                        if ticks.is_some_and(|n| samples >= n) {
                            break 'outer;
                        }
                    }
                }
            }
        }
    }

    info!("Stopping after {} samples", samples);
    if let Some(path) = export {
        app::export_snapshot(&monitor, path)?;
        println!("Exported dashboard to: {}", path.display());
    }
    Ok(())
}

/// Run the TUI with the given source
fn run_tui(source: Box<dyn SourceControl>, monitor: FlowMonitor) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(source, monitor, ui::Theme::auto_detect());
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.pump(Instant::now());

        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(Event::Key(key)) = events::poll_event(FRAME_INTERVAL)? {
            events::handle_key_event(app, key);
        }
    }
    Ok(())
}

mod emotify;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::macros::format_description;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aerobot_fc::echo::EchoVehicle;
use aerobot_fc::{doctor as fc_doctor, ErrorReceiver, ExecutorReport, Session, SessionConfig, TerminationCause};
use aerobot_input::{doctor as input_doctor, InputConfig, SourceKind};
use aerobot_proto::Verbosity;
use aerobot_video::{doctor as video_doctor, VideoConfig, VideoPlayer, VideoSession};

use emotify::{Emotifier, Mood};

#[derive(Debug, Parser)]
#[command(name = "aerobot", version, about = "Aerobot - keyboard piloting for toy drones")]
struct Cli {
    /// TOML config; every field has a default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Per-direction move budget, 0 disables it.
    #[arg(long, global = true)]
    max_moves: Option<u32>,

    /// Step applied to moves and rotations.
    #[arg(long, global = true)]
    magnitude: Option<u32>,

    /// Prefix console messages with emoticons.
    #[arg(long, global = true)]
    emoji: bool,

    #[arg(long, global = true)]
    no_video: bool,

    #[arg(long, value_enum, global = true)]
    source: Option<SourceKind>,

    /// Command file for `--source script`.
    #[arg(long, global = true)]
    script: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Fly (default).
    Run,
    /// Validate the configuration and exit.
    Doctor,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Config {
    session: SessionConfig,
    video: VideoConfig,
    input: InputConfig,
}

impl Config {
    fn apply(&mut self, cli: &Cli) {
        if let Some(n) = cli.max_moves {
            self.session.max_moves = n;
        }
        if let Some(m) = cli.magnitude {
            self.session.magnitude = m;
        }
        if cli.no_video {
            self.video.enable = false;
        }
        if let Some(s) = cli.source {
            self.input.source = s;
        }
        if let Some(p) = &cli.script {
            self.input.script = Some(p.clone());
            if cli.source.is_none() {
                self.input.source = SourceKind::Script;
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else { return Ok(Config::default()); };
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    toml::from_str(&s).context("parse config toml")
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbosity {
            Verbosity::NonVerbose => "info",
            Verbosity::Verbose => "debug",
            Verbosity::VeryVerbose => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_count(cli.verbose);
    init_tracing(verbosity);

    let mut cfg = load_config(cli.config.as_deref())?;
    cfg.apply(&cli);
    let say = Emotifier::new(cli.emoji);

    match cli.cmd.unwrap_or(Cmd::Run) {
        Cmd::Doctor => doctor(&cfg),
        Cmd::Run => run(&cfg, verbosity, say).await,
    }
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");
    fc_doctor::check_session(&cfg.session)?;
    video_doctor::check_video(&cfg.video)?;
    input_doctor::check_input(&cfg.input, cfg.session.settle())?;
    info!("doctor: OK");
    Ok(())
}

async fn run(cfg: &Config, verbosity: Verbosity, say: Emotifier) -> Result<()> {
    info!("run: starting");
    let vehicle = Arc::new(EchoVehicle::new());

    // Subscribe before connecting so the connection event reaches the video session.
    let video = if cfg.video.enable {
        match start_video(vehicle.clone(), &cfg.video) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("run: video disabled: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let (source, input) = aerobot_input::open_source(
        &cfg.input,
        verbosity,
        cfg.session.queue_capacity,
        cfg.session.settle() * 2,
    )
    .await
    .context("open command source")?;

    let mut session = Session::start(vehicle, source, &cfg.session)?;
    say.say(Mood::Happy, "connected, ready for commands");

    let errors = session.take_errors().context("error channel already taken")?;
    let reporter = tokio::spawn(report_errors(errors, say));

    let mut video_tasks = Vec::new();
    if let Some((video, player, sink)) = video {
        let stats = video.spawn(sink, session.monitor());
        let player = tokio::spawn(player.supervise(session.monitor()));
        video_tasks.push((stats, player));
    }

    let terminator = session.terminator();
    let mut monitor = session.monitor();
    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() && terminator.terminate(TerminationCause::Forced) {
                    warn!("run: interrupted, landing");
                }
            }
            _ = monitor.wait() => {}
        }
    });

    let report = session.join().await?;
    if let Err(e) = reporter.await {
        warn!("run: error reporter failed: {}", e);
    }
    for (stats, player) in video_tasks {
        match stats.await {
            Ok(s) => info!("run: video forwarded {} frames ({} bytes)", s.frames, s.bytes),
            Err(e) => warn!("run: video task failed: {}", e),
        }
        match player.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("run: video player: {:#}", e),
            Err(e) => warn!("run: video player task failed: {}", e),
        }
    }
    input.abort();

    summarize(&report, say);
    Ok(())
}

fn start_video(
    vehicle: Arc<EchoVehicle>,
    cfg: &VideoConfig,
) -> Result<(VideoSession<EchoVehicle>, VideoPlayer, tokio::process::ChildStdin)> {
    let video = VideoSession::subscribe(vehicle, cfg)?;
    let (player, sink) = VideoPlayer::spawn(cfg)?;
    Ok((video, player, sink))
}

async fn report_errors(mut errors: ErrorReceiver, say: Emotifier) {
    let fmt = format_description!("[hour]:[minute]:[second]");
    while let Some(rec) = errors.recv().await {
        let at = rec.at.format(&fmt).unwrap_or_default();
        say.say(Mood::Sad, &format!("[{}] {}", at, rec));
    }
}

fn summarize(report: &ExecutorReport, say: Emotifier) {
    info!(
        "run: {} dispatched, {} dropped by the move limit, {} failed",
        report.dispatched, report.dropped, report.failed
    );
    let msg = match report.cause {
        Some(TerminationCause::Forced) => "interrupted, vehicle halted",
        _ => "bye",
    };
    let mood = if report.failed > 0 { Mood::Worried } else { Mood::Bye };
    say.say(mood, msg);
}

mod script;

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use instrument_echo_core::{
    Clock, ControlMode, FrameInput, GameConfig, GameSession, InstrumentCatalog, ManualClock,
    MultiplayerSession, PlaygroundSession, SequenceGenerator, Session, SilentSoundBank, StateTag,
};
use tracing_subscriber::EnvFilter;

fn main() -> instrument_echo_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    let catalog = match &cli.catalog {
        Some(path) => InstrumentCatalog::from_json_file(path)?,
        None => InstrumentCatalog::default(),
    };
    let sound = Box::new(SilentSoundBank::uniform(
        catalog.len(),
        Duration::from_millis(cli.clip_ms),
    ));

    match cli.command {
        Commands::Challenge {
            script,
            control,
            seed,
            level,
        } => {
            if let Some(control) = control {
                config.control = control.into();
            }
            if seed.is_some() {
                config.seed = seed;
            }
            let generator = SequenceGenerator::for_catalog(&catalog, config.seed)?;
            let mut session =
                GameSession::with_generator(catalog, &config, generator, sound, level)?;
            replay(&mut session, &script::load(&script)?)
        }
        Commands::Multiplayer {
            script,
            players,
            starting_level,
        } => {
            if let Some(level) = starting_level {
                config.multiplayer.starting_level = level;
            }
            let mut session = MultiplayerSession::new(players, catalog, &config, sound)?;
            replay(&mut session, &script::load(&script)?)?;
            for (place, entry) in session.ranking().iter().enumerate() {
                tracing::info!(
                    place = place + 1,
                    player = %entry.name,
                    score = entry.score,
                    "final ranking"
                );
            }
            Ok(())
        }
        Commands::Playground { script, log } => {
            if let Some(log) = log {
                config.playground.log_path = log;
            }
            let mut session = PlaygroundSession::new(catalog, &config, sound)?;
            replay(&mut session, &script::load(&script)?)
        }
        Commands::Catalog => {
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            Ok(())
        }
    }
}

/// Feeds every frame through the session on a manual clock, then prints the
/// final snapshot as JSON.
fn replay(session: &mut dyn Session, frames: &[FrameInput]) -> instrument_echo_core::Result<()> {
    tracing::info!(frames = frames.len(), "replaying script");
    let clock = ManualClock::new();
    let mut last_state: Option<StateTag> = None;

    for frame in frames {
        clock.set(frame.now);
        let input = FrameInput::sample(&clock, frame.cursor, frame.clicked);
        if let Some(feedback) = session.tick(&input)? {
            tracing::info!(at = ?input.now, ?feedback, "activation");
        }

        let state = session.snapshot().state;
        if last_state != Some(state) {
            tracing::info!(at = ?clock.now(), ?state, "state changed");
            last_state = Some(state);
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless driver for the Instrument Echo game engine", long_about = None)]
struct Cli {
    /// Game configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Instrument catalog (JSON). The built-in six instruments otherwise.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Length of every simulated sound clip, in milliseconds.
    #[arg(long, global = true, default_value_t = 600)]
    clip_ms: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Single-player challenge: repeat ever longer sequences.
    Challenge {
        /// Input frames to replay (JSON array).
        #[arg(short, long)]
        script: PathBuf,
        #[arg(long, value_enum)]
        control: Option<ControlArg>,
        /// Seed for the sequence generator.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 1)]
        level: u32,
    },
    /// Players take turns composing and guessing sequences.
    Multiplayer {
        #[arg(short, long)]
        script: PathBuf,
        /// Comma-separated player names, in turn order.
        #[arg(long, value_delimiter = ',', required = true)]
        players: Vec<String>,
        #[arg(long)]
        starting_level: Option<u32>,
    },
    /// Free play; every note goes to the CSV note log.
    Playground {
        #[arg(short, long)]
        script: PathBuf,
        /// Note log path, overriding the configuration.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Print the instrument catalog as JSON.
    Catalog,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ControlArg {
    /// Hold the pointer over an instrument.
    Dwell,
    /// Click an instrument.
    Click,
}

impl From<ControlArg> for ControlMode {
    fn from(arg: ControlArg) -> Self {
        match arg {
            ControlArg::Dwell => ControlMode::Dwell,
            ControlArg::Click => ControlMode::Click,
        }
    }
}

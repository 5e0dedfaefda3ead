use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use jf_clients::ClientDirectory;
use jf_core::{seeded_rng, Archetype, ClientId, FailureReason};
use jf_generator::{GenerateOptions, MissionGenerator};
use jf_runner::{doctor, simulate, Config, Session, SimulationPlan};

#[derive(Parser)]
#[command(name = "jobforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config to .jobforge/jobforge.toml
    Init {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Check the config and catalogs can sustain a pool
    Doctor,

    /// Print the visible pool as JSON
    Pool {
        /// Advance the clock this many ticks first
        #[arg(long, default_value_t = 0)]
        ticks: u32,
    },

    /// Print pool statistics as JSON
    Stats,

    /// Run a scripted session and print its summary
    Simulate {
        #[arg(long, default_value_t = 24)]
        ticks: u32,
        /// Minutes per tick; defaults to engine.tick_minutes
        #[arg(long)]
        minutes: Option<u32>,
        /// Fail every n-th settled job
        #[arg(long)]
        fail_every: Option<u32>,
        /// deadline, filesDeleted or incomplete
        #[arg(long, default_value = "incomplete")]
        fail_reason: FailureReason,
    },

    /// Generate one job for a client and print it as JSON
    Generate {
        client: String,
        /// repair, backup or transfer; weighted random when absent
        #[arg(long)]
        archetype: Option<Archetype>,
        /// Force a time limit on or off
        #[arg(long)]
        timed: Option<bool>,
    },

    /// List storyline templates
    Storylines,

    /// List clients, marking those open at the configured reputation
    Clients,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let root = std::env::current_dir()?;
    let cfg_path = Config::config_path(&root);

    match cli.cmd {
        Command::Init { seed, force } => {
            if cfg_path.exists() && !force {
                anyhow::bail!("{} already exists; pass --force to overwrite", cfg_path.display());
            }
            Config::default_for_seed(seed).save_to(&cfg_path)?;
            println!("Wrote {}", cfg_path.display());
        }
        Command::Doctor => {
            let cfg = Config::load_or_default(&cfg_path)?;
            doctor(&root, &cfg)?;
            println!("OK");
        }
        Command::Pool { ticks } => {
            let cfg = Config::load_or_default(&cfg_path)?;
            let directory = cfg.load_directory(&root)?;
            let catalog = cfg.load_catalog(&root)?;
            let mut session = Session::open(&cfg, &directory, &catalog)?;
            for _ in 0..ticks {
                session.tick(cfg.engine.tick_minutes);
            }
            println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        }
        Command::Stats => {
            let cfg = Config::load_or_default(&cfg_path)?;
            let directory = cfg.load_directory(&root)?;
            let catalog = cfg.load_catalog(&root)?;
            let session = Session::open(&cfg, &directory, &catalog)?;
            println!("{}", serde_json::to_string_pretty(&session.stats())?);
        }
        Command::Simulate { ticks, minutes, fail_every, fail_reason } => {
            let cfg = Config::load_or_default(&cfg_path)?;
            let directory = cfg.load_directory(&root)?;
            let catalog = cfg.load_catalog(&root)?;
            let plan = SimulationPlan {
                ticks,
                minutes_per_tick: minutes.unwrap_or(cfg.engine.tick_minutes),
                fail_every,
                fail_reason,
            };
            info!(?plan, "simulating");
            let summary = simulate(&cfg, &directory, &catalog, &plan)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Generate { client, archetype, timed } => {
            let cfg = Config::load_or_default(&cfg_path)?;
            let directory = cfg.load_directory(&root)?;
            let generator = MissionGenerator::new(&directory).with_timed_chance(cfg.engine.timed_chance);
            let options = GenerateOptions { archetype, timed, timed_chance: generator.timed_chance() };
            let mut rng = seeded_rng(cfg.engine.seed);
            let job = generator
                .generate_mission(&ClientId::from_str(client.as_str()), &options, 0, &mut rng)
                .ok_or_else(|| anyhow::anyhow!("no client with id {client}"))?;
            println!("{}", serde_json::to_string_pretty(&job)?);
        }
        Command::Storylines => {
            let cfg = Config::load_or_default(&cfg_path)?;
            let catalog = cfg.load_catalog(&root)?;
            for s in catalog.storylines() {
                let steps: Vec<&str> = s.mission_sequence.iter().map(|step| step.archetype.as_str()).collect();
                println!("- {} \"{}\" [{}] {}", s.id, s.name, steps.join(" -> "), s.description);
            }
        }
        Command::Clients => {
            let cfg = Config::load_or_default(&cfg_path)?;
            let directory = cfg.load_directory(&root)?;
            for c in directory.all_clients() {
                let mark = if c.is_accessible(cfg.engine.reputation) { "open" } else { "locked" };
                println!("- {} {} ({}, rep {}) [{}]", c.id, c.name, c.industry, c.min_reputation, mark);
            }
        }
    }

    Ok(())
}

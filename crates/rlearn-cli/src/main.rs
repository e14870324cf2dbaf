//! rlearn CLI
//!
//! Command-line interface for running the training loop on the built-in
//! environments with a random agent.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rlearn::agent::RandomAgent;
use rlearn::checkpoint::{CheckpointPolicy, FinalModelConfig};
use rlearn::i18n::Translator;
use rlearn::log::ConsoleLogger;
use rlearn::training::{
    OrchestratorConfig, SmoothingMethod, StoppingConfig, TrainingOrchestrator, TrainingSummary,
};
use rlearn::vector::{Serial, VecEnvBackend};
use rlearn_envs::{describe, Bandit, CartPole, Corridor, ENV_NAMES};

#[derive(Parser)]
#[command(name = "rlearn")]
#[command(version, about = "rlearn - Vectorized online training with early stopping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a random agent on a batch of environments
    Train {
        /// Environment name
        #[arg(default_value = "cartpole")]
        env: String,

        /// Number of environments
        #[arg(long, default_value = "4")]
        num_envs: usize,

        /// Maximum number of epochs
        #[arg(long, default_value = "10")]
        epochs: usize,

        /// Batched steps per epoch
        #[arg(long, default_value = "100")]
        steps_per_epoch: usize,

        /// Seed for the environment reset and the agent
        #[arg(long, default_value = "42")]
        seed: u64,

        #[command(flatten)]
        stopping: StoppingArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List available environments
    List,
}

/// Early-stopping flags, applied on top of `--config`
#[derive(Args)]
struct StoppingArgs {
    /// JSON file with a stopping configuration
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    max_episodes: Option<u64>,

    #[arg(long)]
    max_total_steps: Option<u64>,

    /// Wall-clock limit in seconds
    #[arg(long)]
    max_runtime: Option<f64>,

    /// Stop once the smoothed reward reaches this value
    #[arg(long)]
    target_reward: Option<f64>,

    /// Every reward in the window must be at least this for the target to count
    #[arg(long)]
    min_reward: Option<f64>,

    /// Stop once the smoothed reward exceeds this value
    #[arg(long)]
    max_reward: Option<f64>,

    /// Rolling window size in episodes
    #[arg(long)]
    window: Option<usize>,

    /// Full-window evaluations without improvement before stopping
    #[arg(long)]
    patience: Option<u64>,

    /// Smoothing method (sma, ema)
    #[arg(long)]
    smoothing: Option<String>,

    #[arg(long)]
    ema_alpha: Option<f64>,
}

impl StoppingArgs {
    fn build(&self) -> Result<StoppingConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                StoppingConfig::from_json(&json)?
            }
            None => StoppingConfig::default(),
        };

        if let Some(v) = self.max_episodes {
            config = config.with_max_episodes(v);
        }
        if let Some(v) = self.max_total_steps {
            config = config.with_max_total_steps(v);
        }
        if let Some(v) = self.max_runtime {
            config = config.with_max_runtime(v);
        }
        if let Some(v) = self.target_reward {
            config = config.with_target_reward(v);
        }
        if let Some(v) = self.min_reward {
            config = config.with_min_reward(v);
        }
        if let Some(v) = self.max_reward {
            config = config.with_max_reward(v);
        }
        if let Some(v) = self.window {
            config = config.with_window(v);
        }
        if let Some(v) = self.patience {
            config = config.with_patience(v);
        }
        if let Some(method) = &self.smoothing {
            config.smoothing_method = method.parse::<SmoothingMethod>()?;
        }
        if let Some(alpha) = self.ema_alpha {
            config.ema_alpha = alpha;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Where results go and how they are reported
#[derive(Args)]
struct OutputArgs {
    /// Checkpoint directory
    #[arg(long, default_value = "checkpoints")]
    checkpoint_dir: PathBuf,

    /// Save a checkpoint every N episodes
    #[arg(long)]
    checkpoint_every: Option<u64>,

    /// Keep only the last N checkpoints (0 keeps all)
    #[arg(long, default_value = "0")]
    keep_last: usize,

    /// Final model directory
    #[arg(long, default_value = "final_model")]
    final_dir: PathBuf,

    /// Final model file name, generated when absent
    #[arg(long)]
    final_name: Option<String>,

    /// Log metrics every N epochs
    #[arg(long, default_value = "10")]
    log_interval: usize,

    /// Message language (en, zh)
    #[arg(long, default_value = "en")]
    lang: String,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            env,
            num_envs,
            epochs,
            steps_per_epoch,
            seed,
            stopping,
            output,
        } => {
            let stopping = stopping.build()?;
            train(&env, num_envs, epochs, steps_per_epoch, seed, stopping, &output)?;
        }
        Commands::List => {
            list_envs();
        }
    }

    Ok(())
}

fn make_backend(env_name: &str, num_envs: usize) -> Result<Box<dyn VecEnvBackend>> {
    if num_envs == 0 {
        bail!("--num-envs must be at least 1");
    }
    let backend: Box<dyn VecEnvBackend> = match env_name {
        "bandit" => Box::new(Serial::new(|| Bandit::new(4), num_envs)),
        "cartpole" => Box::new(Serial::new(CartPole::new, num_envs)),
        "corridor" => Box::new(Serial::new(Corridor::default, num_envs)),
        other => bail!("Unknown environment: {}. Use 'rlearn list' to see available environments.", other),
    };
    Ok(backend)
}

fn train(
    env_name: &str,
    num_envs: usize,
    epochs: usize,
    steps_per_epoch: usize,
    seed: u64,
    stopping: StoppingConfig,
    output: &OutputArgs,
) -> Result<()> {
    tracing::info!(
        env = env_name,
        num_envs,
        epochs,
        steps_per_epoch,
        seed,
        "Starting training"
    );

    let backend = make_backend(env_name, num_envs)?;
    let agent = RandomAgent::new(backend.action_space(), seed);

    let mut final_model = FinalModelConfig::new(&output.final_dir).with_extension("json");
    if let Some(name) = &output.final_name {
        final_model = final_model.with_name(name);
    }
    let config = OrchestratorConfig::default()
        .with_seed(seed)
        .with_log_interval(output.log_interval)
        .with_progress(output.progress)
        .with_final_model(final_model);

    let mut checkpoints = CheckpointPolicy::new(&output.checkpoint_dir)
        .keep_last(output.keep_last)
        .with_extension("json");
    if let Some(every) = output.checkpoint_every {
        checkpoints = checkpoints.every(every);
    }

    let translator = Translator::new(output.lang.as_str());
    let mut orchestrator = TrainingOrchestrator::new(agent)
        .with_env(backend)
        .with_config(config)
        .with_logger(Box::new(ConsoleLogger::new()))
        .with_translator(translator.clone());

    let summary = orchestrator.run(epochs, steps_per_epoch, stopping, checkpoints)?;
    print_summary(&summary, &translator, output.json)
}

fn print_summary(summary: &TrainingSummary, translator: &Translator, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!();
    println!("{}: {}", translator.translate("exit_reason"), translator.exit_reason(summary.exit_reason));
    println!("  Episodes:    {}", summary.total_episodes);
    println!("  Steps:       {}", summary.total_steps);
    println!("  Epochs:      {}", summary.epochs_run);
    println!("  Duration:    {:.2}s", summary.duration_seconds);
    match summary.best_avg_reward {
        Some(best) => println!("  Best reward: {:.3}", best),
        None => println!("  Best reward: n/a"),
    }
    println!("  Final model: {}", summary.final_model_path.display());
    Ok(())
}

fn list_envs() {
    println!("Available environments:");
    println!();
    for name in ENV_NAMES {
        println!("  {:<10} {}", name, describe(name).unwrap_or(""));
    }
}

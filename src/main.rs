//! vanswitch - relay board control from a terminal.
//!
//! A thin harness over the core: scan for boards, run the poll loop and
//! print button state, or dump what was persisted. A phone UI would sit on
//! the same `AppController` surface this binary drives.

use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use vanswitch::storage::{KEY_BOARD_IPS, KEY_BUTTONS};
use vanswitch::{
    AppConfig, AppController, RelayButton, Storage, DEFAULT_EVICTION_THRESHOLD,
    DEFAULT_POLL_INTERVAL_MS,
};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "vanswitch")]
#[command(about = "🚐 vanswitch - relay board discovery and control")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Discovers relay-switch boards on the local subnet, keeps their \
state in sync, and persists your button customizations")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Subnet prefix probed during scans, including the trailing dot
    #[arg(long, default_value = "192.168.10.")]
    subnet: String,

    /// First host octet probed when no boards are known
    #[arg(long, default_value_t = 11)]
    range_start: u8,

    /// Last host octet probed when no boards are known
    #[arg(long, default_value_t = 25)]
    range_end: u8,

    /// Status poll interval in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    interval: u64,

    /// Consecutive missed checks before a board is dropped
    #[arg(long, default_value_t = DEFAULT_EVICTION_THRESHOLD)]
    eviction_threshold: u32,

    /// Persistence directory (platform config dir by default)
    #[arg(long)]
    storage_dir: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load or discover boards, then poll and print state (default)
    Run(RunArgs),

    /// Run a single discovery scan and exit
    Scan,

    /// Print the persisted boards and buttons and exit
    Status(StatusArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Seconds between state printouts
    #[arg(long, default_value_t = 5)]
    print_every: u64,
}

#[derive(Args)]
struct StatusArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;
    print_banner();

    let controller = AppController::new(build_config(&cli))?;

    match &cli.command {
        Some(Commands::Scan) => scan_command(&controller).await?,
        Some(Commands::Status(args)) => status_command(&cli, args).await?,
        Some(Commands::Run(args)) => run_command(&controller, args).await?,
        None => {
            let run_args = RunArgs { print_every: 5 };
            run_command(&controller, &run_args).await?;
        }
    }

    Ok(())
}

fn build_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::new()
        .with_subnet_prefix(cli.subnet.clone())
        .with_scan_range(cli.range_start, cli.range_end)
        .with_poll_interval_ms(cli.interval)
        .with_eviction_threshold(cli.eviction_threshold);

    if let Some(dir) = &cli.storage_dir {
        config = config.with_storage_dir(dir.clone());
    }

    config
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn print_banner() {
    println!("🚐 vanswitch - relay board control");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
}

async fn scan_command(controller: &AppController) -> anyhow::Result<()> {
    println!("Scanning for boards...");

    let progress_task = {
        let controller = controller.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(250)).await;
                let pct = controller.scan_progress();
                print!("\r  {}%", pct);
                use std::io::Write;
                let _ = std::io::stdout().flush();
                if pct >= 100 {
                    break;
                }
            }
        })
    };

    controller.scan().await?;
    let _ = progress_task.await;
    println!();

    print_state(controller).await;
    Ok(())
}

async fn run_command(controller: &AppController, args: &RunArgs) -> anyhow::Result<()> {
    info!("Starting vanswitch core...");

    controller.load_saved().await;
    let poll_task = controller.spawn_poller();
    info!("Polling started");

    let mut printer = tokio::time::interval(Duration::from_secs(args.print_every.max(1)));
    loop {
        tokio::select! {
            _ = printer.tick() => {
                print_state(controller).await;
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    controller.shutdown();
    poll_task.await?;
    Ok(())
}

/// Print what is on disk without scanning or polling.
async fn status_command(cli: &Cli, args: &StatusArgs) -> anyhow::Result<()> {
    let storage = match &cli.storage_dir {
        Some(dir) => Storage::new(dir.clone()),
        None => Storage::default_location()?,
    };
    let boards: Vec<String> = storage.load(KEY_BOARD_IPS)?.unwrap_or_default();
    let buttons: Vec<RelayButton> = storage.load(KEY_BUTTONS)?.unwrap_or_default();

    match args.format.as_str() {
        "json" => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "boards": boards,
                    "buttons": buttons,
                }))?
            );
        }
        "pretty" => {
            println!("Boards ({}):", boards.len());
            for address in &boards {
                println!("  {}", address);
            }
            println!("Buttons ({}):", buttons.len());
            for button in &buttons {
                println!(
                    "  [{}] {} @ {}{}{}",
                    if button.effective_on() { "ON " } else { "off" },
                    button.label(),
                    button.board_address,
                    if button.reversed { " (reversed)" } else { "" },
                    if button.hidden { " (hidden)" } else { "" }
                );
            }
        }
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

async fn print_state(controller: &AppController) {
    let boards = controller.board_addresses().await;
    let buttons = controller.visible_buttons().await;
    let hidden = controller.hidden_count().await;

    println!();
    println!("Boards ({}):", boards.len());
    for address in &boards {
        println!("  {}", address);
    }

    println!("Buttons ({} visible, {} hidden):", buttons.len(), hidden);
    for button in &buttons {
        println!(
            "  [{}] {} @ {}{}",
            if button.effective_on() { "ON " } else { "off" },
            button.label(),
            button.board_address,
            if button.reversed { " (reversed)" } else { "" }
        );
    }

    println!("Messages:");
    for message in controller.messages().await.iter().take(5) {
        println!("  {} {}", message.time.format("%H:%M:%S"), message.text);
    }
}

//! Header Mine Sim - Main Application
//!
//! Interactive console over the mining engine. Reads commands from stdin and
//! prints one line per mining cycle.

use header_mine_sim::{
    utils::init_logging, BlockHeader, ChannelPollControl, ChannelSink, Config, DisplayHash,
    Error, HeaderBuffer, MineScheduler, MiningEvent, Result, SystemClock, APP_DESCRIPTION,
    APP_NAME, APP_VERSION,
};

use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// A console command
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsoleCommand {
    Start,
    Stop,
    Step,
    Tip(DisplayHash),
    /// Reload the configured header, or the given JSON header
    Load(Option<Box<BlockHeader>>),
    Status,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "start" => ConsoleCommand::Start,
            "stop" => ConsoleCommand::Stop,
            "step" | "s" => ConsoleCommand::Step,
            "tip" => ConsoleCommand::Tip(rest.parse()?),
            "load" if rest.is_empty() => ConsoleCommand::Load(None),
            "load" => ConsoleCommand::Load(Some(Box::new(serde_json::from_str(rest)?))),
            "status" => ConsoleCommand::Status,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => return Err(Error::misuse(format!("unknown command '{}'", other))),
        };
        Ok(command)
    }
}

/// Console session state
struct Console {
    config: Config,
    scheduler: MineScheduler,
}

impl Console {
    /// Run one command; returns false on quit
    async fn execute(&self, command: ConsoleCommand) -> Result<bool> {
        match command {
            ConsoleCommand::Start => self.scheduler.start()?,
            ConsoleCommand::Stop => self.scheduler.stop()?,
            ConsoleCommand::Step => self.scheduler.step_once()?,
            ConsoleCommand::Tip(tip) => self.scheduler.tip_follower().apply(tip)?,
            ConsoleCommand::Load(header) => {
                let header = match header {
                    Some(header) => *header,
                    None => self.config.block_header()?,
                };
                self.scheduler.load_header(header)?;
            }
            ConsoleCommand::Status => {
                let snapshot = self.scheduler.snapshot().await?;
                println!("state:  {}", snapshot.state);
                println!("header: {}", snapshot.header.to_header());
            }
            ConsoleCommand::Help => print_help(),
            ConsoleCommand::Quit => return Ok(false),
        }
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load and validate configuration
    let config = Config::load().await?;

    init_logging(&config.log_level.to_string(), config.log_json);

    if config.print_config {
        print_configuration(&config)?;
        return Ok(());
    }

    info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let header = config.block_header()?;
    let (sink, mut events) = ChannelSink::new();
    let (poll, mut poll_signals) = ChannelPollControl::new();

    let scheduler = MineScheduler::spawn_with(
        HeaderBuffer::from_header(&header),
        config.scheduler_config()?,
        Arc::new(sink),
        Arc::new(SystemClock),
        Arc::new(poll),
    );

    // In follow-tip mode a loaded header starts mining right away
    if config.follow_tip {
        scheduler.load_header(header)?;
    }

    let json_events = config.json_events;
    let max_cycles = config.max_cycles;
    let console = Console { config, scheduler };

    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut cycles: u64 = 0;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
            Some(event) = events.recv() => {
                print_event(&event, json_events)?;
                cycles += 1;
                if max_cycles.is_some_and(|max| cycles >= max) {
                    info!(cycles, "Cycle limit reached");
                    break;
                }
            }
            Some(signal) = poll_signals.recv() => {
                info!(?signal, "Tip polling");
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    let keep_going = match line.parse::<ConsoleCommand>() {
                        Ok(command) => console.execute(command).await?,
                        Err(e) => {
                            warn!("{}", e);
                            true
                        }
                    };
                    if !keep_going {
                        break;
                    }
                }
                None => {
                    stdin_open = false;
                    // Without a cycle limit there is nothing left to wait for
                    if max_cycles.is_none() {
                        break;
                    }
                }
            },
        }
    }

    let header = console.scheduler.shutdown().await?;
    info!(nonce = header.nonce(), header = %header.to_hex(), "Final header");

    Ok(())
}

/// Print one mining event
fn print_event(event: &MiningEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        println!("{}", event);
    }
    Ok(())
}

/// Print basic program information and the command list
fn print_help() {
    println!("{} v{}", APP_NAME, APP_VERSION);
    println!("{}", APP_DESCRIPTION);
    println!();
    println!("Commands:");
    println!("  start          begin periodic mining");
    println!("  stop           stop after the pending cycle");
    println!("  step           run a single cycle");
    println!("  tip <hex>      set the previous block hash (display order)");
    println!("  load [json]    reload the configured header, or load a JSON header");
    println!("  status         show state and header");
    println!("  quit           exit");
}

/// Print current configuration
fn print_configuration(config: &Config) -> Result<()> {
    let config_yaml = serde_yaml::to_string(config)?;
    println!("{}", config_yaml);
    Ok(())
}

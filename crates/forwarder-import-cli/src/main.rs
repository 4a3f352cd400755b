use anyhow::Context;
use clap::builder::NonEmptyStringValueParser;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use forwarder_import_core::config::{DEFAULT_BOT_CONFIG, DEFAULT_OUTPUT, DEFAULT_STATE};
use forwarder_import_core::{logging, Config, ImportProgress, Importer, LogLevel};

mod telegram;

use telegram::{TelegramBotLogin, TelegramSession};

/// Cause lines printed under a runtime failure
const MAX_TRACE: usize = 7;

#[derive(Parser, Debug)]
#[command(name = "forwarder-import")]
#[command(about = "Forwarder Telegram Bot Channel Import Tool")]
#[command(
    long_about = "Exports the unique images of a Telegram channel into a Forwarder import file.\n\n\
    The app_id and app_hash values can be generated via the Telegram API page at \
    https://my.telegram.org. Log in with any account that can read the target channel; \
    bot tokens cannot list channels."
)]
#[command(version)]
struct Cli {
    /// Name of the Channel to use
    #[arg(value_parser = NonEmptyStringValueParser::new())]
    channel_name: String,

    /// Telegram API "app_id" value
    #[arg(short = 'i', long = "app-id")]
    app_id: i32,

    /// Telegram API "app_hash" value
    #[arg(short = 'n', long = "app-hash", value_parser = NonEmptyStringValueParser::new())]
    app_hash: String,

    /// Name of the saved session state file, avoids logging in on every run
    #[arg(
        short,
        long,
        default_value = DEFAULT_STATE,
        value_parser = NonEmptyStringValueParser::new()
    )]
    state: String,

    /// Do not use a state file, overrides --state
    #[arg(long)]
    no_state: bool,

    /// Path to save the import file to
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Forwarder config used to resolve the channel's BotID, ignored with --bot
    #[arg(short, long, default_value = DEFAULT_BOT_CONFIG)]
    config: PathBuf,

    /// Numerical ID of the Bot assigned to the Channel import
    #[arg(short, long, default_value_t = 0)]
    bot: i64,

    /// Extra attempts for a failed media download
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn to_config(&self) -> Config {
        Config {
            channel_name: self.channel_name.clone(),
            output: self.output.clone(),
            bot_config: self.config.clone(),
            bot_id: self.bot,
            state: (!self.no_state).then(|| self.state.clone()),
            download_retries: self.retries,
            log_level: match self.verbose {
                0 => LogLevel::Info,
                1 => LogLevel::Debug,
                _ => LogLevel::Trace,
            },
            log_file: self.log_file.clone(),
            ..Config::default()
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.to_config();

    logging::init_logger(config.log_level.to_level_filter(), config.log_file.as_deref())
        .context("Failed to initialize logging")?;
    config.validate()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    let runtime = Arc::new(
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start network runtime")?,
    );

    let mut session = TelegramSession::connect(
        runtime.clone(),
        cli.app_id,
        &cli.app_hash,
        config.session_file(),
    )
    .context("Failed to open Telegram session")?;
    let login = TelegramBotLogin::new(runtime, cli.app_id, cli.app_hash.clone());

    let summary = Importer::new(&mut session)
        .with_progress(ImportProgress::new(config.progress_interval))
        .with_shutdown(shutdown)
        .run(&config, &login)?;

    info!(
        "Exported {} images from \"{}\" for BotID {} to {}",
        summary.stats.entries,
        summary.channel.name,
        summary.bot_id,
        summary.output.display()
    );
    Ok(())
}

// Printed help and version count as usage exits too
fn usage_status(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 2,
        _ => u8::try_from(err.exit_code()).unwrap_or(2),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(usage_status(&err));
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error during runtime: {}!", err);
            for cause in err.chain().skip(1).take(MAX_TRACE) {
                eprintln!("  caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}

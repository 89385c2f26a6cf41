mod config;
mod store;

use config::Config;
use store::{ConfigStore, FileStore, Key, UserSettings};

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use relatime_engine::{
    parse, render_reply, Anchor, ParseModes, RenderOptions, Style, TimeMatch, Zone,
};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

const LONG_ABOUT: &str = r##"
relatime finds dates, times and durations in chat messages and replies with
timestamps every reader sees in their own timezone.

RECOGNIZED EXPRESSIONS:
  Absolute:  today, tomorrow at 5pm, next Friday, Monday last, at 17:30,
             first day of next month, 2nd Tuesday of March, 3rd hour,
             back of 8, front of 9pm, midnight, noon, evening
  Relative:  in 2 hours, 5 minutes ago, 2 days from now, give me 10 mins,
             1h30m, next week, match in 15, invites in 10

EXAMPLES:
  relatime parse "see you tomorrow at 5pm"
  relatime parse --tz Europe/London --style plain "in 2 hours"
  relatime parse --json --now 2024-03-15T10:00:00Z "next friday"
  tail -f chat.log | relatime process --user 1234
  relatime config set 1234 timezone America/New_York

CONFIGURATION:
  Precedence: CLI args > per-user settings > Environment vars > Config file > Defaults

  Setting   | CLI flag   | Env var          | Default
  ----------|------------|------------------|---------
  timezone  | --tz       | RELATIME_TZ      | UTC
  mode      | --mode     | RELATIME_MODE    | both
  style     | --style    | RELATIME_STYLE   | discord
  code      | --code     | RELATIME_CODE    | false

  Config directory: relatime config path (override with RELATIME_CONFIG_DIR)"##;

#[derive(Parser)]
#[command(name = "relatime")]
#[command(version)]
#[command(about = "Find dates, times and durations in text and anchor them")]
#[command(long_about = LONG_ABOUT)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Parse one message and print the reply
    Parse {
        /// The message text
        #[arg(required = true, value_name = "TEXT")]
        text: Vec<String>,

        #[command(flatten)]
        options: MessageOptions,
    },

    /// Read messages from stdin, one per line, replying to each that mentions a time
    Process {
        #[command(flatten)]
        options: MessageOptions,
    },

    /// Show or change per-user settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct MessageOptions {
    /// Timezone: IANA name or UTC offset such as +05:30
    #[arg(long)]
    tz: Option<String>,

    /// Anchor time as RFC 3339 (default: the current time)
    #[arg(long, value_name = "RFC3339")]
    now: Option<String>,

    /// Expression families to look for: absolute, relative or both
    #[arg(long, short = 'm')]
    mode: Option<String>,

    /// Reply style: discord or plain
    #[arg(long, short = 's')]
    style: Option<String>,

    /// Append the raw timestamp markup to every line
    #[arg(long)]
    code: bool,

    /// Output matches as JSON (for scripting/piping)
    #[arg(long, short = 'j')]
    json: bool,

    /// Apply the settings stored for this user id
    #[arg(long, short = 'u')]
    user: Option<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print settings for a user (all of them when no key is given)
    Get {
        user: String,
        keys: Vec<String>,
    },

    /// Change a setting for a user; leave out the value to clear it
    Set {
        user: String,
        key: String,
        value: Option<String>,
    },

    /// Print the config directory
    Path,

    /// Write a default config file
    Init,
}

/// Everything a parse needs, after layering all configuration sources.
struct Settings {
    zone: Zone,
    now: Option<DateTime<Utc>>,
    modes: ParseModes,
    render: RenderOptions,
    json: bool,
}

impl Settings {
    fn anchor(&self) -> Anchor {
        match self.now {
            Some(now) => Anchor::new(now, self.zone),
            None => Anchor::current(self.zone),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::OFF,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    if level != LevelFilter::OFF {
        let filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Parse { text, options } => {
            let settings = resolve_settings(&options)?;
            let message = text.join(" ");
            let anchor = settings.anchor();
            let found = parse(&message, &anchor, settings.modes);
            print_matches(&found, &anchor, &settings)
        }
        Command::Process { options } => {
            let settings = resolve_settings(&options)?;
            process_lines(io::stdin().lock(), &settings)
        }
        Command::Config { action } => handle_config(action),
    }
}

/// Open the per-user store next to the config file.
fn open_store() -> Result<FileStore> {
    let dir = Config::dir().context("Cannot determine config directory")?;
    Ok(FileStore::open(dir.join(FileStore::FILE_NAME))?)
}

/// Merge CLI flags, user settings, environment and config file.
fn resolve_settings(options: &MessageOptions) -> Result<Settings> {
    let file_config = Config::load();
    if let Some(path) = Config::path() {
        if path.exists() {
            tracing::debug!("Loaded config from: {}", path.display());
        } else {
            tracing::trace!("No config file at: {}", path.display());
        }
    }

    let user = match &options.user {
        Some(id) => open_store()?.load(id)?,
        None => UserSettings::default(),
    };

    let zone = if let Some(tz) = &options.tz {
        tracing::debug!("timezone = {} (from CLI)", tz);
        Zone::parse(tz)?
    } else if let Some(zone) = user.zone() {
        tracing::debug!("timezone = {} (from user settings)", zone);
        zone
    } else {
        let tz = file_config.timezone();
        let source = file_config.source("RELATIME_TZ", file_config.timezone.is_some());
        tracing::debug!("timezone = {} (from {})", tz, source);
        Zone::parse(&tz).with_context(|| format!("timezone from {source}"))?
    };

    let base_modes = if let Some(mode) = &options.mode {
        tracing::debug!("mode = {} (from CLI)", mode);
        mode.parse::<ParseModes>()?
    } else {
        let mode = file_config.mode();
        let source = file_config.source("RELATIME_MODE", file_config.mode.is_some());
        tracing::debug!("mode = {} (from {})", mode, source);
        mode.parse::<ParseModes>()
            .with_context(|| format!("mode from {source}"))?
    };
    // An explicit --mode wins over stored switches.
    let modes = if options.mode.is_some() {
        base_modes
    } else {
        user.modes(base_modes)
    };

    let style = match &options.style {
        Some(style) => style.parse::<Style>(),
        None => file_config.style().parse::<Style>(),
    }
    .map_err(anyhow::Error::msg)?;
    tracing::debug!("style = {}", style);

    let now = options
        .now
        .as_deref()
        .map(|now| {
            DateTime::parse_from_rfc3339(now)
                .map(|t| t.with_timezone(&Utc))
                .with_context(|| format!("invalid --now '{now}'"))
        })
        .transpose()?;

    Ok(Settings {
        zone,
        now,
        modes,
        render: RenderOptions {
            style,
            include_code: options.code || file_config.code(),
        },
        json: options.json,
    })
}

fn print_matches(found: &[TimeMatch], anchor: &Anchor, settings: &Settings) -> Result<()> {
    let mut out = io::stdout().lock();
    if settings.json {
        writeln!(out, "{}", serde_json::to_string_pretty(found)?)?;
        return Ok(());
    }
    match render_reply(found, anchor.now(), settings.render) {
        Some(reply) => writeln!(out, "{reply}")?,
        None => tracing::debug!("no times found"),
    }
    Ok(())
}

/// Reply to every line of `input` that mentions a time. Lines without one
/// produce no output.
fn process_lines(input: impl BufRead, settings: &Settings) -> Result<()> {
    let mut out = io::stdout().lock();
    for line in input.lines() {
        let line = line.context("Failed to read stdin")?;
        let anchor = settings.anchor();
        let found = parse(&line, &anchor, settings.modes);
        if found.is_empty() {
            continue;
        }
        if settings.json {
            writeln!(out, "{}", serde_json::to_string(&found)?)?;
        } else if let Some(reply) = render_reply(&found, anchor.now(), settings.render) {
            writeln!(out, "{reply}")?;
        }
        out.flush()?;
    }
    Ok(())
}

fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { user, keys } => {
            let keys = if keys.is_empty() {
                Key::ALL.to_vec()
            } else {
                keys.iter()
                    .map(|k| k.parse::<Key>())
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };
            let store = open_store()?;
            for (key, value) in store.get(&user, &keys)? {
                println!("{key} = {}", value.as_deref().unwrap_or("(unset)"));
            }
        }
        ConfigAction::Set { user, key, value } => {
            let key = key.parse::<Key>()?;
            let mut store = open_store()?;
            store.set(&user, key, value.as_deref())?;
            match store.get(&user, &[key])?.remove(&key).flatten() {
                Some(stored) => println!("{key} = {stored}"),
                None => println!("{key} cleared"),
            }
        }
        ConfigAction::Path => {
            let dir = Config::dir().context("Cannot determine config directory")?;
            println!("{}", dir.display());
        }
        ConfigAction::Init => {
            let path = config::init_config().map_err(anyhow::Error::msg)?;
            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}

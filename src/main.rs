mod debug_report;

use chrono::NaiveDate;
use nextdue::calendar::parse_date;
use nextdue::config::{self, Config};
use nextdue::{Context, next_date_verbose_with, server};
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

fn main() {
    let command = match parse_args() {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let result = match command {
        Command::Next(args) => run_next(&args),
        Command::Serve => serve(),
    };
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

enum Command {
    Next(NextArgs),
    Serve,
}

struct NextArgs {
    date: String,
    repeat: String,
    now: Option<NaiveDate>,
    verbose: bool,
    color: bool,
}

fn run_next(args: &NextArgs) -> anyhow::Result<()> {
    let ctx = match args.now {
        Some(reference_date) => Context { reference_date },
        None => Context::default(),
    };
    let out = next_date_verbose_with(&args.date, &args.repeat, &ctx)?;
    if args.verbose {
        debug_report::print_run(&out, args.color);
    } else {
        println!("{}", out.date);
    }
    Ok(())
}

fn serve() -> anyhow::Result<()> {
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let config = Config::from_env();
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(server::run(config))
}

fn parse_args() -> Result<Command, String> {
    let mut args = std::env::args().skip(1);

    let Some(first) = args.next() else {
        return Err(format!("error: no command given\n\n{}", help_text()));
    };
    match first.as_str() {
        "-h" | "--help" => {
            print_help();
            std::process::exit(0);
        }
        "-V" | "--version" => {
            println!("nextdue {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
        "serve" => match args.next() {
            None => Ok(Command::Serve),
            Some(extra) => Err(format!("error: unexpected argument '{extra}' for serve")),
        },
        "next" => parse_next_args(args).map(Command::Next),
        other => Err(format!("error: unknown command '{other}'\n\n{}", help_text())),
    }
}

fn parse_next_args(mut args: impl Iterator<Item = String>) -> Result<NextArgs, String> {
    let mut date: Option<String> = None;
    let mut repeat: Option<String> = None;
    let mut now: Option<NaiveDate> = None;
    let mut verbose = false;
    let mut color = io::stdout().is_terminal();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            match inline.clone() {
                Some(value) => Ok(value),
                None => args.next().ok_or_else(|| format!("error: {name} expects a value")),
            }
        };

        match flag.as_str() {
            "--date" | "-d" => set_once(&mut date, value("--date")?, "--date")?,
            "--repeat" | "-r" => set_once(&mut repeat, value("--repeat")?, "--repeat")?,
            "--now" | "-n" => {
                let raw = value("--now")?;
                let parsed = parse_date(&raw);
                now = Some(parsed.ok_or_else(|| format!("error: invalid --now '{raw}' (expected YYYYMMDD)"))?);
            }
            "--verbose" | "-v" => verbose = true,
            "--color" => color = true,
            "--no-color" => color = false,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            _ => return Err(format!("error: unknown option '{arg}'")),
        }
    }

    let date = date.ok_or_else(|| format!("error: --date is required\n\n{}", help_text()))?;
    let repeat = repeat.ok_or_else(|| format!("error: --repeat is required\n\n{}", help_text()))?;
    Ok(NextArgs { date, repeat, now, verbose, color })
}

fn set_once(slot: &mut Option<String>, value: String, name: &str) -> Result<(), String> {
    if slot.is_some() {
        return Err(format!("error: {name} provided multiple times"));
    }
    *slot = Some(value);
    Ok(())
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "nextdue {version}

Task scheduler with recurring due dates.

Usage:
  nextdue next --date <YYYYMMDD> --repeat <rule> [OPTIONS]
  nextdue serve

Commands:
  next                       Print the next occurrence of a repeating task.
  serve                      Run the HTTP service (configured via TODO_* env vars).

Options for next:
  -d, --date <YYYYMMDD>      Anchor date of the task.
  -r, --repeat <rule>        Repeat rule: y | d <1..400> | w <1..7,...> | m <days> [months].
  -n, --now <YYYYMMDD>       Reference date. Default: today.
  -v, --verbose              Print a report with the parsed rule and search trace.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment (serve):
  TODO_PORT       Listen port (default {port}).
  TODO_DBFILE     SQLite database file (default {db}).
  TODO_PASSWORD   Shared password; unset leaves the API open.
  TODO_WEBDIR     Static files directory (default {web}).
  RUST_LOG        Log filter (default info).

Exit codes:
  0  Success.
  1  Rule evaluation or server error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        port = config::DEFAULT_PORT,
        db = config::DEFAULT_DB_FILE,
        web = config::DEFAULT_WEB_DIR,
    )
}

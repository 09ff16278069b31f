use subsync::parser::Parser;
use subsync::replay::{self, ReplayOpts};
use subsync::serialiser;

use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(about = "Replay a caption script against a simulated playhead")]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The script to read from. If not supplied, the script will be read from standard input.",
        default_value = "-"
    )]
    input: String,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to write the event log to. If not supplied, it will be written to standard output.",
        default_value = "-"
    )]
    output: String,
    #[arg(
        short,
        long,
        help = "Keep a timeline track alongside the synchronizer and list its markers at the end."
    )]
    track: bool,
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Log more detail to standard error. Repeat for more. RUST_LOG takes precedence."
    )]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("subsync={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let data = if cli.input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&cli.input)
            .context(format!("Failed to open input file: '{}'", cli.input))?
    };

    let mut parser = Parser::new();

    let commands = parser
        .parse(&data)
        .context(format!("Failed to parse script: '{}'", cli.input))?;

    let opts = ReplayOpts { track: cli.track };
    let report = replay::replay(commands, opts).context("Replay failed")?;

    if cli.output == "-" {
        let dst = io::stdout();
        serialiser::serialise(&report, dst.lock())?;
    } else {
        let dst = std::fs::File::create(&cli.output)
            .context(format!("Failed to create output file: '{}'", cli.output))?;
        serialiser::serialise(&report, dst)?;
    };

    Ok(())
}

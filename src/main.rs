use clap::Parser;
use std::io::Write;

use pixelate::cli::{self, Args, Command};
use pixelate::config::Config;

/// Set up env_logger. `RUST_LOG` wins over `-v`.
fn init_logger(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "[{style}{}{style:#} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

/// Load config file.
/// If --config is specified, require the file to exist.
/// Otherwise, fall back to defaults if the default config is missing or broken.
fn load_config(args: &Args) -> Config {
    if let Some(ref path) = args.config {
        match Config::load_from_explicit(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match Config::load(None) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                eprintln!("Using default settings.\n");
                Config::default()
            }
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    let result = match args.command {
        Command::Render(ref render_args) => {
            let config = load_config(&args);
            cli::run_render(render_args, &config).map(|output| {
                println!("Wrote {}", output.display());
            })
        }
        Command::Inspect { ref input, size } => {
            let config = load_config(&args);
            cli::run_inspect(input, size, &config)
        }
        Command::Config { ref action } => {
            cli::handle_config_action(action.clone(), args.config.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

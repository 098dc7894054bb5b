//! Command that prints one or '-n count' UUID strings
//!
//! Usage: uuidgen [-v v4|v5|v7] [-n count] [--ns namespace --name name] [--upper] [--no-hyphen]
//! [--braces]

use std::{env, io, io::Write, process::ExitCode};

use tracing_subscriber::EnvFilter;
use uuidgen_core::{FormatOption, FormatOptions, UuidVersion};

#[derive(Debug, Default)]
struct Options {
    version: UuidVersion,
    count: Option<usize>,
    namespace: Option<String>,
    name: Option<String>,
    format: FormatOptions,
}

fn main() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let opts = {
        let mut args = env::args();
        let program = args.next();
        match parse_args(args) {
            Ok(opts) => opts,
            Err(message) => {
                eprintln!("Error: {}", message);
                eprintln!(
                    "Usage: {} [-v v4|v5|v7] [-n count] [--ns namespace --name name] [--upper] [--no-hyphen] [--braces]",
                    program.as_deref().unwrap_or("uuidgen")
                );
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    let mut buf = io::BufWriter::new(io::stdout());
    for _ in 0..opts.count.unwrap_or(1) {
        let generated = match uuidgen_core::generate(
            opts.version,
            opts.namespace.as_deref(),
            opts.name.as_deref(),
            chrono::Utc::now(),
        ) {
            Ok(generated) => generated,
            Err(err) => {
                buf.flush()?;
                eprintln!("Error: {}", err);
                return Ok(ExitCode::FAILURE);
            }
        };
        writeln!(buf, "{}", opts.format.apply(&generated.value))?;
    }

    buf.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut opts = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-n" => {
                if opts.count.is_some() {
                    return Err("option 'n' given more than once".to_owned());
                }
                let n_arg = required_value(&mut args, "n")?;
                let Ok(c) = n_arg.parse() else {
                    return Err(format!("invalid argument to option 'n': '{}'", n_arg));
                };
                opts.count.replace(c);
            }
            "-v" => {
                let v_arg = required_value(&mut args, "v")?;
                let Ok(v) = v_arg.parse() else {
                    return Err(format!("invalid argument to option 'v': '{}'", v_arg));
                };
                opts.version = v;
            }
            "--ns" => opts.namespace = Some(required_value(&mut args, "ns")?),
            "--name" => opts.name = Some(required_value(&mut args, "name")?),
            "--upper" => opts.format = opts.format.with(FormatOption::Uppercase, true),
            "--no-hyphen" => opts.format = opts.format.with(FormatOption::Hyphen, false),
            "--braces" => opts.format = opts.format.with(FormatOption::Braces, true),
            _ => return Err(format!("unrecognized argument '{}'", arg)),
        }
    }
    Ok(opts)
}

fn required_value(args: &mut impl Iterator<Item = String>, option: &str) -> Result<String, String> {
    args.next()
        .ok_or_else(|| format!("argument to option '{}' missing", option))
}

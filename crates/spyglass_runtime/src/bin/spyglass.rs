//! Spyglass CLI entry point.

use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use spyglass_engine::config::parse_number;
use spyglass_engine::{EnvSource, HostModel, Settings};
use spyglass_foundation::Value;
use spyglass_runtime::{Inspector, OutputFormat, load_from_file};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// CLI configuration parsed from arguments.
#[allow(clippy::struct_excessive_bools)]
#[derive(Default)]
struct CliConfig {
    snapshot: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
    globals: bool,
    show_help: bool,
    show_version: bool,
    max_depth: Option<usize>,
    max_runtime: Option<u64>,
    max_calls: Option<u32>,
    min_memory: Option<u64>,
    memory_limit: Option<u64>,
    chunk_threshold: Option<usize>,
    chunk_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    no_protected: bool,
    no_private: bool,
    getters: bool,
    cli_budget: bool,
}

impl CliConfig {
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(depth) = self.max_depth {
            settings = settings.with_max_depth(depth);
        }
        if let Some(secs) = self.max_runtime {
            settings = settings.with_max_runtime_secs(secs);
        }
        if let Some(calls) = self.max_calls {
            settings = settings.with_max_calls(calls);
        }
        if let Some(mb) = self.min_memory {
            settings.min_memory_left_mb = mb;
        }
        if let Some(mb) = self.memory_limit {
            settings.memory_limit_mb = mb;
        }
        if let Some(bytes) = self.chunk_threshold {
            settings = settings.with_chunk_threshold(bytes);
        }
        if let Some(dir) = &self.chunk_dir {
            settings = settings.with_chunk_dir(dir);
        }
        if let Some(dir) = &self.log_dir {
            settings = settings.with_log_dir(dir);
        }
        if self.no_protected {
            settings = settings.with_protected(false);
        }
        if self.no_private {
            settings = settings.with_private(false);
        }
        if self.getters {
            settings = settings.with_getters(true);
        }
        if self.cli_budget {
            settings = settings.with_host_model(HostModel::Cli);
        }
        settings
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("SPYGLASS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn value_of<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, Box<dyn std::error::Error>> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value").into())
}

fn parse_args(args: &[String]) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "--json" => config.json = true,
            "--globals" => config.globals = true,
            "--no-protected" => config.no_protected = true,
            "--no-private" => config.no_private = true,
            "--getters" => config.getters = true,
            "--cli-budget" => config.cli_budget = true,
            flag @ "--max-depth" => config.max_depth = Some(parse_number(flag, value_of(args, &mut i, flag)?)?),
            flag @ "--max-runtime" => config.max_runtime = Some(parse_number(flag, value_of(args, &mut i, flag)?)?),
            flag @ "--max-calls" => config.max_calls = Some(parse_number(flag, value_of(args, &mut i, flag)?)?),
            flag @ "--min-memory" => config.min_memory = Some(parse_number(flag, value_of(args, &mut i, flag)?)?),
            flag @ "--memory-limit" => {
                config.memory_limit = Some(parse_number(flag, value_of(args, &mut i, flag)?)?);
            }
            flag @ "--chunk-threshold" => {
                config.chunk_threshold = Some(parse_number(flag, value_of(args, &mut i, flag)?)?);
            }
            flag @ "--chunk-dir" => config.chunk_dir = Some(PathBuf::from(value_of(args, &mut i, flag)?)),
            flag @ "--log-dir" => config.log_dir = Some(PathBuf::from(value_of(args, &mut i, flag)?)),
            flag @ ("-o" | "--output") => config.output = Some(PathBuf::from(value_of(args, &mut i, flag)?)),
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => {
                if config.snapshot.is_some() {
                    return Err(format!("unexpected argument: {path}").into());
                }
                config.snapshot = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(&args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("spyglass {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let path = config.snapshot.as_ref().ok_or("no snapshot given (see --help)")?;
    let snapshot = load_from_file(path)?;

    let format = if config.json { OutputFormat::Json } else { OutputFormat::Text };
    let inspector = Inspector::from_source(&EnvSource::new())
        .configure(|settings| config.apply(settings))
        .with_format(format);

    let mut session = inspector.session();
    session.inspect(&snapshot.host, &snapshot.name, &snapshot.root);
    if config.globals {
        session.inspect(&snapshot.host, "globals", &Value::Globals);
    }

    let report = match &config.output {
        Some(out) => {
            let file = File::create(out)
                .map_err(|e| format!("failed to create file '{}': {e}", out.display()))?;
            let mut writer = BufWriter::new(file);
            session.finish(&mut writer)?
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            let report = session.finish(&mut lock)?;
            lock.flush()?;
            report
        }
    };

    if let Some(log) = &report.log_file {
        eprintln!("diagnostics written to {}", log.display());
    }
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mSpyglass\x1b[0m - Inspect captured host value graphs

\x1b[1mUSAGE:\x1b[0m
    spyglass [OPTIONS] <SNAPSHOT>

\x1b[1mARGUMENTS:\x1b[0m
    <SNAPSHOT>    Host snapshot (.msgpack, or .json)

\x1b[1mOPTIONS:\x1b[0m
    -h, --help               Print help information
    -V, --version            Print version information
    -o, --output PATH        Write output to PATH instead of stdout
    --json                   Emit a JSON document
    --globals                Also inspect the globals table

\x1b[1mANALYSIS OPTIONS:\x1b[0m
    --no-protected           Hide protected members
    --no-private             Hide private members
    --getters                Derive values for getter methods

\x1b[1mLIMIT OPTIONS:\x1b[0m
    --max-depth N            Maximum nesting level
    --max-runtime SECS       Runtime limit (0 disables)
    --max-calls N            Inspections per session (0 disables)
    --memory-limit MB        Memory ceiling (default 0: headroom check off)
    --min-memory MB          Minimum memory headroom, used once a ceiling is set
    --cli-budget             Fresh budget for every top-level inspection

\x1b[1mOUTPUT OPTIONS:\x1b[0m
    --chunk-threshold BYTES  Spill fragments at least this large (0 disables)
    --chunk-dir PATH         Directory for spilled fragments
    --log-dir PATH           Also write diagnostics to a file in PATH

\x1b[1mENVIRONMENT:\x1b[0m
    SPYGLASS_<SETTING>       Any setting, e.g. SPYGLASS_MAX_NESTING_LEVEL=4
    SPYGLASS_LOG             Log filter, e.g. SPYGLASS_LOG=debug"
    );
}

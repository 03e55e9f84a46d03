// Idiomatic Rust CLI for cea708.
//
// Subcommands decode raw caption byte files to UTF-8 text and inspect the
// character catalog the decoder resolves against.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::charset::bank::{self, CharacterBank, CodeValue};
use crate::charset::catalog::{self, CatalogEntry, default_catalog};
use crate::decode::{DecodeOptions, Decoder, UnknownCodePolicy};
use crate::io::decode_stream;

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Code value parsing (hex, optional 0x prefix)
// ---------------------------------------------------------------------------

fn parse_code_value(s: &str) -> Result<CodeValue, String> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() {
        return Err("empty code value".into());
    }
    CodeValue::from_str_radix(digits, 16).map_err(|e| format!("invalid code value '{s}': {e}"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// CEA-708 closed caption character decoder.
#[derive(Parser, Debug)]
#[command(
    name = "cea708",
    version,
    about = "CEA-708 caption character decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Machine-readable JSON output.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Decode raw caption bytes to UTF-8 text.
    Decode(DecodeArgs),
    /// Print catalog entries.
    Table(TableArgs),
    /// Resolve individual code values.
    Lookup(LookupArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum UnknownArg {
    Skip,
    Replace,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BankArg {
    G0,
    G1,
    G2,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    /// Ascending code value.
    Code,
    /// Ascending UTF-8 bytes of the scalar (scanner order).
    Utf8,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Input caption byte file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output text file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Decode only (do not write output).
    #[arg(long = "check-only")]
    no_output: bool,

    /// Handling of codes with no mapping.
    #[arg(long = "on-unknown", value_enum, default_value_t = UnknownArg::Skip)]
    on_unknown: UnknownArg,

    /// Replacement character for `--on-unknown replace`.
    #[arg(long, default_value_t = char::REPLACEMENT_CHARACTER)]
    replacement: char,

    /// Decode TSP/NBTSP as ordinary and non-breaking spaces.
    #[arg(long = "transparent-spaces")]
    transparent_spaces: bool,

    /// Treat control commands as unknown codes instead of skipping them.
    #[arg(long = "strict-controls")]
    strict_controls: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TableArgs {
    /// Bank to print.
    #[arg(long, value_enum, default_value_t = BankArg::All)]
    bank: BankArg,

    /// Entry order.
    #[arg(long, value_enum, default_value_t = OrderArg::Code)]
    order: OrderArg,
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Hex code values, e.g. 0x1025 or 7f.
    #[arg(required = true, value_parser = parse_code_value)]
    codes: Vec<CodeValue>,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Decode,
    Table,
    Lookup,
    Config,
}

struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    no_output: bool,
    decode: DecodeOptions,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    bank: BankArg,
    order: OrderArg,
    codes: Vec<CodeValue>,
}

impl Options {
    fn new(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            use_stdout: false,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            no_output: false,
            decode: DecodeOptions::default(),
            input_file: None,
            output_file: None,
            bank: BankArg::All,
            order: OrderArg::Code,
            codes: Vec::new(),
        }
    }
}

fn unknown_policy(arg: UnknownArg, replacement: char) -> UnknownCodePolicy {
    match arg {
        UnknownArg::Skip => UnknownCodePolicy::Skip,
        UnknownArg::Replace => UnknownCodePolicy::Replace(replacement),
        UnknownArg::Abort => UnknownCodePolicy::Abort,
    }
}

fn resolve_options(cli: Cli) -> Options {
    match &cli.command {
        Cmd::Decode(args) => Options {
            use_stdout: args.stdout,
            no_output: args.no_output,
            decode: DecodeOptions {
                on_unknown: unknown_policy(args.on_unknown, args.replacement),
                transparent_spaces: args.transparent_spaces,
                skip_controls: !args.strict_controls,
            },
            input_file: args.input.clone().or_else(|| args.input_pos.clone()),
            output_file: args.output.clone().or_else(|| args.output_pos.clone()),
            ..Options::new(Command::Decode, &cli)
        },
        Cmd::Table(args) => Options {
            bank: args.bank,
            order: args.order,
            ..Options::new(Command::Table, &cli)
        },
        Cmd::Lookup(args) => Options {
            codes: args.codes.clone(),
            ..Options::new(Command::Lookup, &cli)
        },
        Cmd::Config => Options::new(Command::Config, &cli),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("cea708".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("cea708 version {version} (Rust)");

    let file_io = cfg!(feature = "file-io") as u8;
    let parallel = cfg!(feature = "parallel") as u8;
    let catalog = default_catalog();

    eprintln!("FILE_IO={file_io}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("EXT1={:#04X}", bank::EXT1);
    eprintln!("MUSIC_NOTE={:#04X}", bank::MUSIC_NOTE);
    eprintln!("CATALOG_ENTRIES={}", catalog.len());
    eprintln!("G2_ENTRIES={}", catalog::G2_TABLE.len());

    0
}

// ---------------------------------------------------------------------------
// Decode command
// ---------------------------------------------------------------------------

fn cmd_decode(opts: &Options) -> i32 {
    let reader: Box<dyn Read> = match &opts.input_file {
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(BufReader::with_capacity(BUF_SIZE, f)),
            Err(e) => {
                eprintln!("cea708: input file: {}: {e}", path.display());
                return 1;
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let writer: Box<dyn Write> = match (opts.no_output, opts.use_stdout, &opts.output_file) {
        (true, _, _) => Box::new(io::sink()),
        (false, true, _) | (false, false, None) => {
            Box::new(BufWriter::with_capacity(BUF_SIZE, io::stdout().lock()))
        }
        (false, false, Some(path)) => {
            if path.exists() && !opts.force {
                eprintln!(
                    "cea708: output file exists, use -f to overwrite: {}",
                    path.display()
                );
                return 1;
            }
            match File::create(path) {
                Ok(f) => Box::new(BufWriter::with_capacity(BUF_SIZE, f)),
                Err(e) => {
                    eprintln!("cea708: output file: {}: {e}", path.display());
                    return 1;
                }
            }
        }
    };

    let stats = match decode_stream(reader, writer, Decoder::with_options(opts.decode)) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("cea708: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "cea708: decoder: input size: {}, output size: {}, scalars: {}, unknown: {}, \
             replaced: {}, controls: {}",
            stats.input_size,
            stats.output_size,
            stats.decode.scalars,
            stats.decode.unknown,
            stats.decode.replaced,
            stats.decode.controls
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "decode",
            "input_size": stats.input_size,
            "output_size": stats.output_size,
            "scalars": stats.decode.scalars,
            "unknown": stats.decode.unknown,
            "replaced": stats.decode.replaced,
            "controls": stats.decode.controls,
            "output_sha256": stats.output_sha256.map(|d| hex(&d)),
        });
        eprintln!("{json:#}");
    }

    0
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Table command
// ---------------------------------------------------------------------------

fn table_entries(bank: BankArg, order: OrderArg) -> Vec<CatalogEntry> {
    let catalog = default_catalog();
    let mut entries: Vec<_> = match bank {
        BankArg::G0 => catalog.bank_entries(CharacterBank::G0).collect(),
        BankArg::G1 => catalog.bank_entries(CharacterBank::G1).collect(),
        BankArg::G2 => catalog.bank_entries(CharacterBank::G2).collect(),
        BankArg::All => catalog.entries().collect(),
    };
    if order == OrderArg::Utf8 {
        catalog::sort_for_scanner(&mut entries);
    }
    entries
}

/// Printable form of a scalar; C1-adjacent blanks are shown by name.
fn glyph(c: char) -> String {
    match c {
        '\u{A0}' => "NBSP".to_string(),
        '\u{AD}' => "SHY".to_string(),
        _ => c.to_string(),
    }
}

fn entry_json(e: &CatalogEntry) -> serde_json::Value {
    serde_json::json!({
        "code": format!("{:#06X}", e.code),
        "bank": e.bank().name(),
        "scalar": format!("U+{:04X}", u32::from(e.scalar)),
        "utf8": e.utf8().to_string(),
        "char": e.scalar.to_string(),
    })
}

fn cmd_table(opts: &Options) -> i32 {
    let entries = table_entries(opts.bank, opts.order);

    if opts.json_output {
        let json: Vec<_> = entries.iter().map(entry_json).collect();
        println!("{:#}", serde_json::Value::Array(json));
        return 0;
    }

    let mut out = BufWriter::new(io::stdout().lock());
    for e in &entries {
        let line = writeln!(
            out,
            "{:#06X}  {}  U+{:04X}  {:<9} {}",
            e.code,
            e.bank(),
            u32::from(e.scalar),
            e.utf8().to_string(),
            glyph(e.scalar)
        );
        if let Err(e) = line {
            eprintln!("cea708: write error: {e}");
            return 1;
        }
    }
    if let Err(e) = out.flush() {
        eprintln!("cea708: write error: {e}");
        return 1;
    }
    0
}

// ---------------------------------------------------------------------------
// Lookup command
// ---------------------------------------------------------------------------

fn cmd_lookup(opts: &Options) -> i32 {
    let catalog = default_catalog();
    let mut status = 0;
    let mut found = Vec::new();

    for &code in &opts.codes {
        match catalog.resolve(code) {
            Ok(scalar) => {
                let entry = CatalogEntry { code, scalar };
                if opts.json_output {
                    found.push(entry_json(&entry));
                } else {
                    println!(
                        "{:#06X}  U+{:04X}  {}  {}",
                        code,
                        u32::from(scalar),
                        entry.utf8(),
                        glyph(scalar)
                    );
                }
            }
            Err(e) => {
                if !opts.quiet {
                    eprintln!("cea708: {e}");
                }
                status = 1;
            }
        }
    }

    if opts.json_output {
        println!("{:#}", serde_json::Value::Array(found));
    }
    status
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run() -> ! {
    let cli = Cli::parse();

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let mut opts = resolve_options(cli);

    // Warn if -c overrides output filename.
    if opts.use_stdout
        && let Some(path) = opts.output_file.take()
        && !opts.quiet
    {
        eprintln!(
            "cea708: warning: -c option overrides output filename: {}",
            path.display()
        );
    }

    let exit_code = match opts.command {
        Command::Decode => cmd_decode(&opts),
        Command::Table => cmd_table(&opts),
        Command::Lookup => cmd_lookup(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

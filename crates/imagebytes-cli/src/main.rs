//! `imagebytes`: inspect, decode and synthesize ImageBytes buffers.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use bytes::Bytes;
use clap::{Parser, Subcommand, ValueEnum};
use imagebytes_cli::{CliError, pattern::Pattern, report};
use imagebytes_proto::{CodecConfig, CodecError, Decoder, ElementKind, Encoder, NarrowingPolicy};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[derive(Parser, Debug)]
#[command(name = "imagebytes")]
#[command(version, about = "Inspect, decode and synthesize ImageBytes camera frame buffers")]
struct Cli {
    /// Wire kind selection for implicit encodes
    #[arg(long, value_enum, default_value_t = NarrowingArg::Narrowest, global = true)]
    narrowing: NarrowingArg,

    /// Largest payload accepted when decoding, in MiB
    #[arg(long, default_value_t = 1024, global = true)]
    max_payload_mib: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header fields of a buffer
    Inspect {
        /// Buffer to read
        file: PathBuf,
    },

    /// Decode a buffer and summarize its array
    Decode {
        /// Buffer to read
        file: PathBuf,
    },

    /// Write a synthetic test-pattern frame
    Synth {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Declared element kind
        #[arg(long, value_enum, default_value_t = KindArg::Int32)]
        kind: KindArg,

        /// First extent
        #[arg(long, default_value_t = 640)]
        width: usize,

        /// Second extent
        #[arg(long, default_value_t = 480)]
        height: usize,

        /// Third extent; omit for a rank-2 frame
        #[arg(long)]
        planes: Option<usize>,

        /// Value of the last element
        #[arg(long, default_value_t = 255)]
        max: u64,

        /// Client transaction id
        #[arg(long, default_value_t = 0)]
        client_txn: u32,

        /// Server transaction id
        #[arg(long, default_value_t = 0)]
        server_txn: u32,

        /// Encode as this kind instead of narrowing
        #[arg(long, value_enum)]
        target: Option<KindArg>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NarrowingArg {
    Narrowest,
    PreserveSignedness,
    Disabled,
}

impl From<NarrowingArg> for NarrowingPolicy {
    fn from(arg: NarrowingArg) -> Self {
        match arg {
            NarrowingArg::Narrowest => Self::Narrowest,
            NarrowingArg::PreserveSignedness => Self::PreserveSignedness,
            NarrowingArg::Disabled => Self::Disabled,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Byte,
    Int16,
    #[value(name = "uint16")]
    UInt16,
    Int32,
    #[value(name = "uint32")]
    UInt32,
    Int64,
    #[value(name = "uint64")]
    UInt64,
    Single,
    Double,
    Object,
}

impl From<KindArg> for ElementKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Byte => Self::Byte,
            KindArg::Int16 => Self::Int16,
            KindArg::UInt16 => Self::UInt16,
            KindArg::Int32 => Self::Int32,
            KindArg::UInt32 => Self::UInt32,
            KindArg::Int64 => Self::Int64,
            KindArg::UInt64 => Self::UInt64,
            KindArg::Single => Self::Single,
            KindArg::Double => Self::Double,
            KindArg::Object => Self::Object,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = CodecConfig {
        narrowing: cli.narrowing.into(),
        max_payload_len: cli.max_payload_mib.saturating_mul(1 << 20),
    };
    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::Inspect { file } => {
            let bytes = read(&file)?;
            let decoder = Decoder::new(config);
            let meta = decoder.read_header(&bytes)?;
            let payload = decoder.read_payload(&bytes)?;
            report::write_header(&mut stdout, &meta, payload.len())?;
        },
        Command::Decode { file } => {
            let bytes = read(&file)?;
            match Decoder::new(config).decode_image(&bytes) {
                Ok(frame) => report::write_frame(&mut stdout, &frame)?,
                Err(CodecError::Remote { error_number, message }) => {
                    report::write_remote(&mut stdout, error_number, &message)?;
                },
                Err(err) => return Err(err.into()),
            }
        },
        Command::Synth { output, kind, width, height, planes, max, client_txn, server_txn, target } => {
            let pattern = Pattern { kind: kind.into(), width, height, planes, max };
            let image = pattern.build()?;
            let encoder = Encoder::new(&image).with_config(&config).transaction(client_txn, server_txn);
            let bytes = match target {
                Some(target) => encoder.encode_as(target.into())?,
                None => encoder.encode_auto()?,
            };
            write(&output, &bytes)?;
            info!(path = %output.display(), bytes = bytes.len(), "wrote synthetic frame");
        },
    }

    stdout.flush()?;
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })
}

fn write(path: &Path, bytes: &Bytes) -> Result<(), CliError> {
    fs::write(path, bytes).map_err(|source| CliError::Write { path: path.to_path_buf(), source })
}

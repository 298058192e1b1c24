use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, DATA_INVALID, USAGE};
use crate::output::OutputFormat;

pub mod clock;
pub mod decode;
pub mod drive;
pub mod encode;
pub mod listen;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a hex-encoded frame and print its contents.
    Decode(DecodeArgs),
    /// Frame a hex-encoded payload.
    Encode(EncodeArgs),
    /// Encode a drive command, optionally sending it to the robot.
    Drive(DriveArgs),
    /// Read frames from the robot and print them.
    Listen(ListenArgs),
    /// Sample the wrap-safe clock over an emulated 32-bit counter.
    Clock(ClockArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Drive(args) => drive::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Clock(args) => clock::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes in hex, e.g. "AA 55 03 01 02 03 03".
    #[arg(required = true, num_args = 1..)]
    pub frame: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Payload bytes in hex. Empty payloads are allowed.
    #[arg(num_args = 0..)]
    pub payload: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DriveArgs {
    /// Left wheel speed in mm/s.
    #[arg(long, allow_hyphen_values = true, requires = "right", conflicts_with_all = ["speed", "radius"])]
    pub left: Option<i16>,
    /// Right wheel speed in mm/s.
    #[arg(long, allow_hyphen_values = true, requires = "left")]
    pub right: Option<i16>,
    /// Forward speed in mm/s.
    #[arg(long, allow_hyphen_values = true)]
    pub speed: Option<i16>,
    /// Turn radius in mm (0 = straight, ±1 = in place).
    #[arg(long, allow_hyphen_values = true)]
    pub radius: Option<i16>,
    /// Serial device to send the command to. Without it the frame is only printed.
    #[arg(long, value_name = "PATH")]
    pub device: Option<PathBuf>,
    /// Baud rate.
    #[arg(long, default_value = "115200")]
    pub baud: u32,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial device the robot is attached to.
    #[arg(long, value_name = "PATH", env = "ROMI_DEVICE")]
    pub device: PathBuf,
    /// Baud rate.
    #[arg(long, default_value = "115200")]
    pub baud: u32,
    /// Per-read timeout (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub read_timeout: String,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Send a stop command before listening.
    #[arg(long)]
    pub init: bool,
}

#[derive(Args, Debug)]
pub struct ClockArgs {
    /// Number of samples to take.
    #[arg(long, default_value = "5")]
    pub samples: usize,
    /// Time between samples (e.g. 250ms, 1s).
    #[arg(long, default_value = "250ms")]
    pub interval: String,
    /// Raw counter value to start from. Defaults to just below the wrap.
    #[arg(long, default_value_t = u32::MAX - 500_000)]
    pub preload: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Parse hex bytes, ignoring whitespace and an optional `0x` on each word.
pub(crate) fn parse_hex(words: &[String]) -> CliResult<Vec<u8>> {
    let mut digits = String::new();
    for word in words.iter().flat_map(|w| w.split_whitespace()) {
        let word = word
            .strip_prefix("0x")
            .or_else(|| word.strip_prefix("0X"))
            .unwrap_or(word);
        digits.push_str(word);
    }

    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("odd number of hex digits ({})", digits.len()),
        ));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            let pair = digits.get(i..i + 2).unwrap_or_default();
            u8::from_str_radix(pair, 16)
                .map_err(|_| CliError::new(DATA_INVALID, format!("invalid hex byte: {pair:?}")))
        })
        .collect()
}

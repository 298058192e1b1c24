use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cmd::ListenArgs;
use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

#[cfg(unix)]
pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    use romi_frame::{
        DriveCommand, FrameError, PacketReader, PacketWriter, ReaderConfig, MAX_FRAME_SIZE,
    };
    use romi_transport::{SerialConfig, SerialPort};
    use tracing::{info, warn};

    use crate::cmd::parse_duration;
    use crate::exit::{frame_error, transport_error, SUCCESS};
    use crate::output::print_packet;

    let read_timeout = parse_duration(&args.read_timeout)?;
    let config = SerialConfig {
        baud_rate: args.baud,
        ..SerialConfig::default()
    };
    let mut port =
        SerialPort::open(&args.device, config).map_err(|err| transport_error("open failed", err))?;

    if args.init {
        PacketWriter::new(&mut port)
            .send_drive(DriveCommand::stop())
            .map_err(|err| frame_error("init failed", err))?;
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut reader = PacketReader::with_config(
        port,
        ReaderConfig {
            read_timeout,
            ..ReaderConfig::default()
        },
    );
    let mut buf = [0u8; MAX_FRAME_SIZE];
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let packet = match reader.read(&mut buf) {
            Ok(packet) => packet,
            // A quiet or noisy line is not fatal for a monitor; keep listening.
            Err(
                err @ (FrameError::TransportBudgetExhausted { .. }
                | FrameError::ChecksumBudgetExhausted { .. }),
            ) => {
                warn!(error = %err, "no valid frame this round");
                continue;
            }
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        print_packet(&packet, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    let stats = reader.stats();
    info!(
        frames = stats.frames,
        checksum_failures = stats.checksum_failures,
        transport_errors = stats.transport_errors,
        skipped_bytes = stats.skipped_bytes,
        "listen finished"
    );
    Ok(SUCCESS)
}

#[cfg(not(unix))]
pub fn run(_args: ListenArgs, _format: OutputFormat) -> CliResult<i32> {
    Err(CliError::new(
        crate::exit::USAGE,
        "serial devices are only supported on Unix",
    ))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

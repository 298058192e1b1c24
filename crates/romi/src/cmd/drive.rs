use bytes::BytesMut;
use romi_frame::{decode_packet, encode_packet, DriveCommand};

use crate::cmd::DriveArgs;
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DriveArgs, format: OutputFormat) -> CliResult<i32> {
    let command = command_from_args(&args)?;

    if let Some(device) = &args.device {
        send(device, args.baud, command)?;
    }

    let mut frame = BytesMut::new();
    encode_packet(&command.to_payload(), &mut frame)
        .map_err(|err| frame_error("encode failed", err))?;
    let packet = decode_packet(&frame).map_err(|err| frame_error("encode failed", err))?;
    print_packet(&packet, format);
    Ok(SUCCESS)
}

fn command_from_args(args: &DriveArgs) -> CliResult<DriveCommand> {
    match (args.left, args.right, args.speed, args.radius) {
        (Some(left), Some(right), None, None) => Ok(DriveCommand::from_wheel_speeds(left, right)),
        (None, None, speed, radius) if speed.is_some() || radius.is_some() => Ok(
            DriveCommand::new(speed.unwrap_or_default(), radius.unwrap_or_default()),
        ),
        (None, None, None, None) => Err(CliError::new(
            USAGE,
            "specify --left/--right or --speed/--radius",
        )),
        _ => Err(CliError::new(
            USAGE,
            "--left/--right cannot be combined with --speed/--radius",
        )),
    }
}

#[cfg(unix)]
fn send(device: &std::path::Path, baud: u32, command: DriveCommand) -> CliResult<()> {
    use romi_transport::{SerialConfig, SerialPort};
    use tracing::info;

    use crate::exit::transport_error;

    let config = SerialConfig {
        baud_rate: baud,
        ..SerialConfig::default()
    };
    let port = SerialPort::open(device, config).map_err(|err| transport_error("open failed", err))?;

    let mut robot = romi::Robot::new(port);
    robot
        .drive(command)
        .map_err(|err| frame_error("send failed", err))?;
    info!(?device, speed = command.speed, radius = command.radius, "drive command sent");
    Ok(())
}

#[cfg(not(unix))]
fn send(_device: &std::path::Path, _baud: u32, _command: DriveCommand) -> CliResult<()> {
    Err(CliError::new(
        USAGE,
        "serial devices are only supported on Unix",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(left: Option<i16>, right: Option<i16>, speed: Option<i16>, radius: Option<i16>) -> DriveArgs {
        DriveArgs {
            left,
            right,
            speed,
            radius,
            device: None,
            baud: 115_200,
        }
    }

    #[test]
    fn wheel_speeds_are_approximated() {
        let command = command_from_args(&args(Some(0), Some(100), None, None)).unwrap();
        assert_eq!(command, DriveCommand::new(100, 62));
    }

    #[test]
    fn speed_alone_drives_straight() {
        let command = command_from_args(&args(None, None, Some(-80), None)).unwrap();
        assert_eq!(command, DriveCommand::new(-80, 0));
    }

    #[test]
    fn missing_or_mixed_arguments_are_usage_errors() {
        assert_eq!(
            command_from_args(&args(None, None, None, None)).unwrap_err().code,
            USAGE
        );
        assert_eq!(
            command_from_args(&args(Some(1), Some(2), Some(3), None))
                .unwrap_err()
                .code,
            USAGE
        );
    }
}

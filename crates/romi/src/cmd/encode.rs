use bytes::BytesMut;
use romi_frame::{decode_packet, encode_packet, MAX_FRAME_SIZE};
use tracing::warn;

use crate::cmd::{parse_hex, EncodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = parse_hex(&args.payload)?;

    let mut frame = BytesMut::new();
    encode_packet(&payload, &mut frame).map_err(|err| frame_error("encode failed", err))?;
    if frame.len() > MAX_FRAME_SIZE {
        warn!(
            size = frame.len(),
            max = MAX_FRAME_SIZE,
            "frame is larger than the robot's receive buffer"
        );
    }

    let packet = decode_packet(&frame).map_err(|err| frame_error("encode failed", err))?;
    print_packet(&packet, format);
    Ok(SUCCESS)
}

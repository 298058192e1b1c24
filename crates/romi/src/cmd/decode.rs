use romi_frame::decode_packet;
use tracing::debug;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.frame)?;
    let packet = decode_packet(&bytes).map_err(|err| frame_error("decode failed", err))?;

    let trailing = bytes.len() - packet.wire_size();
    if trailing > 0 {
        debug!(trailing, "ignoring bytes after the frame");
    }

    print_packet(&packet, format);
    Ok(SUCCESS)
}

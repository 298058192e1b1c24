use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("romi {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("ROMI_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "max_frame_size: {} bytes",
        romi_frame::MAX_FRAME_SIZE
    );
    println!(
        "serial: {}",
        if cfg!(unix) { "posix termios" } else { "unsupported" }
    );

    Ok(SUCCESS)
}

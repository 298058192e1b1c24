use romi_clock::{
    ClockConfig, HardwareCounter, InterruptControl, InterruptSet, SleepError, Sleeper,
    SystemCounter, WakeSignal, WrappingClock,
};
use tracing::{debug, info};

use crate::cmd::{parse_duration, ClockArgs};
use crate::exit::{clock_error, sleep_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_clock_samples, ClockSample, OutputFormat};

/// Raised from the Ctrl-C handler, the host's only asynchronous event.
static WAKE: WakeSignal = WakeSignal::new();

/// The host has no interrupt controller to program.
struct HostInterrupts;

impl InterruptControl for HostInterrupts {
    fn enable(&mut self, irq: u8) {
        debug!(irq, "enable");
    }

    fn disable(&mut self, irq: u8) {
        debug!(irq, "disable");
    }

    fn set_priority(&mut self, irq: u8, priority: u8) {
        debug!(irq, priority, "set priority");
    }
}

pub fn run(args: ClockArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;

    let clock = WrappingClock::initialize(
        SystemCounter::with_preload(args.preload),
        ClockConfig::default(),
    )
    .map_err(|err| clock_error("clock init failed", err))?;
    info!(
        preload = args.preload,
        wrap_period = ?clock.wrap_period(),
        overflow_irq = clock.overflow_armed(),
        "clock started"
    );

    ctrlc::set_handler(|| WAKE.raise())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    let mut sleeper = Sleeper::new(HostInterrupts, InterruptSet::new(), &WAKE);

    let mut samples = Vec::with_capacity(args.samples);
    for sample in 0..args.samples {
        if sample > 0 {
            match sleeper.sleep_for(&clock, interval) {
                Ok(()) => {}
                Err(SleepError::Interrupted) => {
                    info!(taken = samples.len(), "sampling interrupted");
                    break;
                }
                Err(err) => return Err(sleep_error("sleep failed", err)),
            }
        }

        let now = clock.now();
        samples.push(ClockSample {
            sample,
            raw: clock.counter().read_raw(),
            now_ns: now.as_nanos(),
            wraps: (now.as_nanos() / clock.ns_per_tick()) >> 32,
        });
    }

    print_clock_samples(&samples, format);
    Ok(SUCCESS)
}

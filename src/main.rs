use std::path::PathBuf;
use std::time::{Duration, Instant};

use structopt::StructOpt;

use chip_fa::emulator::driver::{Driver, FrameOutcome, DEFAULT_CYCLES_PER_SECOND};
use chip_fa::emulator::quirks::Quirks;
use chip_fa::emulator::timers::TIMER_HZ;
use chip_fa::emulator::{input::DummyInput, output::DummyOutput};
use chip_fa::emulator::Emulator;

/// Run a CHIP-8 program without a screen or keyboard.
#[derive(StructOpt, Debug)]
#[structopt(name = "chip-fa")]
struct Opt {
    /// Instructions executed per second. Timers always run at 60 Hz.
    #[structopt(short, long, default_value = "700")]
    cycles_per_second: u32,

    /// Stop after this many frames (1/60th of a second each)
    #[structopt(long)]
    max_frames: Option<u64>,

    /// Shift VY into VX for 8XY6 and 8XYE
    #[structopt(long)]
    shift_uses_vy: bool,

    /// Leave I unchanged after FX55 and FX65
    #[structopt(long)]
    keep_index: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// The program to execute
    #[structopt(parse(from_os_str))]
    input: PathBuf,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter(None, level)
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_default())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get configuration and read input file
    let opt = Opt::from_args();
    init_logger(opt.verbose);
    log::info!("Executing {:?}", &opt.input);

    let quirks = Quirks {
        shift_uses_vy: opt.shift_uses_vy,
        load_store_increments_index: !opt.keep_index,
    };
    let emulator = Emulator::from_file(&opt.input, quirks)?;
    let cycles_per_second = if opt.cycles_per_second == 0 {
        DEFAULT_CYCLES_PER_SECOND
    } else {
        opt.cycles_per_second
    };
    let mut driver = Driver::new(emulator, DummyInput, DummyOutput::new(), cycles_per_second);

    // Start execution, one frame per timer tick
    let frame_length = Duration::from_secs(1) / TIMER_HZ;
    let mut frames = 0;
    let result = loop {
        if opt.max_frames.map_or(false, |max| frames >= max) {
            break Ok(());
        }
        let started = Instant::now();
        match driver.frame() {
            Ok(FrameOutcome::Breakpoint { .. }) => break Ok(()),
            Ok(_) => {}
            Err(error) => break Err(error),
        }
        frames += 1;
        if let Some(rest) = frame_length.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    };

    log::info!("Stopped after {} frames\n{}", frames, driver.emulator());
    Ok(result?)
}

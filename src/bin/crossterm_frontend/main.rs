use std::path::PathBuf;
use std::time::{Duration, Instant};

use structopt::StructOpt;

use chip_fa::emulator::driver::{Driver, FrameOutcome};
use chip_fa::emulator::quirks::Quirks;
use chip_fa::emulator::timers::TIMER_HZ;
use chip_fa::emulator::Emulator;

mod crossterm_io;
mod key_buffer;
mod key_manager;
use crossterm::event::KeyCode;
use crossterm_io::{CrosstermInput, CrosstermOutput};
use key_manager::KeyManager;

const HELP: &str = "1234 QWER ASDF ZXCV: keypad   p: pause   Esc: quit";

/// The program options.
#[derive(StructOpt)]
struct Opt {
    /// Instructions executed per second. Timers always run at 60 Hz.
    #[structopt(short, long, default_value = "700")]
    cycles_per_second: u32,

    /// Shift VY into VX for 8XY6 and 8XYE
    #[structopt(long)]
    shift_uses_vy: bool,

    /// Leave I unchanged after FX55 and FX65
    #[structopt(long)]
    keep_index: bool,

    /// The program to execute
    #[structopt(parse(from_os_str))]
    input: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {

    env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    log::info!("Executing {:?}", &opt.input);
    let quirks = Quirks {
        shift_uses_vy: opt.shift_uses_vy,
        load_store_increments_index: !opt.keep_index,
    };
    let emulator = Emulator::from_file(&opt.input, quirks)?;

    let mut driver = Driver::new(
        emulator,
        CrosstermInput::new(),
        CrosstermOutput::new()?,
        opt.cycles_per_second
    );
    let key_manager = KeyManager::new();
    driver.output_mut().show_status(HELP);

    // Start execution, one frame per timer tick
    let frame_length = Duration::from_secs(1) / TIMER_HZ;
    'running: loop {
        let started = Instant::now();

        for key in key_manager.pressed() {
            match key {
                KeyCode::Esc => break 'running,
                KeyCode::Char('p') => {
                    driver.toggle_pause();
                    show_state(&mut driver);
                }
                other => {
                    driver.input_mut().press(other);
                }
            }
        }

        if let FrameOutcome::Breakpoint { .. } = driver.frame()? {
            show_state(&mut driver);
        }

        if let Some(rest) = frame_length.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    Ok(())
}

fn show_state(driver: &mut Driver<CrosstermInput, CrosstermOutput>) {
    let text = if driver.is_paused() {
        format!("PAUSED   {}\n{}{}", HELP, driver.emulator(), driver.emulator().memory_window())
    } else {
        HELP.to_string()
    };
    driver.output_mut().show_status(&text);
}

/*!

A CHIP-8 virtual machine as specified at https://en.wikipedia.org/wiki/CHIP-8.

# Crossterm Frontend

If you want to try the machine on some programs, there is a ready-to-use implementation
you can run by using `cargo run --release --bin crossterm_frontend -- <program>`.
The keys 1234, QWER, ASDF and ZXCV are the sixteen keys of the keypad, `p` pauses and shows
the CPU state, and Esc quits.

# Library

The machine is a plain value. Boot it, load a program, and call `step` as often as you like.

```rust
use chip_fa::emulator::Emulator;

let mut emulator = Emulator::new();

// Load a program at address 0x200: set V0 to 5, then clear the screen.
emulator.load(&[0x60, 0x05, 0x00, 0xE0]).unwrap();
emulator.step().unwrap();
emulator.step().unwrap();

assert_eq!(5, emulator.registers()[0]);
assert_eq!(0x204, emulator.program_counter());
```

Alternatively, you can experiment by executing instructions manually.

```rust
use chip_fa::emulator::Emulator;
use chip_fa::emulator::instruction::{Instruction, Reg, Const, Addr};

let mut emulator = Emulator::new();

// Execute instructions manually
emulator.execute_single(Instruction::ClearScreen).unwrap();

// Or many sequentially
emulator.execute_many(&[
    Instruction::Goto(Addr(0x250)),
    Instruction::SetRegToConst(Reg(0xA), Const(35)),
    Instruction::SetRegToReg(Reg(0xB), Reg(0xA))
]).unwrap();
assert_eq!(35, emulator.registers()[0xB]);
```

## Timers, keys and the screen

`step` never touches the timers. Call `tick_timers` at 60 Hz, write the keypad before
stepping, and check the framebuffer's redraw flag afterwards.
`Driver` does all of that for you given an `EmulatorInput` and an `EmulatorOutput`.

```rust
use chip_fa::emulator::Emulator;
use chip_fa::emulator::driver::Driver;
use chip_fa::emulator::{input::DummyInput, output::DummyOutput};

let emulator = Emulator::new();
let mut driver = Driver::new(emulator, DummyInput, DummyOutput::new(), 600);
driver.emulator_mut().load(&[0x12, 0x00]).unwrap(); // Jump to itself forever
driver.frame().unwrap(); // 10 cycles and one timer tick
```
*/

pub mod emulator;
pub mod util;

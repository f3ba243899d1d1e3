//! Top-level Vectrex system.
//!
//! The CPU runs one instruction at a time. For every cycle it reports,
//! the VIA takes its first half-step, the analog hardware integrates one
//! step, then the VIA takes its second half-step. The VIA interrupt flag
//! drives IRQ; FIRQ is never asserted.
//!
//! # Display passes
//!
//! A countdown reloaded with 50,000 cycles (1.5 MHz / 30 Hz phosphor
//! decay) marks the end of a display pass. When it goes negative the draw
//! list is rasterised and the segment lists swap. A host frame is 20 ms,
//! 30,000 cycles, so a pass completes on roughly three frames in five.

use emu_core::{Bus, Cpu, MasterClock, Observable, Value};
use motorola_6809::{M6809, RegisterId};

use crate::audio::{self, AudioStream, AudioTap};
use crate::bus::{PSG_PORT_A, VectrexBus};
use crate::config::{CPU_FREQUENCY, FRAME_MILLIS, PHOSPHOR_DECAY_HZ, VectrexConfig};
use crate::display::{Display, Line};
use crate::input::{InputQueue, InputState, VectrexKey};
use crate::memory::VectrexMemory;

const CLOCK: MasterClock = MasterClock::new(CPU_FREQUENCY);

/// Vectrex system.
pub struct Vectrex {
    cpu: M6809,
    bus: VectrexBus,
    display: Display,
    /// Lines projected by the most recent display pass.
    lines: Vec<Line>,
    /// Cycles left until the next display pass ends.
    render_countdown: i64,
    render_complete: bool,
    /// Master clock: counts CPU cycles.
    master_clock: u64,
    /// Completed frame counter.
    frame_count: u64,
    /// Controller state latched at the start of each frame.
    input: InputState,
    input_queue: InputQueue,
    audio: AudioStream,
    audio_tap: Option<AudioTap>,
}

impl Vectrex {
    /// Create a Vectrex from the given configuration, with the sound chip
    /// running and the machine reset.
    #[must_use]
    pub fn new(config: &VectrexConfig) -> Self {
        let memory = VectrexMemory::new(&config.rom, config.cartridge.as_deref());
        let mut bus = VectrexBus::new(memory);
        bus.psg.start();

        let (audio, audio_tap) = audio::channel(config.samples_per_frame());

        let mut vectrex = Self {
            cpu: M6809::new(),
            bus,
            display: Display::default(),
            lines: Vec::new(),
            render_countdown: Self::render_cycles(),
            render_complete: false,
            master_clock: 0,
            frame_count: 0,
            input: InputState::new(),
            input_queue: InputQueue::new(),
            audio,
            audio_tap: Some(audio_tap),
        };
        vectrex.reset();
        vectrex
    }

    fn render_cycles() -> i64 {
        CLOCK.ticks_per_frame(PHOSPHOR_DECAY_HZ).get() as i64
    }

    /// Cycles in one host frame.
    #[must_use]
    pub fn frame_cycles() -> u64 {
        CLOCK.ticks_per_millis(FRAME_MILLIS).get()
    }

    /// Reset RAM, sound registers, VIA, analog state, segment lists and CPU.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.render_countdown = Self::render_cycles();
        self.render_complete = false;
        self.lines.clear();
        self.cpu.reset(&mut self.bus);
        log::debug!("reset, PC = ${:04X}", self.cpu.regs.pc);
    }

    /// Replace the output surface.
    pub fn set_display(&mut self, display: Display) {
        self.display = display;
    }

    /// Run at least `budget` cycles, stopping on an instruction boundary.
    ///
    /// Returns the number of cycles executed.
    pub fn run_cycles(&mut self, budget: u64) -> u64 {
        let mut executed = 0u64;

        while executed < budget {
            let irq = self.bus.via.irq_active();
            let cycles = self.cpu.step(&mut self.bus, irq, false);

            for _ in 0..cycles {
                self.bus.tick();
            }

            executed += u64::from(cycles);
            self.render_countdown -= i64::from(cycles);
            if self.render_countdown < 0 {
                self.render_countdown += Self::render_cycles();
                self.render();
            }
        }

        self.master_clock += executed;
        executed
    }

    /// Latch input, run one 20 ms frame and queue its audio.
    ///
    /// Returns the number of CPU cycles executed.
    pub fn run_frame(&mut self) -> u64 {
        self.input_queue.process(self.frame_count, &mut self.input);
        self.apply_input();
        self.frame_count += 1;

        let cycles = self.run_cycles(Self::frame_cycles());
        self.audio.push_frame(&mut self.bus.psg);
        cycles
    }

    fn apply_input(&mut self) {
        let port = self.bus.psg.read(PSG_PORT_A);
        self.bus
            .psg
            .write(PSG_PORT_A, (port & 0xF0) | (self.input.buttons & 0x0F));
        self.bus.analog.set_joystick(0, self.input.pot_x);
        self.bus.analog.set_joystick(1, self.input.pot_y);
    }

    /// End a display pass: rasterise the draw list, then swap lists.
    fn render(&mut self) {
        self.lines.clear();
        self.display.render(self.bus.segments.draw(), &mut self.lines);
        self.bus.segments.swap();
        self.render_complete = true;
    }

    /// True once per completed display pass.
    pub fn take_render_complete(&mut self) -> bool {
        std::mem::take(&mut self.render_complete)
    }

    /// RGBA pixel buffer.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        self.display.pixels()
    }

    #[must_use]
    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Lines projected by the most recent display pass.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Segment lists for the pass in progress and the one before.
    #[must_use]
    pub fn segments(&self) -> &crate::vectors::SegmentLists {
        &self.bus.segments
    }

    /// Press a controller line; takes effect at the next frame.
    pub fn press_key(&mut self, key: VectrexKey) {
        self.input.set_key(key, true);
    }

    /// Release a controller line; takes effect at the next frame.
    pub fn release_key(&mut self, key: VectrexKey) {
        self.input.set_key(key, false);
    }

    /// Mutable reference to the timed input queue.
    pub fn input_queue(&mut self) -> &mut InputQueue {
        &mut self.input_queue
    }

    /// Hand the audio consumer to the host. Only the first call succeeds.
    pub fn take_audio_tap(&mut self) -> Option<AudioTap> {
        self.audio_tap.take()
    }

    /// Silence the sound chip.
    pub fn stop_audio(&mut self) {
        self.bus.psg.stop();
    }

    /// Diagnostic register read.
    #[must_use]
    pub fn register(&self, id: RegisterId) -> u16 {
        self.cpu.register(id)
    }

    /// Reference to the CPU.
    #[must_use]
    pub fn cpu(&self) -> &M6809 {
        &self.cpu
    }

    /// Reference to the bus.
    #[must_use]
    pub fn bus(&self) -> &VectrexBus {
        &self.bus
    }

    /// Master clock tick count (CPU cycles).
    #[must_use]
    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Read memory through the bus decoder without side effects.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.memory.peek(addr)
    }

    /// Write memory through the bus, as the CPU would.
    pub fn poke(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value);
    }
}

impl Observable for Vectrex {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("via.") {
            let via = &self.bus.via;
            match rest {
                "ora" => Some(via.port_a().into()),
                "orb" => Some(via.port_b().into()),
                "ifr" => Some(via.ifr().into()),
                "ier" => Some(via.ier().into()),
                "acr" => Some(via.acr().into()),
                "pcr" => Some(via.pcr().into()),
                "t1" => Some(via.timer1_counter().into()),
                "t2" => Some(via.timer2_counter().into()),
                "sr" => Some(via.shift_register().into()),
                "irq" => Some(via.irq_active().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("analog.") {
            let analog = &self.bus.analog;
            match rest {
                "x" => Some(analog.position().0.into()),
                "y" => Some(analog.position().1.into()),
                "dx" => Some(analog.delta().0.into()),
                "dy" => Some(analog.delta().1.into()),
                "rsh" => Some(analog.rsh().into()),
                "xsh" => Some(analog.xsh().into()),
                "ysh" => Some(analog.ysh().into()),
                "zsh" => Some(analog.zsh().into()),
                "compare" => Some(analog.compare().into()),
                "vectoring" => Some(analog.is_vectoring().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("psg.") {
            match rest {
                "select" => Some(self.bus.psg.selected_register().into()),
                "port_a" => Some(self.bus.psg.read(PSG_PORT_A).into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("segments.") {
            let segments = &self.bus.segments;
            match rest {
                "draw" => Some((segments.draw().len() as u64).into()),
                "erase" => Some((segments.erase().len() as u64).into()),
                "dropped" => Some(segments.dropped().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("memory.") {
            let addr =
                if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
                    u16::from_str_radix(hex, 16).ok()
                } else if let Some(hex) = rest.strip_prefix('$') {
                    u16::from_str_radix(hex, 16).ok()
                } else {
                    rest.parse().ok()
                };
            addr.map(|a| Value::U8(self.peek(a)))
        } else {
            match path {
                "master_clock" => Some(self.master_clock.into()),
                "frame_count" => Some(self.frame_count.into()),
                _ => self.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<6809_paths>",
            "via.ora",
            "via.orb",
            "via.ifr",
            "via.ier",
            "via.acr",
            "via.pcr",
            "via.t1",
            "via.t2",
            "via.sr",
            "via.irq",
            "analog.x",
            "analog.y",
            "analog.dx",
            "analog.dy",
            "analog.rsh",
            "analog.xsh",
            "analog.ysh",
            "analog.zsh",
            "analog.compare",
            "analog.vectoring",
            "psg.select",
            "psg.port_a",
            "segments.draw",
            "segments.erase",
            "segments.dropped",
            "memory.<address>",
            "master_clock",
            "frame_count",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ROM_SIZE;

    /// ROM with the reset vector at $E000 and a `BRA *` loop there.
    fn make_vectrex() -> Vectrex {
        let mut rom = vec![0x12; ROM_SIZE]; // NOP sled
        rom[0] = 0x20; // BRA -2
        rom[1] = 0xFE;
        rom[0x1FFE] = 0xE0;
        rom[0x1FFF] = 0x00;
        Vectrex::new(&VectrexConfig::new(rom))
    }

    #[test]
    fn frame_budget_constants() {
        assert_eq!(Vectrex::frame_cycles(), 30_000);
        assert_eq!(Vectrex::render_cycles(), 50_000);
    }

    #[test]
    fn reset_loads_vector() {
        let vectrex = make_vectrex();
        assert_eq!(vectrex.query("cpu.pc"), Some(Value::U16(0xE000)));
        assert_eq!(vectrex.register(RegisterId::Pc), 0xE000);
    }

    #[test]
    fn run_frame_executes_whole_instructions() {
        let mut vectrex = make_vectrex();
        // BRA is 3 cycles: 30,000 is a multiple.
        assert_eq!(vectrex.run_frame(), 30_000);
        assert_eq!(vectrex.master_clock(), 30_000);
        assert_eq!(vectrex.frame_count(), 1);
    }

    #[test]
    fn display_pass_every_fifty_thousand_cycles() {
        let mut vectrex = make_vectrex();
        vectrex.run_frame();
        assert!(!vectrex.take_render_complete());
        vectrex.run_frame();
        assert!(vectrex.take_render_complete());
        assert!(!vectrex.take_render_complete());
    }

    #[test]
    fn input_is_latched_at_frame_start() {
        let mut vectrex = make_vectrex();
        vectrex.press_key(VectrexKey::Player1Down);
        vectrex.press_key(VectrexKey::Player2Right);
        assert_eq!(vectrex.query("psg.port_a"), Some(Value::U8(0xFF)));

        vectrex.run_frame();
        assert_eq!(vectrex.query("psg.port_a"), Some(Value::U8(0xF7)));
        assert_eq!(vectrex.bus().analog.joystick(0), 0xFF);

        vectrex.release_key(VectrexKey::Player1Down);
        vectrex.release_key(VectrexKey::Player2Right);
        vectrex.run_frame();
        assert_eq!(vectrex.query("psg.port_a"), Some(Value::U8(0xFF)));
        assert_eq!(vectrex.bus().analog.joystick(0), 0x80);
    }

    #[test]
    fn audio_tap_taken_once() {
        let mut vectrex = make_vectrex();
        let tap = vectrex.take_audio_tap();
        assert!(tap.is_some());
        assert!(vectrex.take_audio_tap().is_none());

        vectrex.run_frame();
        assert_eq!(tap.map(|t| t.available()), Some(441));
    }

    #[test]
    fn observable_memory_and_analog() {
        let mut vectrex = make_vectrex();
        vectrex.poke(0xC810, 0xAB);
        assert_eq!(vectrex.query("memory.0xC810"), Some(Value::U8(0xAB)));
        assert_eq!(vectrex.query("memory.$C810"), Some(Value::U8(0xAB)));
        assert_eq!(vectrex.query("analog.x"), Some(Value::I64(16_500)));
        assert_eq!(vectrex.query("segments.draw"), Some(Value::U64(0)));
        assert_eq!(vectrex.query("nonsense"), None);
    }

    #[test]
    fn reset_is_repeatable() {
        let mut vectrex = make_vectrex();
        vectrex.run_frame();
        // Dirty every subsystem: VIA timer and interrupt enable, sound
        // registers, analog holds and RAM.
        vectrex.poke(0xD00E, 0xC0);
        vectrex.poke(0xD004, 0x10);
        vectrex.poke(0xD005, 0x00);
        vectrex.poke(0xD003, 0xFF);
        vectrex.poke(0xD001, 0x40);
        vectrex.poke(0xC900, 0xAB);
        vectrex.bus.psg.write(7, 0x38);
        vectrex.bus.psg.write(8, 0x0F);
        vectrex.bus.analog.set_joystick(2, 0x10);
        vectrex.run_cycles(100);

        vectrex.reset();
        let first_paths: Vec<_> = vectrex
            .query_paths()
            .iter()
            .map(|p| vectrex.query(p))
            .collect();
        let first_cpu = vectrex.cpu.clone();
        let first_via = vectrex.bus.via.clone();
        let first_psg = vectrex.bus.psg.clone();
        let first_analog = vectrex.bus.analog.clone();
        let first_segments = vectrex.bus.segments.clone();
        let first_memory = vectrex.bus.memory.clone();
        let first_render = (vectrex.render_countdown, vectrex.render_complete);

        vectrex.reset();
        let second_paths: Vec<_> = vectrex
            .query_paths()
            .iter()
            .map(|p| vectrex.query(p))
            .collect();
        assert_eq!(first_paths, second_paths);
        assert_eq!(first_cpu, vectrex.cpu);
        assert_eq!(first_via, vectrex.bus.via);
        assert_eq!(first_psg, vectrex.bus.psg);
        assert_eq!(first_analog, vectrex.bus.analog);
        assert!(first_segments == vectrex.bus.segments);
        assert!(first_memory == vectrex.bus.memory);
        assert_eq!(
            first_render,
            (vectrex.render_countdown, vectrex.render_complete)
        );

        // And the reset really did clear what was dirtied.
        assert_eq!(vectrex.peek(0xC900), 0x00);
        assert_eq!(vectrex.query("via.ier"), Some(Value::U8(0)));
        assert_eq!(vectrex.bus.psg.read(8), 0);
        assert_eq!(vectrex.bus.analog.joystick(2), 0x80);
        assert_eq!(vectrex.query("cpu.pc"), Some(Value::U16(0xE000)));
    }
}

//! General Instrument AY-3-8910 Programmable Sound Generator emulator.
//!
//! Three square-wave tone generators, a shared noise generator, a shared
//! envelope generator, and a per-channel mixer. Samples are produced on
//! demand: the host asks [`Ay3_8910::generate`] for a buffer of unsigned
//! 8-bit samples and the chip advances exactly as far as that buffer
//! needs. Each channel's contribution is weighted by how long its square
//! wave spent high during the sample, so tone edges are not aliased.
//!
//! # Register map (16 registers)
//!
//! | Reg | Name      | Bits |
//! |-----|-----------|------|
//! | R0  | A fine    | 7-0  |
//! | R1  | A coarse  | 3-0  |
//! | R2  | B fine    | 7-0  |
//! | R3  | B coarse  | 3-0  |
//! | R4  | C fine    | 7-0  |
//! | R5  | C coarse  | 3-0  |
//! | R6  | Noise     | 4-0  |
//! | R7  | Mixer     | 7-0  |
//! | R8  | A volume  | 4-0  |
//! | R9  | B volume  | 4-0  |
//! | R10 | C volume  | 4-0  |
//! | R11 | Env fine  | 7-0  |
//! | R12 | Env coarse| 7-0  |
//! | R13 | Env shape | 3-0  |
//! | R14 | Port A    | 7-0  |
//! | R15 | Port B    | 7-0  |

/// Time units per half-sample of the update loop.
const STEP: i32 = 4;
/// Time units per register period count. An envelope period of 0 runs at
/// half a count, so counts are kept in doubled units.
const STEP3: i32 = 2;

/// Full-scale DAC output.
const MAX_OUTPUT: f64 = 4095.0;
/// 1.5 dB per envelope step: 10 ^ (1.5 / 20).
const STEP_RATIO: f64 = 1.188_502_227;

/// Output samples produced per pass of the update loop. Keeps the
/// doubled-unit span of a pass well inside `i32`.
const MAX_CHUNK: usize = 4096;

const REG_ENABLE: usize = 7;
const REG_VOLUME_A: usize = 8;

/// Build the 32-step logarithmic volume table. Entry 0 is silence.
fn build_volume_table() -> [u32; 32] {
    let mut table = [0u32; 32];
    let mut out = MAX_OUTPUT;
    for entry in table.iter_mut().skip(1).rev() {
        *entry = (out + 0.5) as u32;
        out /= STEP_RATIO;
    }
    table
}

/// A single tone generator (square wave with 12-bit period).
#[derive(Debug, Clone, PartialEq, Eq)]
struct ToneGenerator {
    /// Half period in time units.
    period: i32,
    /// Time units until the next edge.
    counter: i32,
    /// Current square wave output (true = high).
    output: bool,
    /// Volume follows the envelope (volume register bit 4).
    use_envelope: bool,
    /// Current DAC level.
    volume: u32,
}

impl ToneGenerator {
    fn new() -> Self {
        Self {
            period: STEP3,
            counter: 1,
            output: false,
            use_envelope: false,
            volume: 0,
        }
    }

    fn set_period(&mut self, period: i32) {
        let old = self.period;
        self.period = if period == 0 { STEP3 } else { period };
        self.counter = (self.counter + self.period - old).max(1);
    }

    /// Run the square wave for `elapsed` time units.
    ///
    /// Returns how long the output was high, counted only when `audible`.
    fn advance(&mut self, elapsed: i32, audible: bool) -> i32 {
        let mut high = 0;
        if audible && self.output {
            high += self.counter;
        }
        self.counter -= elapsed;

        // Two half periods leave the output where it started.
        while self.counter <= 0 {
            self.counter += self.period;
            if self.counter > 0 {
                self.output = !self.output;
                if audible && self.output {
                    high += self.period;
                }
                break;
            }
            self.counter += self.period;
            if audible {
                high += self.period;
            }
        }

        if audible && self.output {
            high -= self.counter;
        }
        high
    }
}

/// 17-bit LFSR noise generator with 5-bit period.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NoiseGenerator {
    period: i32,
    counter: i32,
    /// 17-bit LFSR state (Galois form).
    lfsr: u32,
    /// Current noise output.
    output: bool,
}

impl NoiseGenerator {
    fn new() -> Self {
        Self {
            period: STEP3,
            counter: 1,
            lfsr: 1,
            output: false,
        }
    }

    fn set_period(&mut self, period: i32) {
        let old = self.period;
        self.period = if period == 0 { STEP3 } else { period };
        self.counter = (self.counter + self.period - old).max(1);
    }

    /// Shift the LFSR once. Returns true if the output changed.
    fn clock(&mut self) -> bool {
        // Output flips when bit 0 differs from bit 1.
        let flips = (self.lfsr + 1) & 2 != 0;
        if flips {
            self.output = !self.output;
        }
        if self.lfsr & 1 != 0 {
            self.lfsr ^= 0x24000;
        }
        self.lfsr >>= 1;
        self.counter += self.period;
        flips
    }
}

/// Shared envelope generator: 32 steps, counting down from 31.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EnvelopeGenerator {
    period: i32,
    counter: i32,
    /// Current step, 31 down to 0.
    step: i32,
    /// XOR mask applied to `step`: $1F for attack (rising) shapes.
    attack: u8,
    hold: bool,
    alternate: bool,
    holding: bool,
}

impl EnvelopeGenerator {
    fn new() -> Self {
        Self {
            period: 1,
            counter: 1,
            step: 0,
            attack: 0,
            hold: false,
            alternate: false,
            holding: false,
        }
    }

    fn set_period(&mut self, period: i32) {
        let old = self.period;
        self.period = if period == 0 { STEP3 / 2 } else { period };
        self.counter = (self.counter + self.period - old).max(1);
    }

    /// Restart with a new shape (R13 low nibble).
    fn restart(&mut self, shape: u8) {
        self.attack = if shape & 0x04 != 0 { 0x1F } else { 0x00 };
        if shape & 0x08 == 0 {
            // No continue: behaves like hold, ending low.
            self.hold = true;
            self.alternate = self.attack != 0;
        } else {
            self.hold = shape & 0x01 != 0;
            self.alternate = shape & 0x02 != 0;
        }
        self.counter = self.period;
        self.step = 0x1F;
        self.holding = false;
    }

    /// Volume table index for the current step.
    fn level(&self) -> usize {
        (self.step as u8 ^ self.attack) as usize & 0x1F
    }

    /// Advance one sample's worth of time. Returns true if the level moved.
    fn clock(&mut self) -> bool {
        if self.holding {
            return false;
        }

        self.counter -= STEP;
        if self.counter > 0 {
            return false;
        }

        while self.counter <= 0 {
            self.step -= 1;
            self.counter += self.period;
        }

        if self.step < 0 {
            if self.hold {
                if self.alternate {
                    self.attack ^= 0x1F;
                }
                self.holding = true;
                self.step = 0;
            } else {
                // An odd number of wraps inverts the direction.
                if self.alternate && self.step & 0x20 != 0 {
                    self.attack ^= 0x1F;
                }
                self.step &= 0x1F;
            }
        }
        true
    }
}

/// AY-3-8910 Programmable Sound Generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ay3_8910 {
    /// Raw register file (16 bytes).
    regs: [u8; 16],
    /// Currently selected register index.
    selected_reg: u8,

    tone: [ToneGenerator; 3],
    noise: NoiseGenerator,
    envelope: EnvelopeGenerator,
    /// Envelope DAC level shared by every channel in envelope mode.
    envelope_volume: u32,

    volume_table: [u32; 32],
    /// Samples are only produced once the chip has been started.
    ready: bool,
}

impl Default for Ay3_8910 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ay3_8910 {
    /// Create a new, stopped AY-3-8910 with all registers zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: [0; 16],
            selected_reg: 0,
            tone: [ToneGenerator::new(), ToneGenerator::new(), ToneGenerator::new()],
            noise: NoiseGenerator::new(),
            envelope: EnvelopeGenerator::new(),
            envelope_volume: 0,
            volume_table: [0; 32],
            ready: false,
        }
    }

    /// Build the volume table and begin producing samples.
    pub fn start(&mut self) {
        self.volume_table = build_volume_table();
        self.ready = true;
        log::debug!("AY-3-8910 started");
    }

    /// Stop producing samples; `generate` returns silence afterwards.
    pub fn stop(&mut self) {
        self.ready = false;
        log::debug!("AY-3-8910 stopped");
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Select a register by index (0–15).
    pub fn select_register(&mut self, reg: u8) {
        self.selected_reg = reg & 0x0F;
    }

    #[must_use]
    pub fn selected_register(&self) -> u8 {
        self.selected_reg
    }

    /// Write a value to the currently selected register.
    pub fn write_data(&mut self, value: u8) {
        self.write(self.selected_reg, value);
    }

    /// Read the currently selected register.
    #[must_use]
    pub fn read_data(&self) -> u8 {
        self.read(self.selected_reg)
    }

    /// Read a register directly. The byte last written is returned as is,
    /// unused bits included.
    #[must_use]
    pub fn read(&self, reg: u8) -> u8 {
        self.regs[usize::from(reg & 0x0F)]
    }

    /// Write a register directly and update the derived generator state.
    pub fn write(&mut self, reg: u8, value: u8) {
        let reg = usize::from(reg & 0x0F);
        self.regs[reg] = value;

        match reg {
            // Tone periods
            0..=5 => {
                let ch = reg / 2;
                let period = i32::from(self.regs[ch * 2])
                    + 256 * i32::from(self.regs[ch * 2 + 1] & 0x0F);
                self.tone[ch].set_period(period * STEP3);
            }
            // Noise period
            6 => {
                self.noise.set_period(i32::from(value & 0x1F) * STEP3);
            }
            // Volumes
            8..=10 => {
                let level = value & 0x1F;
                let ch = reg - REG_VOLUME_A;
                self.tone[ch].use_envelope = level & 0x10 != 0;
                self.tone[ch].volume = if self.tone[ch].use_envelope {
                    self.envelope_volume
                } else if level == 0 {
                    0
                } else {
                    self.volume_table[usize::from(level) * 2 + 1]
                };
            }
            // Envelope period
            11 | 12 => {
                let period = i32::from(self.regs[11]) + 256 * i32::from(self.regs[12]);
                self.envelope.set_period(period * STEP3);
            }
            // Envelope shape: writing restarts the envelope
            13 => {
                self.envelope.restart(value & 0x0F);
                self.reload_envelope_volume();
            }
            // Mixer and I/O ports are plain storage.
            _ => {}
        }
    }

    fn reload_envelope_volume(&mut self) {
        self.envelope_volume = self.volume_table[self.envelope.level()];
        for tone in &mut self.tone {
            if tone.use_envelope {
                tone.volume = self.envelope_volume;
            }
        }
    }

    /// Noise gate per channel: bit 3+ch set means the channel passes.
    fn noise_gate(&self) -> u8 {
        (if self.noise.output { 0xFF } else { 0x00 }) | self.regs[REG_ENABLE]
    }

    /// Fill `out` with unsigned 8-bit samples. Silence until started.
    pub fn generate(&mut self, out: &mut [u8]) {
        if !self.ready {
            out.fill(0);
            return;
        }
        for chunk in out.chunks_mut(MAX_CHUNK) {
            self.generate_chunk(chunk);
        }
    }

    fn generate_chunk(&mut self, out: &mut [u8]) {
        // Two passes of the inner loop per output sample.
        let mut length = out.len() as i32 * 2;
        let span = length * STEP;
        let enable = self.regs[REG_ENABLE];

        // A tone-disabled channel is locked high; a silent one just keeps
        // its phase. Either way push its counter past this whole update.
        for (ch, tone) in self.tone.iter_mut().enumerate() {
            let disabled = enable & (1 << ch) != 0;
            if disabled || self.regs[REG_VOLUME_A + ch] & 0x1F == 0 {
                if tone.counter <= span {
                    tone.counter += span;
                }
                if disabled {
                    tone.output = true;
                }
            }
        }
        if enable & 0x38 == 0x38 && self.noise.counter <= span {
            self.noise.counter += span;
        }

        let mut gate = self.noise_gate();
        let mut samples = out.iter_mut();

        while length > 0 {
            let mut high = [0i32; 3];
            let mut left = STEP;

            while left > 0 {
                let elapsed = self.noise.counter.min(left);

                for (ch, tone) in self.tone.iter_mut().enumerate() {
                    let audible = gate & (0x08 << ch) != 0;
                    high[ch] += tone.advance(elapsed, audible);
                }

                self.noise.counter -= elapsed;
                if self.noise.counter <= 0 && self.noise.clock() {
                    gate = self.noise_gate();
                }

                left -= elapsed;
            }

            if self.envelope.clock() {
                self.reload_envelope_volume();
            }

            let mixed: i64 = high
                .iter()
                .zip(&self.tone)
                .map(|(&h, tone)| i64::from(h) * i64::from(tone.volume))
                .sum::<i64>()
                / i64::from(3 * STEP);

            length -= 1;
            if length & 1 != 0 {
                if let Some(sample) = samples.next() {
                    *sample = (mixed >> 4).clamp(0, 255) as u8;
                }
            }
        }
    }
}

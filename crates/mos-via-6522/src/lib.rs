//! MOS 6522 Versatile Interface Adapter (VIA).
//!
//! The 6522 provides two 8-bit I/O ports, two 16-bit timers, a serial
//! shift register, and an interrupt controller. In the Vectrex it drives
//! the beam DAC and sound chip through its ports, times vector lengths
//! with timer 1 (PB7 is the integrator RAMP line), and blanks the beam
//! through CB2.
//!
//! Each CPU cycle is split into two half-steps: [`Via6522::phase1`] counts
//! the timers and the shift clock, [`Via6522::phase2`] ends CA2/CB2 pulses.
//! The machine runs its analog step between the two.
//!
//! # Registers ($0-$F)
//!
//! | Reg | Name | Description                              |
//! |-----|------|------------------------------------------|
//! | $0  | ORB  | Port B data (bit 7 from PB7 when ACR7)   |
//! | $1  | ORA  | Port A data (CA2 handshake on access)    |
//! | $2  | DDRB | Port B data direction                    |
//! | $3  | DDRA | Port A data direction                    |
//! | $4  | T1CL | T1 counter low (read stops and disarms)  |
//! | $5  | T1CH | T1 counter high (write starts T1)        |
//! | $6  | T1LL | T1 latch low                             |
//! | $7  | T1LH | T1 latch high                            |
//! | $8  | T2CL | T2 counter low (read stops and disarms)  |
//! | $9  | T2CH | T2 counter high (write starts T2)        |
//! | $A  | SR   | Shift register (access restarts shifting)|
//! | $B  | ACR  | Auxiliary control register               |
//! | $C  | PCR  | Peripheral control register              |
//! | $D  | IFR  | Interrupt flag register                  |
//! | $E  | IER  | Interrupt enable register                |
//! | $F  | ORA  | Port A data (no handshake)               |

/// Shift register operating mode (ACR bits 4-2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftMode {
    Disabled,
    InUnderT2,
    InUnderSystemClock,
    InUnderExternalClock,
    /// Shifts out forever under T2 without counting bits.
    OutFreeRunningT2,
    OutUnderT2,
    OutUnderSystemClock,
    OutUnderExternalClock,
}

impl ShiftMode {
    #[must_use]
    pub const fn from_acr(acr: u8) -> Self {
        match (acr >> 2) & 0x07 {
            0 => Self::Disabled,
            1 => Self::InUnderT2,
            2 => Self::InUnderSystemClock,
            3 => Self::InUnderExternalClock,
            4 => Self::OutFreeRunningT2,
            5 => Self::OutUnderT2,
            6 => Self::OutUnderSystemClock,
            _ => Self::OutUnderExternalClock,
        }
    }
}

/// Timer 1 operating mode (ACR bit 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer1Mode {
    /// Fires once per start, PB7 goes high and stays there.
    OneShot,
    /// Reloads from the latch on every rollover and toggles PB7.
    Continuous,
}

impl Timer1Mode {
    #[must_use]
    pub const fn from_acr(acr: u8) -> Self {
        if acr & 0x40 != 0 {
            Self::Continuous
        } else {
            Self::OneShot
        }
    }
}

/// CA2/CB2 output control, decoded from the 3-bit PCR field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLineMode {
    /// Input modes (the line is not driven).
    Input,
    /// Goes low on port access and stays low.
    Handshake,
    /// Goes low on port access for one cycle.
    Pulse,
    /// Held low.
    Low,
    /// Held high.
    High,
}

impl ControlLineMode {
    /// Decode a PCR control field already shifted down to bits 2-0.
    #[must_use]
    pub const fn from_field(field: u8) -> Self {
        match field & 0x07 {
            4 => Self::Handshake,
            5 => Self::Pulse,
            6 => Self::Low,
            7 => Self::High,
            _ => Self::Input,
        }
    }
}

/// MOS 6522 Versatile Interface Adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Via6522 {
    /// Port A output register.
    port_a: u8,
    /// Port B output register.
    port_b: u8,
    /// Port A data direction register.
    ddr_a: u8,
    /// Port B data direction register.
    ddr_b: u8,

    /// Timer 1 counter (16-bit, counts down).
    timer1_counter: u16,
    /// Timer 1 latch (reloaded into the counter in continuous mode).
    timer1_latch: u16,
    /// Timer 1 is counting.
    timer1_running: bool,
    /// Timer 1 may still raise its one-shot interrupt.
    timer1_armed: bool,
    /// Timer 1 controlled PB7 level.
    pb7_high: bool,

    /// Timer 2 counter (16-bit, counts down).
    timer2_counter: u16,
    /// Timer 2 latch low byte (also the shift clock divider reload).
    timer2_latch_lo: u8,
    /// Timer 2 is counting.
    timer2_running: bool,
    /// Timer 2 may still raise its one-shot interrupt.
    timer2_armed: bool,

    /// Shift register.
    shift_register: u8,
    /// Bits shifted since the last SR access; 8 = idle.
    shift_count: u8,
    /// Shift clock divider.
    shift_divider: u8,
    /// Alternates on every divider reload; a T2 shift happens when set.
    shift_phase: bool,

    /// Auxiliary control register (ACR).
    /// Bit 7: PB7 driven by T1
    /// Bit 6: T1 continuous
    /// Bit 5: T2 counts PB6 pulses
    /// Bits 4-2: Shift register control
    acr: u8,
    /// Peripheral control register (PCR).
    /// Bits 7-5: CB2 control
    /// Bits 3-1: CA2 control
    pcr: u8,
    /// Interrupt flag register. Bit 7 mirrors (IFR & IER & $7F) != 0.
    ifr: u8,
    /// Interrupt enable register.
    ier: u8,

    /// CA2 output level.
    ca2: bool,
    /// CB2 level from the handshake/manual logic.
    cb2_handshake: bool,
    /// CB2 level from the shift register.
    cb2_shift: bool,
}

impl Via6522 {
    /// Create a new VIA with all registers in their reset state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port_a: 0,
            port_b: 0,
            ddr_a: 0,
            ddr_b: 0,
            timer1_counter: 0,
            timer1_latch: 0,
            timer1_running: false,
            timer1_armed: false,
            pb7_high: true,
            timer2_counter: 0,
            timer2_latch_lo: 0,
            timer2_running: false,
            timer2_armed: false,
            shift_register: 0,
            shift_count: 8,
            shift_divider: 0,
            shift_phase: false,
            acr: 0,
            pcr: 0,
            ifr: 0,
            ier: 0,
            ca2: true,
            cb2_handshake: true,
            cb2_shift: false,
        }
    }

    /// Return every register and line to its power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// First half of a clock cycle: timers and shift register.
    pub fn phase1(&mut self) {
        self.tick_timer1();
        self.tick_timer2();
        let t2_shift = self.tick_shift_clock();
        self.tick_shift_register(t2_shift);
    }

    /// Second half of a clock cycle: pulse-mode control lines return high.
    pub fn phase2(&mut self) {
        if self.ca2_mode() == ControlLineMode::Pulse {
            self.ca2 = true;
        }
        if self.cb2_mode() == ControlLineMode::Pulse {
            self.cb2_handshake = true;
        }
    }

    /// Check if the VIA has an active (and enabled) interrupt.
    #[must_use]
    pub fn irq_active(&self) -> bool {
        self.ifr & 0x80 != 0
    }

    /// Read a VIA register.
    ///
    /// Register 0 returns bit 5 clear; the comparator input is merged in
    /// by the machine. Registers 1 and $F return the output register; the
    /// machine substitutes sound chip data when the PSG drives port A.
    pub fn read(&mut self, reg: u8) -> u8 {
        match reg & 0x0F {
            0x00 => {
                if self.acr & 0x80 != 0 {
                    (self.port_b & 0x5F) | if self.pb7_high { 0x80 } else { 0 }
                } else {
                    self.port_b & 0xDF
                }
            }
            0x01 => {
                self.port_a_handshake();
                self.port_a
            }
            0x02 => self.ddr_b,
            0x03 => self.ddr_a,
            0x04 => {
                self.ifr &= !IFR_T1;
                self.timer1_running = false;
                self.timer1_armed = false;
                self.pb7_high = true;
                self.update_irq();
                self.timer1_counter as u8
            }
            0x05 => (self.timer1_counter >> 8) as u8,
            0x06 => self.timer1_latch as u8,
            0x07 => (self.timer1_latch >> 8) as u8,
            0x08 => {
                self.ifr &= !IFR_T2;
                self.timer2_running = false;
                self.timer2_armed = false;
                self.update_irq();
                self.timer2_counter as u8
            }
            0x09 => (self.timer2_counter >> 8) as u8,
            0x0A => {
                self.restart_shift();
                self.shift_register
            }
            0x0B => self.acr,
            0x0C => self.pcr,
            0x0D => self.ifr,
            0x0E => self.ier | 0x80,
            _ => self.port_a,
        }
    }

    /// Write a VIA register.
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x0F {
            0x00 => {
                self.port_b = value;
                if self.cb2_mode() == ControlLineMode::Handshake {
                    self.cb2_handshake = false;
                }
            }
            0x01 => {
                self.port_a_handshake();
                self.port_a = value;
            }
            0x02 => self.ddr_b = value,
            0x03 => self.ddr_a = value,
            0x04 | 0x06 => {
                self.timer1_latch = (self.timer1_latch & 0xFF00) | u16::from(value);
            }
            0x05 => {
                // Load the counter from the latch and start, PB7 goes low.
                self.timer1_latch = (self.timer1_latch & 0x00FF) | (u16::from(value) << 8);
                self.timer1_counter = self.timer1_latch;
                self.ifr &= !IFR_T1;
                self.timer1_running = true;
                self.timer1_armed = true;
                self.pb7_high = false;
                self.update_irq();
            }
            0x07 => {
                self.timer1_latch = (self.timer1_latch & 0x00FF) | (u16::from(value) << 8);
            }
            0x08 => self.timer2_latch_lo = value,
            0x09 => {
                self.timer2_counter = (u16::from(value) << 8) | u16::from(self.timer2_latch_lo);
                self.ifr &= !IFR_T2;
                self.timer2_running = true;
                self.timer2_armed = true;
                self.update_irq();
            }
            0x0A => {
                self.shift_register = value;
                self.restart_shift();
            }
            0x0B => self.acr = value,
            0x0C => {
                self.pcr = value;
                self.ca2 = self.ca2_mode() != ControlLineMode::Low;
                self.cb2_handshake = self.cb2_mode() != ControlLineMode::Low;
            }
            0x0D => {
                // Writing 1s clears the corresponding flags
                self.ifr &= !(value & 0x7F);
                self.update_irq();
            }
            0x0E => {
                // Bit 7 selects set (1) or clear (0) mode
                if value & 0x80 != 0 {
                    self.ier |= value & 0x7F;
                } else {
                    self.ier &= !(value & 0x7F);
                }
                self.update_irq();
            }
            _ => self.port_a = value,
        }
    }

    /// Port A output register (feeds the DAC and the PSG data bus).
    #[must_use]
    pub fn port_a(&self) -> u8 {
        self.port_a
    }

    /// Port B output register (mux select, PSG control, RAMP).
    #[must_use]
    pub fn port_b(&self) -> u8 {
        self.port_b
    }

    /// Beam enable: true while the beam is unblanked.
    ///
    /// CB2 comes from the shift register in shift-out modes (ACR bit 4),
    /// otherwise from the handshake logic.
    #[must_use]
    pub fn blank(&self) -> bool {
        if self.acr & 0x10 != 0 {
            self.cb2_shift
        } else {
            self.cb2_handshake
        }
    }

    /// True while CA2 is low, which forces the integrators to the origin.
    #[must_use]
    pub fn zero(&self) -> bool {
        !self.ca2
    }

    /// RAMP line level. The integrators only move while it is low.
    ///
    /// Driven by PB7 from timer 1 when ACR bit 7 is set, else by ORB bit 7.
    #[must_use]
    pub fn ramp(&self) -> bool {
        if self.acr & 0x80 != 0 {
            self.pb7_high
        } else {
            self.port_b & 0x80 != 0
        }
    }

    /// Get the current IFR value (for diagnostic/debug use).
    #[must_use]
    pub fn ifr(&self) -> u8 {
        self.ifr
    }

    /// Get the current IER value (for diagnostic/debug use).
    #[must_use]
    pub fn ier(&self) -> u8 {
        self.ier
    }

    #[must_use]
    pub fn acr(&self) -> u8 {
        self.acr
    }

    #[must_use]
    pub fn pcr(&self) -> u8 {
        self.pcr
    }

    #[must_use]
    pub fn timer1_counter(&self) -> u16 {
        self.timer1_counter
    }

    #[must_use]
    pub fn timer2_counter(&self) -> u16 {
        self.timer2_counter
    }

    #[must_use]
    pub fn shift_register(&self) -> u8 {
        self.shift_register
    }

    #[must_use]
    pub fn shift_mode(&self) -> ShiftMode {
        ShiftMode::from_acr(self.acr)
    }

    #[must_use]
    pub fn timer1_mode(&self) -> Timer1Mode {
        Timer1Mode::from_acr(self.acr)
    }

    #[must_use]
    pub fn ca2_mode(&self) -> ControlLineMode {
        ControlLineMode::from_field(self.pcr >> 1)
    }

    #[must_use]
    pub fn cb2_mode(&self) -> ControlLineMode {
        ControlLineMode::from_field(self.pcr >> 5)
    }

    // --- Internal helpers ---

    /// Keep IFR bit 7 equal to the OR of enabled, pending flags.
    fn update_irq(&mut self) {
        if self.ifr & self.ier & 0x7F != 0 {
            self.ifr |= 0x80;
        } else {
            self.ifr &= 0x7F;
        }
    }

    fn raise(&mut self, flag: u8) {
        self.ifr |= flag;
        self.update_irq();
    }

    /// Register 1 access pulls CA2 low in handshake mode.
    fn port_a_handshake(&mut self) {
        if self.ca2_mode() == ControlLineMode::Handshake {
            self.ca2 = false;
        }
    }

    fn restart_shift(&mut self) {
        self.ifr &= !IFR_SR;
        self.shift_count = 0;
        self.shift_phase = true;
        self.update_irq();
    }

    fn tick_timer1(&mut self) {
        if !self.timer1_running {
            return;
        }

        self.timer1_counter = self.timer1_counter.wrapping_sub(1);
        if self.timer1_counter != 0xFFFF {
            return;
        }

        match self.timer1_mode() {
            Timer1Mode::Continuous => {
                self.raise(IFR_T1);
                self.pb7_high = !self.pb7_high;
                self.timer1_counter = self.timer1_latch;
            }
            Timer1Mode::OneShot => {
                if self.timer1_armed {
                    self.raise(IFR_T1);
                    self.pb7_high = true;
                    self.timer1_armed = false;
                }
            }
        }
    }

    fn tick_timer2(&mut self) {
        // ACR bit 5: PB6 pulse counting is never clocked here.
        if !self.timer2_running || self.acr & 0x20 != 0 {
            return;
        }

        self.timer2_counter = self.timer2_counter.wrapping_sub(1);
        if self.timer2_counter == 0xFFFF && self.timer2_armed {
            self.raise(IFR_T2);
            self.timer2_armed = false;
        }
    }

    /// Count down the shift divider. Returns true on a T2 shift pulse.
    fn tick_shift_clock(&mut self) -> bool {
        self.shift_divider = self.shift_divider.wrapping_sub(1);
        if self.shift_divider != 0xFF {
            return false;
        }

        self.shift_divider = self.timer2_latch_lo;
        let pulse = self.shift_phase;
        self.shift_phase = !self.shift_phase;
        pulse
    }

    fn tick_shift_register(&mut self, t2_shift: bool) {
        if self.shift_count >= 8 {
            return;
        }

        match self.shift_mode() {
            ShiftMode::Disabled
            | ShiftMode::InUnderExternalClock
            | ShiftMode::OutUnderExternalClock => {}
            ShiftMode::InUnderT2 => {
                // CB2 is always an output here, so zeros shift in.
                if t2_shift {
                    self.shift_register <<= 1;
                    self.shift_count += 1;
                }
            }
            ShiftMode::InUnderSystemClock => {
                self.shift_register <<= 1;
                self.shift_count += 1;
            }
            ShiftMode::OutFreeRunningT2 => {
                if t2_shift {
                    self.rotate_out();
                }
            }
            ShiftMode::OutUnderT2 => {
                if t2_shift {
                    self.rotate_out();
                    self.shift_count += 1;
                }
            }
            ShiftMode::OutUnderSystemClock => {
                self.rotate_out();
                self.shift_count += 1;
            }
        }

        if self.shift_count == 8 {
            self.raise(IFR_SR);
        }
    }

    /// Bit 7 goes out on CB2 and recirculates into bit 0.
    fn rotate_out(&mut self) {
        let bit = self.shift_register >> 7;
        self.cb2_shift = bit != 0;
        self.shift_register = (self.shift_register << 1) | bit;
    }
}

impl Default for Via6522 {
    fn default() -> Self {
        Self::new()
    }
}

// IFR/IER bit masks
const IFR_SR: u8 = 0x04;
const IFR_T2: u8 = 0x20;
const IFR_T1: u8 = 0x40;

//! Analog vector hardware: DAC, sample-and-holds, integrators and beam.
//!
//! Port A drives an 8-bit DAC. Port B bits 0-2 route the DAC output
//! through a demultiplexer into the Y, zero-reference and brightness
//! sample-and-holds, and select which joystick pot feeds the comparator.
//! The X integrator input comes straight from the DAC.
//!
//! Each CPU cycle the integrators add the current deltas to the beam
//! position unless RAMP is high. While the beam is unblanked, runs of
//! constant delta and brightness are collected into segments.

use mos_via_6522::Via6522;

use crate::vectors::{Segment, SegmentLists};

/// Horizontal extent in integrator units.
pub const MAX_X: i64 = 33_000;
/// Vertical extent in integrator units.
pub const MAX_Y: i64 = 41_000;

/// VIA output lines sampled by the analog circuitry each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamLines {
    /// CA2 low: integrators are pulled back to the centre.
    pub zero: bool,
    /// RAMP high: integrators hold.
    pub ramp: bool,
    /// CB2 high: beam visible.
    pub beam_on: bool,
}

impl BeamLines {
    #[must_use]
    pub fn from_via(via: &Via6522) -> Self {
        Self {
            zero: via.zero(),
            ramp: via.ramp(),
            beam_on: via.blank(),
        }
    }
}

/// Sample-and-hold values, integrator state and the open segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analog {
    /// Zero reference.
    rsh: u8,
    /// DAC output (X integrator input).
    xsh: u8,
    ysh: u8,
    /// Brightness.
    zsh: u8,
    /// Joystick pots.
    jch: [u8; 4],
    /// Pot selected for the comparator.
    jsh: u8,
    /// Comparator result as it appears on port B bit 5.
    compare: u8,
    dx: i64,
    dy: i64,
    x: i64,
    y: i64,
    vectoring: bool,
    /// Segment being traced, with the delta it was opened under.
    open: Segment,
    open_dx: i64,
    open_dy: i64,
}

impl Default for Analog {
    fn default() -> Self {
        Self::new()
    }
}

impl Analog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rsh: 128,
            xsh: 128,
            ysh: 128,
            zsh: 0,
            jch: [128; 4],
            jsh: 128,
            compare: 0,
            dx: 0,
            dy: 0,
            x: MAX_X / 2,
            y: MAX_Y / 2,
            vectoring: false,
            open: Segment::default(),
            open_dx: 0,
            open_dy: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Load the DAC from port A. The DAC input is offset binary.
    pub fn set_dac(&mut self, ora: u8) {
        self.xsh = ora ^ 0x80;
    }

    /// Re-evaluate the multiplexer after a port write.
    pub fn update(&mut self, orb: u8) {
        let latch = orb & 0x01 == 0;
        match orb & 0x06 {
            0x00 => {
                self.jsh = self.jch[0];
                if latch {
                    self.ysh = self.xsh;
                }
            }
            0x02 => {
                self.jsh = self.jch[1];
                if latch {
                    self.rsh = self.xsh;
                }
            }
            0x04 => {
                self.jsh = self.jch[2];
                if latch {
                    self.zsh = self.xsh.saturating_sub(0x80);
                }
            }
            // Sound output line
            _ => self.jsh = self.jch[3],
        }

        self.compare = if self.jsh > self.xsh { 0x20 } else { 0 };

        self.dx = i64::from(self.xsh) - i64::from(self.rsh);
        self.dy = i64::from(self.rsh) - i64::from(self.ysh);
    }

    fn in_bounds(&self) -> bool {
        (0..MAX_X).contains(&self.x) && (0..MAX_Y).contains(&self.y)
    }

    fn open_segment(&mut self, dx: i64, dy: i64) {
        self.vectoring = true;
        self.open = Segment {
            x0: self.x,
            y0: self.y,
            x1: self.x,
            y1: self.y,
            color: self.zsh,
        };
        self.open_dx = dx;
        self.open_dy = dy;
    }

    /// Advance the beam by one CPU cycle.
    pub fn step(&mut self, lines: BeamLines, segments: &mut SegmentLists) {
        let (dx, dy) = if lines.zero {
            (MAX_X / 2 - self.x, MAX_Y / 2 - self.y)
        } else if lines.ramp {
            (0, 0)
        } else {
            (self.dx, self.dy)
        };

        if !self.vectoring {
            if lines.beam_on && self.in_bounds() {
                self.open_segment(dx, dy);
            }
        } else if !lines.beam_on {
            self.vectoring = false;
            segments.add(self.open);
        } else if dx != self.open_dx || dy != self.open_dy || self.zsh != self.open.color {
            segments.add(self.open);
            if self.in_bounds() {
                self.open_segment(dx, dy);
            } else {
                self.vectoring = false;
            }
        }

        self.x += dx;
        self.y += dy;

        if self.vectoring && self.in_bounds() {
            self.open.x1 = self.x;
            self.open.y1 = self.y;
        }
    }

    /// Set a joystick pot (0 = left/down, $80 = centre, $FF = right/up).
    pub fn set_joystick(&mut self, channel: usize, value: u8) {
        self.jch[channel & 3] = value;
    }

    #[must_use]
    pub fn joystick(&self, channel: usize) -> u8 {
        self.jch[channel & 3]
    }

    #[must_use]
    pub fn compare(&self) -> u8 {
        self.compare
    }

    /// Beam position in integrator units.
    #[must_use]
    pub fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    #[must_use]
    pub fn delta(&self) -> (i64, i64) {
        (self.dx, self.dy)
    }

    #[must_use]
    pub fn is_vectoring(&self) -> bool {
        self.vectoring
    }

    #[must_use]
    pub fn rsh(&self) -> u8 {
        self.rsh
    }

    #[must_use]
    pub fn xsh(&self) -> u8 {
        self.xsh
    }

    #[must_use]
    pub fn ysh(&self) -> u8 {
        self.ysh
    }

    #[must_use]
    pub fn zsh(&self) -> u8 {
        self.zsh
    }
}

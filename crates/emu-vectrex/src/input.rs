//! Controller input for the Vectrex.
//!
//! Three layers:
//! 1. `VectrexKey`: the eight host input lines.
//! 2. `InputState`: pending controller state, edited at any time and
//!    latched into the machine at the start of each frame.
//! 3. `InputQueue`: timed events for scripted sequences.
//!
//! Player 1's directions drive the four buttons wired to the sound chip's
//! I/O port (active low). Player 2's directions drive the analog pots of
//! the second joystick: $00, $80 or $FF.

use std::collections::VecDeque;

/// Pot value with the stick centred.
pub const POT_CENTRE: u8 = 0x80;

/// One of the eight host input lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectrexKey {
    Player1Left,
    Player1Right,
    Player1Up,
    Player1Down,
    Player2Left,
    Player2Right,
    Player2Up,
    Player2Down,
}

impl VectrexKey {
    /// Map a host key code (0-7) to a line.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Player1Left,
            1 => Self::Player1Right,
            2 => Self::Player1Up,
            3 => Self::Player1Down,
            4 => Self::Player2Left,
            5 => Self::Player2Right,
            6 => Self::Player2Up,
            7 => Self::Player2Down,
            _ => return None,
        })
    }

    /// Parse a command-line name such as `p1-left`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "p1-left" => Self::Player1Left,
            "p1-right" => Self::Player1Right,
            "p1-up" => Self::Player1Up,
            "p1-down" => Self::Player1Down,
            "p2-left" => Self::Player2Left,
            "p2-right" => Self::Player2Right,
            "p2-up" => Self::Player2Up,
            "p2-down" => Self::Player2Down,
            _ => return None,
        })
    }
}

/// Controller state waiting to be latched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputState {
    /// Sound chip port A bits 0-3, active low.
    pub buttons: u8,
    /// Joystick 2 horizontal pot.
    pub pot_x: u8,
    /// Joystick 2 vertical pot.
    pub pot_y: u8,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buttons: 0x0F,
            pot_x: POT_CENTRE,
            pot_y: POT_CENTRE,
        }
    }

    /// Apply a press or release.
    pub fn set_key(&mut self, key: VectrexKey, pressed: bool) {
        let button = |mask: u8, buttons: &mut u8| {
            if pressed {
                *buttons &= !mask;
            } else {
                *buttons |= mask;
            }
        };

        match key {
            VectrexKey::Player1Left => button(0x01, &mut self.buttons),
            VectrexKey::Player1Right => button(0x02, &mut self.buttons),
            VectrexKey::Player1Up => button(0x04, &mut self.buttons),
            VectrexKey::Player1Down => button(0x08, &mut self.buttons),
            VectrexKey::Player2Left => self.pot_x = if pressed { 0x00 } else { POT_CENTRE },
            VectrexKey::Player2Right => self.pot_x = if pressed { 0xFF } else { POT_CENTRE },
            VectrexKey::Player2Up => self.pot_y = if pressed { 0xFF } else { POT_CENTRE },
            VectrexKey::Player2Down => self.pot_y = if pressed { 0x00 } else { POT_CENTRE },
        }
    }
}

/// A timed controller event.
#[derive(Debug, Clone)]
pub struct InputEvent {
    /// Frame number at which this event fires.
    pub frame: u64,
    pub key: VectrexKey,
    /// True = press, false = release.
    pub pressed: bool,
}

/// Timed input queue for scripted sequences.
///
/// Events are sorted by frame number and processed at the start of each frame.
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Enqueue a raw input event.
    pub fn push(&mut self, event: InputEvent) {
        let pos = self
            .events
            .iter()
            .position(|e| e.frame > event.frame)
            .unwrap_or(self.events.len());
        self.events.insert(pos, event);
    }

    /// Enqueue a press and its release `hold_frames` later.
    pub fn enqueue_key(&mut self, key: VectrexKey, at_frame: u64, hold_frames: u64) {
        self.push(InputEvent {
            frame: at_frame,
            key,
            pressed: true,
        });
        self.push(InputEvent {
            frame: at_frame + hold_frames,
            key,
            pressed: false,
        });
    }

    /// Apply every event due at or before `frame`.
    pub fn process(&mut self, frame: u64, state: &mut InputState) {
        while self.events.front().is_some_and(|e| e.frame <= frame) {
            if let Some(event) = self.events.pop_front() {
                state.set_key(event.key, event.pressed);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

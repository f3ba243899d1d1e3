//! Host-facing lifecycle.
//!
//! A [`Session`] wraps a [`Vectrex`] the way a front end drives it: size
//! the output surface, load images by path, then call [`Session::frame`]
//! every 20 ms. Results flow back through the [`Host`] trait. Nothing in
//! here blocks or fails loudly: load problems are reported as messages
//! and leave the session idle.

use std::path::Path;

use motorola_6809::RegisterId;

use crate::audio::AudioTap;
use crate::config::{DEFAULT_SAMPLE_RATE, VectrexConfig};
use crate::display::{Display, InitError, Line};
use crate::input::{InputQueue, VectrexKey};
use crate::rom::{self, LoadError};
use crate::vectrex::Vectrex;

/// CPU register snapshot for a live debug view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuView {
    pub pc: u16,
    /// User stack pointer.
    pub u: u16,
    /// Hardware stack pointer.
    pub s: u16,
    pub a: u8,
    pub b: u8,
    pub x: u16,
    pub y: u16,
    pub dp: u8,
    pub cc: u8,
    /// Segments in the draw list.
    pub vectors: usize,
}

impl CpuView {
    fn capture(vectrex: &Vectrex) -> Self {
        let regs = vectrex.cpu().regs;
        Self {
            pc: regs.pc,
            u: regs.u,
            s: regs.s,
            a: regs.a,
            b: regs.b,
            x: regs.x,
            y: regs.y,
            dp: regs.dp,
            cc: regs.cc,
            vectors: vectrex.segments().draw().len(),
        }
    }
}

/// Callbacks into the front end.
pub trait Host {
    /// Human-readable status text.
    fn message(&mut self, text: &str);

    /// One segment of a completed display pass, in pixel coordinates.
    fn add_line(&mut self, line: &Line);

    /// The RGBA pixel buffer after a frame.
    fn render_frame(&mut self, pixels: &[u8]);

    /// Register snapshot, sent after each frame while live update is on.
    fn update_cpu_view(&mut self, _view: &CpuView) {}
}

/// Debugger requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    /// Toggle register snapshots after every frame.
    LiveUpdate,
}

impl DebugCommand {
    /// Map a host command code. Only live update (13) is supported; the
    /// other debugger codes are ignored.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            13 => Some(Self::LiveUpdate),
            _ => None,
        }
    }
}

/// A running (or idle) emulator bound to a host.
pub struct Session<H: Host> {
    host: H,
    /// Blank surface sized by `init`, copied into every started machine.
    display: Option<Display>,
    machine: Option<Vectrex>,
    audio_tap: Option<AudioTap>,
    sample_rate: u32,
    paused: bool,
    live_update: bool,
}

impl<H: Host> Session<H> {
    #[must_use]
    pub fn new(host: H) -> Self {
        Self {
            host,
            display: None,
            machine: None,
            audio_tap: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            paused: false,
            live_update: false,
        }
    }

    /// Set the audio rate used by the next `start`.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Size the pixel surface and clear the paused flag.
    pub fn init(&mut self, width: u32, height: u32) -> Result<(), InitError> {
        let display = Display::new(width, height)?;
        log::info!(
            "display {width}x{height}, scaling {}, offset {:?}",
            display.scaling(),
            display.offset()
        );
        if let Some(machine) = self.machine.as_mut() {
            machine.set_display(display.clone());
        }
        self.display = Some(display);
        self.paused = false;
        Ok(())
    }

    /// Load the system ROM and optional cartridge, start the sound chip
    /// and reset.
    ///
    /// A ROM failure leaves the session idle. A cartridge failure is
    /// reported and the machine starts with an empty slot.
    pub fn start(
        &mut self,
        rom_path: &Path,
        rom_label: &str,
        cart_path: Option<&Path>,
        cart_label: &str,
    ) -> Result<(), LoadError> {
        let rom = match rom::load_rom(rom_path) {
            Ok(rom) => rom,
            Err(e) => {
                log::error!("system ROM {}: {e}", rom_path.display());
                self.host.message(&format!("Error loading ROM {rom_label}: {e}"));
                self.stop();
                return Err(e);
            }
        };
        self.host.message(&format!("ROM loaded: {rom_label}"));

        let cartridge = cart_path.and_then(|path| match rom::load_cartridge(path) {
            Ok(cart) => {
                self.host
                    .message(&format!("Cartridge loaded: {cart_label}"));
                Some(cart)
            }
            Err(e) => {
                log::warn!("cartridge {}: {e}", path.display());
                self.host
                    .message(&format!("Error loading cartridge {cart_label}: {e}"));
                None
            }
        });

        let config = VectrexConfig {
            rom,
            cartridge,
            sample_rate: self.sample_rate,
        };
        let mut machine = Vectrex::new(&config);
        if let Some(display) = &self.display {
            machine.set_display(display.clone());
        }
        if let Some(mut previous) = self.machine.take() {
            previous.stop_audio();
        }
        self.audio_tap = machine.take_audio_tap();
        self.machine = Some(machine);
        Ok(())
    }

    /// Run one 20 ms frame and deliver its output to the host.
    pub fn frame(&mut self) {
        if self.paused {
            return;
        }
        let Some(machine) = self.machine.as_mut() else {
            return;
        };

        machine.run_frame();

        if machine.take_render_complete() {
            for line in machine.lines() {
                self.host.add_line(line);
            }
        }
        self.host.render_frame(machine.framebuffer());

        if self.live_update {
            self.host.update_cpu_view(&CpuView::capture(machine));
        }
    }

    /// Host key code 0-7 pressed or released. Unknown codes are ignored.
    pub fn key(&mut self, code: u32, pressed: bool) {
        let Some(key) = VectrexKey::from_code(code) else {
            log::debug!("ignoring key code {code}");
            return;
        };
        if let Some(machine) = self.machine.as_mut() {
            if pressed {
                machine.press_key(key);
            } else {
                machine.release_key(key);
            }
        }
    }

    /// Scripted input for the running machine.
    pub fn input_queue(&mut self) -> Option<&mut InputQueue> {
        self.machine.as_mut().map(Vectrex::input_queue)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Stop sound and drop the machine.
    pub fn stop(&mut self) {
        self.audio_tap = None;
        if let Some(mut machine) = self.machine.take() {
            machine.stop_audio();
            log::info!("stopped after {} frames", machine.frame_count());
        }
    }

    pub fn command(&mut self, command: DebugCommand) {
        match command {
            DebugCommand::LiveUpdate => self.live_update = !self.live_update,
        }
    }

    /// Diagnostic register read by host code (0 PC, 1 X, 2 Y, 3 A, 4 B,
    /// 5 S, 6 U, 7 DP, 8 CC). Unknown codes and an idle session read 0.
    #[must_use]
    pub fn register(&self, code: u32) -> u16 {
        match (RegisterId::from_code(code), self.machine.as_ref()) {
            (Some(id), Some(machine)) => machine.register(id),
            _ => 0,
        }
    }

    /// Hand the audio consumer to the host. Available once per `start`.
    pub fn audio_tap(&mut self) -> Option<AudioTap> {
        self.audio_tap.take()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.machine.is_some()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn machine(&self) -> Option<&Vectrex> {
        self.machine.as_ref()
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::ROM_SIZE;

    #[derive(Default)]
    struct RecordingHost {
        messages: Vec<String>,
        lines: Vec<Line>,
        frames: usize,
        last_frame_len: usize,
        views: Vec<CpuView>,
    }

    impl Host for RecordingHost {
        fn message(&mut self, text: &str) {
            self.messages.push(text.to_string());
        }

        fn add_line(&mut self, line: &Line) {
            self.lines.push(*line);
        }

        fn render_frame(&mut self, pixels: &[u8]) {
            self.frames += 1;
            self.last_frame_len = pixels.len();
        }

        fn update_cpu_view(&mut self, view: &CpuView) {
            self.views.push(*view);
        }
    }

    /// Write a ROM that spins on `BRA *` at $E000.
    fn spin_rom(name: &str) -> PathBuf {
        let mut rom = vec![0u8; ROM_SIZE];
        rom[0] = 0x20;
        rom[1] = 0xFE;
        rom[ROM_SIZE - 2] = 0xE0;
        rom[ROM_SIZE - 1] = 0x00;
        let path = std::env::temp_dir().join(format!(
            "emu-vectrex-session-{}-{name}.bin",
            std::process::id()
        ));
        std::fs::write(&path, rom).expect("write ROM");
        path
    }

    fn started(name: &str) -> Session<RecordingHost> {
        let rom = spin_rom(name);
        let mut session = Session::new(RecordingHost::default());
        session.init(330, 410).expect("init");
        session.start(&rom, "test.bin", None, "").expect("start");
        let _ = std::fs::remove_file(rom);
        session
    }

    #[test]
    fn frame_before_start_is_a_no_op() {
        let mut session = Session::new(RecordingHost::default());
        session.frame();
        assert_eq!(session.host().frames, 0);
        assert!(!session.is_running());
        assert_eq!(session.register(0), 0);
    }

    #[test]
    fn init_rejects_zero_size() {
        let mut session = Session::new(RecordingHost::default());
        assert!(session.init(0, 410).is_err());
    }

    #[test]
    fn missing_rom_reports_and_stays_idle() {
        let mut session = Session::new(RecordingHost::default());
        let result = session.start(
            Path::new("/nonexistent/vectrex-rom.bin"),
            "rom.bin",
            None,
            "",
        );
        assert!(result.is_err());
        assert!(!session.is_running());
        assert!(session.host().messages[0].starts_with("Error loading ROM rom.bin"));
    }

    #[test]
    fn missing_cartridge_still_starts() {
        let rom = spin_rom("missing-cart");
        let mut session = Session::new(RecordingHost::default());
        session
            .start(
                &rom,
                "rom.bin",
                Some(Path::new("/nonexistent/cart.bin")),
                "cart.bin",
            )
            .expect("start");
        let _ = std::fs::remove_file(rom);

        assert!(session.is_running());
        let messages = &session.host().messages;
        assert_eq!(messages[0], "ROM loaded: rom.bin");
        assert!(messages[1].starts_with("Error loading cartridge cart.bin"));
    }

    #[test]
    fn start_resets_to_rom_entry() {
        let session = started("entry");
        assert_eq!(session.register(0), 0xE000);
        assert_eq!(session.register(99), 0);
    }

    #[test]
    fn every_frame_renders_pixels() {
        let mut session = started("pixels");
        session.frame();
        session.frame();
        assert_eq!(session.host().frames, 2);
        assert_eq!(session.host().last_frame_len, 330 * 410 * 4);
    }

    #[test]
    fn pause_and_resume() {
        let mut session = started("pause");
        session.pause();
        session.frame();
        assert_eq!(session.host().frames, 0);
        assert!(session.is_paused());

        session.resume();
        session.frame();
        assert_eq!(session.host().frames, 1);
    }

    #[test]
    fn init_clears_pause() {
        let mut session = started("init-pause");
        session.pause();
        session.init(660, 820).expect("init");
        assert!(!session.is_paused());
        session.frame();
        assert_eq!(session.host().last_frame_len, 660 * 820 * 4);
    }

    #[test]
    fn live_update_toggles() {
        let mut session = started("live");
        session.frame();
        assert!(session.host().views.is_empty());

        session.command(DebugCommand::LiveUpdate);
        session.frame();
        assert_eq!(session.host().views.len(), 1);
        assert_eq!(session.host().views[0].pc, 0xE000);

        session.command(DebugCommand::LiveUpdate);
        session.frame();
        assert_eq!(session.host().views.len(), 1);
    }

    #[test]
    fn command_codes() {
        assert_eq!(DebugCommand::from_code(13), Some(DebugCommand::LiveUpdate));
        assert_eq!(DebugCommand::from_code(3), None);
    }

    #[test]
    fn keys_reach_the_machine() {
        let mut session = started("keys");
        session.key(4, true); // p2-left
        session.key(42, true);
        session.frame();
        let machine = session.machine().expect("running");
        assert_eq!(
            machine.bus().psg.read(crate::bus::PSG_PORT_A) & 0x0F,
            0x0F
        );
        assert_eq!(machine.bus().analog.joystick(0), 0x00);
    }

    #[test]
    fn audio_tap_handed_out_once() {
        let mut session = started("audio");
        let mut tap = session.audio_tap().expect("tap");
        assert!(session.audio_tap().is_none());
        session.frame();
        assert_eq!(tap.available(), 441);
        let mut out = [0u8; 441];
        assert_eq!(tap.pull(&mut out), 441);
    }

    #[test]
    fn stop_drops_machine() {
        let mut session = started("stop");
        session.stop();
        assert!(!session.is_running());
        session.frame();
        assert_eq!(session.host().frames, 0);
    }

    #[test]
    fn restart_keeps_display_size() {
        let rom = spin_rom("restart");
        let mut session = Session::new(RecordingHost::default());
        session.init(660, 820).expect("init");
        session.start(&rom, "a.bin", None, "").expect("first start");
        session.frame();
        assert_eq!(session.host().last_frame_len, 660 * 820 * 4);

        session.start(&rom, "a.bin", None, "").expect("second start");
        let _ = std::fs::remove_file(rom);
        session.frame();
        assert_eq!(session.host().last_frame_len, 660 * 820 * 4);
        assert_eq!(session.machine().expect("running").frame_count(), 1);
    }

    #[test]
    fn failed_restart_leaves_session_idle() {
        let mut session = started("failed-restart");
        assert!(session.audio_tap().is_some());
        let result = session.start(Path::new("/nonexistent/rom.bin"), "rom.bin", None, "");
        assert!(result.is_err());
        assert!(!session.is_running());
        assert_eq!(session.register(0), 0);

        session.frame();
        assert_eq!(session.host().frames, 0);
    }

    #[test]
    fn sample_rate_sets_frame_length() {
        let rom = spin_rom("rate");
        let mut session = Session::new(RecordingHost::default());
        session.set_sample_rate(44_100);
        session.start(&rom, "rate.bin", None, "").expect("start");
        let _ = std::fs::remove_file(rom);

        let tap = session.audio_tap().expect("tap");
        session.frame();
        assert_eq!(tap.available(), 882);
    }
}

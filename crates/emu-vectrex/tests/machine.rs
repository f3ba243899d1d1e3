//! Whole-machine tests driven by small hand-assembled programs.

use emu_core::{Observable, Value};
use emu_vectrex::config::{ROM_SIZE, VectrexConfig};
use emu_vectrex::{CpuView, DebugCommand, Host, Line, Session, Vectrex, VectrexKey};

/// Build a system ROM with `program` at $E000 and the reset vector there.
fn rom_with(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; ROM_SIZE];
    rom[..program.len()].copy_from_slice(program);
    rom[ROM_SIZE - 2] = 0xE0;
    rom[ROM_SIZE - 1] = 0x00;
    rom
}

/// Draws one horizontal line by driving the VIA directly.
const LINE_PROGRAM: &[u8] = &[
    0x86, 0xCE, //       LDA #$CE
    0xB7, 0xD0, 0x0C, // STA $D00C   beam off, zero off
    0x86, 0xFF, //       LDA #$FF
    0xB7, 0xD0, 0x03, // STA $D003   DDRA
    0xB7, 0xD0, 0x02, // STA $D002   DDRB
    0x86, 0x81, //       LDA #$81
    0xB7, 0xD0, 0x00, // STA $D000   ramp high, hold off
    0x86, 0x7F, //       LDA #$7F
    0xB7, 0xD0, 0x01, // STA $D001   DAC = +127
    0x86, 0x84, //       LDA #$84
    0xB7, 0xD0, 0x00, // STA $D000   latch brightness
    0x86, 0x81, //       LDA #$81
    0xB7, 0xD0, 0x00, // STA $D000   hold off
    0x86, 0x01, //       LDA #$01
    0xB7, 0xD0, 0x00, // STA $D000   ramp low, beam moves right
    0x86, 0xEE, //       LDA #$EE
    0xB7, 0xD0, 0x0C, // STA $D00C   beam on
    0x86, 0xCE, //       LDA #$CE
    0xB7, 0xD0, 0x0C, // STA $D00C   beam off
    0x86, 0x81, //       LDA #$81
    0xB7, 0xD0, 0x00, // STA $D000   ramp high
    0x20, 0xFE, //       BRA *
];

fn line_machine() -> Vectrex {
    Vectrex::new(&VectrexConfig::new(rom_with(LINE_PROGRAM)))
}

#[test]
fn program_draws_a_horizontal_line() {
    let mut vectrex = line_machine();
    vectrex.run_frame();

    let bright: Vec<_> = vectrex
        .segments()
        .draw()
        .iter()
        .filter(|s| s.color == 127)
        .copied()
        .collect();
    assert_eq!(bright.len(), 1);

    let segment = bright[0];
    assert_eq!(segment.y0, 20_500);
    assert_eq!(segment.y1, 20_500);
    assert!(segment.x0 > 16_500);
    assert!(segment.x1 > segment.x0);
    assert_eq!((segment.x1 - segment.x0) % 127, 0);
    assert!(!vectrex.bus().analog.is_vectoring());
}

#[test]
fn display_pass_rasterises_the_line() {
    let mut vectrex = line_machine();
    vectrex.run_frame();
    assert!(!vectrex.take_render_complete());
    vectrex.run_frame();
    assert!(vectrex.take_render_complete());

    let line = vectrex
        .lines()
        .iter()
        .find(|l| l.color == 254)
        .copied()
        .expect("bright line");
    assert_eq!(line.y0, 205);
    assert_eq!(line.y1, 205);
    assert!(line.x1 > line.x0);

    let fb = vectrex.framebuffer();
    let mid = (line.x0 + line.x1) as usize / 2;
    let offset = (mid + 205 * 330) * 4;
    assert_eq!(&fb[offset..offset + 4], &[254, 254, 254, 255]);

    // The draw list became the erase list.
    assert!(vectrex.segments().draw().is_empty());
    assert!(vectrex.segments().erase().iter().any(|s| s.color == 127));
}

#[test]
fn observable_reports_port_state() {
    let mut vectrex = line_machine();
    vectrex.run_frame();

    assert_eq!(vectrex.query("via.pcr"), Some(Value::U8(0xCE)));
    assert_eq!(vectrex.query("via.orb"), Some(Value::U8(0x81)));
    assert_eq!(vectrex.query("analog.zsh"), Some(Value::U8(0x7F)));
    assert_eq!(vectrex.query("analog.vectoring"), Some(Value::Bool(false)));
    assert_eq!(vectrex.query("cpu.pc"), Some(Value::U16(0xE035)));
}

#[test]
fn rom_hands_off_to_cartridge() {
    // JMP $0000
    let rom = rom_with(&[0x7E, 0x00, 0x00]);
    // LDA #$42; STA $C880; BRA *
    let cart = [0x86, 0x42, 0xB7, 0xC8, 0x80, 0x20, 0xFE];
    let config = VectrexConfig {
        cartridge: Some(cart.to_vec()),
        ..VectrexConfig::new(rom)
    };
    let mut vectrex = Vectrex::new(&config);
    vectrex.run_cycles(100);

    assert_eq!(vectrex.peek(0xC880), 0x42);
    assert_eq!(vectrex.cpu().regs.pc, 0x0005);
}

#[test]
fn scripted_presses_reach_the_sound_port() {
    let mut vectrex = Vectrex::new(&VectrexConfig::new(rom_with(&[0x20, 0xFE])));
    vectrex.input_queue().enqueue_key(VectrexKey::Player1Up, 2, 2);

    let port = |v: &Vectrex| v.bus().psg.read(emu_vectrex::PSG_PORT_A) & 0x0F;
    vectrex.run_frame();
    vectrex.run_frame();
    assert_eq!(port(&vectrex), 0x0F);
    vectrex.run_frame();
    assert_eq!(port(&vectrex), 0x0B);
    vectrex.run_frame();
    vectrex.run_frame();
    assert_eq!(port(&vectrex), 0x0F);
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TestHost {
    messages: Vec<String>,
    lines: Vec<Line>,
    frames: usize,
    views: Vec<CpuView>,
}

impl Host for TestHost {
    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn add_line(&mut self, line: &Line) {
        self.lines.push(*line);
    }

    fn render_frame(&mut self, _pixels: &[u8]) {
        self.frames += 1;
    }

    fn update_cpu_view(&mut self, view: &CpuView) {
        self.views.push(*view);
    }
}

#[test]
fn session_forwards_lines_once_per_pass() {
    let path = std::env::temp_dir().join(format!("emu-vectrex-line-{}.bin", std::process::id()));
    std::fs::write(&path, rom_with(LINE_PROGRAM)).expect("write ROM");

    let mut session = Session::new(TestHost::default());
    session.init(660, 820).expect("init");
    session
        .start(&path, "line.bin", None, "")
        .expect("start");
    let _ = std::fs::remove_file(&path);
    assert_eq!(session.host().messages, vec!["ROM loaded: line.bin"]);

    session.command(DebugCommand::LiveUpdate);
    session.frame();
    assert!(session.host().lines.is_empty());
    session.frame();
    let forwarded = session.host().lines.len();
    assert!(forwarded >= 1);
    assert!(session.host().lines.iter().any(|l| l.color == 254));
    session.frame();
    assert_eq!(session.host().lines.len(), forwarded);

    assert_eq!(session.host().frames, 3);
    assert_eq!(session.host().views.len(), 3);
    assert_eq!(session.host().views[2].pc, 0xE035);
    assert_eq!(session.register(0), 0xE035);
    assert_eq!(session.register(7), 0);
}

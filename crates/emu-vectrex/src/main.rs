//! Vectrex emulator binary.
//!
//! Runs a session headless for a fixed number of frames and writes the
//! requested screenshot, audio and line dumps.

use std::path::{Path, PathBuf};
use std::process;

use emu_vectrex::config::DEFAULT_SAMPLE_RATE;
use emu_vectrex::display::{DEFAULT_HEIGHT, DEFAULT_WIDTH, Line};
use emu_vectrex::{AudioTap, CpuView, DebugCommand, Host, Session, VectrexKey, capture};

/// Frames a `--press` key is held down.
const PRESS_HOLD_FRAMES: u64 = 5;

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        });
    }
}

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    rom_path: Option<PathBuf>,
    cart_path: Option<PathBuf>,
    frames: u32,
    width: u32,
    height: u32,
    sample_rate: u32,
    screenshot_path: Option<PathBuf>,
    audio_path: Option<PathBuf>,
    lines_path: Option<PathBuf>,
    presses: Vec<(VectrexKey, u64)>,
    verbose: bool,
}

fn parse_press(spec: &str) -> Option<(VectrexKey, u64)> {
    let (name, frame) = spec.split_once('@')?;
    Some((VectrexKey::from_name(name)?, frame.parse().ok()?))
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        rom_path: None,
        cart_path: None,
        frames: 200,
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        sample_rate: DEFAULT_SAMPLE_RATE,
        screenshot_path: None,
        audio_path: None,
        lines_path: None,
        presses: Vec::new(),
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rom" => {
                i += 1;
                cli.rom_path = args.get(i).map(PathBuf::from);
            }
            "--cart" => {
                i += 1;
                cli.cart_path = args.get(i).map(PathBuf::from);
            }
            "--frames" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.frames = s.parse().unwrap_or(200);
                }
            }
            "--width" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.width = s.parse().unwrap_or(DEFAULT_WIDTH);
                }
            }
            "--height" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.height = s.parse().unwrap_or(DEFAULT_HEIGHT);
                }
            }
            "--sample-rate" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.sample_rate = s
                        .parse()
                        .ok()
                        .filter(|&rate| rate > 0)
                        .unwrap_or(DEFAULT_SAMPLE_RATE);
                }
            }
            "--screenshot" => {
                i += 1;
                cli.screenshot_path = args.get(i).map(PathBuf::from);
            }
            "--audio" => {
                i += 1;
                cli.audio_path = args.get(i).map(PathBuf::from);
            }
            "--lines" => {
                i += 1;
                cli.lines_path = args.get(i).map(PathBuf::from);
            }
            "--press" => {
                i += 1;
                match args.get(i).and_then(|s| parse_press(s)) {
                    Some(press) => cli.presses.push(press),
                    None => {
                        eprintln!("Invalid --press, expected KEY@FRAME (e.g. p1-left@100)");
                        process::exit(1);
                    }
                }
            }
            "--verbose" | "-v" => {
                cli.verbose = true;
            }
            "--help" | "-h" => {
                eprintln!("Usage: emu-vectrex [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --rom <file>         System ROM image (8 KiB) [required]");
                eprintln!("  --cart <file>        Cartridge image (up to 32 KiB)");
                eprintln!("  --frames <n>         Number of 20 ms frames to run [default: 200]");
                eprintln!("  --width <px>         Framebuffer width [default: {DEFAULT_WIDTH}]");
                eprintln!("  --height <px>        Framebuffer height [default: {DEFAULT_HEIGHT}]");
                eprintln!(
                    "  --sample-rate <hz>   Audio sample rate [default: {DEFAULT_SAMPLE_RATE}]"
                );
                eprintln!("  --screenshot <file>  Save a PNG of the last frame");
                eprintln!("  --audio <file>       Save all audio as an 8-bit WAV");
                eprintln!("  --lines <file>       Save the last display pass as JSON");
                eprintln!("  --press <key@frame>  Press a key (p1-left .. p2-down) at a frame");
                eprintln!("  --verbose            Log debug output to stderr");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

// ---------------------------------------------------------------------------
// Headless mode
// ---------------------------------------------------------------------------

/// Host that keeps the most recent output of each kind.
#[derive(Default)]
struct CaptureHost {
    pending_lines: Vec<Line>,
    lines: Vec<Line>,
    last_view: Option<CpuView>,
}

impl Host for CaptureHost {
    fn message(&mut self, text: &str) {
        eprintln!("{text}");
    }

    fn add_line(&mut self, line: &Line) {
        self.pending_lines.push(*line);
    }

    fn render_frame(&mut self, _pixels: &[u8]) {
        if !self.pending_lines.is_empty() {
            self.lines = std::mem::take(&mut self.pending_lines);
        }
    }

    fn update_cpu_view(&mut self, view: &CpuView) {
        self.last_view = Some(*view);
    }
}

fn drain(tap: &mut Option<AudioTap>, audio: &mut Vec<u8>) {
    if let Some(tap) = tap.as_mut() {
        let start = audio.len();
        audio.resize(start + tap.available(), 0);
        let read = tap.pull(&mut audio[start..]);
        audio.truncate(start + read);
    }
}

fn write_outputs(cli: &CliArgs, session: &Session<CaptureHost>, audio: &[u8]) {
    let host = session.host();

    if let Some(ref path) = cli.screenshot_path {
        if let Some(machine) = session.machine() {
            report("Screenshot", path, capture::save_screenshot(machine, path));
        }
    }
    if let Some(ref path) = cli.audio_path {
        report("Audio", path, capture::save_audio(audio, cli.sample_rate, path));
    }
    if let Some(ref path) = cli.lines_path {
        report("Lines", path, capture::save_lines(&host.lines, path));
    }
}

fn report(what: &str, path: &Path, result: Result<(), Box<dyn std::error::Error>>) {
    match result {
        Ok(()) => eprintln!("{what} saved to {}", path.display()),
        Err(e) => {
            eprintln!("{what} error: {e}");
            process::exit(1);
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
}

fn run_headless(cli: &CliArgs) {
    let Some(ref rom_path) = cli.rom_path else {
        eprintln!("No system ROM given (use --rom <file>)");
        process::exit(1);
    };

    let mut session = Session::new(CaptureHost::default());
    session.set_sample_rate(cli.sample_rate);
    if let Err(e) = session.init(cli.width, cli.height) {
        eprintln!("Display error: {e}");
        process::exit(1);
    }

    let cart_label = cli.cart_path.as_deref().map(file_label).unwrap_or_default();
    if session
        .start(
            rom_path,
            &file_label(rom_path),
            cli.cart_path.as_deref(),
            &cart_label,
        )
        .is_err()
    {
        process::exit(1);
    }

    if let Some(queue) = session.input_queue() {
        for &(key, frame) in &cli.presses {
            queue.enqueue_key(key, frame, PRESS_HOLD_FRAMES);
        }
    }

    if cli.verbose {
        session.command(DebugCommand::LiveUpdate);
    }

    let mut tap = session.audio_tap();
    let mut audio = Vec::new();
    for _ in 0..cli.frames {
        session.frame();
        drain(&mut tap, &mut audio);
    }

    if let Some(machine) = session.machine() {
        log::info!(
            "ran {} frames, {} cycles, {} segments dropped",
            machine.frame_count(),
            machine.master_clock(),
            machine.segments().dropped()
        );
    }

    if let Some(view) = session.host().last_view {
        log::info!(
            "PC={:04X} A={:02X} B={:02X} X={:04X} Y={:04X} U={:04X} S={:04X} DP={:02X} CC={:02X} vectors={}",
            view.pc,
            view.a,
            view.b,
            view.x,
            view.y,
            view.u,
            view.s,
            view.dp,
            view.cc,
            view.vectors
        );
    }

    write_outputs(cli, &session, &audio);
    session.stop();
}

fn main() {
    let cli = parse_args();
    init_logging(cli.verbose);
    run_headless(&cli);
}

//! Headless capture: PNG screenshots, WAV audio and JSON line dumps.

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use crate::Vectrex;
use crate::display::Line;

/// Save the current framebuffer as a PNG file.
pub fn save_screenshot(vectrex: &Vectrex, path: &Path) -> Result<(), Box<dyn Error>> {
    let display = vectrex.display();
    save_pixels(display.pixels(), display.width(), display.height(), path)
}

/// Save an RGBA buffer as a PNG file.
///
/// Unlit pixels have zero alpha, so they are forced opaque here to give
/// a black background rather than a transparent one.
pub fn save_pixels(
    pixels: &[u8],
    width: u32,
    height: u32,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let mut rgba = pixels.to_vec();
    for pixel in rgba.chunks_exact_mut(4) {
        pixel[3] = 0xFF;
    }

    writer.write_image_data(&rgba)?;
    Ok(())
}

/// Save audio samples as a WAV file (mono, 8-bit PCM).
///
/// Samples are the unsigned bytes produced by the sound chip.
pub fn save_audio(samples: &[u8], sample_rate: u32, path: &Path) -> Result<(), Box<dyn Error>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };

    // hound takes 8-bit samples as i8 and biases them on write.
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample((i16::from(sample) - 128) as i8)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Save the lines of the last display pass as a JSON array.
pub fn save_lines(lines: &[Line], path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), lines)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("emu-vectrex-capture-{}-{name}", std::process::id()))
    }

    #[test]
    fn screenshot_writes_png() {
        let path = temp_path("shot.png");
        let mut pixels = vec![0u8; 4 * 3 * 4];
        pixels[..4].copy_from_slice(&[200, 200, 200, 255]);
        save_pixels(&pixels, 4, 3, &path).expect("save");

        let data = fs::read(&path).expect("read back");
        assert_eq!(&data[1..4], b"PNG");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn machine_screenshot_matches_display_size() {
        let path = temp_path("machine.png");
        let mut rom = vec![0u8; crate::config::ROM_SIZE];
        rom[0] = 0x20; // BRA *
        rom[1] = 0xFE;
        rom[crate::config::ROM_SIZE - 2] = 0xE0;
        let vectrex = Vectrex::new(&crate::VectrexConfig::new(rom));
        save_screenshot(&vectrex, &path).expect("save");

        let decoder = png::Decoder::new(fs::File::open(&path).expect("open"));
        let reader = decoder.read_info().expect("header");
        assert_eq!(reader.info().width, vectrex.display().width());
        assert_eq!(reader.info().height, vectrex.display().height());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn audio_round_trips_through_wav() {
        let path = temp_path("audio.wav");
        save_audio(&[0, 128, 255], 22_050, &path).expect("save");

        let mut reader = hound::WavReader::open(&path).expect("open");
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.spec().bits_per_sample, 8);
        let samples: Vec<i8> = reader.samples::<i8>().map(|s| s.expect("sample")).collect();
        assert_eq!(samples, vec![-128, 0, 127]);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn lines_are_serialised() {
        let path = temp_path("lines.json");
        let lines = [Line {
            x0: 1,
            y0: 2,
            x1: 3,
            y1: 4,
            color: 5,
        }];
        save_lines(&lines, &path).expect("save");

        let text = fs::read_to_string(&path).expect("read back");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value[0]["x1"], 3);
        assert_eq!(value[0]["color"], 5);
        let _ = fs::remove_file(path);
    }
}

//! Audio transport from the sound chip to the host.
//!
//! A single-producer/single-consumer ring of unsigned 8-bit samples. The
//! machine pushes one frame of samples per `run_frame`; the host pulls at
//! its own pace through an [`AudioTap`].

use gi_ay_3_8910::Ay3_8910;
use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};

/// Sample value used on underrun.
pub const SILENCE: u8 = 0;

/// Frames of audio the ring can hold before new samples are dropped.
const RING_FRAMES: usize = 8;

/// Producer side, owned by the machine.
pub struct AudioStream {
    producer: HeapProd<u8>,
    /// Scratch buffer for one frame of samples.
    frame: Vec<u8>,
    dropped: u64,
}

/// Consumer side, handed to the host.
pub struct AudioTap {
    consumer: HeapCons<u8>,
}

/// Create a connected stream and tap sized for `samples_per_frame`.
#[must_use]
pub fn channel(samples_per_frame: usize) -> (AudioStream, AudioTap) {
    let ring = HeapRb::<u8>::new((samples_per_frame * RING_FRAMES).max(1));
    let (producer, consumer) = ring.split();
    (
        AudioStream {
            producer,
            frame: vec![SILENCE; samples_per_frame],
            dropped: 0,
        },
        AudioTap { consumer },
    )
}

impl AudioStream {
    /// Generate one frame of samples and queue them for the host.
    pub fn push_frame(&mut self, psg: &mut Ay3_8910) {
        psg.generate(&mut self.frame);
        let pushed = self.producer.push_slice(&self.frame);
        if pushed < self.frame.len() {
            let lost = (self.frame.len() - pushed) as u64;
            self.dropped += lost;
            log::trace!("audio ring full, dropped {lost} samples");
        }
    }

    /// Samples lost because the host fell behind.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl AudioTap {
    /// Fill `out` from the ring. Returns how many samples were real; the
    /// remainder is filled with silence.
    pub fn pull(&mut self, out: &mut [u8]) -> usize {
        let read = self.consumer.pop_slice(out);
        out[read..].fill(SILENCE);
        read
    }

    /// Samples waiting in the ring.
    #[must_use]
    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }
}

// Mixer - lock-free click voices with dual SPSC queues
//
// Clicks travel to the audio callback through two lock-free SPSC (Single Producer
// Single Consumer) ring buffers so the event loop never blocks and the audio
// thread never allocates or frees.
//
// Architecture:
// - SUBMIT_QUEUE: event loop pushes fresh clicks, audio thread consumes
// - SPENT_QUEUE: audio thread returns finished clicks, event loop drops them
//
// Click flow:
// 1. Event loop synthesizes a click and pushes it to SUBMIT_QUEUE
// 2. Audio thread pops it into a free voice slot
// 3. Audio thread sums all active voices into the output buffer
// 4. Finished voices are pushed to SPENT_QUEUE
// 5. Event loop drains SPENT_QUEUE on the next submit, freeing memory off the audio thread

use rtrb::{Consumer, Producer};

use super::click::ClickWaveform;
use crate::error::AudioError;

/// Default number of concurrently mixed clicks
pub const DEFAULT_MAX_VOICES: usize = 16;

/// Event-loop side of the click queues.
pub struct VoiceQueue {
    /// Producer for sending new clicks to the audio thread
    submit_producer: Producer<ClickWaveform>,
    /// Consumer for receiving finished clicks back from the audio thread
    spent_consumer: Consumer<ClickWaveform>,
}

impl VoiceQueue {
    /// Hand a click to the audio thread without blocking.
    ///
    /// Spent clicks are reclaimed first so their memory is released here
    /// rather than in the audio callback.
    pub fn submit(&mut self, waveform: ClickWaveform) -> Result<(), AudioError> {
        self.reclaim();
        self.submit_producer
            .push(waveform)
            .map_err(|_| AudioError::QueueFull)
    }

    /// Drop every click the audio thread has finished with.
    ///
    /// Returns the number of clicks reclaimed.
    pub fn reclaim(&mut self) -> usize {
        let mut reclaimed = 0;
        while self.spent_consumer.pop().is_ok() {
            reclaimed += 1;
        }
        reclaimed
    }
}

struct Voice {
    waveform: ClickWaveform,
    position: usize,
}

impl Voice {
    #[inline]
    fn is_finished(&self) -> bool {
        self.position >= self.waveform.len()
    }
}

/// Audio-thread side of the click queues.
///
/// Mixes every active click into the interleaved output buffer. Overlapping
/// clicks are summed, never cut off or serialized.
pub struct Mixer {
    submit_consumer: Consumer<ClickWaveform>,
    spent_producer: Producer<ClickWaveform>,
    voices: Vec<Voice>,
    max_voices: usize,
}

/// Create the click queues for one output stream.
///
/// All voice storage is allocated here; `Mixer::render` does not allocate.
///
/// # Arguments
/// * `max_voices` - Clicks mixed at once; the oldest voice is stolen past this
///
/// # Panics
/// Panics if `max_voices` is 0
pub fn voice_queue(max_voices: usize) -> (VoiceQueue, Mixer) {
    assert!(max_voices > 0, "max_voices must be greater than 0");

    let (submit_producer, submit_consumer) = rtrb::RingBuffer::new(max_voices);
    // Spent queue holds every voice plus a full submit queue of stolen ones
    let (spent_producer, spent_consumer) = rtrb::RingBuffer::new(max_voices * 2);

    (
        VoiceQueue {
            submit_producer,
            spent_consumer,
        },
        Mixer {
            submit_consumer,
            spent_producer,
            voices: Vec::with_capacity(max_voices),
            max_voices,
        },
    )
}

impl Mixer {
    /// Number of clicks currently sounding
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Fill an interleaved output buffer.
    ///
    /// Channel 0 gets the left sample, channel 1 the right; mono output gets
    /// their average and extra channels are silent. Output is clamped to
    /// [-1.0, 1.0].
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        self.accept_new_voices();
        data.fill(0.0);

        if channels == 0 || self.voices.is_empty() {
            return;
        }

        for frame in data.chunks_exact_mut(channels) {
            let mut left = 0.0_f32;
            let mut right = 0.0_f32;

            for voice in self.voices.iter_mut() {
                if let Some(&[l, r]) = voice.waveform.frames().get(voice.position) {
                    left += l;
                    right += r;
                    voice.position += 1;
                }
            }

            if channels == 1 {
                frame[0] = ((left + right) * 0.5).clamp(-1.0, 1.0);
            } else {
                frame[0] = left.clamp(-1.0, 1.0);
                frame[1] = right.clamp(-1.0, 1.0);
            }
        }

        self.release_finished_voices();
    }

    fn accept_new_voices(&mut self) {
        while let Ok(waveform) = self.submit_consumer.pop() {
            if self.voices.len() == self.max_voices {
                let stolen = self.voices.remove(0);
                self.retire(stolen);
            }
            self.voices.push(Voice {
                waveform,
                position: 0,
            });
        }
    }

    fn release_finished_voices(&mut self) {
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].is_finished() {
                let voice = self.voices.remove(i);
                self.retire(voice);
            } else {
                i += 1;
            }
        }
    }

    fn retire(&mut self, voice: Voice) {
        // If the event loop has stopped reclaiming, the click is freed here instead
        let _ = self.spent_producer.push(voice.waveform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::click::synthesize;

    fn short_click() -> ClickWaveform {
        synthesize(1200.0, 0.001, 44_100, 0.3)
    }

    #[test]
    fn test_single_voice_plays_waveform_verbatim() {
        let (mut queue, mut mixer) = voice_queue(4);
        let click = short_click();
        let expected = click.clone();
        queue.submit(click).unwrap();

        let mut out = vec![1.0_f32; expected.len() * 2];
        mixer.render(&mut out, 2);

        for (i, frame) in out.chunks(2).enumerate() {
            assert_eq!(frame[0], expected.frames()[i][0]);
            assert_eq!(frame[1], expected.frames()[i][1]);
        }
        assert_eq!(mixer.active_voices(), 0, "finished voice should be released");
    }

    #[test]
    fn test_overlapping_voices_are_summed() {
        let (mut queue, mut mixer) = voice_queue(4);
        let click = short_click();
        let len = click.len();

        queue.submit(click.clone()).unwrap();
        let mut first_half = vec![0.0_f32; (len / 2) * 2];
        mixer.render(&mut first_half, 2);
        assert_eq!(mixer.active_voices(), 1);

        // Second click arrives while the first is still sounding
        queue.submit(click.clone()).unwrap();
        let mut out = vec![0.0_f32; 2];
        mixer.render(&mut out, 2);
        assert_eq!(mixer.active_voices(), 2);

        let expected = click.frames()[len / 2][0] + click.frames()[0][0];
        assert!((out[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_silence_without_voices() {
        let (_queue, mut mixer) = voice_queue(2);
        let mut out = vec![0.5_f32; 64];
        mixer.render(&mut out, 2);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_mono_output_averages_channels() {
        let (mut queue, mut mixer) = voice_queue(2);
        let click = short_click();
        let expected = click.frames()[5][0];
        queue.submit(click).unwrap();

        let mut out = vec![0.0_f32; 8];
        mixer.render(&mut out, 1);
        assert_eq!(out[5], expected);
    }

    #[test]
    fn test_extra_channels_stay_silent() {
        let (mut queue, mut mixer) = voice_queue(2);
        queue.submit(short_click()).unwrap();

        let mut out = vec![0.0_f32; 4 * 6];
        mixer.render(&mut out, 4);
        for frame in out.chunks(4) {
            assert_eq!(frame[2], 0.0);
            assert_eq!(frame[3], 0.0);
        }
    }

    #[test]
    fn test_voice_stealing_keeps_limit() {
        let (mut queue, mut mixer) = voice_queue(2);
        for _ in 0..2 {
            queue.submit(short_click()).unwrap();
        }
        let mut out = vec![0.0_f32; 2];
        mixer.render(&mut out, 2);

        queue.submit(short_click()).unwrap();
        mixer.render(&mut out, 2);
        assert_eq!(mixer.active_voices(), 2);
        assert_eq!(queue.reclaim(), 1, "stolen voice should be returned");
    }

    #[test]
    fn test_full_queue_reports_error() {
        let (mut queue, _mixer) = voice_queue(1);
        queue.submit(short_click()).unwrap();
        assert_eq!(queue.submit(short_click()), Err(AudioError::QueueFull));
    }

    #[test]
    fn test_finished_clicks_are_reclaimed() {
        let (mut queue, mut mixer) = voice_queue(2);
        let click = short_click();
        let len = click.len();
        queue.submit(click).unwrap();

        let mut out = vec![0.0_f32; (len + 4) * 2];
        mixer.render(&mut out, 2);
        assert_eq!(queue.reclaim(), 1);
        assert_eq!(queue.reclaim(), 0);
    }

    #[test]
    #[should_panic(expected = "max_voices must be greater than 0")]
    fn test_zero_voices_panics() {
        let _ = voice_queue(0);
    }
}

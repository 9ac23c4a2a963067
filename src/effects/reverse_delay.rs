use crate::chain::BlockCtx;
use crate::dsp::delay::RingBuffer;
use crate::dsp::mix::blend_dry_wet;
use crate::params::ParameterDescriptor;
use crate::MAX_PROCESS_CHANNELS;

/*
Reverse Delay
=============

Plays the delayed signal backwards. The effect records input into a
segment buffer the length of the delay time; each time the segment fills,
it is handed to the playback side and read back in reverse order while the
next segment records. A conventional forward tap runs in parallel, and the
`reverse` parameter blends between the forward and time-reversed reads, so
the effect sweeps continuously from a normal delay to a fully reversed one.

Segment length follows the `time` parameter, but only changes at segment
boundaries: resizing mid-segment would splice two unrelated pieces of audio
together.

Parameters
----------

Time (10 - 2000 ms):  Segment / delay length.
Feedback (0 - 0.9):   Wet signal fed back into the forward buffer.
Mix (0 - 1):          Dry/wet blend.
Reverse (0 - 1):      Forward tap vs. reversed segment blend.
*/

#[derive(Clone, Copy, Debug)]
pub enum ReverseDelayParam {
    Time,
    Feedback,
    Mix,
    Reverse,
}

pub static REVERSE_DELAY_PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("time", 10.0, 2000.0, 400.0, "ms"),
    ParameterDescriptor::new("feedback", 0.0, 0.9, 0.3, ""),
    ParameterDescriptor::new("mix", 0.0, 1.0, 0.5, ""),
    ParameterDescriptor::new("reverse", 0.0, 1.0, 1.0, ""),
];

const MAX_DELAY_SECONDS: f32 = 2.0;

struct Channel {
    forward: RingBuffer,
    recording: Vec<f32>,
    playback: Vec<f32>,
    /// Valid frames in `playback`; zero until the first segment completes.
    playback_len: usize,
    position: usize,
}

impl Channel {
    fn new(sample_rate: f32) -> Self {
        let capacity = (MAX_DELAY_SECONDS * sample_rate).ceil() as usize + 1;
        Self {
            forward: RingBuffer::for_time(MAX_DELAY_SECONDS + 0.01, sample_rate)
                .expect("reverse delay capacity is a compile-time constant"),
            recording: vec![0.0; capacity],
            playback: vec![0.0; capacity],
            playback_len: 0,
            position: 0,
        }
    }

    fn reset(&mut self) {
        self.forward.reset();
        self.recording.fill(0.0);
        self.playback.fill(0.0);
        self.playback_len = 0;
        self.position = 0;
    }
}

pub struct ReverseDelay {
    channels: [Channel; MAX_PROCESS_CHANNELS],
    /// Segment length currently being recorded, in frames. Re-captured
    /// from the `time` parameter at each segment boundary.
    segment_len: usize,
}

impl ReverseDelay {
    pub fn new(sample_rate: f32) -> Self {
        let default_ms = REVERSE_DELAY_PARAMS[ReverseDelayParam::Time as usize].default;
        Self {
            channels: [Channel::new(sample_rate), Channel::new(sample_rate)],
            segment_len: (default_ms / 1000.0 * sample_rate) as usize,
        }
    }

    pub fn process_block(&mut self, buffer: &mut [f32], ctx: &BlockCtx, params: &[f32]) {
        let time_ms = params[ReverseDelayParam::Time as usize];
        let feedback = params[ReverseDelayParam::Feedback as usize];
        let mix = params[ReverseDelayParam::Mix as usize];
        let reverse = params[ReverseDelayParam::Reverse as usize];

        let channels = ctx.channels.max(1);
        let capacity = self.channels[0].recording.len();
        let requested_len =
            ((time_ms / 1000.0 * ctx.sample_rate) as usize).clamp(1, capacity);

        for frame in buffer.chunks_exact_mut(channels) {
            // Segment boundary: channel 0 owns the shared position cursor,
            // so swap and resize decisions apply to every channel at once.
            if self.channels[0].position >= self.segment_len {
                for ch in self.channels.iter_mut() {
                    std::mem::swap(&mut ch.recording, &mut ch.playback);
                    ch.playback_len = ch.position.min(ch.playback.len());
                    ch.position = 0;
                }
            }
            if self.channels[0].position == 0 {
                self.segment_len = requested_len;
            }

            let delay_samples = self.segment_len as f32;
            for (ch_index, sample) in frame.iter_mut().take(MAX_PROCESS_CHANNELS).enumerate() {
                let dry = *sample;
                let ch = &mut self.channels[ch_index];

                let forward_tap = ch.forward.tap(delay_samples);
                let reversed = if ch.playback_len > 0 {
                    ch.playback[(ch.playback_len - 1).saturating_sub(ch.position)]
                } else {
                    0.0
                };

                let wet = blend_dry_wet(forward_tap, reversed, reverse);
                ch.forward.write(dry + feedback * wet);
                ch.recording[ch.position] = dry;
                ch.position += 1;

                *sample = blend_dry_wet(dry, wet, mix);
            }
        }
    }

    pub fn advance_idle(&mut self, _frames: usize, _ctx: &BlockCtx, _params: &[f32]) {
        // No free-running modulation state.
    }

    pub fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.reset();
        }
    }
}

use crate::chain::BlockCtx;
use crate::dsp::mix::blend_dry_wet;
use crate::params::ParameterDescriptor;
use crate::{ConfigError, MAX_PROCESS_CHANNELS};

/*
Looper
======

Records a phrase into a fixed-length buffer, then plays it back under the
live input with overdubbing. The behavior is a small state machine:

    Idle ── start_recording ──▶ Recording ── stop_recording ──▶ Playing
     ▲                              │  (buffer full also stops)    │
     │                              ▼                              ▼
     └────────── reset ───────── Stopped ◀──── stop_playback ──────┘
                                    │
                                    └──── start_playback ──▶ Playing

While Playing, each output sample blends the stored loop with the live
input by `mix`, and `feedback * mixedSample` is written back at the read
position, so repeated passes either sustain (`feedback` = 1), decay, or
are replaced by fresh playing. Playback position is fractional: `speed`
scales the per-sample increment and `reverse` flips its sign, with linear
interpolation between neighboring frames.

`set_loop_length` reallocates, so it is a between-blocks control operation:
it is rejected while recording and must never be called from inside the
audio callback.

Parameters
----------

Mix (0 - 1):        Live input vs. stored loop blend.
Feedback (0 - 1):   How much of the mixed signal is written back (overdub).
Speed (0.25 - 4):   Playback rate; 0.5 = half speed/octave down.
Reverse (0 - 1):    Above 0.5, the loop plays backwards.
*/

#[derive(Clone, Copy, Debug)]
pub enum LooperParam {
    Mix,
    Feedback,
    Speed,
    Reverse,
}

pub static LOOPER_PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("mix", 0.0, 1.0, 0.5, ""),
    ParameterDescriptor::new("feedback", 0.0, 1.0, 1.0, ""),
    ParameterDescriptor::new("speed", 0.25, 4.0, 1.0, "x"),
    ParameterDescriptor::new("reverse", 0.0, 1.0, 0.0, ""),
];

/// Hard cap on loop buffers: one minute at 48 kHz.
pub const MAX_LOOP_FRAMES: usize = 48_000 * 60;

const DEFAULT_LOOP_SECONDS: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LooperState {
    Idle,
    Recording,
    Playing,
    Stopped,
}

pub struct Looper {
    buffers: [Vec<f32>; MAX_PROCESS_CHANNELS],
    capacity_frames: usize,
    state: LooperState,
    /// Write cursor while Recording; also the recorded length so far.
    record_pos: usize,
    /// Frames captured by the last recording pass.
    loop_frames: usize,
    /// Fractional read cursor while Playing.
    play_pos: f64,
}

impl Looper {
    pub fn new(sample_rate: f32) -> Self {
        let frames = (DEFAULT_LOOP_SECONDS * sample_rate) as usize;
        Self {
            buffers: [vec![0.0; frames], vec![0.0; frames]],
            capacity_frames: frames,
            state: LooperState::Idle,
            record_pos: 0,
            loop_frames: 0,
            play_pos: 0.0,
        }
    }

    pub fn state(&self) -> LooperState {
        self.state
    }

    /// Resize the loop buffer. Reallocates and resets all captured audio,
    /// so it is rejected while a recording pass is in flight.
    pub fn set_loop_length(&mut self, frames: usize) -> Result<(), ConfigError> {
        if self.state == LooperState::Recording {
            return Err(ConfigError::LooperBusy);
        }
        if frames == 0 || frames > MAX_LOOP_FRAMES {
            return Err(ConfigError::LoopLength { frames });
        }
        for buffer in &mut self.buffers {
            *buffer = vec![0.0; frames];
        }
        self.capacity_frames = frames;
        self.state = LooperState::Idle;
        self.record_pos = 0;
        self.loop_frames = 0;
        self.play_pos = 0.0;
        log::debug!("looper buffer resized to {frames} frames");
        Ok(())
    }

    /// Clear the buffer and begin capturing input.
    pub fn start_recording(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
        self.record_pos = 0;
        self.loop_frames = 0;
        self.state = LooperState::Recording;
    }

    /// End the capture pass and start playback from the loop start.
    pub fn stop_recording(&mut self) {
        if self.state != LooperState::Recording {
            return;
        }
        self.loop_frames = self.record_pos.max(1);
        self.play_pos = 0.0;
        self.state = LooperState::Playing;
    }

    /// (Re)start playback of the held loop from the top.
    pub fn start_playback(&mut self) {
        if self.loop_frames == 0 {
            return; // nothing captured yet
        }
        self.play_pos = 0.0;
        self.state = LooperState::Playing;
    }

    /// Halt playback, keeping the captured loop.
    pub fn stop_playback(&mut self) {
        if self.state == LooperState::Playing {
            self.state = LooperState::Stopped;
        }
    }

    /// Interpolated read of the captured loop at a fractional position.
    #[inline]
    fn read_loop(&self, channel: usize, position: f64) -> f32 {
        let len = self.loop_frames;
        let buffer = &self.buffers[channel];
        let i0 = position as usize % len;
        let i1 = (i0 + 1) % len;
        let frac = (position - position.floor()) as f32;
        buffer[i0] + (buffer[i1] - buffer[i0]) * frac
    }

    pub fn process_block(&mut self, buffer: &mut [f32], ctx: &BlockCtx, params: &[f32]) {
        let mix = params[LooperParam::Mix as usize];
        let feedback = params[LooperParam::Feedback as usize];
        let speed = params[LooperParam::Speed as usize] as f64;
        let reverse = params[LooperParam::Reverse as usize] > 0.5;

        let channels = ctx.channels.max(1);

        for frame in buffer.chunks_exact_mut(channels) {
            match self.state {
                LooperState::Idle | LooperState::Stopped => {
                    // Live input passes through untouched.
                }
                LooperState::Recording => {
                    for (ch, sample) in frame.iter_mut().take(MAX_PROCESS_CHANNELS).enumerate() {
                        self.buffers[ch][self.record_pos] = *sample;
                    }
                    self.record_pos += 1;
                    if self.record_pos >= self.capacity_frames {
                        // Buffer full: capture ends exactly as if the host
                        // had called stop_recording here.
                        self.stop_recording();
                    }
                }
                LooperState::Playing => {
                    let increment = if reverse { -speed } else { speed };
                    let len = self.loop_frames as f64;
                    let write_idx = (self.play_pos as usize) % self.loop_frames;

                    for (ch, sample) in frame.iter_mut().take(MAX_PROCESS_CHANNELS).enumerate() {
                        let live = *sample;
                        let looped = self.read_loop(ch, self.play_pos);
                        let mixed = blend_dry_wet(live, looped, mix);
                        self.buffers[ch][write_idx] = feedback * mixed;
                        *sample = mixed;
                    }

                    self.play_pos += increment;
                    if self.play_pos >= len {
                        self.play_pos -= len;
                    } else if self.play_pos < 0.0 {
                        self.play_pos += len;
                    }
                }
            }
        }
    }

    pub fn advance_idle(&mut self, _frames: usize, _ctx: &BlockCtx, _params: &[f32]) {
        // Bypassed loopers hold their transport position.
    }

    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
        self.state = LooperState::Idle;
        self.record_pos = 0;
        self.loop_frames = 0;
        self.play_pos = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn ctx() -> BlockCtx {
        BlockCtx {
            sample_rate: SAMPLE_RATE,
            channels: 1,
        }
    }

    fn params(mix: f32, feedback: f32, speed: f32, reverse: f32) -> Vec<f32> {
        vec![mix, feedback, speed, reverse]
    }

    fn record_ramp(looper: &mut Looper, frames: usize) -> Vec<f32> {
        let p = params(0.5, 1.0, 1.0, 0.0);
        let phrase: Vec<f32> = (0..frames).map(|i| (i + 1) as f32 / frames as f32).collect();
        looper.start_recording();
        let mut buf = phrase.clone();
        looper.process_block(&mut buf, &ctx(), &p);
        looper.stop_recording();
        phrase
    }

    #[test]
    fn round_trip_reproduces_recorded_phrase() {
        let mut looper = Looper::new(SAMPLE_RATE);
        let phrase = record_ramp(&mut looper, 256);

        // mix=1, feedback=0, speed=1, reverse=0: pure loop playback.
        let p = params(1.0, 0.0, 1.0, 0.0);
        let mut buf = vec![0.0f32; 256];
        looper.process_block(&mut buf, &ctx(), &p);

        for (got, want) in buf.iter().zip(phrase.iter()) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn recording_passes_live_input_through() {
        let mut looper = Looper::new(SAMPLE_RATE);
        let p = params(0.5, 1.0, 1.0, 0.0);
        looper.start_recording();
        let mut buf = vec![0.25f32; 128];
        looper.process_block(&mut buf, &ctx(), &p);
        assert!(buf.iter().all(|&s| (s - 0.25).abs() < 1e-6));
        assert_eq!(looper.state(), LooperState::Recording);
    }

    #[test]
    fn reverse_playback_reverses_the_phrase() {
        let mut looper = Looper::new(SAMPLE_RATE);
        let phrase = record_ramp(&mut looper, 64);

        let p = params(1.0, 0.0, 1.0, 1.0);
        let mut buf = vec![0.0f32; 63];
        looper.process_block(&mut buf, &ctx(), &p);

        // First sample reads position 0, then the cursor walks backwards
        // through the end of the phrase.
        assert!((buf[0] - phrase[0]).abs() < 1e-6);
        for (i, got) in buf.iter().enumerate().skip(1) {
            let want = phrase[64 - i];
            assert!((got - want).abs() < 1e-6, "index {i}: {got} != {want}");
        }
    }

    #[test]
    fn half_speed_interpolates_between_frames() {
        let mut looper = Looper::new(SAMPLE_RATE);
        let phrase = record_ramp(&mut looper, 64);

        let p = params(1.0, 0.0, 0.5, 0.0);
        let mut buf = vec![0.0f32; 8];
        looper.process_block(&mut buf, &ctx(), &p);

        assert!((buf[0] - phrase[0]).abs() < 1e-6);
        let mid = (phrase[0] + phrase[1]) * 0.5;
        assert!((buf[1] - mid).abs() < 1e-6, "{} != {mid}", buf[1]);
        assert!((buf[2] - phrase[1]).abs() < 1e-6);
    }

    #[test]
    fn stopped_state_holds_loop_and_passes_input() {
        let mut looper = Looper::new(SAMPLE_RATE);
        let phrase = record_ramp(&mut looper, 32);

        looper.stop_playback();
        assert_eq!(looper.state(), LooperState::Stopped);

        let p = params(1.0, 0.0, 1.0, 0.0);
        let mut buf = vec![0.5f32; 16];
        looper.process_block(&mut buf, &ctx(), &p);
        assert!(buf.iter().all(|&s| (s - 0.5).abs() < 1e-6));

        // Resuming playback still has the phrase.
        looper.start_playback();
        let mut buf = vec![0.0f32; 8];
        looper.process_block(&mut buf, &ctx(), &p);
        assert!((buf[0] - phrase[0]).abs() < 1e-6);
    }

    #[test]
    fn set_loop_length_rejected_while_recording() {
        let mut looper = Looper::new(SAMPLE_RATE);
        looper.start_recording();
        assert!(looper.set_loop_length(1024).is_err());
        looper.stop_recording();
        assert!(looper.set_loop_length(1024).is_ok());
        assert_eq!(looper.state(), LooperState::Idle);
    }

    #[test]
    fn set_loop_length_validates_range() {
        let mut looper = Looper::new(SAMPLE_RATE);
        assert!(looper.set_loop_length(0).is_err());
        assert!(looper.set_loop_length(MAX_LOOP_FRAMES + 1).is_err());
    }

    #[test]
    fn recording_stops_when_buffer_fills() {
        let mut looper = Looper::new(SAMPLE_RATE);
        looper.set_loop_length(100).unwrap();
        looper.start_recording();

        let p = params(0.5, 1.0, 1.0, 0.0);
        let mut buf = vec![0.1f32; 150];
        looper.process_block(&mut buf, &ctx(), &p);

        assert_eq!(looper.state(), LooperState::Playing);
    }
}

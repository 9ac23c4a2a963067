//! Control messages crossing from UI/automation/host threads into the
//! audio thread.
//!
//! The audio thread never waits on a lock: edits are published through a
//! single-producer single-consumer queue and drained at the top of the
//! next `process` call. Messages whose payload needs allocation (a
//! prepared impulse response) carry the allocation with them, so applying
//! a message is at most a pointer swap.

#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::effects::convolution::ConvState;

/// Looper transport operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LooperCommand {
    StartRecording,
    StopRecording,
    StartPlayback,
    StopPlayback,
}

#[derive(Debug)]
pub enum ControlMessage {
    SetParameter {
        unit: usize,
        param: usize,
        value: f32,
    },
    SetAutomated {
        unit: usize,
        param: usize,
        automated: bool,
    },
    AddAutomationPoint {
        unit: usize,
        param: usize,
        time: f64,
        value: f32,
    },
    RemoveAutomationPoint {
        unit: usize,
        param: usize,
        time: f64,
    },
    ClearAutomation {
        unit: usize,
        param: usize,
    },
    SetBypassed {
        unit: usize,
        bypassed: bool,
    },
    NoteOn {
        note: u8,
        velocity: u8,
    },
    NoteOff {
        note: u8,
    },
    Looper {
        unit: usize,
        command: LooperCommand,
    },
    /// Prepared off-thread by `prepare_impulse_response`; installing is a
    /// pointer swap.
    InstallImpulseResponse {
        unit: usize,
        state: Box<ConvState>,
    },
    ClearImpulseResponse {
        unit: usize,
    },
    ResetUnit {
        unit: usize,
    },
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ControlMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        Consumer::pop(self).ok()
    }
}

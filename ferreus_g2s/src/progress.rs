/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines diagnostic messages, sinks, and helper functions for reporting warnings and pipeline progress.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Progress and diagnostic reporting primitives.
//!
//! Nothing in the numeric core prints. Non-fatal conditions (a rank deficient
//! operator, a long local window) and pipeline milestones are emitted as
//! [`ProgressMsg`] events to an optional [`ProgressSink`].

use std::fmt::Debug;
use std::sync::{Arc, mpsc};
use std::thread;

/// Events emitted while building operators or scoring observations.
#[derive(Debug, Clone)]
pub enum ProgressMsg {
    /// A differentiation operator has a lower numerical rank than the
    /// single expected deficiency (the constant function) allows.
    RankDeficient { rank: usize, num_points: usize },

    /// A local window longer than 13 points was requested. High order local
    /// fits are prone to the Runge phenomenon.
    RungeRisk { support_length: usize },

    /// A pipeline stage finished for the labelled observation.
    StageComplete { label: String, stage: &'static str },

    /// An observation was screened out of a batch.
    RecordSkipped { label: String, reason: String },

    /// An observation failed; the batch continues.
    RecordFailed { label: String, error: String },

    /// Progress through a batch, as a value in [0, 1].
    BatchProgress { completed: usize, total: usize, progress: f64 },

    /// Arbitrary informational message.
    Message { message: String },
}

/// Sink that consumes progress messages.
pub trait ProgressSink: Send + Sync + Debug {
    fn emit(&self, msg: ProgressMsg);
}

/// Progress sink that forwards messages over a channel.
#[derive(Debug)]
pub struct ClosureSink {
    tx: mpsc::SyncSender<ProgressMsg>,
}

impl ProgressSink for ClosureSink {
    #[inline]
    fn emit(&self, msg: ProgressMsg) {
        let _ = self.tx.try_send(msg);
    }
}

/// Spawns a listener thread that runs a handler closure for each progress message.
pub fn closure_sink<F>(
    buffer: usize,
    mut handler: F,
) -> (Arc<dyn ProgressSink>, thread::JoinHandle<()>)
where
    F: FnMut(ProgressMsg) + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<ProgressMsg>(buffer.max(1));
    let sink: Arc<dyn ProgressSink> = Arc::new(ClosureSink { tx });

    let handle = thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            handler(msg);
        }
    });

    (sink, handle)
}

/// Emits `msg` when a sink is attached.
#[inline]
pub fn emit(progress: &Option<Arc<dyn ProgressSink>>, msg: ProgressMsg) {
    if let Some(sink) = progress {
        sink.emit(msg);
    }
}

/// Fraction of a batch that has completed, in [0, 1].
#[inline]
pub fn batch_fraction(completed: usize, total: usize) -> f64 {
    if total == 0 { 1.0 } else { completed as f64 / total as f64 }
}

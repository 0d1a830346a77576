/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines progress reporting messages, sinks, and helper functions for the morphing stages.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Progress reporting primitives for the morphing pipeline.

use std::fmt::{self, Debug};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

/// Sequential stages of a morph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Validating control points, displacements and the node set.
    CollectInputs,

    /// Assembling the Gram matrix of the control points.
    BuildGram,

    /// Factorising the Gram matrix and solving for the weights.
    Solve,

    /// Evaluating the fitted field at the query nodes.
    Interpolate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CollectInputs => "collect inputs",
            Stage::BuildGram => "build gram",
            Stage::Solve => "solve",
            Stage::Interpolate => "interpolate",
        };
        f.write_str(name)
    }
}

/// Progress events emitted while a morph is fitted and evaluated.
#[derive(Debug, Clone)]
pub enum ProgressMsg {
    /// A stage has begun.
    StageStarted { stage: Stage },

    /// A stage completed successfully.
    StageFinished { stage: Stage, elapsed: Duration },

    /// Estimated 1-norm condition number of the Gram matrix.
    ConditionEstimate { estimate: f64, threshold: f64 },

    /// Chunked evaluation status. `progress` is in `[0, 1]`.
    EvaluationProgress {
        completed_chunks: usize,
        total_chunks: usize,
        progress: f64,
    },

    /// Arbitrary informational message.
    Message { message: String },
}

/// Sink that consumes progress messages.
pub trait ProgressSink: Send + Sync + Debug {
    fn emit(&self, msg: ProgressMsg);
}

/// Progress sink that forwards messages over a channel.
///
/// Messages are dropped rather than blocking the morph when the channel is full.
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
///
/// The thread exits once every clone of the returned sink has been dropped.
///
/// # Examples
///
/// ```
/// use morph_rbf::progress::{ProgressMsg, ProgressSink, closure_sink};
///
/// let (sink, listener) = closure_sink(64, |msg: ProgressMsg| println!("{msg:?}"));
/// sink.emit(ProgressMsg::Message { message: "hello".into() });
/// drop(sink);
/// listener.join().unwrap();
/// ```
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

/// Fraction of chunks completed, clamped to `[0, 1]`. An empty job counts as done.
#[inline]
pub(crate) fn chunk_progress(completed: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        (completed as f64 / total as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use std::sync::Mutex;

    #[test]
    fn closure_sink_delivers_messages_in_order() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let store = received.clone();

        let (sink, listener) = closure_sink(16, move |msg| {
            if let ProgressMsg::StageStarted { stage } = msg {
                store.lock().unwrap().push(stage);
            }
        });

        sink.emit(ProgressMsg::StageStarted { stage: Stage::BuildGram });
        sink.emit(ProgressMsg::StageStarted { stage: Stage::Solve });
        drop(sink);
        listener.join().unwrap();

        let stages = received.lock().unwrap().clone();
        assert!(stages == vec![Stage::BuildGram, Stage::Solve]);
    }

    #[test]
    fn chunk_progress_is_bounded() {
        assert!(chunk_progress(0, 0) == 1.0);
        assert!(chunk_progress(1, 4) == 0.25);
        assert!(chunk_progress(9, 4) == 1.0);
    }
}

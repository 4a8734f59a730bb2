//! Batched evaluator boundary.
//!
//! Workers never call the estimator directly. They push submissions to
//! a dedicated sender thread, which coalesces whatever is queued (up to
//! the batch limit) into one `evaluate_batch` call, and a dedicated
//! receiver thread demultiplexes the results back into the work queue
//! as resolve tasks, matched to submissions by order. Simulations
//! suspend while a result is outstanding; nothing in the pool blocks
//! on the estimator.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;
use tracing::{debug, warn};

use xq_core::{Board, Move};

use crate::node::PathStep;
use crate::search::Task;

/// Errors surfaced by an evaluator implementation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("evaluator returned {got} outputs for {expected} requests")]
    BatchShapeMismatch { expected: usize, got: usize },
}

/// One position submitted for evaluation: encoded input planes plus
/// the legal moves the returned policy must be aligned with.
#[derive(Debug, Clone)]
pub struct EvalRequest {
    pub planes: Vec<f32>,
    pub legal_moves: Vec<Move>,
}

/// Evaluation result: a probability per legal move, in request order,
/// and a scalar value in [-1, 1] for the side to move.
#[derive(Debug, Clone)]
pub struct EvalOutput {
    pub policy: Vec<f32>,
    pub value: f32,
}

/// Position estimator consumed through batches.
pub trait Evaluator: Send + Sync {
    fn evaluate_batch(&self, requests: &[EvalRequest]) -> Result<Vec<EvalOutput>, EvaluatorError>;
}

/// Uniform policy, neutral value. The standard stand-in for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformEvaluator;

impl UniformEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for UniformEvaluator {
    fn evaluate_batch(&self, requests: &[EvalRequest]) -> Result<Vec<EvalOutput>, EvaluatorError> {
        Ok(requests
            .iter()
            .map(|req| {
                let count = req.legal_moves.len();
                let prob = if count > 0 { 1.0 / count as f32 } else { 0.0 };
                EvalOutput {
                    policy: vec![prob; count],
                    value: 0.0,
                }
            })
            .collect())
    }
}

/// A pending evaluation: where the simulation stood when it suspended,
/// plus what to evaluate.
#[derive(Debug)]
pub struct EvalSubmission {
    pub board: Board,
    pub path: Vec<PathStep>,
    pub request: EvalRequest,
}

/// Uniform-policy, zero-value outputs used when a batch fails. The
/// affected simulations complete with a neutral result instead of
/// wedging the pool.
fn neutral_outputs(requests: &[EvalRequest]) -> Vec<EvalOutput> {
    requests
        .iter()
        .map(|req| {
            let count = req.legal_moves.len();
            let prob = if count > 0 { 1.0 / count as f32 } else { 0.0 };
            EvalOutput {
                policy: vec![prob; count],
                value: 0.0,
            }
        })
        .collect()
}

/// Spawn the sender and receiver threads. The sender exits when every
/// submission handle is dropped; the receiver exits when the sender
/// does, or when the work queue closes.
pub(crate) fn spawn_bridge<E: Evaluator + 'static>(
    evaluator: Arc<E>,
    submissions: Receiver<EvalSubmission>,
    tasks: Sender<Task>,
    batch_limit: usize,
) -> Vec<JoinHandle<()>> {
    let (batch_tx, batch_rx) =
        crossbeam_channel::bounded::<(Vec<EvalSubmission>, Vec<EvalOutput>)>(4);

    let sender = thread::Builder::new()
        .name("eval-sender".into())
        .spawn(move || sender_loop(evaluator, submissions, batch_tx, batch_limit))
        .expect("spawn eval sender");

    let receiver = thread::Builder::new()
        .name("eval-receiver".into())
        .spawn(move || receiver_loop(batch_rx, tasks))
        .expect("spawn eval receiver");

    vec![sender, receiver]
}

fn sender_loop<E: Evaluator>(
    evaluator: Arc<E>,
    submissions: Receiver<EvalSubmission>,
    batches: Sender<(Vec<EvalSubmission>, Vec<EvalOutput>)>,
    batch_limit: usize,
) {
    while let Ok(first) = submissions.recv() {
        let mut batch = vec![first];
        while batch.len() < batch_limit {
            match submissions.try_recv() {
                Ok(sub) => batch.push(sub),
                Err(_) => break,
            }
        }

        let requests: Vec<EvalRequest> = batch.iter().map(|s| s.request.clone()).collect();
        debug!(batch = batch.len(), "dispatching evaluation batch");
        let outputs = match evaluator.evaluate_batch(&requests) {
            Ok(outputs) if outputs.len() == requests.len() => outputs,
            Ok(outputs) => {
                warn!(
                    expected = requests.len(),
                    got = outputs.len(),
                    "evaluator batch shape mismatch, substituting neutral results"
                );
                neutral_outputs(&requests)
            }
            Err(err) => {
                warn!(error = %err, "evaluation batch failed, substituting neutral results");
                neutral_outputs(&requests)
            }
        };

        if batches.send((batch, outputs)).is_err() {
            break;
        }
    }
}

fn receiver_loop(batches: Receiver<(Vec<EvalSubmission>, Vec<EvalOutput>)>, tasks: Sender<Task>) {
    while let Ok((batch, outputs)) = batches.recv() {
        // Submission order is the demultiplexing key.
        for (sub, out) in batch.into_iter().zip(outputs) {
            let task = Task::Resolve {
                board: sub.board,
                path: sub.path,
                policy: out.policy,
                value: out.value,
            };
            if tasks.send(task).is_err() {
                return;
            }
        }
    }
}

//! The concurrent search itself: worker pool, descent with dynamic
//! virtual loss, suspension on pending evaluations, backup, and the
//! move-request driver.
//!
//! Each simulation is a [`Task::Simulate`] walking root to leaf. On
//! reaching an unexpanded position it creates the node in a pending
//! state and submits it for evaluation; the result comes back as a
//! [`Task::Resolve`] that seeds the priors, resumes every simulation
//! queued on the node, and backs the requester's path up the tree.
//! An outstanding-task counter gates the driver between dispatch
//! batches.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace, warn};

use xq_core::{Board, GameRules, Move, RepetitionClass, Terminal};

use crate::cache::TranspositionCache;
use crate::config::{ConfigError, SearchConfig};
use crate::evaluator::{spawn_bridge, EvalRequest, EvalSubmission, Evaluator};
use crate::node::{PathStep, SearchNode};
use crate::select::{select_move, MoveComplexity, UniformComplexity};
use crate::tree::SearchTree;
use crate::zobrist::ZobristHasher;

/// How many recent positions accompany an evaluation request.
const HISTORY_WINDOW: usize = 5;

/// Errors surfaced to the caller of [`SearchEngine::search`].
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("engine is closed")]
    Closed,
}

/// Unit of work flowing through the bounded queue.
#[derive(Debug)]
pub enum Task {
    /// Run one simulation from `board`, continuing the given partial
    /// path (empty for a fresh root simulation).
    Simulate { board: Board, path: Vec<PathStep> },
    /// An evaluation arrived for the node at `board`.
    Resolve {
        board: Board,
        path: Vec<PathStep>,
        policy: Vec<f32>,
        value: f32,
    },
    /// Worker exit signal; each worker consumes exactly one.
    Shutdown,
}

/// Simulation budget for one move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// The configured per-move budget.
    Default,
    /// An explicit override.
    Simulations(u32),
    /// Pondering: the configured very large budget.
    Ponder,
}

/// A move request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub board: Board,
    /// Game ply, drives temperature decay and resignation gating.
    pub ply: u32,
    /// Moves the caller forbids at the root, e.g. to avoid a forced
    /// draw. Zeroed in the returned policy.
    pub excluded_moves: Vec<Move>,
    pub budget: Budget,
    /// Keep the tree from previous requests and credit visits already
    /// accumulated on this position against the budget.
    pub reuse_tree: bool,
    /// Force full-temperature sampling and a full budget.
    pub increase_temperature: bool,
    /// Recent real-game positions, newest last, forwarded to the
    /// evaluator's plane encoding.
    pub history: Vec<Board>,
}

impl SearchRequest {
    pub fn new(board: Board, ply: u32) -> Self {
        Self {
            board,
            ply,
            excluded_moves: Vec::new(),
            budget: Budget::Default,
            reuse_tree: true,
            increase_temperature: false,
            history: Vec::new(),
        }
    }
}

/// Outcome of a move request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Play(Move),
    Resign,
    /// The requested position was already terminal; `value` is the
    /// rules engine's classification for the side to move.
    GameOver { value: f32 },
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub decision: Decision,
    /// Normalized visit-derived policy over the root's legal moves.
    pub policy: Vec<(Move, f32)>,
    /// Best root edge Q, or 0.0 when nothing was visited.
    pub root_value: f32,
    /// Simulations dispatched for this request.
    pub simulations: u32,
}

/// Read-only view of one edge, for inspection and tests.
#[derive(Debug, Clone)]
pub struct EdgeSnapshot {
    pub mv: Move,
    pub n: f32,
    pub w: f32,
    pub q: f32,
    pub q_variance: f32,
    pub prior: f32,
}

/// Read-only view of one node.
#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    pub visits: u32,
    pub pending: bool,
    pub edges: Vec<EdgeSnapshot>,
}

/// Outstanding-simulation counter with a completion signal.
#[derive(Debug, Default)]
struct TaskCounter {
    outstanding: Mutex<u64>,
    done: Condvar,
}

impl TaskCounter {
    fn guard(&self) -> MutexGuard<'_, u64> {
        match self.outstanding.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn begin(&self, n: u64) {
        *self.guard() += n;
    }

    fn complete_one(&self) {
        let mut outstanding = self.guard();
        // Saturating: completions from an abandoned request may trail
        // into the next one.
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.done.notify_all();
        }
    }

    fn reset(&self) {
        *self.guard() = 0;
    }

    /// Wait until the count reaches zero. Returns false if the
    /// deadline passed first.
    fn wait(&self, deadline: Option<Instant>) -> bool {
        let mut outstanding = self.guard();
        while *outstanding > 0 {
            match deadline {
                None => {
                    outstanding = match self.done.wait(outstanding) {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    outstanding = match self.done.wait_timeout(outstanding, deadline - now) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    };
                }
            }
        }
        true
    }
}

/// State shared by the driver and every worker.
struct Shared<R: GameRules> {
    config: SearchConfig,
    rules: R,
    hasher: ZobristHasher,
    tree: SearchTree,
    cache: TranspositionCache,
    counter: TaskCounter,
    excluded: Mutex<Vec<Move>>,
    history: Mutex<Vec<Board>>,
    complexity: Box<dyn MoveComplexity>,
}

impl<R: GameRules> Shared<R> {
    fn excluded_snapshot(&self) -> Vec<Move> {
        match self.excluded.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn history_snapshot(&self) -> Vec<Board> {
        match self.history.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_request_context(&self, excluded: &[Move], history: &[Board]) {
        match self.excluded.lock() {
            Ok(mut guard) => *guard = excluded.to_vec(),
            Err(poisoned) => *poisoned.into_inner() = excluded.to_vec(),
        }
        let window = history
            .iter()
            .rev()
            .take(HISTORY_WINDOW)
            .rev()
            .cloned()
            .collect();
        match self.history.lock() {
            Ok(mut guard) => *guard = window,
            Err(poisoned) => *poisoned.into_inner() = window,
        }
    }
}

/// Per-worker handles.
struct WorkerCtx<R: GameRules> {
    shared: Arc<Shared<R>>,
    tasks: Sender<Task>,
    evals: Sender<EvalSubmission>,
}

fn worker_loop<R: GameRules>(ctx: WorkerCtx<R>, tasks: Receiver<Task>, mut rng: ChaCha20Rng) {
    while let Ok(task) = tasks.recv() {
        match task {
            Task::Simulate { board, path } => ctx.simulate(board, path, &mut rng),
            Task::Resolve {
                board,
                path,
                policy,
                value,
            } => ctx.resolve(&board, path, &policy, value),
            Task::Shutdown => break,
        }
    }
}

impl<R: GameRules> WorkerCtx<R> {
    /// Walk from `board` toward a leaf, continuing `path`. Every exit
    /// either completes the simulation (backup plus counter decrement)
    /// or suspends it (queued continuation or submitted evaluation).
    fn simulate(&self, mut board: Board, mut path: Vec<PathStep>, rng: &mut ChaCha20Rng) {
        let shared = &self.shared;
        let config = &shared.config;
        let mut hash = shared.hasher.hash(&board);

        loop {
            if let Some(value) = repetition_value(&shared.rules, &board, &path) {
                self.backup(value, &path);
                shared.counter.complete_one();
                return;
            }

            if let Terminal::Over { value } = shared.rules.terminal(&board) {
                // Terminal resolutions are doubled so they outweigh
                // estimator values on the same edge.
                self.backup(value * 2.0, &path);
                shared.counter.complete_one();
                return;
            }

            let node = match shared.tree.get(&board) {
                Some(node) => node,
                None => {
                    match self.materialize(&board, hash, std::mem::take(&mut path)) {
                        Some((node, returned)) => {
                            path = returned;
                            node
                        }
                        // The simulation now belongs to the evaluation
                        // in flight, or was completed on the spot.
                        None => return,
                    }
                }
            };

            let selected = {
                let mut state = node.lock();
                if state.pending {
                    trace!("simulation suspended on pending evaluation");
                    state.queued.push(path);
                    return;
                }
                let is_root = path.is_empty();
                let excluded = if is_root {
                    shared.excluded_snapshot()
                } else {
                    Vec::new()
                };
                let picked = select_move(
                    &board,
                    &state,
                    node.visits(),
                    config,
                    is_root,
                    &excluded,
                    shared.complexity.as_ref(),
                    rng,
                );
                match picked {
                    Some(mv) => {
                        let visits = node.visits();
                        match state.edges.get_mut(&mv) {
                            Some(edge) => {
                                let loss = edge.dynamic_loss(
                                    config.virtual_loss_base,
                                    config.virtual_loss_ratio_weight,
                                    visits,
                                );
                                edge.apply_loss(loss);
                                node.record_visit();
                                Some((mv, loss))
                            }
                            None => None,
                        }
                    }
                    None => None,
                }
            };

            let (mv, loss) = match selected {
                Some(step) => step,
                None => {
                    // Nothing selectable here counts as a loss for the
                    // side to move.
                    self.backup(-2.0, &path);
                    shared.counter.complete_one();
                    return;
                }
            };

            let next = shared.rules.apply(&board, mv);
            hash = match board.piece_at(mv.from) {
                Some(moved) => shared.hasher.update(hash, mv, moved, board.piece_at(mv.to)),
                None => shared.hasher.hash(&next),
            };
            path.push(PathStep {
                board: board.clone(),
                mv,
                loss,
            });
            board = next;
        }
    }

    /// Tree miss: reuse a warm transposition, or create the node in
    /// its pending state and submit it for evaluation. `Some` returns
    /// a node to keep descending through together with the caller's
    /// path; `None` means this simulation is no longer the caller's to
    /// continue.
    fn materialize(
        &self,
        board: &Board,
        hash: u64,
        path: Vec<PathStep>,
    ) -> Option<(Arc<SearchNode>, Vec<PathStep>)> {
        let shared = &self.shared;

        let cached = shared.cache.get(hash).filter(|node| {
            node.fingerprint() == hash
                && node.visits() > shared.config.cache_visit_threshold
                && !node.is_pending()
        });
        if let Some(node) = cached {
            trace!(visits = node.visits(), "transposition splice");
            return Some((shared.tree.insert(board.clone(), node), path));
        }

        let legal = shared.rules.legal_moves(board);
        if legal.is_empty() {
            // Exhaustion at a nominally ongoing position.
            self.backup(-2.0, &path);
            shared.counter.complete_one();
            return None;
        }

        let created = Arc::new(SearchNode::new(hash, legal.clone()));
        let node = shared.tree.insert(board.clone(), created.clone());
        if !Arc::ptr_eq(&node, &created) {
            // Another worker won the insertion race.
            return Some((node, path));
        }

        shared.cache.put(hash, node.clone());
        let planes = shared.rules.encode_planes(board, &shared.history_snapshot());
        let submission = EvalSubmission {
            board: board.clone(),
            path,
            request: EvalRequest {
                planes,
                legal_moves: legal,
            },
        };
        if self.evals.send(submission).is_err() {
            warn!("evaluator bridge closed, dropping simulation");
            shared.counter.complete_one();
        }
        None
    }

    /// An evaluation arrived: publish priors, resume queued
    /// simulations, back up the requester's own path.
    fn resolve(&self, board: &Board, path: Vec<PathStep>, policy: &[f32], value: f32) {
        let shared = &self.shared;

        let queued = match shared.tree.get(board) {
            Some(node) => {
                let mut state = node.lock();
                let state = &mut *state;
                if state.pending {
                    state.pending = false;
                    for (mv, &p) in state.legal_moves.iter().zip(policy.iter()) {
                        if let Some(edge) = state.edges.get_mut(mv) {
                            edge.prior = p;
                        }
                    }
                }
                std::mem::take(&mut state.queued)
            }
            // The tree was replaced while the evaluation was in
            // flight; nothing to resume.
            None => Vec::new(),
        };

        trace!(resumed = queued.len(), value, "evaluation resolved");
        for continuation in queued {
            let task = Task::Simulate {
                board: board.clone(),
                path: continuation,
            };
            if self.tasks.send(task).is_err() {
                shared.counter.complete_one();
            }
        }

        self.backup(value, &path);
        shared.counter.complete_one();
    }

    /// Walk the path leaf-to-root: negate the value each step, repay
    /// the borrowed virtual loss, apply the confirmed visit, and give
    /// RAVE credit to every move played later in the path. A node's
    /// own move joins `future` only after that node's update, so a
    /// move never credits itself at the node it was played from.
    fn backup(&self, leaf_value: f32, path: &[PathStep]) {
        let shared = &self.shared;
        let mut value = leaf_value;
        let mut future: Vec<Move> = Vec::with_capacity(path.len());

        for step in path.iter().rev() {
            value = -value;
            if let Some(node) = shared.tree.get(&step.board) {
                let mut state = node.lock();
                if let Some(edge) = state.edges.get_mut(&step.mv) {
                    edge.confirm(value, step.loss);
                }
                if shared.config.rave_enabled {
                    for mv in &future {
                        if let Some(edge) = state.edges.get_mut(mv) {
                            edge.rave_update(value);
                        }
                    }
                }
            }
            future.push(step.mv);
        }
    }
}

/// The engine: a worker pool, the evaluator bridge, and the shared
/// tree, driving one move request at a time.
pub struct SearchEngine<R: GameRules + 'static> {
    shared: Arc<Shared<R>>,
    tasks: Sender<Task>,
    threads: Vec<JoinHandle<()>>,
    closed: bool,
}

impl<R: GameRules + 'static> SearchEngine<R> {
    pub fn new<E: Evaluator + 'static>(
        rules: R,
        evaluator: E,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        Self::with_complexity(rules, evaluator, config, Box::new(UniformComplexity))
    }

    /// Construct with a custom progressive-unlock complexity scorer.
    pub fn with_complexity<E: Evaluator + 'static>(
        rules: R,
        evaluator: E,
        config: SearchConfig,
        complexity: Box<dyn MoveComplexity>,
    ) -> Result<Self, SearchError> {
        config.validate()?;

        let shared = Arc::new(Shared {
            rules,
            hasher: ZobristHasher::new(),
            tree: SearchTree::new(),
            cache: TranspositionCache::new(config.cache_capacity),
            counter: TaskCounter::default(),
            excluded: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            complexity,
            config: config.clone(),
        });

        // Sized so workers, resumed continuations, and a full
        // evaluation batch of resolves all fit without blocking the
        // pool against itself.
        let queue_capacity = config.workers * 4 + config.eval_batch;
        let (tasks_tx, tasks_rx) = crossbeam_channel::bounded::<Task>(queue_capacity);
        let (eval_tx, eval_rx) = crossbeam_channel::bounded::<EvalSubmission>(queue_capacity);

        let mut threads = spawn_bridge(
            Arc::new(evaluator),
            eval_rx,
            tasks_tx.clone(),
            config.eval_batch,
        );
        for i in 0..config.workers {
            let ctx = WorkerCtx {
                shared: shared.clone(),
                tasks: tasks_tx.clone(),
                evals: eval_tx.clone(),
            };
            let rx = tasks_rx.clone();
            let rng =
                ChaCha20Rng::seed_from_u64(config.seed ^ (i as u64).wrapping_mul(0x9E37_79B9));
            let handle = thread::Builder::new()
                .name(format!("search-worker-{i}"))
                .spawn(move || worker_loop(ctx, rx, rng))
                .expect("spawn search worker");
            threads.push(handle);
        }

        Ok(Self {
            shared,
            tasks: tasks_tx,
            threads,
            closed: false,
        })
    }

    /// Run one move request to completion and harvest the policy.
    pub fn search(&mut self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        if self.closed {
            return Err(SearchError::Closed);
        }

        // Terminal positions resolve without touching the pool or the
        // evaluator.
        if let Terminal::Over { value } = self.shared.rules.terminal(&request.board) {
            return Ok(SearchResponse {
                decision: Decision::GameOver { value },
                policy: Vec::new(),
                root_value: value,
                simulations: 0,
            });
        }
        let legal = self.shared.rules.legal_moves(&request.board);
        if legal.is_empty() {
            return Ok(SearchResponse {
                decision: Decision::GameOver { value: -1.0 },
                policy: Vec::new(),
                root_value: -1.0,
                simulations: 0,
            });
        }

        let total = match request.budget {
            Budget::Default => self.shared.config.simulations,
            Budget::Ponder => self.shared.config.ponder_budget,
            Budget::Simulations(0) => return Err(ConfigError::ZeroBudget.into()),
            Budget::Simulations(n) => n,
        };

        if !request.reuse_tree {
            self.shared.tree.clear();
        }
        self.shared
            .set_request_context(&request.excluded_moves, &request.history);

        // Visits already accumulated on this position (tree reuse)
        // count against the budget, unless the request changes the
        // root's move distribution.
        let mut credit = if request.excluded_moves.is_empty() && !request.increase_temperature {
            self.shared
                .tree
                .get(&request.board)
                .map(|node| node.visits())
                .unwrap_or(0)
        } else {
            0
        };
        // A root already carrying the full budget gets a fresh one.
        // Repeating a request means more search is wanted, not a
        // replay of the stale harvest.
        if credit >= total {
            credit = 0;
        }
        let budget = total - credit;

        self.shared.counter.reset();
        let deadline = self
            .shared
            .config
            .wall_clock_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        debug!(budget, credit, ply = request.ply, "dispatching simulations");
        let mut dispatched = 0u32;
        while dispatched < budget {
            let batch = (self.shared.config.workers as u32).min(budget - dispatched);
            self.shared.counter.begin(batch as u64);
            for _ in 0..batch {
                let task = Task::Simulate {
                    board: request.board.clone(),
                    path: Vec::new(),
                };
                if self.tasks.send(task).is_err() {
                    return Err(SearchError::Closed);
                }
            }
            if !self.shared.counter.wait(deadline) {
                warn!(dispatched, "wall clock ceiling reached, harvesting partial search");
                break;
            }
            dispatched += batch;
        }

        debug!(dispatched, "harvesting root policy");
        Ok(self.harvest(&request, &legal, dispatched))
    }

    fn harvest(&self, request: &SearchRequest, legal: &[Move], dispatched: u32) -> SearchResponse {
        let config = &self.shared.config;

        let (moves, mut weights, best_q) = match self.shared.tree.get(&request.board) {
            Some(node) => {
                let state = node.lock();
                let mut weights = Vec::with_capacity(state.legal_moves.len());
                let mut best_q = f32::NEG_INFINITY;
                for mv in &state.legal_moves {
                    match state.edges.get(mv) {
                        Some(edge) => {
                            // Excluded edges cannot veto resignation.
                            if edge.n > 0.0 && !request.excluded_moves.contains(mv) {
                                best_q = best_q.max(edge.q);
                            }
                            weights.push(edge.n.max(0.0));
                        }
                        None => weights.push(0.0),
                    }
                }
                (state.legal_moves.clone(), weights, best_q)
            }
            None => (legal.to_vec(), vec![0.0; legal.len()], f32::NEG_INFINITY),
        };

        for (mv, weight) in moves.iter().zip(weights.iter_mut()) {
            if request.excluded_moves.contains(mv) {
                *weight = 0.0;
            }
        }
        if weights.iter().sum::<f32>() <= 0.0 {
            // Nothing visited (tiny budget or full exclusion): fall
            // back to uniform over the allowed moves.
            for (mv, weight) in moves.iter().zip(weights.iter_mut()) {
                if !request.excluded_moves.contains(mv) {
                    *weight = 1.0;
                }
            }
        }
        let sum: f32 = weights.iter().sum();
        if sum > 0.0 {
            for w in &mut weights {
                *w /= sum;
            }
        }

        let root_value = if best_q.is_finite() { best_q } else { 0.0 };
        if should_resign(config, request.ply, best_q) {
            return SearchResponse {
                decision: Decision::Resign,
                policy: moves.into_iter().zip(weights).collect(),
                root_value,
                simulations: dispatched,
            };
        }

        let tau = if request.increase_temperature {
            1.0
        } else {
            config.tau_decay.powi(request.ply as i32)
        };
        let sampling = apply_temperature(&weights, tau);

        let mut rng = ChaCha20Rng::seed_from_u64(
            config.seed ^ u64::from(request.ply).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        );
        let decision = match sample_move(&moves, &sampling, &mut rng) {
            Some(mv) => Decision::Play(mv),
            None => Decision::Resign,
        };

        SearchResponse {
            decision,
            policy: moves.into_iter().zip(weights).collect(),
            root_value,
            simulations: dispatched,
        }
    }

    /// Inspect a node's statistics.
    pub fn snapshot(&self, board: &Board) -> Option<NodeSnapshot> {
        let node = self.shared.tree.get(board)?;
        let state = node.lock();
        let edges = state
            .legal_moves
            .iter()
            .filter_map(|mv| {
                state.edges.get(mv).map(|edge| EdgeSnapshot {
                    mv: *mv,
                    n: edge.n,
                    w: edge.w,
                    q: edge.q,
                    q_variance: edge.q_variance,
                    prior: edge.prior,
                })
            })
            .collect();
        Some(NodeSnapshot {
            visits: node.visits(),
            pending: state.pending,
            edges,
        })
    }

    pub fn tree_len(&self) -> usize {
        self.shared.tree.len()
    }

    /// Drop the tree and stop every background loop. In-flight
    /// simulations are abandoned, not drained.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for _ in 0..self.shared.config.workers {
            let _ = self.tasks.send(Task::Shutdown);
        }
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
        self.shared.tree.clear();
        self.shared.cache.clear();
    }
}

impl<R: GameRules + 'static> Drop for SearchEngine<R> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resolve a repetition reached during descent, ignoring the position
/// the simulation just left. The adjudicated move is the reply played
/// from the FIRST occurrence of the repeated position, so a perpetual
/// check is pinned on the checker no matter which side's move closed
/// the cycle. The returned value is for the side to move at `board`,
/// which is the side that played that reply.
fn repetition_value<R: GameRules>(rules: &R, board: &Board, path: &[PathStep]) -> Option<f32> {
    if path.len() < 2 {
        return None;
    }
    let first = path[..path.len() - 1].iter().find(|s| s.board == *board)?;
    let class = rules.repetition_classification(&first.board, first.mv);
    trace!(?class, "repetition resolved during descent");
    Some(match class {
        RepetitionClass::Chase => -1.0,
        RepetitionClass::Chased => 1.0,
        RepetitionClass::Neutral => 0.0,
    })
}

fn should_resign(config: &SearchConfig, ply: u32, best_q: f32) -> bool {
    config.resign_enabled
        && ply > config.min_resign_ply
        && best_q.is_finite()
        && best_q < config.resign_threshold
}

/// Temperature-adjust a visit distribution: below tau 0.1 collapse to
/// a one-hot argmax, otherwise raise to 1/tau and renormalize.
fn apply_temperature(policy: &[f32], tau: f32) -> Vec<f32> {
    if policy.is_empty() {
        return Vec::new();
    }
    if tau < 0.1 {
        let mut best = 0;
        for (i, &p) in policy.iter().enumerate() {
            if p > policy[best] {
                best = i;
            }
        }
        let mut out = vec![0.0; policy.len()];
        out[best] = 1.0;
        return out;
    }
    let mut out: Vec<f32> = policy.iter().map(|&p| p.powf(1.0 / tau)).collect();
    let sum: f32 = out.iter().sum();
    if sum > 0.0 {
        for p in &mut out {
            *p /= sum;
        }
    }
    out
}

/// Sample a move by cumulative probability.
fn sample_move(moves: &[Move], policy: &[f32], rng: &mut ChaCha20Rng) -> Option<Move> {
    let r: f32 = rng.gen();
    let mut cumulative = 0.0;
    for (mv, &p) in moves.iter().zip(policy.iter()) {
        cumulative += p;
        if r < cumulative {
            return Some(*mv);
        }
    }
    moves
        .iter()
        .zip(policy.iter())
        .rev()
        .find(|(_, &p)| p > 0.0)
        .map(|(mv, _)| *mv)
}

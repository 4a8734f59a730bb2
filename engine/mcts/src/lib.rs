//! Concurrent Monte Carlo Tree Search engine for Chinese chess.
//!
//! A fixed pool of worker threads shares one search tree. Each
//! simulation descends from the root guided by UCB1-TUNED blended with
//! RAVE, borrowing a dynamic virtual loss on every edge it takes so
//! concurrent simulations spread out. Unexpanded positions are created
//! in a pending state and sent to an external batched policy/value
//! estimator; simulations that land on a pending node suspend and
//! resume when its evaluation arrives. Backup repays the borrowed
//! losses, folds values into running means and variances, and credits
//! RAVE statistics for moves played later in the same path.
//!
//! The engine is game-agnostic over the `xq-core` `GameRules` trait;
//! the `games-skirmish` crate provides the rules used by tests and
//! benches.
//!
//! # Usage
//!
//! ```rust,ignore
//! use games_skirmish::{start_board, SkirmishRules};
//! use xq_mcts::{SearchConfig, SearchEngine, SearchRequest, UniformEvaluator};
//!
//! let config = SearchConfig::default().with_simulations(800).with_workers(8);
//! let mut engine = SearchEngine::new(SkirmishRules, UniformEvaluator::new(), config)?;
//!
//! let response = engine.search(SearchRequest::new(start_board(), 0))?;
//! println!("decision: {:?}", response.decision);
//! # Ok::<(), xq_mcts::SearchError>(())
//! ```

pub mod cache;
pub mod config;
pub mod evaluator;
pub mod node;
pub mod search;
pub mod select;
pub mod tree;
pub mod zobrist;

pub use cache::TranspositionCache;
pub use config::{ConfigError, SearchConfig};
pub use evaluator::{EvalOutput, EvalRequest, Evaluator, EvaluatorError, UniformEvaluator};
pub use node::{EdgeStats, NodeState, PathStep, SearchNode};
pub use search::{
    Budget, Decision, EdgeSnapshot, NodeSnapshot, SearchEngine, SearchError, SearchRequest,
    SearchResponse, Task,
};
pub use select::{MoveComplexity, UniformComplexity};
pub use tree::SearchTree;
pub use zobrist::ZobristHasher;

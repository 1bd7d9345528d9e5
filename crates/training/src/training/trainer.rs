//! BPE trainer implementation.
//!
//! Training starts from the UTF-8 bytes of the corpus and repeats a fixed
//! number of times: count adjacent pairs, pick the most frequent one (ties go
//! to the lexicographically smallest pair), give it the next id, record the
//! rule and its vocabulary entry, and merge it across the sequence.
//!
//! Two counting strategies produce identical results:
//! - `Recount` rebuilds the pair histogram every iteration, O(n) each.
//! - `Incremental` counts once and then applies per-merge count deltas,
//!   selecting pairs through a lazily invalidated heap.

use super::counter::{most_frequent, PairCounter};
use ahash::AHashMap;
use bytepair_core::{
    BpeParams, MergeRules, Pair, PairPriorityQueue, Result, TokenId, TokenizerError, Vocabulary,
    BYTE_VOCAB_SIZE,
};
use log::{debug, info};

/// Largest merge count whose ids still fit in a `TokenId`.
pub const MAX_MERGES: usize = TokenId::MAX as usize - BYTE_VOCAB_SIZE + 1;

/// How pair frequencies are maintained between iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountingStrategy {
    /// Recount every adjacent pair after each merge
    Recount,
    /// Count once, then update counts from merge deltas
    #[default]
    Incremental,
}

/// Configuration for BPE training.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingConfig {
    /// Number of merges to learn
    pub num_merges: usize,
    /// Counting strategy
    pub strategy: CountingStrategy,
    /// Whether to count pairs with rayon
    pub parallel: bool,
}

impl TrainingConfig {
    /// Configuration learning `num_merges` merges with default settings.
    pub fn new(num_merges: usize) -> Self {
        Self {
            num_merges,
            ..Default::default()
        }
    }

    /// Set the number of merges to learn.
    pub fn num_merges(mut self, num_merges: usize) -> Self {
        self.num_merges = num_merges;
        self
    }

    /// Set the counting strategy.
    pub fn strategy(mut self, strategy: CountingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enable or disable parallel pair counting.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.num_merges > MAX_MERGES {
            return Err(TokenizerError::InvalidArgument(format!(
                "num_merges {} exceeds the maximum of {}",
                self.num_merges, MAX_MERGES
            )));
        }
        Ok(())
    }
}

/// Why training stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// All requested merges were learned
    TargetReached,
    /// The sequence ran out of pairs before the target
    CorpusExhausted,
}

/// Summary of a training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingReport {
    /// Merges requested
    pub requested: usize,
    /// Merges actually learned
    pub learned: usize,
    /// Why the loop ended
    pub stop_reason: StopReason,
    /// Sequence length before any merge (corpus bytes)
    pub initial_sequence_len: usize,
    /// Sequence length after the last merge
    pub final_sequence_len: usize,
}

impl TrainingReport {
    /// Corpus bytes per token after training; 1.0 for an empty corpus.
    pub fn compression_ratio(&self) -> f64 {
        if self.final_sequence_len == 0 {
            return 1.0;
        }
        self.initial_sequence_len as f64 / self.final_sequence_len as f64
    }
}

/// BPE trainer.
///
/// Learns merge rules from a single training text over the raw byte
/// alphabet.
#[derive(Debug, Clone, Default)]
pub struct BpeTrainer {
    /// Configuration
    config: TrainingConfig,
}

/// Vocabulary and merge rules being built.
struct MergeState {
    vocab: Vocabulary,
    merges: MergeRules,
}

impl MergeState {
    fn with_capacity(num_merges: usize) -> Self {
        Self {
            vocab: Vocabulary::with_capacity(BYTE_VOCAB_SIZE + num_merges),
            merges: MergeRules::with_capacity(num_merges),
        }
    }

    /// Record a merge and return the id assigned to it.
    fn record(&mut self, pair: Pair, count: u64) -> Result<TokenId> {
        let new_id = self.vocab.push_merge(pair.0, pair.1)?;
        self.merges.push(pair, new_id)?;
        debug!(
            "merge {}: {:?} (count {}) -> {}",
            self.merges.len(),
            pair,
            count,
            new_id
        );
        Ok(new_id)
    }

    fn learned(&self) -> usize {
        self.merges.len()
    }
}

impl BpeTrainer {
    /// Create a new BPE trainer with the given configuration.
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Create a new BPE trainer learning `num_merges` merges.
    pub fn with_num_merges(num_merges: usize) -> Self {
        Self::new(TrainingConfig::new(num_merges))
    }

    /// The trainer's configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on the given text.
    ///
    /// Learns up to `num_merges` merges; fewer when the sequence runs out of
    /// pairs, which is not an error.
    pub fn train(&self, text: &str) -> Result<BpeParams> {
        self.train_with_report(text).map(|(params, _)| params)
    }

    /// Train on the given text and report how the run went.
    pub fn train_with_report(&self, text: &str) -> Result<(BpeParams, TrainingReport)> {
        self.config.validate()?;

        let requested = self.config.num_merges;
        let mut counter = PairCounter::from_text(text);
        let initial_sequence_len = counter.len();

        info!(
            "training {} merges over {} bytes ({:?}, parallel: {})",
            requested, initial_sequence_len, self.config.strategy, self.config.parallel
        );

        // Never more merges than the sequence can shrink by
        let capacity = requested.min(initial_sequence_len.saturating_sub(1));
        let mut state = MergeState::with_capacity(capacity);

        match self.config.strategy {
            CountingStrategy::Recount => self.run_recount(&mut counter, &mut state)?,
            CountingStrategy::Incremental => self.run_incremental(&mut counter, &mut state)?,
        }

        let learned = state.learned();
        let stop_reason = if learned == requested {
            StopReason::TargetReached
        } else {
            StopReason::CorpusExhausted
        };

        let report = TrainingReport {
            requested,
            learned,
            stop_reason,
            initial_sequence_len,
            final_sequence_len: counter.len(),
        };

        info!(
            "learned {} of {} merges ({:?}); sequence {} -> {} tokens ({:.2}x)",
            report.learned,
            report.requested,
            report.stop_reason,
            report.initial_sequence_len,
            report.final_sequence_len,
            report.compression_ratio()
        );

        let params = BpeParams::from_parts(state.vocab, state.merges)?;
        let stats = params.merges().stats();
        debug!(
            "merge ids {:?}..={:?}, {} of {} merges join two raw bytes",
            stats.first_id, stats.last_id, stats.byte_pairs, stats.count
        );
        Ok((params, report))
    }

    /// Recount every pair before each merge.
    fn run_recount(&self, counter: &mut PairCounter, state: &mut MergeState) -> Result<()> {
        while state.learned() < self.config.num_merges {
            let pair_counts = counter.count_pairs(self.config.parallel);
            let Some((pair, count)) = most_frequent(&pair_counts) else {
                break;
            };

            let new_id = state.record(pair, count)?;
            counter.apply_merge(pair, new_id);
        }
        Ok(())
    }

    /// Count once, then keep counts current from merge deltas.
    fn run_incremental(&self, counter: &mut PairCounter, state: &mut MergeState) -> Result<()> {
        if self.config.num_merges == 0 || counter.is_empty() {
            return Ok(());
        }

        let mut pair_counts = counter.count_pairs(self.config.parallel);
        let mut queue = PairPriorityQueue::from_counts(&pair_counts);

        while state.learned() < self.config.num_merges {
            let Some(candidate) = queue.pop() else {
                break;
            };

            let new_id = state.record(candidate.pair, candidate.count)?;
            let changes = counter.merge_pair(candidate.pair, new_id);
            update_pair_counts(&mut pair_counts, &mut queue, changes);
        }
        Ok(())
    }
}

/// Apply merge deltas to the counts and refresh the queue for every pair
/// whose count changed.
fn update_pair_counts(
    pair_counts: &mut AHashMap<Pair, u64>,
    queue: &mut PairPriorityQueue,
    changes: Vec<(Pair, i64)>,
) {
    // Aggregate changes by pair
    let mut aggregated: AHashMap<Pair, i64> = AHashMap::new();
    for (pair, delta) in changes {
        *aggregated.entry(pair).or_insert(0) += delta;
    }

    for (pair, delta) in aggregated {
        if delta == 0 {
            continue;
        }

        let current = pair_counts.get(&pair).copied().unwrap_or(0);
        let new_count = current as i64 + delta;
        debug_assert!(new_count >= 0, "pair {:?} count went negative", pair);
        let new_count = new_count.max(0) as u64;

        if new_count > 0 {
            pair_counts.insert(pair, new_count);
        } else {
            pair_counts.remove(&pair);
        }
        queue.update(pair, new_count);
    }
}

/// Train BPE parameters with `num_merges` merges using the default
/// configuration.
pub fn train(text: &str, num_merges: usize) -> Result<BpeParams> {
    BpeTrainer::with_num_merges(num_merges).train(text)
}

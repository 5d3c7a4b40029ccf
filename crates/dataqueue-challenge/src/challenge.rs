//! Challenge finder: producers draw random numbers below a difficulty until
//! one lands at or under the threshold, then every producer is stopped.

use dataqueue::{Action, ConsumerFn, ProducerFn, Runner, consumer_fn, producer_fn};
use portable_atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// A single draw travelling from a producer to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draw {
    Miss(u64),
    Hit(u64),
}

#[derive(Debug, Default)]
struct Tally {
    draws: AtomicU64,
    hit: OnceLock<u64>,
}

/// [`Runner`] racing producers to find a draw under the threshold.
#[derive(Debug, Clone)]
pub struct ChallengeFinder {
    difficulty: u64,
    threshold: u64,
    tally: Arc<Tally>,
}

impl ChallengeFinder {
    pub fn new(difficulty: u64, threshold: u64) -> Self {
        Self {
            difficulty,
            threshold,
            tally: Arc::default(),
        }
    }

    /// Number of draws received by the consumer so far.
    pub fn draws(&self) -> u64 {
        self.tally.draws.load(Ordering::Relaxed)
    }

    /// The first hit received by the consumer, if any.
    pub fn hit(&self) -> Option<u64> {
        self.tally.hit.get().copied()
    }

    /// Classifies a raw random value into the item and action a producer
    /// round yields.
    fn judge(difficulty: u64, threshold: u64, raw: u64) -> (Option<Draw>, Action) {
        let value = raw % difficulty;
        if value > threshold {
            return (Some(Draw::Miss(value)), Action::SEND);
        }

        tracing::info!("Challenge found: {value}");
        (Some(Draw::Hit(value)), Action::SEND_AND_STOP_ALL)
    }
}

impl Runner<Draw> for ChallengeFinder {
    fn callbacks(&self) -> (Option<ProducerFn<Draw>>, Option<ConsumerFn<Draw>>) {
        let (difficulty, threshold) = (self.difficulty, self.threshold);
        let producer = producer_fn(move |_token| {
            let raw = rand::random::<u64>();
            async move { Self::judge(difficulty, threshold, raw) }
        });

        let tally = Arc::clone(&self.tally);
        let consumer = consumer_fn(move |_token, draw: Draw| {
            tally.draws.fetch_add(1, Ordering::Relaxed);
            if let Draw::Hit(value) = draw {
                tracing::info!("Challenge received: {value}");
                let _ = tally.hit.set(value);
            }
            async {}
        });

        (Some(producer), Some(consumer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataqueue::{CancellationToken, start, start_single_consumer};
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn judge_splits_on_threshold() {
        let cases = [
            (0, Draw::Hit(0), Action::SEND_AND_STOP_ALL),
            (10, Draw::Hit(10), Action::SEND_AND_STOP_ALL),
            (11, Draw::Miss(11), Action::SEND),
            (99, Draw::Miss(99), Action::SEND),
            // Reduced modulo the difficulty first.
            (105, Draw::Hit(5), Action::SEND_AND_STOP_ALL),
        ];

        for (raw, draw, action) in cases {
            assert_eq!(
                ChallengeFinder::judge(100, 10, raw),
                (Some(draw), action),
                "raw = {raw}"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn finds_an_easy_challenge() {
        let finder = ChallengeFinder::new(16, 7);

        timeout(
            Duration::from_secs(5),
            start_single_consumer(&CancellationToken::new(), &finder, 8),
        )
        .await
        .unwrap()
        .unwrap();

        let hit = finder.hit().unwrap();
        assert!(hit <= 7);
        assert!(finder.draws() >= 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deadline_ends_an_impossible_challenge() {
        // With threshold 0 and a huge difficulty a hit is practically
        // impossible, so only cancellation can end the run.
        let finder = ChallengeFinder::new(u64::MAX, 0);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        timeout(Duration::from_secs(5), start(&token, &finder, 4, 2))
            .await
            .unwrap()
            .unwrap();

        assert!(finder.draws() > 0);
    }
}

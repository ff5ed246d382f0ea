//! Audio staging queue: prepared questions land here from background
//! preparation tasks and are consumed by the session driver when each
//! ordinal's turn arrives.
//!
//! FIFO by insertion — staging order may differ from delivery order because
//! preparation tasks finish in any order. The consumer asks for a specific
//! ordinal: an exact match is preferred, and for dynamic questions any
//! staged item may serve the next slot (its ordinal is restamped).

use crate::question::PreparedQuestion;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Ordered, concurrency-safe buffer of prepared questions. Owned by exactly
/// one session; producers are that session's preparation tasks.
#[derive(Default)]
pub struct StagingQueue {
    items: Mutex<VecDeque<PreparedQuestion>>,
    notify: Notify,
}

impl StagingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side: stage a prepared question.
    pub fn push(&self, prepared: PreparedQuestion) {
        self.items
            .lock()
            .expect("staging queue poisoned")
            .push_back(prepared);
        self.notify.notify_one();
    }

    /// Non-blocking pop of the queue head.
    pub fn try_pop(&self) -> Option<PreparedQuestion> {
        self.items
            .lock()
            .expect("staging queue poisoned")
            .pop_front()
    }

    /// Bounded-blocking pop of the queue head.
    pub async fn pop(&self, timeout: Duration) -> Option<PreparedQuestion> {
        self.pop_matching(None, true, timeout).await
    }

    /// Bounded-blocking pop for a specific ordinal. With `allow_any`, falls
    /// back to the queue head when no exact match is staged — the caller
    /// restamps the ordinal.
    pub async fn pop_matching(
        &self,
        ordinal: Option<u32>,
        allow_any: bool,
        timeout: Duration,
    ) -> Option<PreparedQuestion> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(item) = self.take(ordinal, allow_any) {
                return Some(item);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return self.take(ordinal, allow_any);
            }
            let _ = tokio::time::timeout(remaining, self.notify.notified()).await;
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("staging queue poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, ordinal: Option<u32>, allow_any: bool) -> Option<PreparedQuestion> {
        use crate::question::QuestionOrigin;
        let mut items = self.items.lock().expect("staging queue poisoned");
        if let Some(wanted) = ordinal {
            if let Some(pos) = items.iter().position(|p| p.spec.ordinal == wanted) {
                return items.remove(pos);
            }
            if allow_any {
                // A stale fixed starter must never serve a dynamic slot.
                if let Some(pos) = items
                    .iter()
                    .position(|p| p.spec.origin != QuestionOrigin::Fixed)
                {
                    return items.remove(pos);
                }
            }
            return None;
        }
        items.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{QuestionCategory, QuestionOrigin, QuestionSpec};

    fn prepared(ordinal: u32) -> PreparedQuestion {
        PreparedQuestion {
            spec: QuestionSpec {
                text: format!("question {}", ordinal),
                category: QuestionCategory::Behavioral,
                ordinal,
                origin: QuestionOrigin::Generated,
            },
            audio: None,
        }
    }

    #[tokio::test]
    async fn fifo_order() {
        let q = StagingQueue::new();
        q.push(prepared(1));
        q.push(prepared(2));
        assert_eq!(q.try_pop().unwrap().spec.ordinal, 1);
        assert_eq!(q.try_pop().unwrap().spec.ordinal, 2);
        assert!(q.try_pop().is_none());
    }

    #[tokio::test]
    async fn exact_match_skips_the_line() {
        let q = StagingQueue::new();
        q.push(prepared(5));
        q.push(prepared(4));
        let got = q
            .pop_matching(Some(4), false, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(got.spec.ordinal, 4);
        assert_eq!(q.len(), 1);
    }

    #[tokio::test]
    async fn no_match_without_allow_any_times_out() {
        let q = StagingQueue::new();
        q.push(prepared(7));
        let got = q
            .pop_matching(Some(2), false, Duration::from_millis(20))
            .await;
        assert!(got.is_none());
        assert_eq!(q.len(), 1);
    }

    #[tokio::test]
    async fn allow_any_takes_head() {
        let q = StagingQueue::new();
        q.push(prepared(9));
        let got = q
            .pop_matching(Some(2), true, Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(got.spec.ordinal, 9);
    }

    #[tokio::test]
    async fn pop_wakes_on_push() {
        let q = std::sync::Arc::new(StagingQueue::new());
        let q2 = q.clone();
        let waiter = tokio::spawn(async move { q2.pop(Duration::from_secs(5)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        q.push(prepared(3));
        let got = waiter.await.unwrap().unwrap();
        assert_eq!(got.spec.ordinal, 3);
    }

    #[tokio::test]
    async fn pop_times_out_when_empty() {
        let q = StagingQueue::new();
        let start = std::time::Instant::now();
        assert!(q.pop(Duration::from_millis(30)).await.is_none());
        assert!(start.elapsed() >= Duration::from_millis(25));
    }
}

//! In-memory result store.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::session::{SessionResult, UserId};
use crate::store::ResultStore;

/// Result store backed by a `DashMap`.
///
/// Each user's history lives in its own map entry; the shard lock taken by
/// `entry()` serializes same-user appends while other users proceed.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    histories: DashMap<UserId, Vec<SessionResult>>,
}

impl MemoryResultStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with at least one result.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.histories.len()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn append(&self, user: &UserId, result: SessionResult) -> Result<(), StoreError> {
        self.histories.entry(user.clone()).or_default().push(result);
        Ok(())
    }

    async fn list(&self, user: &UserId) -> Result<Vec<SessionResult>, StoreError> {
        Ok(self
            .histories
            .get(user)
            .map(|history| history.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::sample_result;
    use std::sync::Arc;

    #[tokio::test]
    async fn unknown_user_has_empty_history() {
        let store = MemoryResultStore::new();
        let history = store.list(&UserId::new("nobody")).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn appends_keep_order_per_user() {
        let store = MemoryResultStore::new();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        store.append(&alice, sample_result("alice", "a1")).await.unwrap();
        store.append(&bob, sample_result("bob", "b1")).await.unwrap();
        store.append(&alice, sample_result("alice", "a2")).await.unwrap();

        let ids: Vec<String> = store
            .list(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.scenario_id)
            .collect();
        assert_eq!(ids, ["a1", "a2"]);
        assert_eq!(store.list(&bob).await.unwrap().len(), 1);
        assert_eq!(store.user_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_same_user_appends_are_not_lost() {
        let store = Arc::new(MemoryResultStore::new());
        let user = UserId::new("alice");

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = Arc::clone(&store);
                let user = user.clone();
                tokio::spawn(async move {
                    store
                        .append(&user, sample_result("alice", &format!("s{i}")))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list(&user).await.unwrap().len(), 64);
    }

    #[tokio::test]
    async fn listed_history_is_a_copy() {
        let store = MemoryResultStore::new();
        let alice = UserId::new("alice");
        store.append(&alice, sample_result("alice", "a1")).await.unwrap();

        let mut listed = store.list(&alice).await.unwrap();
        listed[0].percentage = 0.0;
        listed.clear();

        let again = store.list(&alice).await.unwrap();
        assert_eq!(again.len(), 1);
        assert!((again[0].percentage - 50.0).abs() < f64::EPSILON);
    }
}

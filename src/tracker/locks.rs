use std::{collections::HashMap, sync::Arc};
use serenity::model::id::UserId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per member.
///
/// Entries nobody holds or waits for are dropped on the next acquisition.
#[derive(Debug, Default)]
pub struct UserLocks(Mutex<HashMap<UserId, Arc<Mutex<()>>>>);

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }
    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.0.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }
    /// Number of members with a lock entry.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.0.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.lock(UserId(1)).await;
        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move { drop(locks.lock(UserId(1)).await) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        // Another member is not blocked.
        drop(locks.lock(UserId(2)).await);
        drop(guard);
        waiter.await.unwrap();
    }
    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = UserLocks::new();
        drop(locks.lock(UserId(1)).await);
        drop(locks.lock(UserId(2)).await);
        let _held = locks.lock(UserId(3)).await;
        assert_eq!(locks.len().await, 1);
    }
}

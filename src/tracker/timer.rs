//! Deferred restores.
//!
//! Each member has at most one pending restore. Scheduling a new one aborts
//! the previous task before spawning the next.

use std::{collections::HashMap, future::Future, sync::atomic::{AtomicU64, Ordering}, time::Duration};
use serenity::model::id::UserId;
use tokio::{sync::Mutex, task::JoinHandle};
use crate::log_debug;

pub type TimerId = u64;

#[derive(Debug, Default)]
pub struct RestoreTimers {
    next_id: AtomicU64,
    handles: Mutex<HashMap<UserId, (TimerId, JoinHandle<()>)>>,
}

impl RestoreTimers {
    pub fn new() -> Self {
        Self::default()
    }
    /// Run `on_expire` after `delay`, replacing the pending restore of `user_id`.
    ///
    /// `on_expire` receives the id of the new timer.
    pub async fn schedule<F, Fut>(&self, user_id: UserId, delay: Duration, on_expire: F) -> TimerId
        where
            F: FnOnce(TimerId) -> Fut,
            Fut: Future<Output = ()> + Send + 'static
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let task = on_expire(id);
        let mut handles = self.handles.lock().await;
        if let Some((old_id, old)) = handles.remove(&user_id) {
            old.abort();
            log_debug!("Timer {} of {}: replaced by timer {}", old_id, user_id, id);
        }
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        handles.insert(user_id, (id, handle));
        id
    }
    /// Abort the pending restore of `user_id`. Returns whether there was one.
    pub async fn cancel(&self, user_id: UserId) -> bool {
        match self.handles.lock().await.remove(&user_id) {
            Some((id, handle)) => {
                handle.abort();
                log_debug!("Timer {} of {}: cancelled", id, user_id);
                true
            },
            None => false
        }
    }
    /// Forget the timer `id` of `user_id` without aborting it.
    /// Called by the timer task itself once it fires.
    pub async fn finish(&self, user_id: UserId, id: TimerId) {
        let mut handles = self.handles.lock().await;
        if matches!(handles.get(&user_id), Some((current, _)) if *current == id) {
            handles.remove(&user_id);
        }
    }
    /// Abort every pending restore. Returns how many were aborted.
    pub async fn cancel_all(&self) -> usize {
        let mut handles = self.handles.lock().await;
        let count = handles.len();
        for (_, (_, handle)) in handles.drain() {
            handle.abort();
        }
        count
    }
    pub async fn pending(&self) -> usize {
        self.handles.lock().await.len()
    }
}

impl Drop for RestoreTimers {
    fn drop(&mut self) {
        for (_, (_, handle)) in self.handles.get_mut().iter() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, atomic::AtomicUsize};

    #[tokio::test(start_paused = true)]
    async fn reschedule_keeps_one_timer() {
        let timers = RestoreTimers::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let user = UserId(1);
        let fired_by = Arc::new(std::sync::Mutex::new(Vec::new()));
        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            let fired_by = Arc::clone(&fired_by);
            timers.schedule(user, Duration::from_secs(10), move |id| async move {
                fired.fetch_add(1, Ordering::SeqCst);
                fired_by.lock().unwrap().push(id);
            }).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        assert_eq!(timers.pending().await, 1);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(*fired_by.lock().unwrap(), vec![3]);
    }
    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let timers = RestoreTimers::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);
        timers.schedule(UserId(1), Duration::from_secs(1), move |_| async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }).await;
        assert!(timers.cancel(UserId(1)).await);
        assert!(!timers.cancel(UserId(1)).await);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
    #[tokio::test(start_paused = true)]
    async fn finish_only_forgets_matching_timer() {
        let timers = RestoreTimers::new();
        let id = timers.schedule(UserId(1), Duration::from_secs(1), |_| async {}).await;
        timers.finish(UserId(1), id + 1).await;
        assert_eq!(timers.pending().await, 1);
        timers.finish(UserId(1), id).await;
        assert_eq!(timers.pending().await, 0);
    }
    #[tokio::test(start_paused = true)]
    async fn cancel_all() {
        let timers = RestoreTimers::new();
        for user in 1..=3 {
            timers.schedule(UserId(user), Duration::from_secs(1), |_| async {}).await;
        }
        assert_eq!(timers.cancel_all().await, 3);
        assert_eq!(timers.pending().await, 0);
    }
}

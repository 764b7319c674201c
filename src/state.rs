//! Wait registry for blocking commands.
//!
//! Maps a key to the FIFO queue of clients currently blocked on it. Signals
//! are edge-triggered: each waiter holds a capacity-1 channel and
//! notification uses `try_send`, so a mutator never blocks on a slow waiter
//! and a spurious wake at most causes one extra rescan.
//!
//! The registry lives behind its own mutex but is only ever locked while
//! the store lock is held (or strictly after it was released), store first.
//! Mutating commands deliver signals before releasing the store lock, which
//! makes the mutation happen-before any wakeup that observes it.

use std::collections::{HashMap, VecDeque};

use tokio::sync::mpsc;

/// A blocked client. One waiter may be registered under several keys
/// (multi-key `BLPOP`); all registrations share the same channel.
#[derive(Debug)]
pub struct Waiter {
    pub client_address: String,
    pub sender: mpsc::Sender<()>,
}

#[derive(Debug, Default)]
pub struct State {
    list_waiters: HashMap<String, VecDeque<Waiter>>,
    stream_waiters: HashMap<String, VecDeque<Waiter>>,
}

impl State {
    pub fn new() -> Self {
        State::default()
    }

    pub fn add_list_waiter(&mut self, key: String, waiter: Waiter) {
        self.list_waiters.entry(key).or_default().push_back(waiter);
    }

    pub fn remove_list_waiter(&mut self, key: &str, client_address: &str) {
        remove_waiter(&mut self.list_waiters, key, client_address);
    }

    /// Wakes up to `count` waiters on `key` in subscription order, one per
    /// newly available element. A waiter whose receiver is gone is skipped
    /// without consuming a slot.
    pub fn notify_list_waiters(&mut self, key: &str, count: usize) {
        let Some(waiters) = self.list_waiters.get_mut(key) else {
            return;
        };

        let mut notified = 0;

        while notified < count {
            let Some(waiter) = waiters.pop_front() else {
                break;
            };

            if waiter.sender.try_send(()).is_ok() {
                notified += 1;
            }
        }

        if waiters.is_empty() {
            self.list_waiters.remove(key);
        }
    }

    pub fn add_stream_waiter(&mut self, key: String, waiter: Waiter) {
        self.stream_waiters.entry(key).or_default().push_back(waiter);
    }

    pub fn remove_stream_waiter(&mut self, key: &str, client_address: &str) {
        remove_waiter(&mut self.stream_waiters, key, client_address);
    }

    /// Wakes every waiter on `key`. Stream reads do not consume entries, so
    /// all blocked readers get to see a new entry. Waiters stay registered;
    /// they deregister themselves when they finish.
    pub fn notify_stream_waiters(&mut self, key: &str) {
        let Some(waiters) = self.stream_waiters.get(key) else {
            return;
        };

        for waiter in waiters {
            // A full channel means a wakeup is already pending.
            let _ = waiter.sender.try_send(());
        }
    }

    pub fn list_waiter_count(&self, key: &str) -> usize {
        self.list_waiters.get(key).map_or(0, VecDeque::len)
    }

    pub fn stream_waiter_count(&self, key: &str) -> usize {
        self.stream_waiters.get(key).map_or(0, VecDeque::len)
    }
}

fn remove_waiter(
    waiters: &mut HashMap<String, VecDeque<Waiter>>,
    key: &str,
    client_address: &str,
) {
    if let Some(queue) = waiters.get_mut(key) {
        queue.retain(|waiter| waiter.client_address != client_address);

        if queue.is_empty() {
            waiters.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiter(client_address: &str) -> (Waiter, mpsc::Receiver<()>) {
        let (sender, receiver) = mpsc::channel(1);
        (
            Waiter {
                client_address: client_address.to_string(),
                sender,
            },
            receiver,
        )
    }

    #[tokio::test]
    async fn test_list_notification_is_fifo_and_bounded() {
        let mut state = State::new();

        let (first, mut first_rx) = waiter("127.0.0.1:1000");
        let (second, mut second_rx) = waiter("127.0.0.1:1001");
        let (third, mut third_rx) = waiter("127.0.0.1:1002");

        state.add_list_waiter("q".to_string(), first);
        state.add_list_waiter("q".to_string(), second);
        state.add_list_waiter("q".to_string(), third);

        // Two elements pushed: the two earliest waiters wake, the third stays.
        state.notify_list_waiters("q", 2);

        assert!(first_rx.try_recv().is_ok());
        assert!(second_rx.try_recv().is_ok());
        assert!(third_rx.try_recv().is_err());
        assert_eq!(state.list_waiter_count("q"), 1);
    }

    #[tokio::test]
    async fn test_list_notification_skips_dropped_receivers() {
        let mut state = State::new();

        let (gone, gone_rx) = waiter("127.0.0.1:1000");
        let (alive, mut alive_rx) = waiter("127.0.0.1:1001");
        drop(gone_rx);

        state.add_list_waiter("q".to_string(), gone);
        state.add_list_waiter("q".to_string(), alive);

        state.notify_list_waiters("q", 1);

        assert!(alive_rx.try_recv().is_ok());
        assert_eq!(state.list_waiter_count("q"), 0);
    }

    #[tokio::test]
    async fn test_stream_notification_reaches_everyone() {
        let mut state = State::new();

        let (first, mut first_rx) = waiter("127.0.0.1:1000");
        let (second, mut second_rx) = waiter("127.0.0.1:1001");

        state.add_stream_waiter("s".to_string(), first);
        state.add_stream_waiter("s".to_string(), second);

        state.notify_stream_waiters("s");

        assert!(first_rx.try_recv().is_ok());
        assert!(second_rx.try_recv().is_ok());
        // Stream waiters deregister themselves.
        assert_eq!(state.stream_waiter_count("s"), 2);

        // A second notify while wakeups are pending does not pile up.
        state.notify_stream_waiters("s");
        assert!(first_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_remove_waiter_cleans_up_empty_slots() {
        let mut state = State::new();

        let (only, _rx) = waiter("127.0.0.1:1000");
        state.add_list_waiter("q".to_string(), only);

        state.remove_list_waiter("q", "127.0.0.1:1000");
        assert_eq!(state.list_waiter_count("q"), 0);

        // Removing from a key nobody waits on is a no-op.
        state.remove_list_waiter("missing", "127.0.0.1:1000");
    }
}

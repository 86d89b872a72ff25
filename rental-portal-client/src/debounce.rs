use std::time::Duration;

use log::debug;
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    time::sleep,
};

/// Create a debounced channel. Values pushed into the [DebounceInput] come out of the
/// [Debouncer] only once no newer value arrived for `window`.
pub fn channel<T>(window: Duration) -> (DebounceInput<T>, Debouncer<T>) {
    let (sender, receiver) = unbounded_channel();
    (
        DebounceInput { sender },
        Debouncer {
            window,
            receiver,
        },
    )
}

/// Sending half of a debounced channel, fed on every keystroke
#[derive(Debug, Clone)]
pub struct DebounceInput<T> {
    sender: UnboundedSender<T>,
}

impl<T> DebounceInput<T> {
    /// Push the latest raw `value`. Returns false once the [Debouncer] is gone.
    pub fn push(&self, value: T) -> bool {
        self.sender.send(value).is_ok()
    }
}

/// Receiving half of a debounced channel
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    receiver: UnboundedReceiver<T>,
}

impl<T> Debouncer<T> {
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Wait for the next settled value: the last one of a burst whose values arrived less than
    /// `window` apart. A closed input flushes the pending value immediately. Returns [None] once
    /// every input is dropped and nothing is pending.
    pub async fn next(&mut self) -> Option<T> {
        let mut latest = self.receiver.recv().await?;
        let mut collapsed = 0_usize;
        loop {
            tokio::select! {
                value = self.receiver.recv() => match value {
                    Some(value) => {
                        latest = value;
                        collapsed += 1;
                    }
                    None => break,
                },
                _ = sleep(self.window) => break,
            }
        }
        debug!("Debounced {} value(s) into one", collapsed + 1);
        Some(latest)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::time::{sleep, Instant};

    use super::channel;

    const WINDOW: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn burst_should_emit_only_last_value() {
        let (input, mut debouncer) = channel(WINDOW);
        let start = Instant::now();
        let typing = tokio::spawn(async move {
            for value in ["J", "Jo", "Joh", "Jo", "John"] {
                input.push(value.to_owned());
                sleep(Duration::from_millis(100)).await;
            }
            sleep(Duration::from_secs(2)).await;
        });

        let first = debouncer.next().await;
        let settled_at = start.elapsed();
        let second = debouncer.next().await;
        typing.await.expect("Typing task panicked");

        assert_eq!(first.as_deref(), Some("John"));
        assert!(settled_at >= Duration::from_millis(900));
        assert!(settled_at < Duration::from_secs(2));
        assert_eq!(second, None);
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_longer_than_window_should_emit_each_value() {
        let (input, mut debouncer) = channel(WINDOW);
        let typing = tokio::spawn(async move {
            input.push("Jane");
            sleep(Duration::from_secs(1)).await;
            input.push("John");
            sleep(Duration::from_secs(1)).await;
        });

        let first = debouncer.next().await;
        let second = debouncer.next().await;
        let third = debouncer.next().await;
        typing.await.expect("Typing task panicked");

        assert_eq!(first, Some("Jane"));
        assert_eq!(second, Some("John"));
        assert_eq!(third, None);
    }

    #[tokio::test]
    async fn closed_input_should_flush_pending_value() {
        let (input, mut debouncer) = channel(Duration::from_secs(60));
        input.push(7);
        drop(input);

        assert_eq!(debouncer.next().await, Some(7));
        assert_eq!(debouncer.next().await, None);
    }
}

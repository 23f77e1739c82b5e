//! Server-clock-synchronized countdown into the memorization phase.
//!
//! The match start instant is computed once on the server and broadcast
//! as `{serverTime, gameStartTime, countdownDuration}`. Clients derive a
//! clock offset at receipt and re-evaluate the remaining time every tick,
//! so both sides hit zero within one network-latency skew of each other
//! regardless of local clock drift.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Wire contract for the countdown broadcast. Times are epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStartBroadcast {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(rename = "serverTime")]
    pub server_time: i64,
    #[serde(rename = "gameStartTime")]
    pub game_start_time: i64,
    #[serde(rename = "countdownDuration")]
    pub countdown_duration: u32,
}

impl GameStartBroadcast {
    /// Builds the broadcast at `now`, scheduling the start `countdown_secs`
    /// out on the server clock.
    pub fn now(countdown_secs: u32) -> Self {
        let server_time = Utc::now().timestamp_millis();
        GameStartBroadcast {
            message_type: "GAME_START".to_string(),
            server_time,
            game_start_time: server_time + i64::from(countdown_secs) * 1000,
            countdown_duration: countdown_secs,
        }
    }
}

/// Offset to add to local clock readings: `serverTime - localClock` at
/// the instant the broadcast arrived.
pub fn clock_offset(server_time_ms: i64, local_at_receipt_ms: i64) -> i64 {
    server_time_ms - local_at_receipt_ms
}

/// Remaining countdown at a local clock reading, never negative.
pub fn remaining_ms(game_start_time_ms: i64, offset_ms: i64, local_now_ms: i64) -> i64 {
    (game_start_time_ms - (local_now_ms + offset_ms)).max(0)
}

/// A running countdown for one client. Polls the clock on a fixed tick
/// and fires the callback exactly once on reaching zero; `cancel`
/// supports teardown before firing. A fresh timer is started every time
/// a match enters the countdown phase, including a resume from pause.
pub struct CountdownTimer {
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    pub fn start<F>(
        game_start_time_ms: i64,
        offset_ms: i64,
        tick: Duration,
        on_zero: F,
    ) -> CountdownTimer
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                let local_now = Utc::now().timestamp_millis();
                if remaining_ms(game_start_time_ms, offset_ms, local_now) == 0 {
                    on_zero();
                    return;
                }
            }
        });

        CountdownTimer { handle }
    }

    /// Stops the timer. A no-op if the callback has already fired.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_broadcast_schedules_start_after_countdown() {
        let broadcast = GameStartBroadcast::now(5);
        assert_eq!(broadcast.message_type, "GAME_START");
        assert_eq!(broadcast.countdown_duration, 5);
        assert_eq!(
            broadcast.game_start_time - broadcast.server_time,
            5000
        );
    }

    #[test]
    fn test_broadcast_wire_field_names() {
        let broadcast = GameStartBroadcast::now(5);
        let serialized = serde_json::to_string(&broadcast).unwrap();
        assert!(serialized.contains("\"type\":\"GAME_START\""));
        assert!(serialized.contains("\"serverTime\""));
        assert!(serialized.contains("\"gameStartTime\""));
        assert!(serialized.contains("\"countdownDuration\""));
    }

    #[test]
    fn test_clock_offset_and_remaining() {
        // Server is 2 s ahead of this client's clock.
        let offset = clock_offset(10_000, 8_000);
        assert_eq!(offset, 2_000);

        // Start at server time 15 000; at local 11 000 that is 2 s out.
        assert_eq!(remaining_ms(15_000, offset, 11_000), 2_000);
        assert_eq!(remaining_ms(15_000, offset, 13_000), 0);
    }

    #[test]
    fn test_remaining_never_negative() {
        assert_eq!(remaining_ms(1_000, 0, 50_000), 0);
    }

    #[test]
    fn test_skewed_clients_agree_on_remaining_time() {
        let broadcast = GameStartBroadcast::now(5);

        // Two clients whose clocks disagree by minutes.
        let fast_local = broadcast.server_time + 120_000;
        let slow_local = broadcast.server_time - 90_000;
        let fast_offset = clock_offset(broadcast.server_time, fast_local);
        let slow_offset = clock_offset(broadcast.server_time, slow_local);

        // One second of real time later on both walls.
        let fast_remaining = remaining_ms(broadcast.game_start_time, fast_offset, fast_local + 1000);
        let slow_remaining = remaining_ms(broadcast.game_start_time, slow_offset, slow_local + 1000);
        assert_eq!(fast_remaining, slow_remaining);
        assert_eq!(fast_remaining, 4000);
    }

    #[tokio::test]
    async fn test_timer_fires_exactly_once() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = fired.clone();

        let start = Utc::now().timestamp_millis() + 50;
        let timer = CountdownTimer::start(start, 0, Duration::from_millis(5), move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(timer.is_finished());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_timer_never_fires() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = fired.clone();

        let start = Utc::now().timestamp_millis() + 100;
        let timer = CountdownTimer::start(start, 0, Duration::from_millis(5), move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        timer.cancel();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timer_with_offset_fires_against_server_clock() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = fired.clone();

        // Start instant expressed on a server clock 10 s ahead of us.
        let offset = 10_000;
        let start = Utc::now().timestamp_millis() + offset + 50;
        let timer = CountdownTimer::start(start, offset, Duration::from_millis(5), move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(timer.is_finished());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}

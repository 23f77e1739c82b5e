use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::models::event_timing::EventType;
use crate::models::match_record::Match;
use crate::models::player::PlayerRating;
use crate::models::queue::QueueEntry;
use crate::repositories::match_repository::MatchRepository;
use crate::repositories::player_repository::PlayerRatingRepository;
use crate::repositories::queue_repository::QueueRepository;
use crate::services::errors::queue_service_errors::QueueServiceError;

/// Tunables for the expanding-radius search.
#[derive(Debug, Clone, Copy)]
pub struct MatchmakingConfig {
    pub base_range: i32,
    pub expansion_rate: i32,
    pub expansion_interval_secs: i64,
    pub max_range: i32,
    pub candidate_limit: usize,
    pub stale_after_secs: i64,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        MatchmakingConfig {
            base_range: 100,
            expansion_rate: 10,
            expansion_interval_secs: 5,
            max_range: 500,
            candidate_limit: 10,
            stale_after_secs: 300,
        }
    }
}

impl MatchmakingConfig {
    /// Rating window half-width after `wait_secs` in the queue.
    pub fn search_radius(&self, wait_secs: i64) -> i32 {
        let expansions = (wait_secs / self.expansion_interval_secs) as i32;
        (self.base_range + expansions * self.expansion_rate).min(self.max_range)
    }
}

/// Candidate preference: rating closeness dominates, but every second a
/// candidate has waited buys back two rating points, so far-from-median
/// players are not starved. Lower is better.
pub fn pairing_score(rating_diff: i32, candidate_wait_secs: i64) -> i64 {
    i64::from(rating_diff.abs()) - 2 * candidate_wait_secs
}

#[derive(Clone)]
pub struct QueueService {
    queue_repository: Arc<dyn QueueRepository>,
    match_repository: Arc<dyn MatchRepository>,
    player_repository: Arc<dyn PlayerRatingRepository>,
    config: MatchmakingConfig,
}

impl QueueService {
    pub fn new(
        queue_repository: Arc<dyn QueueRepository>,
        match_repository: Arc<dyn MatchRepository>,
        player_repository: Arc<dyn PlayerRatingRepository>,
    ) -> Self {
        QueueService {
            queue_repository,
            match_repository,
            player_repository,
            config: MatchmakingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MatchmakingConfig) -> Self {
        self.config = config;
        self
    }

    /// Enqueues the player with a rating snapshot. A player with an
    /// active entry for any event gets `AlreadyInQueue`, never a silent
    /// duplicate.
    pub async fn join_queue(
        &self,
        player: &PlayerRating,
        event_type: EventType,
    ) -> Result<QueueEntry, QueueServiceError> {
        let entry = QueueEntry::new(&player.player_id, player.rating, event_type);
        self.queue_repository.join_queue(&entry).await?;

        info!(
            "Player {} joined {} queue at rating {}",
            entry.player_id,
            event_type.as_str(),
            entry.rating
        );
        Ok(entry)
    }

    /// Idempotent: leaving while absent is a no-op.
    pub async fn leave_queue(&self, player_id: &str) -> Result<(), QueueServiceError> {
        self.queue_repository.leave_queue(player_id).await?;
        Ok(())
    }

    /// One search pass for the given entry. Zero candidates is a normal
    /// outcome; the caller polls again on its next tick. Re-invocation is
    /// safe: nothing is mutated until the pair claim succeeds, and the
    /// claim covers both entries, so two matchers racing over the same
    /// pair (A's pass finds B while B's pass finds A) resolve to exactly
    /// one match.
    pub async fn find_match(
        &self,
        entry: &QueueEntry,
    ) -> Result<Option<Match>, QueueServiceError> {
        let now = Utc::now();
        let radius = self.config.search_radius(entry.wait_secs(now));

        let candidates = self
            .queue_repository
            .find_candidates(
                entry.event_type,
                entry.rating - radius,
                entry.rating + radius,
                &entry.player_id,
                self.config.candidate_limit,
            )
            .await?;

        if candidates.is_empty() {
            debug!(
                "No candidates for {} within ±{} of {}",
                entry.player_id, radius, entry.rating
            );
            return Ok(None);
        }

        let mut ranked = candidates;
        ranked.sort_by_key(|candidate| {
            pairing_score(candidate.rating - entry.rating, candidate.wait_secs(now))
        });

        for candidate in &ranked {
            // Both queue entries go in one conditional transaction; a
            // lost race (either side already claimed) is not an error.
            if self.queue_repository.claim_pair(entry, candidate).await? {
                let match_record = self.create_match(entry, candidate).await?;
                return Ok(Some(match_record));
            }
        }

        Ok(None)
    }

    /// Creates the match record for a claimed pair with both players'
    /// current ratings snapshotted. Callers must have claimed both queue
    /// entries first; this only writes the match.
    pub async fn create_match(
        &self,
        player1: &QueueEntry,
        player2: &QueueEntry,
    ) -> Result<Match, QueueServiceError> {
        let rating1 = self
            .player_repository
            .get_player(&player1.player_id)
            .await?
            .rating;
        let rating2 = self
            .player_repository
            .get_player(&player2.player_id)
            .await?
            .rating;

        let match_record = Match::new(
            &player1.player_id,
            &player2.player_id,
            rating1,
            rating2,
            player1.event_type,
        );

        self.match_repository.create_match(&match_record).await?;

        info!(
            "Match {} formed: {} ({}) vs {} ({})",
            match_record.match_id, player1.player_id, rating1, player2.player_id, rating2
        );
        Ok(match_record)
    }

    /// Maintenance sweep dropping entries from players who queued and
    /// then abandoned the client without an explicit leave.
    pub async fn clean_stale_entries(&self) -> Result<usize, QueueServiceError> {
        let cutoff = Utc::now() - Duration::seconds(self.config.stale_after_secs);
        let removed = self.queue_repository.delete_older_than(cutoff).await?;
        if removed > 0 {
            info!("Purged {} stale queue entries", removed);
        }
        Ok(removed)
    }

    pub fn stale_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::seconds(self.config.stale_after_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::models::state_machine::MatchStatus;
    use crate::repositories::errors::match_repository_errors::MatchRepositoryError;
    use crate::repositories::errors::player_repository_errors::PlayerRepositoryError;
    use crate::repositories::errors::queue_repository_errors::QueueRepositoryError;

    #[derive(Default)]
    struct MockQueueRepository {
        entries: Mutex<Vec<QueueEntry>>,
        claims_succeed: bool,
        claim_attempts: Mutex<Vec<(String, String)>>,
    }

    impl MockQueueRepository {
        fn new() -> Self {
            MockQueueRepository {
                claims_succeed: true,
                ..Default::default()
            }
        }

        fn with_entries(self, entries: Vec<QueueEntry>) -> Self {
            *self.entries.lock().unwrap() = entries;
            self
        }

        fn failing_claims(mut self) -> Self {
            self.claims_succeed = false;
            self
        }
    }

    #[async_trait]
    impl QueueRepository for MockQueueRepository {
        async fn join_queue(&self, entry: &QueueEntry) -> Result<(), QueueRepositoryError> {
            let mut entries = self.entries.lock().unwrap();
            if entries.iter().any(|e| e.player_id == entry.player_id) {
                return Err(QueueRepositoryError::AlreadyExists);
            }
            entries.push(entry.clone());
            Ok(())
        }

        async fn leave_queue(&self, player_id: &str) -> Result<(), QueueRepositoryError> {
            self.entries
                .lock()
                .unwrap()
                .retain(|e| e.player_id != player_id);
            Ok(())
        }

        async fn get_entry(
            &self,
            player_id: &str,
        ) -> Result<Option<QueueEntry>, QueueRepositoryError> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.player_id == player_id)
                .cloned())
        }

        async fn find_candidates(
            &self,
            event_type: EventType,
            min_rating: i32,
            max_rating: i32,
            excluded_player_id: &str,
            limit: usize,
        ) -> Result<Vec<QueueEntry>, QueueRepositoryError> {
            let mut candidates: Vec<QueueEntry> = self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.event_type == event_type)
                .filter(|e| e.rating >= min_rating && e.rating <= max_rating)
                .filter(|e| e.player_id != excluded_player_id)
                .cloned()
                .collect();
            candidates.sort_by_key(|e| e.joined_at);
            candidates.truncate(limit);
            Ok(candidates)
        }

        // Mirrors the store's transactional semantics: both entries are
        // removed if and only if both are still present, under one lock.
        async fn claim_pair(
            &self,
            entry: &QueueEntry,
            candidate: &QueueEntry,
        ) -> Result<bool, QueueRepositoryError> {
            self.claim_attempts
                .lock()
                .unwrap()
                .push((entry.player_id.clone(), candidate.player_id.clone()));
            if !self.claims_succeed {
                return Ok(false);
            }

            let mut entries = self.entries.lock().unwrap();
            let both_present = entries.iter().any(|e| e.player_id == entry.player_id)
                && entries.iter().any(|e| e.player_id == candidate.player_id);
            if !both_present {
                return Ok(false);
            }
            entries
                .retain(|e| e.player_id != entry.player_id && e.player_id != candidate.player_id);
            Ok(true)
        }

        async fn delete_older_than(
            &self,
            cutoff: DateTime<Utc>,
        ) -> Result<usize, QueueRepositoryError> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|e| e.joined_at >= cutoff);
            Ok(before - entries.len())
        }
    }

    #[derive(Default)]
    struct MockMatchRepository {
        created: Mutex<Vec<Match>>,
    }

    #[async_trait]
    impl MatchRepository for MockMatchRepository {
        async fn create_match(&self, match_record: &Match) -> Result<(), MatchRepositoryError> {
            self.created.lock().unwrap().push(match_record.clone());
            Ok(())
        }

        async fn get_match(&self, match_id: &str) -> Result<Option<Match>, MatchRepositoryError> {
            Ok(self
                .created
                .lock()
                .unwrap()
                .iter()
                .find(|m| m.match_id == match_id)
                .cloned())
        }

        async fn update_match(&self, _match_record: &Match) -> Result<(), MatchRepositoryError> {
            Ok(())
        }
    }

    struct MockPlayerRepository;

    #[async_trait]
    impl PlayerRatingRepository for MockPlayerRepository {
        async fn get_player(
            &self,
            player_id: &str,
        ) -> Result<PlayerRating, PlayerRepositoryError> {
            let mut player = PlayerRating::new(player_id);
            // Rating encoded in the id for tests, e.g. "p1:1430".
            if let Some((_, rating)) = player_id.split_once(':') {
                player.rating = rating.parse().unwrap();
            }
            Ok(player)
        }

        async fn put_player(&self, _player: &PlayerRating) -> Result<(), PlayerRepositoryError> {
            Ok(())
        }
    }

    fn service(
        queue: MockQueueRepository,
    ) -> (QueueService, Arc<MockQueueRepository>, Arc<MockMatchRepository>) {
        let queue = Arc::new(queue);
        let matches = Arc::new(MockMatchRepository::default());
        let service =
            QueueService::new(queue.clone(), matches.clone(), Arc::new(MockPlayerRepository));
        (service, queue, matches)
    }

    fn entry_waiting(player_id: &str, rating: i32, wait_secs: i64) -> QueueEntry {
        let mut entry = QueueEntry::new(player_id, rating, EventType::Speed);
        entry.joined_at = Utc::now() - Duration::seconds(wait_secs);
        entry
    }

    #[test]
    fn test_search_radius_defaults() {
        let config = MatchmakingConfig::default();
        assert_eq!(config.search_radius(0), 100);
        assert_eq!(config.search_radius(4), 100);
        assert_eq!(config.search_radius(25), 150);
        assert_eq!(config.search_radius(10_000), 500);
    }

    #[test]
    fn test_pairing_score_discounts_waiting() {
        // 50 points closer beats a fresh candidate...
        assert!(pairing_score(50, 0) < pairing_score(100, 0));
        // ...but 30 seconds of waiting beats 50 points of closeness.
        assert!(pairing_score(100, 30) < pairing_score(50, 0));
    }

    #[tokio::test]
    async fn test_join_queue_snapshots_rating() {
        let (service, queue, _) = service(MockQueueRepository::new());

        let mut player = PlayerRating::new("p1");
        player.rating = 1432;
        let entry = service.join_queue(&player, EventType::Speed).await.unwrap();

        assert_eq!(entry.rating, 1432);
        assert!(queue.get_entry("p1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_join_rejected() {
        let (service, _, _) = service(MockQueueRepository::new());

        let player = PlayerRating::new("p1");
        service.join_queue(&player, EventType::Speed).await.unwrap();
        let err = service
            .join_queue(&player, EventType::Speed)
            .await
            .unwrap_err();

        assert!(matches!(err, QueueServiceError::AlreadyInQueue));
    }

    #[tokio::test]
    async fn test_join_rejected_across_events() {
        let (service, _, _) = service(MockQueueRepository::new());

        // One active entry per player globally, not per event queue.
        let player = PlayerRating::new("p1");
        service.join_queue(&player, EventType::Speed).await.unwrap();
        let err = service
            .join_queue(&player, EventType::Hour)
            .await
            .unwrap_err();

        assert!(matches!(err, QueueServiceError::AlreadyInQueue));
    }

    #[tokio::test]
    async fn test_leave_queue_is_idempotent() {
        let (service, _, _) = service(MockQueueRepository::new());
        // Never joined; both calls succeed.
        service.leave_queue("ghost").await.unwrap();
        service.leave_queue("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn test_find_match_no_candidates() {
        let (service, _, matches) = service(MockQueueRepository::new());

        let result = service
            .find_match(&entry_waiting("p1:1500", 1500, 0))
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(matches.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_match_prefers_closest_rating() {
        let far = entry_waiting("far:1590", 1590, 0);
        let near = entry_waiting("near:1510", 1510, 0);
        let me = entry_waiting("me:1500", 1500, 0);
        let queue = MockQueueRepository::new()
            .with_entries(vec![far, near, me.clone()]);
        let (service, _, _) = service(queue);

        let result = service.find_match(&me).await.unwrap().unwrap();

        assert_eq!(result.player1_id, "me:1500");
        assert_eq!(result.player2_id, "near:1510");
        assert_eq!(result.status, MatchStatus::WaitingForPlayers);
    }

    #[tokio::test]
    async fn test_find_match_wait_discount_overcomes_rating_gap() {
        // 90 points closer, but the far candidate has waited 60 s:
        // |10| - 0 = 10 vs |100| - 120 = -20.
        let me = entry_waiting("me:1500", 1500, 0);
        let queue = MockQueueRepository::new().with_entries(vec![
            entry_waiting("near:1510", 1510, 0),
            entry_waiting("patient:1600", 1600, 60),
            me.clone(),
        ]);
        let (service, _, _) = service(queue);

        let result = service.find_match(&me).await.unwrap().unwrap();

        assert_eq!(result.player2_id, "patient:1600");
    }

    #[tokio::test]
    async fn test_find_match_radius_expands_with_wait() {
        // 1650 is outside the fresh ±100 window but inside ±150 at 25 s.
        let fresh_me = entry_waiting("me:1500", 1500, 0);
        let waited_me = entry_waiting("me:1500", 1500, 25);
        let queue = MockQueueRepository::new().with_entries(vec![
            entry_waiting("high:1650", 1650, 10),
            fresh_me.clone(),
        ]);
        let (service, _, _) = service(queue);

        let fresh = service.find_match(&fresh_me).await.unwrap();
        assert!(fresh.is_none());

        let waited = service.find_match(&waited_me).await.unwrap();
        assert!(waited.is_some());
    }

    #[tokio::test]
    async fn test_find_match_excludes_self() {
        let me = entry_waiting("me:1500", 1500, 0);
        let queue = MockQueueRepository::new().with_entries(vec![me.clone()]);
        let (service, _, _) = service(queue);

        assert!(service.find_match(&me).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lost_claim_race_means_no_match() {
        let me = entry_waiting("me:1500", 1500, 0);
        let queue = MockQueueRepository::new()
            .with_entries(vec![entry_waiting("opp:1500", 1500, 5), me.clone()])
            .failing_claims();
        let (service, queue, matches) = service(queue);

        let result = service.find_match(&me).await.unwrap();

        // The claim was attempted, but a racing matcher won; no match is
        // formed and the caller keeps searching.
        assert!(result.is_none());
        assert_eq!(queue.claim_attempts.lock().unwrap().len(), 1);
        assert!(matches.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_match_claims_both_entries() {
        let me = entry_waiting("me:1520", 1500, 0);
        let opp = entry_waiting("opp:1480", 1500, 0);
        let queue = MockQueueRepository::new().with_entries(vec![me.clone(), opp]);
        let (service, queue, matches) = service(queue);

        let match_record = service.find_match(&me).await.unwrap().unwrap();

        // Current ratings snapshotted, both queue entries gone.
        assert_eq!(match_record.player1_rating_before, 1520);
        assert_eq!(match_record.player2_rating_before, 1480);
        assert_eq!(matches.created.lock().unwrap().len(), 1);
        assert!(queue.get_entry("me:1520").await.unwrap().is_none());
        assert!(queue.get_entry("opp:1480").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_matchers_form_one_match() {
        // Both players' stream invocations search at the same time and
        // each finds the other. The pair claim is atomic over both
        // entries, so exactly one matcher wins.
        let alice = entry_waiting("alice:1500", 1500, 0);
        let bob = entry_waiting("bob:1500", 1500, 0);
        let queue = MockQueueRepository::new().with_entries(vec![alice.clone(), bob.clone()]);
        let (service, queue, matches) = service(queue);

        let (from_alice, from_bob) =
            tokio::join!(service.find_match(&alice), service.find_match(&bob));

        let formed = [from_alice.unwrap(), from_bob.unwrap()]
            .into_iter()
            .flatten()
            .count();
        assert_eq!(formed, 1);
        assert_eq!(matches.created.lock().unwrap().len(), 1);
        assert!(queue.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clean_stale_entries() {
        let queue = MockQueueRepository::new().with_entries(vec![
            entry_waiting("fresh", 1500, 10),
            entry_waiting("stale", 1500, 400),
            entry_waiting("ancient", 1500, 4000),
        ]);
        let (service, queue, _) = service(queue);

        let removed = service.clean_stale_entries().await.unwrap();
        assert_eq!(removed, 2);
        assert!(queue.get_entry("fresh").await.unwrap().is_some());
    }
}

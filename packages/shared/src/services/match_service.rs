use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::models::match_history::{HistoryResult, MatchHistoryEntry};
use crate::models::match_record::{Match, MatchResult, DIGITS_PER_ROW};
use crate::models::state_machine::{DisconnectPolicy, MatchStateMachine, MatchStatus};
use crate::repositories::history_repository::MatchHistoryRepository;
use crate::repositories::match_repository::MatchRepository;
use crate::repositories::player_repository::PlayerRatingRepository;
use crate::services::countdown_service::GameStartBroadcast;
use crate::services::errors::match_service_errors::MatchServiceError;
use crate::services::rating_service;
use crate::services::scoring_service::{score_grids, ScoringResult, ScoringVariant};

/// Drives a match through its phases and settles it: scoring, rating
/// updates, and the immutable history rows, all written at the single
/// transition into `Completed`.
#[derive(Clone)]
pub struct MatchService {
    match_repository: Arc<dyn MatchRepository>,
    player_repository: Arc<dyn PlayerRatingRepository>,
    history_repository: Arc<dyn MatchHistoryRepository>,
}

impl MatchService {
    pub fn new(
        match_repository: Arc<dyn MatchRepository>,
        player_repository: Arc<dyn PlayerRatingRepository>,
        history_repository: Arc<dyn MatchHistoryRepository>,
    ) -> Self {
        MatchService {
            match_repository,
            player_repository,
            history_repository,
        }
    }

    pub async fn get_match(&self, match_id: &str) -> Result<Match, MatchServiceError> {
        self.match_repository
            .get_match(match_id)
            .await?
            .ok_or(MatchServiceError::MatchNotFound)
    }

    /// Arms the countdown: computes the authoritative start instant once,
    /// server-side, and stores it on the match for broadcast to both
    /// clients.
    pub async fn start_countdown(
        &self,
        match_id: &str,
    ) -> Result<(Match, GameStartBroadcast), MatchServiceError> {
        let mut match_record = self.get_match(match_id).await?;
        Self::advance(&mut match_record, MatchStatus::Countdown)?;

        let broadcast = GameStartBroadcast::now(match_record.game_data.countdown_secs);
        match_record.game_data.game_start_time = Some(broadcast.game_start_time);
        match_record.started_at = Some(Utc::now());

        self.match_repository.update_match(&match_record).await?;
        Ok((match_record, broadcast))
    }

    pub async fn begin_memorization(&self, match_id: &str) -> Result<Match, MatchServiceError> {
        let mut match_record = self.get_match(match_id).await?;
        Self::advance(&mut match_record, MatchStatus::Memorization)?;
        match_record.memorization_started_at = Some(Utc::now());
        self.match_repository.update_match(&match_record).await?;
        Ok(match_record)
    }

    pub async fn begin_recall(&self, match_id: &str) -> Result<Match, MatchServiceError> {
        let mut match_record = self.get_match(match_id).await?;
        Self::advance(&mut match_record, MatchStatus::Recall)?;
        match_record.recall_started_at = Some(Utc::now());
        self.match_repository.update_match(&match_record).await?;
        Ok(match_record)
    }

    pub async fn pause(&self, match_id: &str) -> Result<Match, MatchServiceError> {
        let mut match_record = self.get_match(match_id).await?;
        Self::advance(&mut match_record, MatchStatus::Paused)?;
        self.match_repository.update_match(&match_record).await?;
        Ok(match_record)
    }

    /// Resumes into the phase the pause interrupted. Re-entering
    /// `Countdown` restarts a fresh countdown for both clients.
    pub async fn resume(
        &self,
        match_id: &str,
        target: MatchStatus,
    ) -> Result<Match, MatchServiceError> {
        let mut match_record = self.get_match(match_id).await?;
        Self::advance(&mut match_record, target)?;
        self.match_repository.update_match(&match_record).await?;
        Ok(match_record)
    }

    pub async fn cancel(&self, match_id: &str) -> Result<Match, MatchServiceError> {
        let mut match_record = self.get_match(match_id).await?;
        Self::advance(&mut match_record, MatchStatus::Cancelled)?;
        self.match_repository.update_match(&match_record).await?;
        Ok(match_record)
    }

    /// The decision table the orchestrator consults when a player's
    /// connection drops mid-match.
    pub fn disconnect_policy(&self, match_record: &Match) -> DisconnectPolicy {
        match_record.status.disconnect_policy()
    }

    /// Resolves a dropped connection to the action the orchestrator
    /// applies after the grace period: pause the clock, forfeit the
    /// player, keep waiting, or nothing in a terminal phase.
    pub async fn handle_disconnect(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<DisconnectPolicy, MatchServiceError> {
        let match_record = self.get_match(match_id).await?;
        if !match_record.has_player(player_id) {
            return Err(MatchServiceError::NotAParticipant(player_id.to_string()));
        }

        let policy = self.disconnect_policy(&match_record);
        info!(
            "Player {} disconnected from match {} in {:?}: {:?} after {} ms",
            player_id, match_id, match_record.status, policy.action, policy.grace_period_ms
        );
        Ok(policy)
    }

    /// Scores a player's recalled grid against the match's digits and
    /// stores it; once both players are in, the match settles.
    pub async fn submit_answers(
        &self,
        match_id: &str,
        player_id: &str,
        recalled: &[Vec<Vec<String>>],
    ) -> Result<(Match, ScoringResult), MatchServiceError> {
        let mut match_record = self.get_match(match_id).await?;

        if !match_record.has_player(player_id) {
            return Err(MatchServiceError::NotAParticipant(player_id.to_string()));
        }
        if match_record.status != MatchStatus::Recall {
            return Err(MatchServiceError::ValidationError(format!(
                "Answers can only be submitted during recall, match is {:?}",
                match_record.status
            )));
        }

        let result = score_grids(
            recalled,
            &match_record.game_data.digits,
            DIGITS_PER_ROW,
            ScoringVariant::Wmc,
        );

        if match_record.player1_id == player_id {
            match_record.player1_score = Some(result.total_score);
        } else {
            match_record.player2_score = Some(result.total_score);
        }

        info!(
            "Player {} scored {} in match {}",
            player_id, result.total_score, match_id
        );

        if match_record.player1_score.is_some() && match_record.player2_score.is_some() {
            // Settlement persists the completed record itself.
            self.settle(&mut match_record).await?;
        } else {
            self.match_repository.update_match(&match_record).await?;
        }

        Ok((match_record, result))
    }

    /// Forfeit by the named player, e.g. a recall-phase disconnection
    /// outlasting its grace period. Whatever they submitted stands;
    /// nothing submitted counts as zero.
    pub async fn forfeit(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<Match, MatchServiceError> {
        let mut match_record = self.get_match(match_id).await?;

        if !match_record.has_player(player_id) {
            return Err(MatchServiceError::NotAParticipant(player_id.to_string()));
        }

        let result = if match_record.player1_id == player_id {
            MatchResult::Player2
        } else {
            MatchResult::Player1
        };

        match_record.player1_score = Some(match_record.player1_score.unwrap_or(0));
        match_record.player2_score = Some(match_record.player2_score.unwrap_or(0));
        self.settle_with_result(&mut match_record, result).await?;
        Ok(match_record)
    }

    fn advance(match_record: &mut Match, target: MatchStatus) -> Result<(), MatchServiceError> {
        let mut machine = MatchStateMachine::resume(
            match_record.status,
            std::mem::take(&mut match_record.state_history),
        );
        let outcome = machine.transition(target);
        match_record.status = machine.status();
        match_record.state_history = machine.into_history();
        outcome?;
        Ok(())
    }

    async fn settle(&self, match_record: &mut Match) -> Result<(), MatchServiceError> {
        let score1 = match_record.player1_score.unwrap_or(0);
        let score2 = match_record.player2_score.unwrap_or(0);
        let result = if score1 > score2 {
            MatchResult::Player1
        } else if score2 > score1 {
            MatchResult::Player2
        } else {
            MatchResult::Draw
        };
        self.settle_with_result(match_record, result).await
    }

    /// The one place rating fields are written, and the one place that
    /// persists a settled match. The completed record lands before any
    /// player or history row, and a second settlement attempt is
    /// rejected by the transition guard, so these fields can never be
    /// overwritten or applied twice.
    async fn settle_with_result(
        &self,
        match_record: &mut Match,
        result: MatchResult,
    ) -> Result<(), MatchServiceError> {
        Self::advance(match_record, MatchStatus::Completed)?;
        match_record.completed_at = Some(Utc::now());
        match_record.result = Some(result);
        match_record.winner_id = match result {
            MatchResult::Player1 => Some(match_record.player1_id.clone()),
            MatchResult::Player2 => Some(match_record.player2_id.clone()),
            MatchResult::Draw => None,
        };

        let mut player1 = self
            .player_repository
            .get_player(&match_record.player1_id)
            .await?;
        let mut player2 = self
            .player_repository
            .get_player(&match_record.player2_id)
            .await?;

        let (update1, update2) = rating_service::update_player_ratings(&player1, &player2, result);

        match_record.player1_rating_after = Some(update1.new_rating);
        match_record.player2_rating_after = Some(update2.new_rating);
        match_record.player1_rating_change = Some(update1.rating_change);
        match_record.player2_rating_change = Some(update2.rating_change);

        // Commit the completed match first. Once it is stored as
        // `Completed` a retried submission bounces off the phase guard,
        // so a failure in the player or history writes below cannot lead
        // to ratings being applied twice.
        self.match_repository.update_match(match_record).await?;

        player1.apply_result(update1.new_rating);
        player2.apply_result(update2.new_rating);
        self.player_repository.put_player(&player1).await?;
        self.player_repository.put_player(&player2).await?;

        let played_at = match_record.completed_at.unwrap_or_else(Utc::now);
        let (result1, result2) = match result {
            MatchResult::Player1 => (HistoryResult::Win, HistoryResult::Loss),
            MatchResult::Player2 => (HistoryResult::Loss, HistoryResult::Win),
            MatchResult::Draw => (HistoryResult::Draw, HistoryResult::Draw),
        };

        self.history_repository
            .record(&MatchHistoryEntry {
                player_id: match_record.player1_id.clone(),
                match_id: match_record.match_id.clone(),
                score: match_record.player1_score.unwrap_or(0),
                rating_before: match_record.player1_rating_before,
                rating_after: update1.new_rating,
                rating_change: update1.rating_change,
                result: result1,
                opponent_id: match_record.player2_id.clone(),
                opponent_rating: match_record.player2_rating_before,
                played_at,
            })
            .await?;
        self.history_repository
            .record(&MatchHistoryEntry {
                player_id: match_record.player2_id.clone(),
                match_id: match_record.match_id.clone(),
                score: match_record.player2_score.unwrap_or(0),
                rating_before: match_record.player2_rating_before,
                rating_after: update2.new_rating,
                rating_change: update2.rating_change,
                result: result2,
                opponent_id: match_record.player1_id.clone(),
                opponent_rating: match_record.player1_rating_before,
                played_at,
            })
            .await?;

        info!(
            "Match {} settled: {:?}, ratings {} -> {} / {} -> {}",
            match_record.match_id,
            result,
            match_record.player1_rating_before,
            update1.new_rating,
            match_record.player2_rating_before,
            update2.new_rating
        );
        Ok(())
    }
}

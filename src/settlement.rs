//! Bet settlement engine
//!
//! Given a final score, computes the canonical market outcomes, resolves all
//! pending bets on the match and credits payouts. Settlement is monotonic
//! per bet (pending -> won | lost, exactly once) and best-effort per batch:
//! a bet that cannot be processed is skipped and stays pending instead of
//! aborting the run.

use crate::error::{AppError, Result};
use crate::markets::{Market, MarketOutcomes, Selection};
use crate::store::GameStore;
use crate::types::{Bet, BetStatus, GameData, MatchStatus, Score, User};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Administrative settlement verdict for a single bet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetResult {
    Won,
    Lost,
}

impl BetResult {
    /// Parse a client-supplied result string, case-insensitively
    pub fn parse(raw: &str) -> Option<BetResult> {
        match raw.to_lowercase().as_str() {
            "won" => Some(BetResult::Won),
            "lost" => Some(BetResult::Lost),
            _ => None,
        }
    }
}

/// Outcome report of one match settlement run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSettlement {
    pub match_id: String,
    pub score: Score,
    /// Number of bets moved out of pending
    pub settled: u64,
    pub won: u64,
    pub outcomes: MarketOutcomes,
}

/// Coerce a client-supplied goal count. Floats are floored, negatives and
/// anything unparseable collapse to 0.
pub fn coerce_goals(value: &serde_json::Value) -> u32 {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if !n.is_finite() || n <= 0.0 {
        0
    } else {
        n.floor() as u32
    }
}

/// Payout for a winning bet: the precomputed potential win when present,
/// otherwise round(stake * odds) with non-positive or non-finite odds
/// treated as 1.
fn payout_for(bet: &Bet) -> u64 {
    if bet.potential_win > 0 {
        return bet.potential_win;
    }
    let odds = if bet.odds.is_finite() && bet.odds > 0.0 {
        bet.odds
    } else {
        1.0
    };
    (bet.stake as f64 * odds).round() as u64
}

/// Credit a payout: coins and totalWinnings grow (saturating, never below
/// zero), biggestWin ratchets up.
fn credit_win(user: &mut User, payout: u64) {
    user.coins = user.coins.saturating_add(payout);
    user.stats.total_winnings = user.stats.total_winnings.saturating_add(payout);
    user.stats.biggest_win = user.stats.biggest_win.max(payout);
}

/// The settlement engine operates on the injected store; it owns no state
/// of its own.
pub struct SettlementEngine {
    store: Arc<GameStore>,
}

impl SettlementEngine {
    pub fn new(store: Arc<GameStore>) -> Self {
        Self { store }
    }

    /// Settle every pending bet on a match against its final score.
    ///
    /// Marks the match finished, computes the canonical outcomes and walks
    /// all users' pending bets for the match. Bets on unrecognized markets
    /// stay pending and are absent from the settled count, as are bets
    /// whose owner record is missing.
    pub async fn settle_match(
        &self,
        match_id: &str,
        home_goals: u32,
        away_goals: u32,
    ) -> Result<MatchSettlement> {
        let mut data = self.store.write().await;

        let m = data
            .match_by_id_mut(match_id)
            .ok_or_else(|| AppError::NotFound(format!("Match {}", match_id)))?;
        m.status = MatchStatus::Finished;
        let score = Score {
            home: home_goals,
            away: away_goals,
        };
        m.score = Some(score);

        let outcomes = MarketOutcomes::compute(home_goals, away_goals);
        let mut settled: u64 = 0;
        let mut won: u64 = 0;

        let GameData { users, bets, .. } = &mut *data;
        for (user_id, list) in bets.iter_mut() {
            for bet in list.iter_mut() {
                if bet.status != BetStatus::Pending || bet.match_id != match_id {
                    continue;
                }

                let market = Market::normalize(&bet.market);
                let selection = Selection::normalize(&bet.selection, &market);
                let is_winner = match outcomes.is_winner(&market, &selection) {
                    Some(w) => w,
                    None => {
                        debug!(bet_id = %bet.id, market = %market, "unknown market, bet stays pending");
                        continue;
                    }
                };

                let user = match users.get_mut(user_id.as_str()) {
                    Some(user) => user,
                    None => {
                        warn!(bet_id = %bet.id, user_id = %user_id, "bet owner missing, bet stays pending");
                        continue;
                    }
                };

                if is_winner {
                    bet.status = BetStatus::Won;
                    let payout = payout_for(bet);
                    credit_win(user, payout);
                    won += 1;
                    debug!(bet_id = %bet.id, payout, "bet won");
                } else {
                    bet.status = BetStatus::Lost;
                }
                settled += 1;
            }
        }

        self.store.persist(&mut data).await;
        info!(match_id, settled, won, "match settled");

        Ok(MatchSettlement {
            match_id: match_id.to_string(),
            score,
            settled,
            won,
            outcomes,
        })
    }

    /// Administrative override: settle one bet to the caller's verdict,
    /// bypassing outcome computation. Rejects bets that are no longer
    /// pending.
    pub async fn settle_bet(&self, bet_id: &str, result: BetResult) -> Result<(Bet, User)> {
        let mut data = self.store.write().await;
        let GameData { users, bets, .. } = &mut *data;

        let mut found: Option<(&String, &mut Bet)> = None;
        for (user_id, list) in bets.iter_mut() {
            if let Some(bet) = list.iter_mut().find(|b| b.id == bet_id) {
                found = Some((user_id, bet));
                break;
            }
        }
        let (user_id, bet) =
            found.ok_or_else(|| AppError::NotFound(format!("Bet {}", bet_id)))?;

        if bet.status != BetStatus::Pending {
            return Err(AppError::AlreadySettled {
                bet_id: bet_id.to_string(),
            });
        }

        let user = users
            .get_mut(user_id.as_str())
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;

        match result {
            BetResult::Won => {
                bet.status = BetStatus::Won;
                let payout = payout_for(bet);
                credit_win(user, payout);
                info!(bet_id, payout, "bet settled as won");
            }
            BetResult::Lost => {
                bet.status = BetStatus::Lost;
                info!(bet_id, "bet settled as lost");
            }
        }

        let settled = (bet.clone(), user.clone());
        self.store.persist(&mut data).await;
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPersistence;
    use crate::types::{generate_id, now_rfc3339, UserStats};
    use serde_json::json;

    fn test_user(id: &str, coins: u64) -> User {
        User {
            id: id.to_string(),
            username: id.to_string(),
            coins,
            joined_at: now_rfc3339(),
            stats: UserStats::default(),
        }
    }

    fn test_match(id: &str) -> crate::types::Match {
        crate::types::Match {
            id: id.to_string(),
            home_team: "Home FC".to_string(),
            away_team: "Away FC".to_string(),
            league: "Test League".to_string(),
            date: "2024-08-10".to_string(),
            time: "15:30".to_string(),
            status: MatchStatus::Upcoming,
            score: None,
            markets: Default::default(),
        }
    }

    fn test_bet(user_id: &str, match_id: &str, market: &str, selection: &str) -> Bet {
        Bet {
            id: generate_id("bet_"),
            user_id: user_id.to_string(),
            match_id: match_id.to_string(),
            market: market.to_string(),
            selection: selection.to_string(),
            odds: 2.0,
            stake: 100,
            potential_win: 200,
            placed_at: now_rfc3339(),
            status: BetStatus::Pending,
            league_ids: vec![],
        }
    }

    async fn engine_with(
        users: Vec<User>,
        matches: Vec<crate::types::Match>,
        bets: Vec<Bet>,
    ) -> SettlementEngine {
        let store = GameStore::open(Box::new(InMemoryPersistence::new())).await;
        {
            let mut data = store.write().await;
            for user in users {
                data.users.insert(user.id.clone(), user);
            }
            data.matches = matches;
            for bet in bets {
                data.bets.entry(bet.user_id.clone()).or_default().push(bet);
            }
        }
        SettlementEngine::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_settle_match_pays_winning_1x2_bet() {
        let engine = engine_with(
            vec![test_user("user_1", 900)],
            vec![test_match("match_1")],
            vec![test_bet("user_1", "match_1", "1x2", "1")],
        )
        .await;

        let report = engine.settle_match("match_1", 3, 1).await.unwrap();
        assert_eq!(report.settled, 1);
        assert_eq!(report.won, 1);
        assert_eq!(report.outcomes.match_result, Selection::Home);
        assert_eq!(report.outcomes.total_goals, Selection::Over);
        assert_eq!(report.outcomes.btts, Selection::Yes);

        let data = engine.store.read().await;
        let user = &data.users["user_1"];
        assert_eq!(user.coins, 1100); // 900 + 200 payout
        assert_eq!(user.stats.total_winnings, 200);
        assert_eq!(user.stats.biggest_win, 200);
        assert_eq!(data.bets["user_1"][0].status, BetStatus::Won);

        let m = &data.matches[0];
        assert_eq!(m.status, MatchStatus::Finished);
        assert_eq!(m.score, Some(Score { home: 3, away: 1 }));
    }

    #[tokio::test]
    async fn test_settle_match_losing_bet_pays_nothing() {
        let engine = engine_with(
            vec![test_user("user_1", 900)],
            vec![test_match("match_1")],
            vec![test_bet("user_1", "match_1", "1x2", "2")],
        )
        .await;

        let report = engine.settle_match("match_1", 3, 1).await.unwrap();
        assert_eq!(report.settled, 1);
        assert_eq!(report.won, 0);

        let data = engine.store.read().await;
        assert_eq!(data.users["user_1"].coins, 900);
        assert_eq!(data.bets["user_1"][0].status, BetStatus::Lost);
    }

    #[tokio::test]
    async fn test_unknown_market_stays_pending() {
        let engine = engine_with(
            vec![test_user("user_1", 900)],
            vec![test_match("match_1")],
            vec![
                test_bet("user_1", "match_1", "unknown_market", "weird"),
                test_bet("user_1", "match_1", "btts", "yes"),
            ],
        )
        .await;

        let report = engine.settle_match("match_1", 2, 1).await.unwrap();
        assert_eq!(report.settled, 1);

        let data = engine.store.read().await;
        let bets = &data.bets["user_1"];
        assert_eq!(bets[0].status, BetStatus::Pending);
        assert_eq!(bets[1].status, BetStatus::Won);
    }

    #[tokio::test]
    async fn test_second_settlement_does_not_resettle_or_repay() {
        let engine = engine_with(
            vec![test_user("user_1", 0)],
            vec![test_match("match_1")],
            vec![test_bet("user_1", "match_1", "1x2", "1")],
        )
        .await;

        let first = engine.settle_match("match_1", 2, 0).await.unwrap();
        assert_eq!(first.settled, 1);

        // Second run with a different score touches no already-settled bet
        let second = engine.settle_match("match_1", 0, 2).await.unwrap();
        assert_eq!(second.settled, 0);
        assert_eq!(second.won, 0);

        let data = engine.store.read().await;
        assert_eq!(data.bets["user_1"][0].status, BetStatus::Won);
        assert_eq!(data.users["user_1"].coins, 200); // paid exactly once
        assert_eq!(data.matches[0].score, Some(Score { home: 0, away: 2 }));
    }

    #[tokio::test]
    async fn test_late_straggler_settles_on_second_run() {
        let engine = engine_with(
            vec![test_user("user_1", 0)],
            vec![test_match("match_1")],
            vec![test_bet("user_1", "match_1", "1x2", "1")],
        )
        .await;

        engine.settle_match("match_1", 2, 0).await.unwrap();

        // A bet placed after the first settlement run
        {
            let mut data = engine.store.write().await;
            let straggler = test_bet("user_1", "match_1", "over_under", "over");
            data.bets.get_mut("user_1").unwrap().push(straggler);
        }

        let report = engine.settle_match("match_1", 2, 0).await.unwrap();
        assert_eq!(report.settled, 1);

        let data = engine.store.read().await;
        assert_eq!(data.bets["user_1"][1].status, BetStatus::Lost); // 2 goals < 2.5
    }

    #[tokio::test]
    async fn test_settle_match_not_found() {
        let engine = engine_with(vec![], vec![], vec![]).await;
        let err = engine.settle_match("match_x", 1, 0).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bet_with_missing_owner_stays_pending() {
        // One winning and one losing bet from a user with no record;
        // neither may be settled
        let engine = engine_with(
            vec![],
            vec![test_match("match_1")],
            vec![
                test_bet("ghost_user", "match_1", "1x2", "1"),
                test_bet("ghost_user", "match_1", "1x2", "2"),
            ],
        )
        .await;

        let report = engine.settle_match("match_1", 1, 0).await.unwrap();
        assert_eq!(report.settled, 0);

        let data = engine.store.read().await;
        assert_eq!(data.bets["ghost_user"][0].status, BetStatus::Pending);
        assert_eq!(data.bets["ghost_user"][1].status, BetStatus::Pending);
    }

    #[tokio::test]
    async fn test_settle_match_with_astronomical_score() {
        let engine = engine_with(
            vec![test_user("user_1", 0)],
            vec![test_match("match_1")],
            vec![test_bet("user_1", "match_1", "over_under", "over")],
        )
        .await;

        let report = engine.settle_match("match_1", u32::MAX, u32::MAX).await.unwrap();
        assert_eq!(report.outcomes.total_goals, Selection::Over);
        assert_eq!(report.settled, 1);
        assert_eq!(report.won, 1);
    }

    #[tokio::test]
    async fn test_settle_bet_twice_is_rejected() {
        let bet = test_bet("user_1", "match_1", "1x2", "1");
        let bet_id = bet.id.clone();
        let engine = engine_with(
            vec![test_user("user_1", 100)],
            vec![test_match("match_1")],
            vec![bet],
        )
        .await;

        let (settled, user) = engine.settle_bet(&bet_id, BetResult::Won).await.unwrap();
        assert_eq!(settled.status, BetStatus::Won);
        assert_eq!(user.coins, 300);

        let err = engine.settle_bet(&bet_id, BetResult::Won).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadySettled { .. }));

        // No double pay
        let data = engine.store.read().await;
        assert_eq!(data.users["user_1"].coins, 300);
    }

    #[tokio::test]
    async fn test_settle_bet_lost_credits_nothing() {
        let bet = test_bet("user_1", "match_1", "btts", "yes");
        let bet_id = bet.id.clone();
        let engine = engine_with(
            vec![test_user("user_1", 100)],
            vec![test_match("match_1")],
            vec![bet],
        )
        .await;

        let (settled, user) = engine.settle_bet(&bet_id, BetResult::Lost).await.unwrap();
        assert_eq!(settled.status, BetStatus::Lost);
        assert_eq!(user.coins, 100);
        assert_eq!(user.stats.total_winnings, 0);
    }

    #[tokio::test]
    async fn test_settle_bet_not_found() {
        let engine = engine_with(vec![], vec![], vec![]).await;
        let err = engine.settle_bet("bet_x", BetResult::Won).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_bet_result_parsing() {
        assert_eq!(BetResult::parse("won"), Some(BetResult::Won));
        assert_eq!(BetResult::parse("LOST"), Some(BetResult::Lost));
        assert_eq!(BetResult::parse("void"), None);
        assert_eq!(BetResult::parse(""), None);
    }

    #[test]
    fn test_goal_coercion() {
        assert_eq!(coerce_goals(&json!(3)), 3);
        assert_eq!(coerce_goals(&json!(2.9)), 2);
        assert_eq!(coerce_goals(&json!(-1)), 0);
        assert_eq!(coerce_goals(&json!("4")), 4);
        assert_eq!(coerce_goals(&json!("4.5")), 4);
        assert_eq!(coerce_goals(&json!("not a number")), 0);
        assert_eq!(coerce_goals(&json!(null)), 0);
        assert_eq!(coerce_goals(&json!({"home": 1})), 0);
    }

    #[test]
    fn test_payout_fallback_paths() {
        let mut bet = Bet {
            id: "bet_1".to_string(),
            user_id: "user_1".to_string(),
            match_id: "match_1".to_string(),
            market: "1x2".to_string(),
            selection: "1".to_string(),
            odds: 2.5,
            stake: 100,
            potential_win: 250,
            placed_at: now_rfc3339(),
            status: BetStatus::Pending,
            league_ids: vec![],
        };
        assert_eq!(payout_for(&bet), 250);

        // Missing potential win falls back to stake * odds
        bet.potential_win = 0;
        assert_eq!(payout_for(&bet), 250);

        // Non-positive odds are treated as 1
        bet.odds = 0.0;
        assert_eq!(payout_for(&bet), 100);

        bet.odds = f64::NAN;
        assert_eq!(payout_for(&bet), 100);
    }

    #[test]
    fn test_credit_win_ratchets_biggest_win() {
        let mut user = test_user("user_1", 10);
        credit_win(&mut user, 300);
        credit_win(&mut user, 50);
        assert_eq!(user.coins, 360);
        assert_eq!(user.stats.total_winnings, 350);
        assert_eq!(user.stats.biggest_win, 300);
    }
}

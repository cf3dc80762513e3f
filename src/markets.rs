//! Canonical odds-market vocabulary and outcome computation
//!
//! Clients (and historical data files) spell markets and selections in a
//! handful of legacy ways. Everything is folded onto four canonical markets
//! before a bet is compared against a final score. Normalization is total:
//! unrecognized input is carried through as [`Market::Unknown`] /
//! [`Selection::Unknown`] instead of being rejected, so bets on markets this
//! engine does not understand simply stay pending.

use serde::{Serialize, Serializer};
use std::fmt;

/// The four canonical markets, plus a pass-through for anything else
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Market {
    /// 1X2 match winner
    MatchResult,
    /// Two of the three 1X2 outcomes covered by one bet
    DoubleChance,
    /// Over/under on the fixed 2.5 goal line
    TotalGoals,
    /// Both teams to score
    Btts,
    /// Unrecognized market code, lower-cased verbatim
    Unknown(String),
}

impl Market {
    /// Fold a raw market code onto its canonical market.
    ///
    /// Case-insensitive exact match against the known alias sets; anything
    /// else passes through lower-cased.
    pub fn normalize(raw: &str) -> Market {
        let m = raw.to_lowercase();
        match m.as_str() {
            "match_result" | "1x2" | "match-winner" | "matchwinner" => Market::MatchResult,
            "double_chance" | "doublechance" | "dc" => Market::DoubleChance,
            "total_goals" | "over_under" | "overunder" | "over_under_2_5" | "over2_5"
            | "under2_5" | "ou" | "ou2_5" => Market::TotalGoals,
            "btts" | "both_teams" | "both_teams_to_score" | "bothteamstoscore" | "bothteams" => {
                Market::Btts
            }
            _ => Market::Unknown(m),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Market::MatchResult => "match_result",
            Market::DoubleChance => "double_chance",
            Market::TotalGoals => "total_goals",
            Market::Btts => "btts",
            Market::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Market::Unknown(_))
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Market {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A selection within one of the canonical markets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    // match_result
    Home,
    Draw,
    Away,
    // double_chance
    HomeOrDraw,
    HomeOrAway,
    DrawOrAway,
    // total_goals
    Over,
    Under,
    // btts
    Yes,
    No,
    /// Unrecognized selection code, lower-cased verbatim
    Unknown(String),
}

impl Selection {
    /// Fold a raw selection code onto its canonical selection, interpreted
    /// in the context of the given market.
    pub fn normalize(raw: &str, market: &Market) -> Selection {
        let sel = raw.to_lowercase();
        match market {
            Market::MatchResult => match sel.as_str() {
                "1" | "home" | "home_win" => Selection::Home,
                "x" | "draw" => Selection::Draw,
                "2" | "away" | "away_win" => Selection::Away,
                _ => Selection::Unknown(sel),
            },
            Market::DoubleChance => match sel.as_str() {
                "1x" | "1-x" | "1orx" => Selection::HomeOrDraw,
                "12" | "1-2" | "1or2" => Selection::HomeOrAway,
                "x2" | "x-2" | "xor2" => Selection::DrawOrAway,
                _ => Selection::Unknown(sel),
            },
            // Any "over..."/"under..." spelling counts, e.g. "over_2_5"
            Market::TotalGoals => {
                if sel.starts_with("over") {
                    Selection::Over
                } else if sel.starts_with("under") {
                    Selection::Under
                } else {
                    Selection::Unknown(sel)
                }
            }
            Market::Btts => match sel.as_str() {
                "yes" | "y" => Selection::Yes,
                "no" | "n" => Selection::No,
                _ => Selection::Unknown(sel),
            },
            Market::Unknown(_) => Selection::Unknown(sel),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selection::Home => "home",
            Selection::Draw => "draw",
            Selection::Away => "away",
            Selection::HomeOrDraw => "1x",
            Selection::HomeOrAway => "12",
            Selection::DrawOrAway => "x2",
            Selection::Over => "over",
            Selection::Under => "under",
            Selection::Yes => "yes",
            Selection::No => "no",
            Selection::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Winning selections across all four markets for one final score
#[derive(Debug, Clone, Serialize)]
pub struct MarketOutcomes {
    pub match_result: Selection,
    /// Always exactly two of {12, 1x, x2}, in canonical-string order
    pub double_chance: Vec<Selection>,
    pub total_goals: Selection,
    pub btts: Selection,
}

impl MarketOutcomes {
    pub fn compute(home: u32, away: u32) -> MarketOutcomes {
        // Widen before summing: coerced goal counts can be as large as
        // u32::MAX each, and their sum must not wrap.
        let total = home as u64 + away as u64;

        // Push order "12" < "1x" < "x2" keeps the list sorted by
        // canonical string without a separate sort pass.
        let mut double_chance = Vec::with_capacity(2);
        if home != away {
            double_chance.push(Selection::HomeOrAway);
        }
        if home >= away {
            double_chance.push(Selection::HomeOrDraw);
        }
        if away >= home {
            double_chance.push(Selection::DrawOrAway);
        }

        MarketOutcomes {
            match_result: if home > away {
                Selection::Home
            } else if home < away {
                Selection::Away
            } else {
                Selection::Draw
            },
            double_chance,
            total_goals: if total >= 3 {
                Selection::Over
            } else {
                Selection::Under
            },
            btts: if home > 0 && away > 0 {
                Selection::Yes
            } else {
                Selection::No
            },
        }
    }

    /// Whether `selection` wins on `market` given these outcomes.
    ///
    /// Returns `None` for unknown markets: the caller must leave such bets
    /// untouched rather than settle them.
    pub fn is_winner(&self, market: &Market, selection: &Selection) -> Option<bool> {
        match market {
            Market::MatchResult => Some(*selection == self.match_result),
            Market::DoubleChance => Some(self.double_chance.contains(selection)),
            Market::TotalGoals => Some(*selection == self.total_goals),
            Market::Btts => Some(*selection == self.btts),
            Market::Unknown(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_aliases() {
        for raw in ["match_result", "1X2", "match-winner", "MatchWinner"] {
            assert_eq!(Market::normalize(raw), Market::MatchResult, "{raw}");
        }
        for raw in ["double_chance", "DoubleChance", "dc"] {
            assert_eq!(Market::normalize(raw), Market::DoubleChance, "{raw}");
        }
        for raw in [
            "total_goals",
            "over_under",
            "OVERUNDER",
            "over_under_2_5",
            "over2_5",
            "under2_5",
            "ou",
            "OU2_5",
        ] {
            assert_eq!(Market::normalize(raw), Market::TotalGoals, "{raw}");
        }
        for raw in [
            "btts",
            "both_teams",
            "both_teams_to_score",
            "BothTeamsToScore",
            "bothteams",
        ] {
            assert_eq!(Market::normalize(raw), Market::Btts, "{raw}");
        }
    }

    #[test]
    fn test_unknown_market_passes_through_lowercased() {
        let market = Market::normalize("Correct_Score");
        assert_eq!(market, Market::Unknown("correct_score".to_string()));
        assert_eq!(market.as_str(), "correct_score");
        assert!(!market.is_known());
    }

    #[test]
    fn test_market_normalization_is_idempotent() {
        for raw in ["1x2", "dc", "ou", "btts", "something_else"] {
            let once = Market::normalize(raw);
            let twice = Market::normalize(once.as_str());
            assert_eq!(once, twice, "{raw}");
        }
    }

    #[test]
    fn test_selection_aliases() {
        let mr = Market::MatchResult;
        assert_eq!(Selection::normalize("1", &mr), Selection::Home);
        assert_eq!(Selection::normalize("HOME_WIN", &mr), Selection::Home);
        assert_eq!(Selection::normalize("X", &mr), Selection::Draw);
        assert_eq!(Selection::normalize("2", &mr), Selection::Away);
        assert_eq!(Selection::normalize("away_win", &mr), Selection::Away);

        let dc = Market::DoubleChance;
        assert_eq!(Selection::normalize("1-X", &dc), Selection::HomeOrDraw);
        assert_eq!(Selection::normalize("1or2", &dc), Selection::HomeOrAway);
        assert_eq!(Selection::normalize("xor2", &dc), Selection::DrawOrAway);

        let tg = Market::TotalGoals;
        assert_eq!(Selection::normalize("Over_2_5", &tg), Selection::Over);
        assert_eq!(Selection::normalize("under3_5", &tg), Selection::Under);
        assert_eq!(
            Selection::normalize("exactly_3", &tg),
            Selection::Unknown("exactly_3".to_string())
        );

        let btts = Market::Btts;
        assert_eq!(Selection::normalize("Y", &btts), Selection::Yes);
        assert_eq!(Selection::normalize("n", &btts), Selection::No);
    }

    #[test]
    fn test_selection_normalization_is_idempotent() {
        let cases = [
            ("home", Market::MatchResult),
            ("draw", Market::MatchResult),
            ("1x", Market::DoubleChance),
            ("over", Market::TotalGoals),
            ("yes", Market::Btts),
        ];
        for (canonical, market) in cases {
            let once = Selection::normalize(canonical, &market);
            let twice = Selection::normalize(once.as_str(), &market);
            assert_eq!(once, twice, "{canonical}");
        }
    }

    #[test]
    fn test_outcome_laws_over_score_grid() {
        for home in 0..=6u32 {
            for away in 0..=6u32 {
                let outcomes = MarketOutcomes::compute(home, away);

                // Exactly one of home/draw/away holds
                let expected = if home > away {
                    Selection::Home
                } else if home < away {
                    Selection::Away
                } else {
                    Selection::Draw
                };
                assert_eq!(outcomes.match_result, expected, "{home}:{away}");

                // Double chance always covers exactly two outcomes, sorted
                assert_eq!(outcomes.double_chance.len(), 2, "{home}:{away}");
                let strs: Vec<&str> =
                    outcomes.double_chance.iter().map(|s| s.as_str()).collect();
                let mut sorted = strs.clone();
                sorted.sort_unstable();
                assert_eq!(strs, sorted, "{home}:{away}");

                // Fixed 2.5 line
                let expected_total = if home + away >= 3 {
                    Selection::Over
                } else {
                    Selection::Under
                };
                assert_eq!(outcomes.total_goals, expected_total, "{home}:{away}");
            }
        }
    }

    #[test]
    fn test_outcomes_for_home_win() {
        let outcomes = MarketOutcomes::compute(3, 1);
        assert_eq!(outcomes.match_result, Selection::Home);
        assert_eq!(outcomes.total_goals, Selection::Over);
        assert_eq!(outcomes.btts, Selection::Yes);
        assert_eq!(
            outcomes.double_chance,
            vec![Selection::HomeOrAway, Selection::HomeOrDraw]
        );
    }

    #[test]
    fn test_outcomes_for_goalless_draw() {
        let outcomes = MarketOutcomes::compute(0, 0);
        assert_eq!(outcomes.match_result, Selection::Draw);
        assert_eq!(outcomes.total_goals, Selection::Under);
        assert_eq!(outcomes.btts, Selection::No);
        assert_eq!(
            outcomes.double_chance,
            vec![Selection::HomeOrDraw, Selection::DrawOrAway]
        );
    }

    #[test]
    fn test_extreme_scores_do_not_overflow_total() {
        let outcomes = MarketOutcomes::compute(u32::MAX, u32::MAX);
        assert_eq!(outcomes.match_result, Selection::Draw);
        assert_eq!(outcomes.total_goals, Selection::Over);
        assert_eq!(outcomes.btts, Selection::Yes);

        let outcomes = MarketOutcomes::compute(u32::MAX, 1);
        assert_eq!(outcomes.match_result, Selection::Home);
        assert_eq!(outcomes.total_goals, Selection::Over);
    }

    #[test]
    fn test_is_winner_unknown_market_is_none() {
        let outcomes = MarketOutcomes::compute(2, 0);
        let market = Market::normalize("unknown_market");
        let selection = Selection::normalize("whatever", &market);
        assert_eq!(outcomes.is_winner(&market, &selection), None);
    }

    #[test]
    fn test_outcome_serialization_uses_canonical_strings() {
        let outcomes = MarketOutcomes::compute(1, 1);
        let json = serde_json::to_value(&outcomes).unwrap();
        assert_eq!(json["match_result"], "draw");
        assert_eq!(json["double_chance"], serde_json::json!(["1x", "x2"]));
        assert_eq!(json["btts"], "no");
    }
}

//! Demo match seeding
//!
//! Fills the match list with a fixed set of fixtures the first time the
//! server boots with an empty document, so testers have something to bet on.

use crate::store::GameStore;
use crate::types::{Match, MarketOffer, MatchStatus};
use std::collections::HashMap;
use tracing::info;

fn offer(label: &str, odds: f64) -> MarketOffer {
    MarketOffer {
        label: label.to_string(),
        odds,
    }
}

/// The three standard markets every demo fixture offers
fn standard_markets(
    home_label: &str,
    away_label: &str,
    odds_1x2: [f64; 3],
    odds_ou: [f64; 2],
    odds_btts: [f64; 2],
) -> HashMap<String, HashMap<String, MarketOffer>> {
    let mut markets = HashMap::new();

    markets.insert(
        "1x2".to_string(),
        HashMap::from([
            ("1".to_string(), offer(home_label, odds_1x2[0])),
            ("X".to_string(), offer("Draw", odds_1x2[1])),
            ("2".to_string(), offer(away_label, odds_1x2[2])),
        ]),
    );
    markets.insert(
        "over_under".to_string(),
        HashMap::from([
            ("over".to_string(), offer("Over 2.5", odds_ou[0])),
            ("under".to_string(), offer("Under 2.5", odds_ou[1])),
        ]),
    );
    markets.insert(
        "both_teams".to_string(),
        HashMap::from([
            ("yes".to_string(), offer("Both Score", odds_btts[0])),
            ("no".to_string(), offer("No Both Score", odds_btts[1])),
        ]),
    );

    markets
}

fn fixture(
    id: &str,
    home_team: &str,
    away_team: &str,
    league: &str,
    date: &str,
    time: &str,
    markets: HashMap<String, HashMap<String, MarketOffer>>,
) -> Match {
    Match {
        id: id.to_string(),
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        league: league.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        status: MatchStatus::Upcoming,
        score: None,
        markets,
    }
}

/// The demo fixture list
pub fn demo_matches() -> Vec<Match> {
    vec![
        fixture(
            "match_1",
            "FC Schalke 04",
            "Hertha BSC",
            "2. Bundesliga",
            "2024-08-10",
            "15:30",
            standard_markets(
                "Schalke Win",
                "Hertha Win",
                [2.10, 3.40, 3.20],
                [1.85, 1.95],
                [1.70, 2.10],
            ),
        ),
        fixture(
            "match_2",
            "Hamburger SV",
            "FC Köln",
            "2. Bundesliga",
            "2024-08-10",
            "18:30",
            standard_markets(
                "Hamburg Win",
                "Köln Win",
                [1.95, 3.60, 3.80],
                [1.90, 1.90],
                [1.75, 2.05],
            ),
        ),
        fixture(
            "match_3",
            "Borussia Dortmund",
            "Bayern Munich",
            "Bundesliga",
            "2024-08-11",
            "18:30",
            standard_markets(
                "Dortmund Win",
                "Bayern Win",
                [3.20, 3.80, 2.05],
                [1.65, 2.25],
                [1.55, 2.40],
            ),
        ),
        fixture(
            "match_4",
            "Arsenal",
            "Manchester City",
            "Premier League",
            "2024-08-11",
            "16:30",
            standard_markets(
                "Arsenal Win",
                "City Win",
                [2.80, 3.40, 2.40],
                [1.70, 2.15],
                [1.60, 2.30],
            ),
        ),
        fixture(
            "match_5",
            "Real Madrid",
            "Barcelona",
            "La Liga",
            "2024-08-12",
            "21:00",
            standard_markets(
                "Real Win",
                "Barca Win",
                [2.20, 3.60, 3.00],
                [1.80, 2.00],
                [1.65, 2.20],
            ),
        ),
    ]
}

/// Seed demo fixtures when the match list is empty
pub async fn seed_if_empty(store: &GameStore) {
    let mut data = store.write().await;
    if !data.matches.is_empty() {
        return;
    }
    data.matches = demo_matches();
    store.persist(&mut data).await;
    info!(matches = data.matches.len(), "initialized demo matches");
}

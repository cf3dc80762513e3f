//! Request handlers for the ScoreLeague API

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::response::{responses, ApiResponse};
use crate::settlement::{coerce_goals, BetResult, MatchSettlement, SettlementEngine};
use crate::store::GameStore;
use crate::types::{
    generate_id, now_rfc3339, Bet, BetStatus, League, LeagueSettings, User, UserStats,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<GameStore>,
    pub engine: Arc<SettlementEngine>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        // Auth endpoints
        .route("/api/auth/login", post(login))
        // Match endpoints
        .route("/api/matches", get(get_matches))
        .route("/api/matches/:match_id/settle", post(settle_match))
        // Bet endpoints
        .route("/api/bets/place", post(place_bet))
        .route("/api/bets/user/:user_id", get(get_user_bets))
        .route("/api/bets/settle", post(settle_bet))
        // League endpoints
        .route("/api/leagues/create", post(create_league))
        .route("/api/leagues/join", post(join_league))
        .route("/api/leagues/user/:user_id", get(get_user_leagues))
        .route("/api/leagues/:league_id/leaderboard", get(get_league_leaderboard))
        .fallback(route_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Settlement endpoints require the admin token, but only when one is
/// configured; an unconfigured server is open like the original deployment.
fn require_admin(config: &Config, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = &config.auth.admin_token else {
        return Ok(());
    };
    let provided = headers.get("x-admin-token").and_then(|v| v.to_str().ok());
    if provided == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "Missing or invalid admin token".to_string(),
        ))
    }
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "timestamp": now_rfc3339(),
    }))
}

async fn route_not_found() -> ApiResponse<()> {
    responses::not_found("Route")
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
}

/// Username-only login: returns the existing user with that name or
/// creates a fresh one with the configured starting balance
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<ApiResponse<Value>> {
    let username = req.username.unwrap_or_default().trim().to_string();
    if username.chars().count() < 2 {
        return Err(AppError::ValidationError {
            field: "username".to_string(),
            message: "must be at least 2 characters".to_string(),
        });
    }

    let mut data = state.store.write().await;
    if let Some(user) = data.user_by_username(&username) {
        return Ok(responses::ok(json!({ "user": user })));
    }

    let user = User {
        id: generate_id("user_"),
        username,
        coins: state.config.game.starting_coins,
        joined_at: now_rfc3339(),
        stats: UserStats::default(),
    };
    data.users.insert(user.id.clone(), user.clone());
    state.store.persist(&mut data).await;
    info!(user_id = %user.id, username = %user.username, "new user registered");

    Ok(responses::ok(json!({ "user": user })))
}

async fn get_matches(State(state): State<AppState>) -> ApiResponse<Value> {
    let data = state.store.read().await;
    responses::ok(json!({ "matches": data.matches }))
}

/// Goal counts arrive as raw JSON values so sloppy clients (floats,
/// numeric strings, missing fields) coerce instead of failing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettleMatchRequest {
    pub home_goals: Value,
    pub away_goals: Value,
}

async fn settle_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SettleMatchRequest>,
) -> Result<ApiResponse<MatchSettlement>> {
    require_admin(&state.config, &headers)?;

    let home_goals = coerce_goals(&req.home_goals);
    let away_goals = coerce_goals(&req.away_goals);
    let report = state
        .engine
        .settle_match(&match_id, home_goals, away_goals)
        .await?;

    Ok(responses::ok(report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetRequest {
    pub user_id: String,
    pub match_id: String,
    pub market: String,
    pub selection: String,
    pub odds: f64,
    pub stake: u64,
    #[serde(default)]
    pub league_ids: Vec<String>,
}

async fn place_bet(
    State(state): State<AppState>,
    Json(req): Json<PlaceBetRequest>,
) -> Result<ApiResponse<Value>> {
    if req.user_id.is_empty() || req.match_id.is_empty() {
        return Err(AppError::BadRequest(
            "Missing required bet information".to_string(),
        ));
    }
    if req.market.is_empty() || req.selection.is_empty() {
        return Err(AppError::BadRequest(
            "Missing required bet information".to_string(),
        ));
    }
    if !req.odds.is_finite() || req.odds < 1.0 {
        return Err(AppError::ValidationError {
            field: "odds".to_string(),
            message: "must be a decimal of at least 1.0".to_string(),
        });
    }
    if req.stake == 0 {
        return Err(AppError::ValidationError {
            field: "stake".to_string(),
            message: "must be greater than 0".to_string(),
        });
    }

    let mut data = state.store.write().await;
    let user = data
        .users
        .get_mut(&req.user_id)
        .ok_or_else(|| AppError::NotFound(format!("User {}", req.user_id)))?;
    if user.coins < req.stake {
        return Err(AppError::InsufficientCoins {
            required: req.stake,
            available: user.coins,
        });
    }

    user.coins -= req.stake;
    user.stats.total_bets += 1;
    let user_snapshot = user.clone();

    let bet = Bet {
        id: generate_id("bet_"),
        user_id: req.user_id.clone(),
        match_id: req.match_id,
        market: req.market,
        selection: req.selection,
        odds: req.odds,
        stake: req.stake,
        potential_win: (req.stake as f64 * req.odds).round() as u64,
        placed_at: now_rfc3339(),
        status: BetStatus::Pending,
        league_ids: req.league_ids,
    };
    data.bets
        .entry(req.user_id)
        .or_default()
        .push(bet.clone());
    state.store.persist(&mut data).await;
    info!(bet_id = %bet.id, user_id = %bet.user_id, stake = bet.stake, "bet placed");

    Ok(responses::ok(json!({ "bet": bet, "user": user_snapshot })))
}

async fn get_user_bets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResponse<Value> {
    let data = state.store.read().await;
    let bets = data.bets.get(&user_id).cloned().unwrap_or_default();
    responses::ok(json!({ "bets": bets }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleBetRequest {
    pub bet_id: String,
    #[serde(default)]
    pub result: String,
}

async fn settle_bet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SettleBetRequest>,
) -> Result<ApiResponse<Value>> {
    require_admin(&state.config, &headers)?;

    let result = BetResult::parse(&req.result).ok_or_else(|| AppError::ValidationError {
        field: "result".to_string(),
        message: "must be 'won' or 'lost'".to_string(),
    })?;
    let (bet, user) = state.engine.settle_bet(&req.bet_id, result).await?;

    Ok(responses::ok(json!({ "bet": bet, "user": user })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeagueRequest {
    pub name: String,
    pub creator_id: String,
    #[serde(default)]
    pub description: String,
}

fn generate_invite_code() -> String {
    use rand::Rng;
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..8)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

async fn create_league(
    State(state): State<AppState>,
    Json(req): Json<CreateLeagueRequest>,
) -> Result<ApiResponse<Value>> {
    let name = req.name.trim().to_string();
    if name.is_empty() || req.creator_id.is_empty() {
        return Err(AppError::BadRequest(
            "League name and creator required".to_string(),
        ));
    }

    let league = League {
        id: generate_id("league_"),
        name,
        description: req.description.trim().to_string(),
        creator_id: req.creator_id.clone(),
        invite_code: generate_invite_code(),
        members: vec![req.creator_id],
        created_at: now_rfc3339(),
        settings: LeagueSettings {
            max_members: state.config.game.max_league_members,
        },
    };

    let mut data = state.store.write().await;
    data.leagues.insert(league.id.clone(), league.clone());
    state.store.persist(&mut data).await;
    info!(league_id = %league.id, "league created");

    Ok(responses::ok(json!({ "league": league })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinLeagueRequest {
    pub invite_code: String,
    pub user_id: String,
}

async fn join_league(
    State(state): State<AppState>,
    Json(req): Json<JoinLeagueRequest>,
) -> Result<ApiResponse<Value>> {
    if req.invite_code.is_empty() || req.user_id.is_empty() {
        return Err(AppError::BadRequest(
            "Invite code and user ID required".to_string(),
        ));
    }
    let code = req.invite_code.trim().to_uppercase();

    let mut data = state.store.write().await;
    let league = data
        .leagues
        .values_mut()
        .find(|l| l.invite_code == code)
        .ok_or_else(|| AppError::NotFound("League".to_string()))?;

    if league.members.contains(&req.user_id) {
        return Err(AppError::BadRequest(
            "Already a member of this league".to_string(),
        ));
    }
    if league.members.len() >= league.settings.max_members {
        return Err(AppError::BadRequest("League is full".to_string()));
    }

    league.members.push(req.user_id);
    let league = league.clone();
    state.store.persist(&mut data).await;
    info!(league_id = %league.id, members = league.members.len(), "league member joined");

    Ok(responses::ok(json!({ "league": league })))
}

async fn get_user_leagues(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResponse<Value> {
    let data = state.store.read().await;
    let leagues: Vec<&League> = data
        .leagues
        .values()
        .filter(|l| l.members.contains(&user_id))
        .collect();
    responses::ok(json!({ "leagues": leagues }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeagueStats {
    bets: usize,
    winnings: u64,
    total_staked: u64,
}

#[derive(Debug, Serialize)]
struct LeaderboardEntry {
    #[serde(flatten)]
    user: User,
    #[serde(rename = "leagueStats")]
    league_stats: LeagueStats,
}

async fn get_league_leaderboard(
    State(state): State<AppState>,
    Path(league_id): Path<String>,
) -> Result<ApiResponse<Value>> {
    let data = state.store.read().await;
    let league = data
        .leagues
        .get(&league_id)
        .ok_or_else(|| AppError::NotFound(format!("League {}", league_id)))?;

    let mut leaderboard: Vec<LeaderboardEntry> = league
        .members
        .iter()
        .filter_map(|user_id| {
            let user = data.users.get(user_id)?;
            let bets = data.bets.get(user_id).map(Vec::as_slice).unwrap_or(&[]);
            let league_bets: Vec<&Bet> = bets
                .iter()
                .filter(|b| b.league_ids.contains(&league_id))
                .collect();

            Some(LeaderboardEntry {
                user: user.clone(),
                league_stats: LeagueStats {
                    bets: league_bets.len(),
                    winnings: league_bets
                        .iter()
                        .filter(|b| b.status == BetStatus::Won)
                        .map(|b| b.potential_win)
                        .sum(),
                    total_staked: league_bets.iter().map(|b| b.stake).sum(),
                },
            })
        })
        .collect();
    leaderboard.sort_by(|a, b| b.user.coins.cmp(&a.user.coins));

    Ok(responses::ok(json!({ "leaderboard": leaderboard })))
}

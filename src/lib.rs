//! ScoreLeague fantasy-betting backend
//!
//! Users place coin stakes on football match outcomes, join private leagues
//! and get paid out when matches are settled against final scores. The
//! interesting parts live in [`markets`] (odds-market normalization) and
//! [`settlement`] (the settlement engine); everything else is thin glue
//! around a single JSON-backed game document.

pub mod config;
pub mod error;
pub mod handlers;
pub mod markets;
pub mod response;
pub mod seed_matches;
pub mod settlement;
pub mod store;
pub mod types;

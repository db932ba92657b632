//! # Recipe Finder
//!
//! Ingredient-driven recipe discovery over two recipe APIs, with diet, time
//! and meal-type filters, a weekly meal planner and a grouped shopping list.
//!
//! The search path runs both sources concurrently ([`aggregator`]), resolves
//! each candidate's full record ([`detail`]), filters it ([`filters`]) and
//! streams matches back ([`search`]). The planning path groups the
//! ingredient lines of planned meals ([`normalizer`], [`shopping_list`]) and
//! exports them ([`export`]).

pub mod aggregator;
pub mod app;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod detail;
pub mod diets;
pub mod errors;
pub mod export;
pub mod filters;
pub mod localization;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod nutrition;
pub mod planner;
pub mod search;
pub mod shopping_list;
pub mod sources;
pub mod storage;
pub mod tools;

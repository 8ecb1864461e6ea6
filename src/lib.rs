//! Helpdesk Assist - knowledge-base matching and ticket service for an IT helpdesk
//!
//! The core of the crate is a small query pipeline: fuzzy (edit distance)
//! and partial (word prefix) matching over categories and error/solution
//! entries, followed by a relevance ranking. A rule-based assistant and the
//! HTTP API for staff (entries, tickets, evaluations) are built on top of it.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{edit_distance, fuzzy_match, partial_match, rank_by_relevance, Assistant, MatchResult, Matcher};
pub use models::{Category, KnowledgeEntry, MatchingParams, Searchable, UnionPolicy};

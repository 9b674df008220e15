// Pass Generation Engine
// Implements: scoring, candidate selection, AI selection, rule-based fallback, quality gate.
// All text-generation calls go through llm_client's TextGenerator; nothing here talks HTTP.

pub mod ai_selection;
pub mod candidates;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod rule_based;
pub mod scoring;
pub mod selection;

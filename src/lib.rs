//! Hearthhold - deterministic per-cycle economy engine for a fantasy city builder

pub mod city;
pub mod core;
pub mod era;
pub mod modifiers;
pub mod rules;
pub mod simulation;

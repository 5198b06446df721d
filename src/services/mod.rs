// src/services/mod.rs

pub mod evaluator;

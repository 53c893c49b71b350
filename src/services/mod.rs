// src/services/mod.rs
pub mod calculations;
pub mod collector;
pub mod company;
pub mod db;
pub mod gemini;
pub mod insights;
pub mod market;
pub mod news;
pub mod providers;
pub mod query;

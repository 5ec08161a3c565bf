//! Core domain types and logic.

pub mod ohlcv;
pub mod bar_table;
pub mod indicator;
pub mod expr;
pub mod expr_parser;
pub mod condition;
pub mod signal;
pub mod holding;
pub mod position;
pub mod portfolio;
pub mod baseline;
pub mod metrics;
pub mod strategy;
pub mod backtest;
pub mod config_validation;
pub mod error;

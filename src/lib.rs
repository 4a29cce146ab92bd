pub mod api;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod domain;
pub mod finance;
pub mod report;
pub mod simulation;
pub mod sizing;
pub mod telemetry;
pub mod weather;

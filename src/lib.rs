pub mod client;
pub mod config;
pub mod contract;
pub mod deployment;
pub mod error;
pub mod evm;
pub mod lifecycle;
pub mod notifications;
pub mod state;
pub mod subscriber;
pub mod telemetry;
pub mod ui;
pub mod wallets;
pub mod waves;

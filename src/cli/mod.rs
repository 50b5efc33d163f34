pub mod account;
pub mod dashboard;
pub mod market;
pub mod setup;
pub mod ui;

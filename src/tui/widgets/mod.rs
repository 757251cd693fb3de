//! TUI widgets

pub mod dashboard;
pub mod filter_popup;
pub mod help;
pub mod kpi_cards;
pub mod spinner;
pub mod tabs;

//! boview
//!
//! Entity navigation, side-panel lifecycle and filter state for back-office record
//! review, plus a terminal viewer that drives them.
//!
//! The state managers in [`state`] are UI-agnostic; [`view`] is the impure shell.

pub mod config;
pub mod logging;
pub mod model;
pub mod source;
pub mod state;
pub mod storage;
pub mod view;

// Filter store to navigation wiring
pub mod integration;

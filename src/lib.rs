//! Pad Remote
//!
//! Polls a game controller, turns button/axis/POV gestures into discrete
//! player commands and delivers them to MPC-HC/MPC-BE (preferred) or VLC.
//! A small HTTP listener lets a phone on the LAN send the same commands.

pub mod action;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod mapping;
pub mod paths;
pub mod poller;
pub mod remote;

//! # padmouse Library
//!
//! Use a gamepad as keyboard and mouse.
//!
//! This library provides the polling loop that turns controller snapshots into
//! synthesized input, plus a few device-control actions (audio output
//! switching, window minimize/restore, controller power-off).

pub mod actions;
pub mod config;
pub mod controller;
pub mod error;
pub mod mapping;
pub mod platform;
pub mod poll_loop;

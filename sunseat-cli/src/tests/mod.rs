//! Shared test harness modules for the SunSeat CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod helpers;
mod probe_unit;
mod rank_steps;

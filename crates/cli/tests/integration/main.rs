//! End-to-end tests driving the `stagehand` binary against fake build scripts.

#![cfg(unix)]

mod clean_tests;
mod common;
mod plan_tests;
mod run_tests;

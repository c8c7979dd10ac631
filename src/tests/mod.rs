// Cross-module behavior tests and shared test support.

pub mod helpers;

mod workflow;

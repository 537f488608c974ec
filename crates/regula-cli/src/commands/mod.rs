pub mod check;
pub mod dump;
pub mod pattern_loader;
pub mod render;
pub mod run_common;

#[cfg(test)]
mod pattern_loader_tests;
#[cfg(test)]
mod run_common_tests;

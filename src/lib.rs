pub mod app;
pub mod cli;
pub mod config;
pub mod counter;
pub mod curation;
pub mod dataset;
pub mod filter;
pub mod output;
pub mod picker;
pub mod store;
pub mod surface;
pub mod utils;

#[cfg(test)]
mod tests;

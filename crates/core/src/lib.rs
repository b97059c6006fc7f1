pub mod asr;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod decode;
pub mod emotion;
pub mod hf;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod text;
pub mod util;
pub mod voice;

#[cfg(test)]
mod testing;

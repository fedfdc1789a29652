mod classifier;
mod common;
mod pipeline;
mod scoring;

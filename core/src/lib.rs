pub mod clock;
pub mod config;
pub mod error;
pub mod features;
pub mod generator;
pub mod insights;
pub mod model;
pub mod name_generator;
pub mod note_writer;
pub mod pipeline;
pub mod rng;
pub mod split;
pub mod store;
pub mod table;
pub mod types;

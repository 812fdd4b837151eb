pub mod build;
pub mod dev;
pub mod setup;

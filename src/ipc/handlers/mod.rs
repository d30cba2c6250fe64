pub mod classes;
pub mod core;
pub mod progress;
pub mod quran;
pub mod setup;

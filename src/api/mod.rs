pub mod sleeper_api;

pub use sleeper_api::{SleeperClient, SLEEPER_BASE_URL};

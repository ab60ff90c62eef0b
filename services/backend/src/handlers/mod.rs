pub mod games;
pub mod health;
pub mod metrics;
pub mod sessions;
pub mod wallet;

pub mod analysis;
pub mod health;
pub mod mint;
pub mod wallet;

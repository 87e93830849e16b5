pub mod analysis;
pub mod auth;
pub mod authenticators;
pub mod entries;
pub mod helpers;
pub mod shares;
pub mod stats;

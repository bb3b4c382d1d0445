pub mod dashboard;
pub mod fake_feed;
pub mod feed;
pub mod markets;
pub mod predict;
pub mod strength;

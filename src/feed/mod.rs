pub mod controller;
pub mod roster;
pub mod simulator;

pub use controller::FeedController;
pub use roster::demo_roster;

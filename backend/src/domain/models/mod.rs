pub mod activity;
pub mod analysis;
pub mod baby;
pub mod media;
pub mod pattern;

//! # File Storage Module
//!
//! YAML/CSV repositories under the data directory:
//!
//! ```text
//! {data_dir}/
//! ├── global_state.yaml
//! ├── settings.yaml
//! ├── analysis_results.yaml
//! ├── babies/{baby_id}/
//! │   ├── baby.yaml
//! │   └── activities.csv
//! └── Media/
//!     ├── Photos/  Videos/  Thumbnails/
//!     └── media_index.yaml
//! ```
//!
//! Every write goes to a temp file first and is renamed into place.

pub mod activity_repository;
pub mod analysis_repository;
pub mod baby_repository;
pub mod connection;
pub mod global_state_repository;
pub mod media_repository;
pub mod settings_repository;

#[cfg(test)]
pub mod test_utils;

pub use activity_repository::ActivityRepository;
pub use analysis_repository::AnalysisRepository;
pub use baby_repository::BabyRepository;
pub use connection::CsvConnection;
pub use global_state_repository::{GlobalState, GlobalStateRepository};
pub use media_repository::{MediaRecord, MediaRepository};
pub use settings_repository::SettingsRepository;

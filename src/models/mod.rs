pub mod backup_config;
pub mod package_managers;
pub mod run_config;

pub use backup_config::BackupConfig;
pub use package_managers::{
    DetectedPackageManager, PackageManagerDefinition, PackageManagerDetection,
};
pub use run_config::RunConfig;

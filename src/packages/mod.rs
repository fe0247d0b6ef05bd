pub mod detector;
pub mod installer;
pub mod scripts;

pub use detector::LockfileDetector;
pub use installer::PackageInstaller;
pub use scripts::ScriptSelector;

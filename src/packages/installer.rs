use crate::models::DetectedPackageManager;
use crate::process::CommandSpec;
use std::path::Path;

/// Builds the install and run commands for a detected package manager
pub struct PackageInstaller;

impl PackageInstaller {
    /// Deterministic install, run inside `dir`
    pub fn install_command(detected: &DetectedPackageManager, dir: &Path) -> Option<CommandSpec> {
        CommandSpec::parse(&detected.install).map(|command| command.current_dir(dir))
    }

    /// `<manager> run <script>`, run inside `dir`
    pub fn run_command(
        detected: &DetectedPackageManager,
        script: &str,
        dir: &Path,
    ) -> Option<CommandSpec> {
        CommandSpec::parse(&detected.run).map(|command| command.arg(script).current_dir(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detected_pnpm() -> DetectedPackageManager {
        DetectedPackageManager {
            tool: "pnpm".to_string(),
            lockfile: "pnpm-lock.yaml".to_string(),
            install: "pnpm install --frozen-lockfile".to_string(),
            run: "pnpm run".to_string(),
        }
    }

    #[test]
    fn test_install_command() {
        let command =
            PackageInstaller::install_command(&detected_pnpm(), Path::new("/w/web")).unwrap();
        assert_eq!(command.to_string(), "pnpm install --frozen-lockfile");
        assert_eq!(command.cwd.as_deref(), Some(Path::new("/w/web")));
    }

    #[test]
    fn test_run_command_appends_script() {
        let command =
            PackageInstaller::run_command(&detected_pnpm(), "dev", Path::new("/w/web")).unwrap();
        assert_eq!(command.to_string(), "pnpm run dev");
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let detected = DetectedPackageManager {
            install: String::new(),
            ..detected_pnpm()
        };
        assert!(PackageInstaller::install_command(&detected, Path::new(".")).is_none());
    }
}

//! Effective user checks the binaries run before touching device nodes.

pub fn is_root(euid: u32) -> bool {
    euid == 0
}

/// Whether a program that needs root may carry on as `euid`.
pub fn should_run(euid: u32, require_root: bool) -> bool {
    is_root(euid) || !require_root
}

/// The line printed at startup, e.g. `Run as root, euid:0`.
pub fn banner(euid: u32) -> String {
    if is_root(euid) {
        format!("Run as root, euid:{}", euid)
    } else {
        format!("Not Run as root, euid:{}", euid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banners() {
        assert_eq!(banner(0), "Run as root, euid:0");
        assert_eq!(banner(1000), "Not Run as root, euid:1000");
        assert!(!is_root(65534));
    }

    #[test]
    fn only_root_runs_unless_waived() {
        assert!(should_run(0, true));
        assert!(should_run(0, false));
        assert!(!should_run(1000, true));
        assert!(should_run(1000, false));
    }
}

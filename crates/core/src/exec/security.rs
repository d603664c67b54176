//! Last-resort command denylist.
//!
//! Commands are assembled by this crate, so this is not a sandbox. It only stops the
//! handful of patterns that would destroy the host if a caller-supplied value ever
//! slipped through unquoted.

use once_cell::sync::Lazy;
use regex::Regex;
use xcpilot_api::{PilotError, Result};

static DENYLIST: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // rm -rf /, rm -fr '/*', rm -r -f --no-preserve-root / ...
        r#"\brm\s+(--?[a-zA-Z-]+\s+)*-[a-zA-Z]*[rR][a-zA-Z]*\s+(--?[a-zA-Z-]+\s+)*['"]?/\*?['"]?(\s|;|&|\||$)"#,
        r#"\brm\s+(--?[a-zA-Z-]+\s+)*--recursive\s+(--?[a-zA-Z-]+\s+)*['"]?/\*?['"]?(\s|;|&|\||$)"#,
        // filesystem formatting
        r"\bmkfs(\.[a-z0-9]+)?\b",
        r"\bnewfs(_[a-z0-9]+)?\b",
        r"\bdiskutil\s+(eraseDisk|eraseVolume|reformat|zeroDisk|randomDisk|secureErase)\b",
        // raw block device writes
        r"\bdd\s+.*\bof=/dev/",
        r">\s*/dev/(r?disk\d|sd[a-z]|nvme\d|hd[a-z])",
        // fork bomb
        r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Reject a command matching any denylisted pattern.
pub fn check_command(command: &str) -> Result<()> {
    if DENYLIST.iter().any(|re| re.is_match(command)) {
        return Err(PilotError::SecurityViolation {
            command: command.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_root_deletion() {
        for cmd in [
            "rm -rf /",
            "rm -fr /*",
            "rm -r -f /",
            "sudo rm -Rf / ; echo done",
            "rm --recursive /",
            "rm -rf --no-preserve-root /",
            "rm --no-preserve-root -rf /",
            "rm -rf \"/\"",
            "rm -rf '/'",
            "rm -fr '/*'",
            "rm --recursive --force \"/\" && true",
        ] {
            assert!(check_command(cmd).is_err(), "should reject: {cmd}");
        }
    }

    #[test]
    fn test_rejects_format_and_raw_writes() {
        for cmd in [
            "mkfs.ext4 /dev/sda1",
            "newfs_apfs /dev/disk4s1",
            "diskutil eraseDisk APFS Blank disk4",
            "dd if=/dev/zero of=/dev/disk2 bs=1m",
            "cat image.bin > /dev/rdisk3",
        ] {
            assert!(
                matches!(check_command(cmd), Err(PilotError::SecurityViolation { .. })),
                "should reject: {cmd}"
            );
        }
    }

    #[test]
    fn test_allows_toolchain_commands() {
        for cmd in [
            "xcrun xctrace list devices",
            "xcodebuild -project 'App.xcodeproj' -scheme App -showBuildSettings",
            "rm -rf /tmp/DerivedData/App",
            "rm -rf build/",
            "rm -rf '/tmp/DerivedData/App Build'",
            "rm -rf --no-preserve-root /tmp/scratch",
            "'/Applications/Xcode.app/Contents/Developer/usr/bin/devicectl' list devices",
        ] {
            assert!(check_command(cmd).is_ok(), "should allow: {cmd}");
        }
    }
}

//! Centralized path resolution for confsync
//!
//! # Environment Variables
//!
//! - `CONFSYNC_CONFIG_DIR` - Override config directory
//! - `CONFSYNC_STATE_DIR` - Override state directory
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `CONFSYNC_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/confsync` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\confsync`
//!    - macOS/Linux: `~/.config/confsync`
//!
//! For state_dir():
//! 1. `CONFSYNC_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/confsync` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\confsync`
//!    - macOS/Linux: `~/.local/state/confsync`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CONFSYNC_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "CONFSYNC_STATE_DIR";

const APP_DIR: &str = "confsync";

/// Get the confsync config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join(APP_DIR);
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_DIR);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the confsync state directory path
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_DIR);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            let path = local_app_data.join(APP_DIR);
            log::debug!("Using Windows state dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join(APP_DIR);
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as-is.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// Serializes tests that touch process environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with `key` set to `value`, restoring the previous value after.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = env_lock();
        let original = env::var(key).ok();
        // SAFETY: env access is serialized by ENV_LOCK
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: env access is serialized by ENV_LOCK
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    /// Run `f` with `key` unset, restoring the previous value after.
    ///
    /// Must be called from inside `with_env_var` or while holding `ENV_LOCK`.
    fn without_env_var<F, R>(key: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: callers hold ENV_LOCK
        unsafe { env::remove_var(key) };
        let result = f();
        if let Some(v) = original {
            // SAFETY: callers hold ENV_LOCK
            unsafe { env::set_var(key, v) };
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/config/path", || {
            let result = config_dir().unwrap();
            assert_eq!(result, PathBuf::from("/custom/config/path"));
        });
    }

    #[test]
    fn test_config_dir_env_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        let expected = home.join("dotfiles").join("confsync-tilde-test");
        with_env_var(ENV_CONFIG_DIR, "~/dotfiles/confsync-tilde-test", || {
            let result = config_dir().unwrap();
            assert_eq!(result, expected);
        });
    }

    #[test]
    fn test_xdg_config_home() {
        with_env_var("XDG_CONFIG_HOME", "/tmp/xdg-config-test", || {
            without_env_var(ENV_CONFIG_DIR, || {
                let result = config_dir().unwrap();
                assert_eq!(result, PathBuf::from("/tmp/xdg-config-test/confsync"));
            });
        });
    }

    #[test]
    fn test_state_dir_env_override() {
        with_env_var(ENV_STATE_DIR, "/custom/state/path", || {
            let result = state_dir().unwrap();
            assert_eq!(result, PathBuf::from("/custom/state/path"));
        });
    }

    #[test]
    fn test_xdg_state_home() {
        with_env_var("XDG_STATE_HOME", "/tmp/xdg-state-test", || {
            without_env_var(ENV_STATE_DIR, || {
                let result = state_dir().unwrap();
                assert_eq!(result, PathBuf::from("/tmp/xdg-state-test/confsync"));
            });
        });
    }

    #[cfg(unix)]
    #[test]
    fn test_default_state_dir_unix() {
        let _guard = env_lock();
        without_env_var(ENV_STATE_DIR, || {
            without_env_var("XDG_STATE_HOME", || {
                let result = state_dir().unwrap();
                let home = dirs::home_dir().unwrap();
                assert_eq!(result, home.join(".local").join("state").join("confsync"));
            });
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_with_env_var() {
        with_env_var("CONFSYNC_TEST_VAR", "test_value", || {
            let result = expand("/path/$CONFSYNC_TEST_VAR/file");
            assert_eq!(result, PathBuf::from("/path/test_value/file"));
        });
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}

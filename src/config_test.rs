use std::sync::{Mutex, MutexGuard};

use super::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// # Safety
/// Callers must hold `env_lock()`.
unsafe fn clear_shell_env() {
    unsafe {
        for var in [
            "SHELL_SIGNIN_URL",
            "SHELL_TARGET_URL",
            "SHELL_HOME_HOST",
            "SHELL_PUBLIC_PREFIXES",
            "SHELL_AUTH_KEY",
            "SHELL_STORE_PATH",
            "SHELL_MANUAL_CHORD",
            "SHELL_COUNTDOWN_SECS",
            "SHELL_TICK_MS",
            "SHELL_POLL_INTERVAL_MS",
            "SHELL_LOADING_TIMEOUT_MS",
            "SHELL_BRIDGE_DELAY_MS",
        ] {
            std::env::remove_var(var);
        }
    }
}

#[test]
fn from_env_defaults() {
    let _guard = env_lock();
    unsafe { clear_shell_env() };

    let cfg = ShellConfig::from_env().unwrap();
    assert_eq!(cfg.signin_url.as_str(), DEFAULT_SIGNIN_URL);
    assert_eq!(cfg.target_url.as_str(), DEFAULT_TARGET_URL);
    assert_eq!(cfg.home, HomePattern::new("kagi.com", vec!["/search".to_string()]));
    assert_eq!(cfg.auth_key, "kagiLoggedIn");
    assert_eq!(cfg.manual_chord, "Ctrl+Shift+A".parse::<KeyChord>().unwrap());
    assert_eq!(cfg.timings, Timings::default());
    assert_eq!(cfg.timings.countdown_secs, 5);
    assert!(cfg.store_path.ends_with("assistant-shell/state.json"));
}

#[test]
fn from_env_parses_overrides() {
    let _guard = env_lock();
    unsafe {
        clear_shell_env();
        std::env::set_var("SHELL_TARGET_URL", "https://example.test/chat");
        std::env::set_var("SHELL_PUBLIC_PREFIXES", "search, images ,");
        std::env::set_var("SHELL_AUTH_KEY", "previouslyAuthenticated");
        std::env::set_var("SHELL_STORE_PATH", "/tmp/shell-state.json");
        std::env::set_var("SHELL_MANUAL_CHORD", "Ctrl+A");
        std::env::set_var("SHELL_COUNTDOWN_SECS", "2");
        std::env::set_var("SHELL_TICK_MS", "500");
    }

    let cfg = ShellConfig::from_env().unwrap();
    assert_eq!(cfg.home, HomePattern::new("example.test", vec!["/search".to_string(), "/images".to_string()]));
    assert_eq!(cfg.auth_key, "previouslyAuthenticated");
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/shell-state.json"));
    assert_eq!(cfg.manual_chord, "ctrl+a".parse::<KeyChord>().unwrap());
    assert_eq!(cfg.timings.countdown_secs, 2);
    assert_eq!(cfg.timings.tick, Duration::from_millis(500));
    assert_eq!(cfg.timings.poll_interval, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));

    unsafe { clear_shell_env() };
}

#[test]
fn from_env_zero_timer_periods_fall_back_to_defaults() {
    let _guard = env_lock();
    unsafe {
        clear_shell_env();
        std::env::set_var("SHELL_TICK_MS", "0");
        std::env::set_var("SHELL_POLL_INTERVAL_MS", "0");
        std::env::set_var("SHELL_LOADING_TIMEOUT_MS", "0");
    }

    let cfg = ShellConfig::from_env().unwrap();
    assert_eq!(cfg.timings.tick, Duration::from_millis(DEFAULT_TICK_MS));
    assert_eq!(cfg.timings.poll_interval, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
    // One-shot deadlines accept zero.
    assert_eq!(cfg.timings.loading_timeout, Duration::ZERO);

    unsafe { clear_shell_env() };
}

#[test]
fn from_env_explicit_home_host_wins() {
    let _guard = env_lock();
    unsafe {
        clear_shell_env();
        std::env::set_var("SHELL_HOME_HOST", "www.kagi.com");
    }

    let cfg = ShellConfig::from_env().unwrap();
    assert_eq!(cfg.home.host(), "www.kagi.com");

    unsafe { clear_shell_env() };
}

#[test]
fn from_env_invalid_url_errors() {
    let _guard = env_lock();
    unsafe {
        clear_shell_env();
        std::env::set_var("SHELL_TARGET_URL", "not a url");
    }

    let err = ShellConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("SHELL_TARGET_URL is not a valid URL"));

    unsafe { clear_shell_env() };
}

#[test]
fn from_env_invalid_chord_errors() {
    let _guard = env_lock();
    unsafe {
        clear_shell_env();
        std::env::set_var("SHELL_MANUAL_CHORD", "Ctrl+");
    }

    let err = ShellConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("not a valid key chord"));

    unsafe { clear_shell_env() };
}

#[test]
fn env_parse_invalid_returns_default() {
    unsafe { std::env::set_var("__TEST_SHELL_EP_INVALID__", "soon") };
    let val: u64 = env_parse("__TEST_SHELL_EP_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__TEST_SHELL_EP_INVALID__") };
}

#[test]
fn split_prefixes_normalizes_leading_slash() {
    assert_eq!(split_prefixes("/search,news"), vec!["/search".to_string(), "/news".to_string()]);
    assert!(split_prefixes(" , ").is_empty());
}

use super::*;
use std::sync::Mutex;

/// Serializes tests that mutate the process environment.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers must hold `ENV_LOCK`.
unsafe fn clear_client_env() {
    unsafe {
        std::env::remove_var("IDENTITY_API_KEY");
        std::env::remove_var("SEATSCOUT_API_BASE_URL");
        std::env::remove_var("IDENTITY_BASE_URL");
        std::env::remove_var("SECURETOKEN_BASE_URL");
        std::env::remove_var("REFRESH_FAILURE_POLICY");
        std::env::remove_var("API_REQUEST_TIMEOUT_SECS");
    }
}

#[test]
fn from_env_applies_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_client_env();
        std::env::set_var("IDENTITY_API_KEY", "web-key");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.provider.identity_base_url, DEFAULT_IDENTITY_BASE_URL);
    assert_eq!(cfg.provider.securetoken_base_url, DEFAULT_SECURETOKEN_BASE_URL);
    assert_eq!(cfg.provider.api_key, "web-key");
    assert_eq!(cfg.refresh_failure_policy, RefreshFailurePolicy::RetainStale);
    assert_eq!(cfg.api_request_timeout, Duration::from_secs(DEFAULT_API_REQUEST_TIMEOUT_SECS));

    unsafe { clear_client_env() };
}

#[test]
fn from_env_reads_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_client_env();
        std::env::set_var("IDENTITY_API_KEY", "web-key");
        std::env::set_var("SEATSCOUT_API_BASE_URL", "https://api.seatscout.test/");
        std::env::set_var("REFRESH_FAILURE_POLICY", "clear");
        std::env::set_var("API_REQUEST_TIMEOUT_SECS", "3");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, "https://api.seatscout.test");
    assert_eq!(cfg.refresh_failure_policy, RefreshFailurePolicy::Clear);
    assert_eq!(cfg.provider.request_timeout, Duration::from_secs(3));

    unsafe { clear_client_env() };
}

#[test]
fn from_env_requires_api_key() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_client_env() };

    assert!(matches!(ClientConfig::from_env(), Err(ConfigError::MissingApiKey)));
}

#[test]
fn from_env_rejects_unknown_policy() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_client_env();
        std::env::set_var("IDENTITY_API_KEY", "web-key");
        std::env::set_var("REFRESH_FAILURE_POLICY", "sometimes");
    }

    assert!(matches!(ClientConfig::from_env(), Err(ConfigError::Parse(_))));

    unsafe { clear_client_env() };
}

#[test]
fn from_env_rejects_invalid_timeout() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_client_env();
        std::env::set_var("IDENTITY_API_KEY", "web-key");
        std::env::set_var("API_REQUEST_TIMEOUT_SECS", "ten");
    }

    assert!(matches!(ClientConfig::from_env(), Err(ConfigError::Parse(_))));

    unsafe { clear_client_env() };
}

#[test]
fn from_env_rejects_zero_timeout() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_client_env();
        std::env::set_var("IDENTITY_API_KEY", "web-key");
        std::env::set_var("API_REQUEST_TIMEOUT_SECS", "0");
    }

    assert!(matches!(ClientConfig::from_env(), Err(ConfigError::Parse(msg)) if msg.contains("greater than zero")));

    unsafe { clear_client_env() };
}

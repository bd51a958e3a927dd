use anyhow::Error;
use dotenv::dotenv;
use std::env;
use std::str::FromStr;

pub fn get_env_var(key: &str) -> Result<String, Error> {
    dotenv().ok();
    Ok(env::var(key)?)
}

/// Reads `key`, treating unset and blank values the same.
pub fn get_optional_env_var(key: &str) -> Option<String> {
    get_env_var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_env_value<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub fn split_env_list(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

use std::env::var;
use std::fmt::Display;
use std::str::FromStr;

/// Get the value of an ENV var
///
/// Only when:
/// - It is set
/// - It is not empty
pub fn env_var(var_name: &str) -> Option<String> {
    var(var_name).ok().filter(|value| !value.is_empty())
}

/// Get the value of ENV var, or a default
pub fn env_var_or_else(var_name: &'static str, or_else: fn() -> String) -> String {
    env_var(var_name).unwrap_or_else(or_else)
}

/// Get the first ENV var that is set from a list of candidates
pub fn first_env_var(var_names: &[&str]) -> Option<String> {
    var_names.iter().find_map(|var_name| env_var(var_name))
}

/// Parse an ENV var, falling back to a default when it is not set
///
/// # Errors
///
/// Will return `Err` when the value is set but can not be parsed
pub fn parse_env_var<T>(var_name: &'static str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env_var(var_name) {
        Some(value) => value
            .parse()
            .map_err(|err| anyhow::anyhow!("Invalid `{var_name}` value: {err}")),
        None => Ok(default),
    }
}

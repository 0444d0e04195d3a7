use crate::error::{ApiError, Result};
use std::env;
use std::env::VarError;
use std::path::PathBuf;
use tracing_core::Level;

/// Get environmental value [var_name]. If value is not found returns Ok(None)
pub fn get_env<T: FromString>(var_name: &str) -> Result<Option<T>> {
    get_env_impl::<Option<T>>(var_name, None)
}

/// Get environmental value [var_name]. If value is not found returns [default_value]
pub fn get_env_with_default<T: FromString>(var_name: &str, default_value: T) -> Result<T> {
    get_env_impl::<T>(var_name, default_value)
}

fn get_env_impl<T: FromString>(var_name: &str, default_value: T) -> Result<T> {
    match env::var(var_name) {
        Ok(val) => T::from_string(&val)
            .map_err(|e| ApiError::message(format!("invalid value for {var_name}: {e}"))),
        Err(VarError::NotPresent) => Ok(default_value),
        Err(VarError::NotUnicode(_)) => Err(ApiError::message(format!(
            "invalid value for {var_name}: not unicode"
        ))),
    }
}

/// Types which can be parsed from the value of an environment variable
pub trait FromString: Sized {
    fn from_string(s: &str) -> Result<Self>;
}

impl<T: FromString> FromString for Option<T> {
    fn from_string(s: &str) -> Result<Self> {
        T::from_string(s).map(Some)
    }
}

impl FromString for bool {
    fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(ApiError::message(format!("bool parsing error: {other}"))),
        }
    }
}

impl FromString for String {
    fn from_string(s: &str) -> Result<Self> {
        Ok(s.to_owned())
    }
}

impl FromString for u64 {
    fn from_string(s: &str) -> Result<Self> {
        s.parse::<u64>()
            .map_err(|_| ApiError::message(format!("u64 parsing error: {s}")))
    }
}

impl FromString for PathBuf {
    fn from_string(s: &str) -> Result<Self> {
        Ok(PathBuf::from(&s))
    }
}

impl FromString for Level {
    fn from_string(s: &str) -> Result<Self> {
        s.parse::<Level>()
            .map_err(|_| ApiError::message(format!("log level parsing error: {s}")))
    }
}

impl<T: FromString> FromString for Vec<T> {
    fn from_string(s: &str) -> Result<Self> {
        s.split(',').map(|x| T::from_string(x.trim())).collect()
    }
}

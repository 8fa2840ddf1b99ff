/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::consts::PORT_RANGE;

#[derive(Debug, Clone, thiserror::Error)]
pub enum InputError {
    #[error("Invalid name: {0}")]
    Name(String),
    #[error("Invalid repository URL: {0}")]
    Repository(String),
    #[error("Invalid password: {0}")]
    Password(String),
}

pub fn port_in_range(s: &str) -> Result<u16, String> {
    let port: usize = s
        .parse()
        .map_err(|_| format!("`{s}` is not a port number"))?;

    if PORT_RANGE.contains(&port) {
        Ok(port as u16)
    } else {
        Err(format!(
            "port not in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}

pub fn greater_than_zero<
    T: std::str::FromStr + std::cmp::PartialOrd + std::fmt::Display + Default,
>(
    s: &str,
) -> Result<T, String> {
    let num: T = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid number", s))?;

    if num > T::default() {
        Ok(num)
    } else {
        Err(format!("`{}` is not larger than 0", s))
    }
}

/// Project names become subdomains and container names, so the charset is
/// restricted to what both accept. Usernames share the same rules.
pub fn check_index_name(s: &str) -> Result<(), InputError> {
    if s.is_empty() {
        return Err(InputError::Name("name cannot be empty".to_string()));
    }

    if s.len() > 63 {
        return Err(InputError::Name(
            "name cannot be longer than 63 characters".to_string(),
        ));
    }

    if s != s.to_lowercase() {
        return Err(InputError::Name("name must be lowercase".to_string()));
    }

    if s.contains(|c: char| !c.is_ascii_alphanumeric() && c != '-') {
        return Err(InputError::Name(
            "name can only contain letters, numbers, and dashes".to_string(),
        ));
    }

    if s.starts_with('-') || s.ends_with('-') {
        return Err(InputError::Name(
            "name can only start and end with letters or numbers".to_string(),
        ));
    }

    Ok(())
}

pub fn check_repository_url(url: &str) -> Result<(), InputError> {
    if url.contains("file://") || url.starts_with("file") {
        return Err(InputError::Repository(
            "URLs pointing to local files are not allowed".to_string(),
        ));
    }

    let allowed = ["http://", "https://", "git://", "ssh://", "git@"];
    if !allowed.iter().any(|scheme| url.starts_with(scheme)) {
        return Err(InputError::Repository(
            "URL must use the http, https, git or ssh scheme".to_string(),
        ));
    }

    if url.split_whitespace().count() > 1 {
        return Err(InputError::Repository(
            "URL cannot contain whitespace".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), InputError> {
    if password.len() < 8 {
        return Err(InputError::Password(
            "password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(InputError::Password(
            "password cannot exceed 128 characters".to_string(),
        ));
    }

    Ok(())
}

pub fn load_secret(f: &str) -> String {
    let s = std::fs::read_to_string(f).unwrap_or_default();
    s.trim().replace(char::from(25), "")
}

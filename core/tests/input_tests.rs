/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Tests for input validation and parsing functions

extern crate core as slipway_core;
use slipway_core::input::*;

#[test]
fn test_port_in_range() {
    let port = port_in_range("8080").unwrap();
    assert_eq!(port, 8080);

    let port = port_in_range("65535").unwrap();
    assert_eq!(port, 65535);

    let port = port_in_range("65536").unwrap_err();
    assert_eq!(port, "port not in range 1-65535");

    let port = port_in_range("0").unwrap_err();
    assert_eq!(port, "port not in range 1-65535");

    assert!(port_in_range("not-a-port").is_err());
}

#[test]
fn test_greater_than_zero() {
    let num = greater_than_zero::<u32>("1").unwrap();
    assert_eq!(num, 1);

    assert!(greater_than_zero::<usize>("0").is_err());
    assert!(greater_than_zero::<i64>("-3").is_err());
    assert!(greater_than_zero::<u32>("abc").is_err());
}

#[test]
fn test_check_index_name() {
    assert!(check_index_name("my-app").is_ok());
    assert!(check_index_name("app42").is_ok());

    assert!(check_index_name("").is_err());
    assert!(check_index_name("My-App").is_err());
    assert!(check_index_name("-app").is_err());
    assert!(check_index_name("app-").is_err());
    assert!(check_index_name("my_app").is_err());
    assert!(check_index_name("my app").is_err());
    assert!(check_index_name(&"a".repeat(64)).is_err());
}

#[test]
fn test_check_repository_url() {
    assert!(check_repository_url("https://github.com/example/repo.git").is_ok());
    assert!(check_repository_url("http://git.example.com/repo").is_ok());
    assert!(check_repository_url("git@github.com:example/repo.git").is_ok());
    assert!(check_repository_url("ssh://git@example.com/repo.git").is_ok());

    assert!(check_repository_url("file:///etc/passwd").is_err());
    assert!(check_repository_url("ftp://example.com/repo").is_err());
    assert!(check_repository_url("https://github.com/a b").is_err());
    assert!(check_repository_url("/local/path").is_err());
}

#[test]
fn test_validate_password() {
    assert!(validate_password("longenough1").is_ok());

    assert!(validate_password("short").is_err());
    assert!(validate_password(&"x".repeat(129)).is_err());
}

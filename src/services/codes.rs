// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Random auth and invite code generation.

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};

/// Length of one-time auth codes.
pub const AUTH_CODE_LEN: usize = 4;
/// Length of invite codes.
pub const INVITE_CODE_LEN: usize = 6;

const DIGITS: &[u8] = b"0123456789";
const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a numeric one-time auth code.
pub fn generate_auth_code() -> Result<String, AppError> {
    random_string(&SystemRandom::new(), DIGITS, AUTH_CODE_LEN)
}

/// Generate an alphanumeric invite code.
pub fn generate_invite_code() -> Result<String, AppError> {
    random_string(&SystemRandom::new(), ALPHANUMERIC, INVITE_CODE_LEN)
}

/// Draw `len` characters uniformly from `alphabet`.
///
/// Bytes at or above the largest multiple of the alphabet size are
/// discarded so every character is equally likely.
fn random_string(
    rng: &dyn SecureRandom,
    alphabet: &[u8],
    len: usize,
) -> Result<String, AppError> {
    let limit = 256 - (256 % alphabet.len());
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 32];

    while out.len() < len {
        rng.fill(&mut buf)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;

        for &b in buf.iter().filter(|&&b| (b as usize) < limit) {
            out.push(alphabet[b as usize % alphabet.len()] as char);
            if out.len() == len {
                break;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_auth_code_is_four_digits() {
        for _ in 0..100 {
            let code = generate_auth_code().unwrap();
            assert_eq!(code.len(), AUTH_CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_digit()), "{code}");
        }
    }

    #[test]
    fn test_invite_code_is_six_alphanumerics() {
        for _ in 0..100 {
            let code = generate_invite_code().unwrap();
            assert_eq!(code.len(), INVITE_CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()), "{code}");
        }
    }

    #[test]
    fn test_invite_codes_vary() {
        let codes: HashSet<String> = (0..50).map(|_| generate_invite_code().unwrap()).collect();
        // 62^6 possibilities; 50 draws colliding down to a handful means a broken RNG.
        assert!(codes.len() > 45);
    }

    #[test]
    fn test_all_digits_reachable() {
        let seen: HashSet<char> = (0..500)
            .flat_map(|_| generate_auth_code().unwrap().chars().collect::<Vec<_>>())
            .collect();
        assert_eq!(seen.len(), DIGITS.len());
    }
}

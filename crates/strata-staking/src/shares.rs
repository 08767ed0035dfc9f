// crates/strata-staking/src/shares.rs
//
// Share accounting: conversion between tokens and a validator's shares.
//
// Shares are held to 18 decimal places. Conversions keep the exchange rate
// `tokens / delegator_shares` fixed; only the slashing hooks move it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use strata_core::amount::{Shares, Tokens};
use strata_core::validator::Validator;

use crate::error::StakingError;

/// Decimal places kept on share amounts.
pub const SHARE_PRECISION: u32 = 18;

/// `a * b / c`, dividing first when the product does not fit.
fn mul_div(a: Decimal, b: Decimal, c: Decimal) -> Result<Decimal, StakingError> {
    a.checked_mul(b)
        .and_then(|product| product.checked_div(c))
        .or_else(|| a.checked_div(c).and_then(|quotient| quotient.checked_mul(b)))
        .ok_or_else(|| StakingError::InvalidAmount(format!("{} * {} / {} overflows", a, b, c)))
}

fn check_rate(validator: &Validator) -> Result<(), StakingError> {
    if validator.tokens == 0 && !validator.delegator_shares.is_zero() {
        return Err(StakingError::InvalidAmount(format!(
            "validator {} has shares but no tokens",
            validator.operator
        )));
    }
    Ok(())
}

/// Shares issued for `amount` tokens at the current rate, rounded to
/// [`SHARE_PRECISION`]. A validator without tokens mints 1:1.
pub fn shares_from_tokens(validator: &Validator, amount: Tokens) -> Result<Shares, StakingError> {
    check_rate(validator)?;
    if validator.tokens == 0 {
        return Ok(Decimal::from(amount));
    }
    let shares = mul_div(
        Decimal::from(amount),
        validator.delegator_shares,
        Decimal::from(validator.tokens),
    )?;
    Ok(shares.round_dp_with_strategy(SHARE_PRECISION, RoundingStrategy::MidpointNearestEven))
}

/// Like [`shares_from_tokens`] but truncated, so the result never exceeds the
/// exact share value of `amount`.
pub fn shares_from_tokens_truncated(
    validator: &Validator,
    amount: Tokens,
) -> Result<Shares, StakingError> {
    check_rate(validator)?;
    if validator.tokens == 0 {
        return Ok(Decimal::from(amount));
    }
    let shares = mul_div(
        Decimal::from(amount),
        validator.delegator_shares,
        Decimal::from(validator.tokens),
    )?;
    Ok(shares.round_dp_with_strategy(SHARE_PRECISION, RoundingStrategy::ToZero))
}

/// Token value of `shares`, truncated toward zero.
pub fn tokens_from_shares(validator: &Validator, shares: Shares) -> Result<Tokens, StakingError> {
    if shares.is_sign_negative() && !shares.is_zero() {
        return Err(StakingError::InvalidAmount(format!(
            "negative share amount {}",
            shares
        )));
    }
    if validator.delegator_shares.is_zero() {
        return Ok(0);
    }
    let tokens = mul_div(
        shares,
        Decimal::from(validator.tokens),
        validator.delegator_shares,
    )?;
    tokens
        .trunc()
        .to_u64()
        .ok_or_else(|| StakingError::InvalidAmount(format!("{} tokens out of range", tokens)))
}

/// Bond `amount` tokens to the validator and return the shares issued.
pub fn add_tokens(validator: &mut Validator, amount: Tokens) -> Result<Shares, StakingError> {
    let issued = shares_from_tokens(validator, amount)?;
    validator.tokens = validator.tokens.checked_add(amount).ok_or_else(|| {
        StakingError::InvalidAmount(format!("validator token total overflows adding {}", amount))
    })?;
    validator.delegator_shares += issued;
    Ok(issued)
}

/// Burn `shares` from the validator and return the tokens they released.
///
/// Burning the last shares releases every remaining token so no residue is
/// left behind a validator without shares.
///
/// # Panics
/// If `shares` exceeds the validator's outstanding shares. Callers check the
/// delegation first, so this only fires on corrupted state.
pub fn remove_shares(validator: &mut Validator, shares: Shares) -> Result<Tokens, StakingError> {
    let remaining = validator.delegator_shares - shares;
    if remaining.is_sign_negative() && !remaining.is_zero() {
        tracing::error!(
            "Validator {} would hold negative shares: {} - {}",
            validator.operator,
            validator.delegator_shares,
            shares
        );
        panic!("negative delegator shares on validator {}", validator.operator);
    }

    let released = if remaining.is_zero() {
        validator.tokens
    } else {
        tokens_from_shares(validator, shares)?.min(validator.tokens)
    };
    validator.tokens -= released;
    validator.delegator_shares = remaining;
    Ok(released)
}

//! Promo codes resolved to a discount amount against the current subtotal.

use rust_decimal::Decimal;
use crate::domain::value_objects::{Money, PromoCode};
use crate::{EcommerceError, Result};

/// Percentage-off codes as fractional rates.
const PROMO_RATES: &[(&str, Decimal)] = &[
    ("WELCOME10", Decimal::from_parts(10, 0, 0, false, 2)),
    ("SUMMER20", Decimal::from_parts(20, 0, 0, false, 2)),
    ("FLASH30", Decimal::from_parts(30, 0, 0, false, 2)),
];

pub fn rate_for(code: &PromoCode) -> Option<Decimal> {
    PROMO_RATES.iter().find(|(name, _)| *name == code.as_str()).map(|(_, rate)| *rate)
}

/// Resolves `raw` to the discount it grants on `subtotal`, rounded to cents.
pub fn redeem(raw: &str, subtotal: Money) -> Result<(PromoCode, Money)> {
    let code = PromoCode::new(raw)?;
    let rate = rate_for(&code).ok_or_else(|| EcommerceError::InvalidPromoCode(code.to_string()))?;
    Ok((code, subtotal.percent_of(rate)))
}

//! Revenue split between the platform and a cafeteria.

use unieats_config::PricingConfig;
use unieats_database::RevenueSplit;

const BPS_DENOMINATOR: i64 = 10_000;

/// `amount * bps / 10000`, rounded half up. Amounts are never negative.
fn apply_bps(amount_cents: i64, bps: u32) -> Option<i64> {
    let scaled = amount_cents.checked_mul(i64::from(bps))?;
    Some(scaled.checked_add(BPS_DENOMINATOR / 2)? / BPS_DENOMINATOR)
}

/// The student pays the subtotal plus a service fee; the platform keeps the fee
/// and a commission withheld from the cafeteria.
///
/// Returns `None` if any amount overflows.
pub fn revenue_split(subtotal_cents: i64, pricing: &PricingConfig) -> Option<RevenueSplit> {
    let service_fee_cents = apply_bps(subtotal_cents, pricing.service_fee_bps)?;
    let commission_cents = apply_bps(subtotal_cents, pricing.commission_bps)?;

    Some(RevenueSplit {
        subtotal_cents,
        service_fee_cents,
        commission_cents,
        total_cents: subtotal_cents.checked_add(service_fee_cents)?,
        admin_revenue_cents: service_fee_cents.checked_add(commission_cents)?,
        cafeteria_revenue_cents: subtotal_cents.checked_sub(commission_cents)?,
    })
}

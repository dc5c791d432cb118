//! Discount vouchers: validity checks and discount computation.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::error::CheckoutError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "percentage" => Some(Self::Percentage),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Voucher row. Codes are stored upper-cased; lookups are case-insensitive.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Voucher {
    pub id: Uuid,
    pub code: String,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub min_purchase: Decimal,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Voucher {
    pub fn discount_type(&self) -> Option<DiscountType> {
        DiscountType::parse(&self.discount_type)
    }

    /// Validates the voucher against `subtotal` at `now` and returns the
    /// discount amount.
    ///
    /// The result is rounded to whole taka and clamped to `[0, subtotal]`;
    /// a discount never exceeds the subtotal and never applies to shipping.
    pub fn discount_for(
        &self,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Decimal, CheckoutError> {
        if !self.is_active {
            return Err(CheckoutError::VoucherInactive);
        }
        if let Some(from) = self.valid_from {
            if now < from {
                return Err(CheckoutError::VoucherNotYetActive);
            }
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return Err(CheckoutError::VoucherExpired);
            }
        }
        if self.min_purchase > Decimal::ZERO && subtotal < self.min_purchase {
            return Err(CheckoutError::MinimumPurchaseNotMet {
                min: self.min_purchase,
            });
        }
        if let Some(max) = self.max_uses {
            if self.current_uses >= max {
                return Err(CheckoutError::VoucherExhausted);
            }
        }
        if self.discount_value <= Decimal::ZERO {
            return Err(CheckoutError::VoucherMisconfigured);
        }

        let raw = match self.discount_type() {
            Some(DiscountType::Percentage) => subtotal * self.discount_value / Decimal::from(100),
            Some(DiscountType::Fixed) => self.discount_value,
            None => return Err(CheckoutError::VoucherMisconfigured),
        };

        // Rounding happens before the clamp; the result can never land
        // above the subtotal.
        let rounded = raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Ok(rounded.clamp(Decimal::ZERO, subtotal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voucher(discount_type: &str, value: i64) -> Voucher {
        Voucher {
            id: Uuid::new_v4(),
            code: "SAVE10".to_string(),
            discount_type: discount_type.to_string(),
            discount_value: Decimal::from(value),
            min_purchase: Decimal::ZERO,
            max_uses: None,
            current_uses: 0,
            valid_from: None,
            valid_until: None,
            is_active: true,
        }
    }

    #[test]
    fn test_percentage_discount() {
        let v = voucher("percentage", 10);
        let d = v.discount_for(Decimal::from(1000), Utc::now()).unwrap();
        assert_eq!(d, Decimal::from(100));
        // Recomputation from the same inputs is idempotent.
        assert_eq!(v.discount_for(Decimal::from(1000), Utc::now()).unwrap(), d);
    }

    #[test]
    fn test_fixed_discount() {
        let v = voucher("fixed", 150);
        let d = v.discount_for(Decimal::from(1000), Utc::now()).unwrap();
        assert_eq!(d, Decimal::from(150));
    }

    #[test]
    fn test_discount_rounds_to_whole_taka() {
        let v = voucher("percentage", 10);
        // 10% of 335 = 33.5, midpoint rounds away from zero
        let d = v.discount_for(Decimal::from(335), Utc::now()).unwrap();
        assert_eq!(d, Decimal::from(34));
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        let subtotal = Decimal::from(400);
        for value in [101, 150, 500, 1_000_000] {
            for kind in ["percentage", "fixed"] {
                let d = voucher(kind, value)
                    .discount_for(subtotal, Utc::now())
                    .unwrap();
                assert!(d >= Decimal::ZERO, "{kind} {value} went negative");
                assert!(d <= subtotal, "{kind} {value} exceeded subtotal");
            }
        }
    }

    #[test]
    fn test_inactive() {
        let mut v = voucher("percentage", 10);
        v.is_active = false;
        // Inactivity wins even when the window has also lapsed.
        v.valid_until = Some(Utc::now() - chrono::Duration::days(1));
        assert!(matches!(
            v.discount_for(Decimal::from(1000), Utc::now()),
            Err(CheckoutError::VoucherInactive)
        ));
    }

    #[test]
    fn test_not_yet_active() {
        let mut v = voucher("percentage", 10);
        v.valid_from = Some(Utc::now() + chrono::Duration::days(1));
        assert!(matches!(
            v.discount_for(Decimal::from(1000), Utc::now()),
            Err(CheckoutError::VoucherNotYetActive)
        ));
    }

    #[test]
    fn test_expired() {
        let mut v = voucher("percentage", 10);
        v.valid_until = Some(Utc::now() - chrono::Duration::days(1));
        assert!(matches!(
            v.discount_for(Decimal::from(1000), Utc::now()),
            Err(CheckoutError::VoucherExpired)
        ));
    }

    #[test]
    fn test_minimum_purchase() {
        let mut v = voucher("percentage", 10);
        v.min_purchase = Decimal::from(500);
        let err = v.discount_for(Decimal::from(400), Utc::now()).unwrap_err();
        assert!(matches!(err, CheckoutError::MinimumPurchaseNotMet { .. }));
        assert!(err.to_string().contains("500"));
        // Exactly at the threshold passes.
        assert!(v.discount_for(Decimal::from(500), Utc::now()).is_ok());
    }

    #[test]
    fn test_exhausted() {
        let mut v = voucher("percentage", 10);
        v.max_uses = Some(5);
        v.current_uses = 5;
        assert!(matches!(
            v.discount_for(Decimal::from(1000), Utc::now()),
            Err(CheckoutError::VoucherExhausted)
        ));
        v.current_uses = 4;
        assert!(v.discount_for(Decimal::from(1000), Utc::now()).is_ok());
    }

    #[test]
    fn test_misconfigured() {
        assert!(matches!(
            voucher("percentage", 0).discount_for(Decimal::from(1000), Utc::now()),
            Err(CheckoutError::VoucherMisconfigured)
        ));
        assert!(matches!(
            voucher("bogof", 10).discount_for(Decimal::from(1000), Utc::now()),
            Err(CheckoutError::VoucherMisconfigured)
        ));
    }
}

//! Flat-rate shipping: a 2x2 lookup over delivery zone and speed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Coarse shipping zone relative to the primary service area (Dhaka).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryZone {
    Inside,
    Outside,
}

impl DeliveryZone {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inside => "inside",
            Self::Outside => "outside",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShippingSpeed {
    #[default]
    Standard,
    Express,
}

impl ShippingSpeed {
    /// Missing or unrecognized values fall back to standard delivery.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("express") => Self::Express,
            _ => Self::Standard,
        }
    }
}

const INSIDE_BASE: u32 = 60;
const OUTSIDE_BASE: u32 = 120;
const INSIDE_EXPRESS_SURCHARGE: u32 = 60;
const OUTSIDE_EXPRESS_SURCHARGE: u32 = 80;

pub fn shipping_cost(zone: DeliveryZone, speed: ShippingSpeed) -> Decimal {
    let amount = match (zone, speed) {
        (DeliveryZone::Inside, ShippingSpeed::Standard) => INSIDE_BASE,
        (DeliveryZone::Inside, ShippingSpeed::Express) => INSIDE_BASE + INSIDE_EXPRESS_SURCHARGE,
        (DeliveryZone::Outside, ShippingSpeed::Standard) => OUTSIDE_BASE,
        (DeliveryZone::Outside, ShippingSpeed::Express) => OUTSIDE_BASE + OUTSIDE_EXPRESS_SURCHARGE,
    };
    Decimal::from(amount)
}

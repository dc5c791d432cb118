//! Checkout identity: authenticated account or guest with inline details.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::normalize::{normalize_phone, valid_zip};
use crate::error::CheckoutError;

/// Who is checking out, decided by the presence of a bearer credential.
#[derive(Clone, Debug)]
pub enum CheckoutIdentity {
    Authenticated { user_id: Uuid },
    Guest(GuestDetails),
}

/// Contact and address details captured inline for guest checkout.
/// Every field defaults to empty so absent keys fail validation with a
/// field-specific message instead of a body rejection.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct GuestDetails {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub phone: String,
    #[validate(length(min = 1, message = "Division is required"))]
    pub division: String,
    #[validate(length(min = 1, message = "District is required"))]
    pub district: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "Road or area is required"))]
    pub road: String,
    pub zip_code: Option<String>,
    pub address: String,
}

/// Normalized contact and shipping details for one order.
#[derive(Clone, Debug)]
pub struct ResolvedCustomer {
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub contact_phone: String,
    pub shipping_address: String,
    pub email: Option<String>,
}

impl GuestDetails {
    pub fn resolve(&self) -> Result<ResolvedCustomer, CheckoutError> {
        self.validate()
            .map_err(|e| CheckoutError::InvalidGuestDetails(first_message(&e)))?;

        let phone = normalize_phone(&self.phone)?;

        if let Some(zip) = self.zip_code.as_deref().map(str::trim) {
            if !zip.is_empty() && !valid_zip(zip) {
                return Err(CheckoutError::InvalidGuestDetails(
                    "Zip code must be exactly 4 digits".to_string(),
                ));
            }
        }

        Ok(ResolvedCustomer {
            user_id: None,
            customer_name: self.full_name.trim().to_string(),
            contact_phone: phone,
            shipping_address: self.shipping_address(),
            email: None,
        })
    }

    fn shipping_address(&self) -> String {
        let parts: Vec<&str> = [
            self.address.as_str(),
            self.road.as_str(),
            self.city.as_str(),
            self.district.as_str(),
            self.division.as_str(),
        ]
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

        let mut line = parts.join(", ");
        if let Some(zip) = self.zip_code.as_deref().map(str::trim).filter(|z| !z.is_empty()) {
            line.push_str(" - ");
            line.push_str(zip);
        }
        line
    }
}

/// Profile row of an authenticated account.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub email: Option<String>,
}

impl Profile {
    /// A profile can only check out when name, phone and address are all
    /// filled in; a stored phone that cannot be normalized counts as missing.
    pub fn resolve(self) -> Result<ResolvedCustomer, CheckoutError> {
        let name = self.full_name.trim();
        let address = self.address.trim();
        if name.is_empty() || self.phone.trim().is_empty() || address.is_empty() {
            return Err(CheckoutError::IncompleteProfile);
        }
        let phone =
            normalize_phone(&self.phone).map_err(|_| CheckoutError::IncompleteProfile)?;

        Ok(ResolvedCustomer {
            user_id: Some(self.user_id),
            customer_name: name.to_string(),
            contact_phone: phone,
            shipping_address: address.to_string(),
            email: self.email,
        })
    }
}

fn first_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(ToString::to_string))
        .unwrap_or_else(|| "Invalid guest details".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest() -> GuestDetails {
        GuestDetails {
            full_name: "Rahim Uddin".to_string(),
            phone: "+8801712345678".to_string(),
            division: "Dhaka".to_string(),
            district: "Dhaka".to_string(),
            city: "Dhaka".to_string(),
            road: "Road 12, Banani".to_string(),
            zip_code: Some("1213".to_string()),
            address: "House 7".to_string(),
        }
    }

    #[test]
    fn test_guest_resolves() {
        let customer = guest().resolve().unwrap();
        assert_eq!(customer.contact_phone, "01712345678");
        assert_eq!(customer.customer_name, "Rahim Uddin");
        assert_eq!(
            customer.shipping_address,
            "House 7, Road 12, Banani, Dhaka, Dhaka, Dhaka - 1213"
        );
        assert!(customer.user_id.is_none());
    }

    #[test]
    fn test_guest_missing_field() {
        let mut g = guest();
        g.district = String::new();
        let err = g.resolve().unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidGuestDetails(_)));
        assert_eq!(err.to_string(), "District is required");
    }

    #[test]
    fn test_guest_bad_phone() {
        let mut g = guest();
        g.phone = "12345".to_string();
        assert!(matches!(g.resolve(), Err(CheckoutError::InvalidPhone)));
    }

    #[test]
    fn test_guest_bad_zip() {
        let mut g = guest();
        g.zip_code = Some("12".to_string());
        assert!(matches!(
            g.resolve(),
            Err(CheckoutError::InvalidGuestDetails(_))
        ));
    }

    #[test]
    fn test_guest_zip_optional() {
        let mut g = guest();
        g.zip_code = None;
        let customer = g.resolve().unwrap();
        assert!(!customer.shipping_address.contains(" - "));
    }

    #[test]
    fn test_profile_requires_all_fields() {
        let profile = Profile {
            user_id: Uuid::new_v4(),
            full_name: "Karim".to_string(),
            phone: String::new(),
            address: "Mirpur 10, Dhaka".to_string(),
            email: None,
        };
        assert!(matches!(
            profile.resolve(),
            Err(CheckoutError::IncompleteProfile)
        ));
    }

    #[test]
    fn test_profile_normalizes_phone() {
        let profile = Profile {
            user_id: Uuid::new_v4(),
            full_name: "Karim".to_string(),
            phone: "8801912345678".to_string(),
            address: "Mirpur 10, Dhaka".to_string(),
            email: Some("karim@example.com".to_string()),
        };
        let customer = profile.resolve().unwrap();
        assert_eq!(customer.contact_phone, "01912345678");
        assert_eq!(customer.email.as_deref(), Some("karim@example.com"));
    }

    #[test]
    fn test_profile_unusable_phone_is_incomplete() {
        let profile = Profile {
            user_id: Uuid::new_v4(),
            full_name: "Karim".to_string(),
            phone: "not-a-phone".to_string(),
            address: "Mirpur 10, Dhaka".to_string(),
            email: None,
        };
        assert!(matches!(
            profile.resolve(),
            Err(CheckoutError::IncompleteProfile)
        ));
    }
}

use rail_shared::Masked;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer account with a prepaid wallet. Contact details stay masked in
/// logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub email: Masked<String>,
    pub phone_number: Masked<String>,
    pub wallet_balance: Decimal,
    pub version: i64,
}

impl User {
    pub fn new(
        user_name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        wallet_balance: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_name: user_name.into(),
            email: Masked::new(email.into()),
            phone_number: Masked::new(phone_number.into()),
            wallet_balance,
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_masks_contact_details() {
        let user = User::new("meera", "meera@rail.example", "9800000000", Decimal::new(500, 0));
        let debug = format!("{:?}", user);

        assert!(!debug.contains("meera@rail.example"));
        assert!(!debug.contains("9800000000"));
        assert!(debug.contains("meera"));
    }
}

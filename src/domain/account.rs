use crate::error::TransferError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Opaque account identity.
///
/// `Ord` matters here: two-account lock acquisition orders by id, which is
/// what keeps concurrent transfers over overlapping pairs deadlock-free.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monetary balance with fixed-point decimal precision.
///
/// Wraps `rust_decimal::Decimal` so balance arithmetic stays exact and
/// type-checked against raw decimals leaking into the domain.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A strictly positive transfer amount.
///
/// The constructor is the only way in, so a zero or negative amount is
/// rejected before any transaction record exists.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, TransferError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(TransferError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = TransferError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An internally-held account: identity plus current balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Balance,
}

impl Account {
    pub fn new(id: AccountId, balance: Balance) -> Self {
        Self { id, balance }
    }

    /// Whether the balance covers `amount` in full.
    pub fn can_cover(&self, amount: Amount) -> bool {
        self.balance >= amount.into()
    }

    /// Adds `amount` to the balance.
    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount.into();
    }

    /// Subtracts `amount` from the balance, refusing to go negative.
    pub fn debit(&mut self, amount: Amount) -> Result<(), TransferError> {
        if self.can_cover(amount) {
            self.balance -= amount.into();
            Ok(())
        } else {
            Err(TransferError::InsufficientFunds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_must_be_positive() {
        assert!(Amount::new(dec!(0.01)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(TransferError::InvalidAmount)
        ));
        assert!(matches!(
            Amount::new(dec!(-5.0)),
            Err(TransferError::InvalidAmount)
        ));
    }

    #[test]
    fn test_balance_arithmetic() {
        let b1 = Balance::new(dec!(10.0));
        let b2 = Balance::new(dec!(2.5));
        assert_eq!(b1 + b2, Balance::new(dec!(12.5)));
        assert_eq!(b1 - b2, Balance::new(dec!(7.5)));
    }

    #[test]
    fn test_debit_success() {
        let mut account = Account::new(AccountId(1), Balance::new(dec!(100.0)));
        account.debit(Amount::new(dec!(30.0)).unwrap()).unwrap();
        assert_eq!(account.balance, Balance::new(dec!(70.0)));
    }

    #[test]
    fn test_debit_refuses_overdraft() {
        let mut account = Account::new(AccountId(1), Balance::new(dec!(10.0)));
        let result = account.debit(Amount::new(dec!(50.0)).unwrap());
        assert!(matches!(result, Err(TransferError::InsufficientFunds)));
        assert_eq!(account.balance, Balance::new(dec!(10.0)));
    }

    #[test]
    fn test_debit_exact_balance() {
        let mut account = Account::new(AccountId(1), Balance::new(dec!(10.0)));
        account.debit(Amount::new(dec!(10.0)).unwrap()).unwrap();
        assert_eq!(account.balance, Balance::ZERO);
    }

    #[test]
    fn test_credit() {
        let mut account = Account::new(AccountId(2), Balance::ZERO);
        account.credit(Amount::new(dec!(30.0)).unwrap());
        assert_eq!(account.balance, Balance::new(dec!(30.0)));
    }
}

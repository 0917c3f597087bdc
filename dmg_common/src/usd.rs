use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const USD_CURRENCY_CODE: &str = "USD";

//--------------------------------------        Usd         ----------------------------------------------------------
/// Whole US dollars. Diamond prices in the B2B group are quoted in round dollar amounts, so there
/// is no cents component to carry around.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Usd(i64);

op!(binary Usd, Add, add);
op!(binary Usd, Sub, sub);
op!(inplace Usd, SubAssign, sub_assign);
op!(unary Usd, Neg, neg);

impl Mul<i64> for Usd {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in whole dollars: {0}")]
pub struct UsdConversionError(String);

impl From<i64> for Usd {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Usd {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Usd {}

impl TryFrom<f64> for Usd {
    type Error = UsdConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 || value > i64::MAX as f64 {
            Err(UsdConversionError(format!("{value} is not a usable dollar amount")))
        } else {
            #[allow(clippy::cast_possible_truncation)]
            Ok(Self(value.round() as i64))
        }
    }
}

impl Display for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl Usd {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_thousands(thousands: i64) -> Self {
        Self(thousands * 1_000)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }
}

//! Pre-trade checks: size and price positivity plus a minimum notional.

pub mod profiles;
pub mod rules;

pub use profiles::OrderLimits;
pub use rules::OrderGuard;

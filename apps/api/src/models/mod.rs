pub mod pass;
pub mod redemption;

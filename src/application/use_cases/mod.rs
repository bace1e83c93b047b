pub mod access;
pub mod admin;
pub mod billing;
pub mod entitlement;
pub mod ops;

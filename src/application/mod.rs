pub mod app_error;
pub mod jwt;
pub mod ports;
pub mod pricing;
pub mod use_cases;
pub mod validators;

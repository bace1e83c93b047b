pub mod entitlement;
pub mod location;
pub mod order;
pub mod product;
pub mod profile;

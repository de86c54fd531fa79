// handlers/landlord/mod.rs - Platform administration
//
// Public context only; under a tenant prefix every landlord route answers 404.

pub mod tenant;

pub mod catalog;
pub mod checkout;
pub mod customers;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod subscription_period;

pub mod customer;
pub mod order;
pub mod order_item;
pub mod product;
pub mod subscription_plan;

//! Business rules, kept free of HTTP and database concerns.

pub mod cart;
pub mod category;
pub mod order;
pub mod product;

pub use cart::{clamp_quantity, merge_decision, same_variation_set, ExistingItem, MergeDecision};
pub use category::{slugify, ParentKey, SizeChart, SizeConfig, SizeConfigError};
pub use order::{order_number, order_totals, OrderStatus, Totals};

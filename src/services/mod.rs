pub mod catalog;
pub mod invoicing;
pub mod purchases;

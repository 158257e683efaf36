pub mod carts;
pub mod checkout;
pub mod menu;
pub mod orders;
pub mod sales;

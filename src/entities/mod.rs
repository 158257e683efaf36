pub mod daily_sales;
pub mod menu_item;
pub mod order;

pub mod blog_post;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod review;
pub mod user;
pub mod wishlist_item;

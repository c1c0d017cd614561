pub mod blog;
pub mod catalog;
pub mod dashboard;
pub mod orders;
pub mod reviews;
pub(crate) mod slug;
pub mod wishlist;

pub use blog::BlogService;
pub use catalog::CatalogService;
pub use dashboard::DashboardService;
pub use orders::OrderService;
pub use reviews::ReviewService;
pub use wishlist::WishlistService;

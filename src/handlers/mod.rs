use std::sync::Arc;

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::services::{
    BlogService, CatalogService, DashboardService, OrderService, ReviewService, WishlistService,
};

pub mod blog;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod wishlist;

/// Service container shared by all handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub catalog: Arc<CatalogService>,
    pub blog: Arc<BlogService>,
    pub reviews: Arc<ReviewService>,
    pub wishlist: Arc<WishlistService>,
    pub dashboard: Arc<DashboardService>,
}

/// Back-office routes reject non-admin principals outright. The caller is
/// authenticated, just not allowed, so this is a 403 rather than the 404
/// used for ownership scoping.
pub fn require_admin(auth_user: &AuthUser) -> Result<(), ServiceError> {
    if !auth_user.is_admin() {
        return Err(ServiceError::Forbidden(
            "Administrator role required".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ROLE_ADMIN, ROLE_CUSTOMER};
    use uuid::Uuid;

    fn user_with_role(role: &str) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            name: "t".into(),
            email: "t@example.com".into(),
            role: role.into(),
            token_id: Uuid::new_v4().to_string(),
        }
    }

    #[test]
    fn admin_gate_rejects_customers() {
        assert!(require_admin(&user_with_role(ROLE_ADMIN)).is_ok());
        assert!(matches!(
            require_admin(&user_with_role(ROLE_CUSTOMER)),
            Err(ServiceError::Forbidden(_))
        ));
    }
}

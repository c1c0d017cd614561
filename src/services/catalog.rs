use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::slug::{slugify, with_timestamp_suffix};
use crate::db::DbPool;
use crate::entities::{category, product};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Derived from the name when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Option<Uuid>>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub featured: Option<bool>,
    /// Forced on for public listings; admins may pass `false` to see
    /// deactivated rows.
    pub active_only: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub slug: Option<String>,
}

pub struct CatalogService {
    db: DbPool,
}

impl CatalogService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must not be negative".into(),
            ));
        }

        let base = match &input.slug {
            Some(raw) => slugify(raw),
            None => slugify(&input.name),
        };
        let slug = self.resolve_product_slug(base, None).await?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description),
            sku: Set(input.sku),
            price: Set(input.price),
            category_id: Set(input.category_id),
            images: Set(json!(input.images)),
            is_active: Set(input.is_active),
            is_featured: Set(input.is_featured),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;
        info!(product_id = %saved.id, slug = %saved.slug, "product created");
        Ok(saved)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let current = product::Entity::find_by_id(product_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price must not be negative".into(),
                ));
            }
        }

        // Re-slug when either the slug or the name is edited.
        let new_slug = match (&input.slug, &input.name) {
            (Some(raw), _) => Some(slugify(raw)),
            (None, Some(name)) => Some(slugify(name)),
            (None, None) => None,
        };
        let resolved_slug = match new_slug {
            Some(base) => Some(self.resolve_product_slug(base, Some(product_id)).await?),
            None => None,
        };

        let mut active: product::ActiveModel = current.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = resolved_slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(sku) = input.sku {
            active.sku = Set(sku);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(images) = input.images {
            active.images = Set(json!(images));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(is_featured) = input.is_featured {
            active.is_featured = Set(is_featured);
        }

        Ok(active.update(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let result = product::Entity::delete_by_id(product_id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }
        info!(product_id = %product_id, "product deleted");
        Ok(())
    }

    /// Public read: active products only.
    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<product::Model, ServiceError> {
        product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(product::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        limit: u64,
        filter: ProductFilter,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = product::Entity::find().order_by_desc(product::Column::CreatedAt);
        if filter.active_only {
            query = query.filter(product::Column::IsActive.eq(true));
        }
        if let Some(featured) = filter.featured {
            query = query.filter(product::Column::IsFeatured.eq(featured));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }

        let paginator = query.paginate(&self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;

        let slug = match &input.slug {
            Some(raw) => slugify(raw),
            None => slugify(&input.name),
        };
        let taken = category::Entity::find()
            .filter(category::Column::Slug.eq(slug.clone()))
            .one(&self.db)
            .await?
            .is_some();
        let slug = if taken { with_timestamp_suffix(&slug) } else { slug };

        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            created_at: Set(chrono::Utc::now()),
        };
        Ok(model.insert(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Pick a free slug, excluding the row being edited from the collision
    /// check so a product keeping its own slug is never suffixed.
    async fn resolve_product_slug(
        &self,
        base: String,
        exclude_id: Option<Uuid>,
    ) -> Result<String, ServiceError> {
        let mut query = product::Entity::find().filter(product::Column::Slug.eq(base.clone()));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }
        let taken = query.one(&self.db).await?.is_some();
        Ok(if taken { with_timestamp_suffix(&base) } else { base })
    }
}

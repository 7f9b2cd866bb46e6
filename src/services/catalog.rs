use crate::{
    entities::{brand, category, product, Brand, Category, Product},
    entities::{BrandModel, CategoryModel, ProductModel},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Parts-finder results are capped; the match is heuristic, not a
/// normalized make/model join.
const PARTS_SEARCH_CAP: usize = 50;

/// Catalog service: product listing/search, slug lookup, the make/model
/// parts-finder, and the idempotent category/brand upserts used by the
/// seeder.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

/// Closed sort-mode enumeration for product listings. Anything
/// unrecognized falls back to `Newest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl SortBy {
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("price_asc") => SortBy::PriceAsc,
            Some("price_desc") => SortBy::PriceDesc,
            Some("name") => SortBy::Name,
            _ => SortBy::Newest,
        }
    }
}

/// Flat optional filters translated into one predicate + ordering +
/// pagination window over active products.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: SortBy,
}

/// Pagination metadata returned alongside every product page so callers
/// can render pagination without a second round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            total.div_ceil(limit)
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// A product with its category and brand joined in.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductModel,
    pub category: CategoryModel,
    pub brand: BrandModel,
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<ProductDetail>,
    pub pagination: Pagination,
}

/// Input for the idempotent category upsert (keyed by slug).
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertCategoryInput {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Input for the idempotent brand upsert (keyed by slug).
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertBrandInput {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_qty: i32,
    pub images: Vec<String>,
    pub specs: serde_json::Value,
    pub category_id: Uuid,
    pub brand_id: Uuid,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists active products matching the composed filters, newest-first
    /// by default, one page at a time.
    ///
    /// Unknown category/brand slugs, out-of-range pages, and inverted
    /// price bounds all yield an empty page rather than an error.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        // Slug filters are resolved to ids up front; an unknown slug can
        // never match anything.
        let category_id = match &query.category {
            Some(slug) => match self.find_category_id(slug).await? {
                Some(id) => Some(id),
                None => {
                    return Ok(ProductPage {
                        products: Vec::new(),
                        pagination: Pagination::new(page, limit, 0),
                    })
                }
            },
            None => None,
        };
        let brand_id = match &query.brand {
            Some(slug) => match self.find_brand_id(slug).await? {
                Some(id) => Some(id),
                None => {
                    return Ok(ProductPage {
                        products: Vec::new(),
                        pagination: Pagination::new(page, limit, 0),
                    })
                }
            },
            None => None,
        };

        let mut select = Product::find().filter(product::Column::IsActive.eq(true));

        if let Some(term) = normalized_search(query.search.as_deref()) {
            select = select.filter(text_contains_condition(&term));
        }
        if let Some(id) = category_id {
            select = select.filter(product::Column::CategoryId.eq(id));
        }
        if let Some(id) = brand_id {
            select = select.filter(product::Column::BrandId.eq(id));
        }
        if let Some(min) = query.min_price {
            select = select.filter(product::Column::Price.gte(min));
        }
        if let Some(max) = query.max_price {
            select = select.filter(product::Column::Price.lte(max));
        }

        select = match query.sort_by {
            SortBy::Newest => select.order_by_desc(product::Column::CreatedAt),
            SortBy::PriceAsc => select.order_by_asc(product::Column::Price),
            SortBy::PriceDesc => select.order_by_desc(product::Column::Price),
            SortBy::Name => select.order_by_asc(product::Column::Name),
        };

        let paginator = select.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;
        let products = self.attach_refs(products).await?;

        Ok(ProductPage {
            products,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// Resolves a single active product by its public slug.
    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductDetail, ServiceError> {
        let product = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let mut detail = self.attach_refs(vec![product]).await?;
        detail
            .pop()
            .ok_or_else(|| ServiceError::InternalError("product lost its references".to_string()))
    }

    /// Make/model compatibility search for the parts-finder.
    ///
    /// Restricts to active products in a category whose name contains
    /// "Spare Parts", then keeps products where the make (or, when given,
    /// the model) appears in the name, the description, or the
    /// `compatibleMakes`/`compatibleModels` arrays in `specs`. The array
    /// check runs application-side so behavior is identical across
    /// SQLite and Postgres.
    #[instrument(skip(self))]
    pub async fn search_parts(
        &self,
        make: &str,
        model: Option<&str>,
    ) -> Result<Vec<ProductDetail>, ServiceError> {
        let spare_parts = Product::find()
            .filter(product::Column::IsActive.eq(true))
            .join(JoinType::InnerJoin, product::Relation::Category.def())
            .filter(
                Expr::expr(Func::lower(Expr::col((
                    category::Entity,
                    category::Column::Name,
                ))))
                .like("%spare parts%"),
            )
            .all(&*self.db)
            .await?;

        let mut matched: Vec<ProductModel> = spare_parts
            .into_iter()
            .filter(|p| {
                matches_term(p, make, "compatibleMakes")
                    || model
                        .map(|m| matches_term(p, m, "compatibleModels"))
                        .unwrap_or(false)
            })
            .collect();
        matched.truncate(PARTS_SEARCH_CAP);

        self.attach_refs(matched).await
    }

    /// Creates the category if its slug is new; otherwise returns the
    /// existing row untouched. Categories are never hard-deleted.
    #[instrument(skip(self))]
    pub async fn upsert_category(
        &self,
        input: UpsertCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        if let Some(existing) = Category::find()
            .filter(category::Column::Slug.eq(input.slug.as_str()))
            .one(&*self.db)
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(input.slug),
            name: Set(input.name),
            description: Set(input.description),
            image_url: Set(input.image_url),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;
        info!("Created category: {}", created.slug);
        Ok(created)
    }

    /// Same upsert lifecycle as categories, keyed by slug.
    #[instrument(skip(self))]
    pub async fn upsert_brand(&self, input: UpsertBrandInput) -> Result<BrandModel, ServiceError> {
        if let Some(existing) = Brand::find()
            .filter(brand::Column::Slug.eq(input.slug.as_str()))
            .one(&*self.db)
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let model = brand::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(input.slug),
            name: Set(input.name),
            description: Set(input.description),
            logo_url: Set(input.logo_url),
            website: Set(input.website),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;
        info!("Created brand: {}", created.slug);
        Ok(created)
    }

    /// Inserts a product unless its slug already exists (seed idempotency).
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        if let Some(existing) = Product::find()
            .filter(product::Column::Slug.eq(input.slug.as_str()))
            .one(&*self.db)
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(input.slug),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            stock_qty: Set(input.stock_qty),
            images: Set(serde_json::json!(input.images)),
            specs: Set(input.specs),
            is_active: Set(true),
            category_id: Set(input.category_id),
            brand_id: Set(input.brand_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;
        info!("Created product: {}", created.slug);
        Ok(created)
    }

    async fn find_category_id(&self, slug: &str) -> Result<Option<Uuid>, ServiceError> {
        Ok(Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .map(|c| c.id))
    }

    async fn find_brand_id(&self, slug: &str) -> Result<Option<Uuid>, ServiceError> {
        Ok(Brand::find()
            .filter(brand::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .map(|b| b.id))
    }

    /// Batch-loads the category and brand rows for a page of products.
    pub(crate) async fn attach_refs(
        &self,
        products: Vec<ProductModel>,
    ) -> Result<Vec<ProductDetail>, ServiceError> {
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let category_ids: Vec<Uuid> = products.iter().map(|p| p.category_id).collect();
        let brand_ids: Vec<Uuid> = products.iter().map(|p| p.brand_id).collect();

        let categories: HashMap<Uuid, CategoryModel> = Category::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let brands: HashMap<Uuid, BrandModel> = Brand::find()
            .filter(brand::Column::Id.is_in(brand_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        products
            .into_iter()
            .map(|product| {
                let category = categories.get(&product.category_id).cloned().ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "product {} references missing category",
                        product.id
                    ))
                })?;
                let brand = brands.get(&product.brand_id).cloned().ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "product {} references missing brand",
                        product.id
                    ))
                })?;
                Ok(ProductDetail {
                    product,
                    category,
                    brand,
                })
            })
            .collect()
    }
}

/// Empty or whitespace-only search input means "no search filter".
fn normalized_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// Case-insensitive substring match over name OR description, expressed
/// with `lower(...) LIKE` so it behaves the same on every backend.
/// `%`, `_`, and `\` in the term are matched literally, not as wildcards.
fn text_contains_condition(term_lower: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(term_lower));
    Condition::any()
        .add(
            Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
        .add(
            Expr::expr(Func::lower(Expr::col(product::Column::Description)))
                .like(LikeExpr::new(pattern).escape('\\')),
        )
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// One leg of the parts-finder heuristic: substring over name or
/// description (case-insensitive), or exact membership in the given
/// specs array.
fn matches_term(product: &ProductModel, term: &str, spec_key: &str) -> bool {
    let needle = term.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product.description.to_lowercase().contains(&needle)
        || product
            .spec_string_array(spec_key)
            .iter()
            .any(|entry| entry == term)
}

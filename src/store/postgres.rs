use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use std::collections::{BTreeMap, HashMap};

use super::{CatalogStore, CommentFilter, OrderStore, ProductFilter, ProductUpdate};
use crate::domain::aggregates::{
    BeforeSave, Category, Comment, Manufacturer, ModerationOutcome, Order, OrderLine, Pharmacy, Position, Product,
    Rating,
};
use crate::error::StoreError;
use crate::Result;

const CATEGORY_COLUMNS: &str = "id, title, slug, parent_id";
const MANUFACTURER_COLUMNS: &str = "id, name, country, info";
const PRODUCT_COLUMNS: &str = "id, title, slug, category_id, price, brand, manufacturer_id, expiration_date, \
     addition_date, barcode, amount, info";
const JOINED_PRODUCT_COLUMNS: &str = "p.id, p.title, p.slug, p.category_id, p.price, p.brand, p.manufacturer_id, \
     p.expiration_date, p.addition_date, p.barcode, p.amount, p.info";
const PHARMACY_COLUMNS: &str = "id, address, opened_at, closed_at, number";
const COMMENT_COLUMNS: &str = "id, product_id, customer_id, commenter, changed_at, comment_field, checked";
const ORDER_COLUMNS: &str = "id, customer_id, created_at, delivery_method, payment_method, payment_status, \
     delivery_status, pharmacy_id, receipt_date, receipt_time, stripe_order_id, stripe_payment_id, order_key, \
     is_paid, in_progress, closed, address, post_index";

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: i64,
    product_id: i64,
    rating_set: Json<BTreeMap<String, i32>>,
    slug: Option<String>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Self { id: row.id, product_id: row.product_id, rating_set: row.rating_set.0, slug: row.slug }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_id: i64,
    created_at: DateTime<Utc>,
    delivery_method: Option<String>,
    payment_method: Option<String>,
    payment_status: String,
    delivery_status: String,
    pharmacy_id: Option<i64>,
    receipt_date: Option<NaiveDate>,
    receipt_time: Option<NaiveTime>,
    stripe_order_id: Option<String>,
    stripe_payment_id: Option<String>,
    order_key: Option<String>,
    is_paid: bool,
    in_progress: bool,
    closed: bool,
    address: Option<String>,
    post_index: Option<String>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order> {
        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            lines,
            created_at: self.created_at,
            delivery_method: self.delivery_method.as_deref().map(str::parse).transpose().map_err(decode)?,
            payment_method: self.payment_method.as_deref().map(str::parse).transpose().map_err(decode)?,
            payment_status: self.payment_status.parse().map_err(decode)?,
            delivery_status: self.delivery_status.parse().map_err(decode)?,
            pharmacy_id: self.pharmacy_id,
            receipt_date: self.receipt_date,
            receipt_time: self.receipt_time,
            stripe_order_id: self.stripe_order_id,
            stripe_payment_id: self.stripe_payment_id,
            key: self.order_key,
            is_paid: self.is_paid,
            in_progress: self.in_progress,
            closed: self.closed,
            address: self.address,
            post_index: self.post_index,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineRow {
    order_id: i64,
    position_id: i64,
    position_amount: i32,
    #[sqlx(flatten)]
    product: Product,
}

fn decode(message: String) -> StoreError {
    StoreError::Database(sqlx::Error::Decode(message.into()))
}

/// Maps constraint violations to caller-facing errors.
fn constraint(what: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| {
        let code = e.as_database_error().and_then(|d| d.code()).map(|c| c.into_owned());
        match code.as_deref() {
            Some("23505") => StoreError::Conflict(format!("{what} already exists")),
            Some("23503") => StoreError::Validation(format!("{what} references a record that does not exist")),
            _ => StoreError::Database(e),
        }
    }
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    async fn lines_for(&self, order_ids: &[i64]) -> Result<HashMap<i64, Vec<OrderLine>>> {
        let sql = format!(
            "SELECT op.order_id, cp.id AS position_id, cp.amount AS position_amount, {JOINED_PRODUCT_COLUMNS} \
             FROM order_positions op \
             JOIN cart_positions cp ON cp.id = op.position_id \
             JOIN products p ON p.id = cp.product_id \
             WHERE op.order_id = ANY($1) ORDER BY cp.id"
        );
        let rows = sqlx::query_as::<_, LineRow>(&sql)
            .bind(order_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        let mut lines: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            lines.entry(row.order_id).or_default().push(OrderLine {
                position_id: row.position_id,
                amount: row.position_amount,
                product: row.product,
            });
        }
        Ok(lines)
    }

    async fn hydrate(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.lines_for(&ids).await?;
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order_lines = lines.remove(&row.id).unwrap_or_default();
            orders.push(row.into_order(order_lines)?);
        }
        Ok(orders)
    }
}

async fn write_category(conn: &mut PgConnection, mut category: Category) -> Result<Category> {
    category.before_save()?;
    let sql = format!(
        "UPDATE categories SET title = $2, slug = $3, parent_id = $4 WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
    );
    sqlx::query_as::<_, Category>(&sql)
        .bind(category.id)
        .bind(&category.title)
        .bind(&category.slug)
        .bind(category.parent_id)
        .fetch_optional(conn)
        .await
        .map_err(constraint("Category"))?
        .ok_or_else(|| StoreError::not_found("Category", category.id))
}

async fn write_manufacturer(conn: &mut PgConnection, manufacturer: Manufacturer) -> Result<Manufacturer> {
    let sql = format!(
        "UPDATE manufacturers SET name = $2, country = $3, info = $4 WHERE id = $1 RETURNING {MANUFACTURER_COLUMNS}"
    );
    sqlx::query_as::<_, Manufacturer>(&sql)
        .bind(manufacturer.id)
        .bind(&manufacturer.name)
        .bind(&manufacturer.country)
        .bind(&manufacturer.info)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| StoreError::not_found("Manufacturer", manufacturer.id))
}

async fn write_product(conn: &mut PgConnection, mut product: Product) -> Result<Product> {
    product.before_save()?;
    let sql = format!(
        "UPDATE products SET title = $2, slug = $3, category_id = $4, price = $5, brand = $6, manufacturer_id = $7, \
         expiration_date = $8, barcode = $9, amount = $10, info = $11 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
    );
    sqlx::query_as::<_, Product>(&sql)
        .bind(product.id)
        .bind(&product.title)
        .bind(&product.slug)
        .bind(product.category_id)
        .bind(product.price)
        .bind(&product.brand)
        .bind(product.manufacturer_id)
        .bind(product.expiration_date)
        .bind(&product.barcode)
        .bind(product.amount)
        .bind(&product.info)
        .fetch_optional(conn)
        .await
        .map_err(constraint("Product"))?
        .ok_or_else(|| StoreError::not_found("Product", product.id))
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY title");
        Ok(sqlx::query_as::<_, Category>(&sql).fetch_all(&self.pool).await?)
    }

    async fn category_by_id(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        Ok(sqlx::query_as::<_, Category>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1");
        Ok(sqlx::query_as::<_, Category>(&sql).bind(slug).fetch_optional(&self.pool).await?)
    }

    async fn find_category(&self, title: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE title = $1 ORDER BY id LIMIT 1");
        Ok(sqlx::query_as::<_, Category>(&sql).bind(title).fetch_optional(&self.pool).await?)
    }

    async fn insert_category(&self, mut category: Category) -> Result<Category> {
        category.before_save()?;
        let sql =
            format!("INSERT INTO categories (title, slug, parent_id) VALUES ($1, $2, $3) RETURNING {CATEGORY_COLUMNS}");
        sqlx::query_as::<_, Category>(&sql)
            .bind(&category.title)
            .bind(&category.slug)
            .bind(category.parent_id)
            .fetch_one(&self.pool)
            .await
            .map_err(constraint("Category"))
    }

    async fn update_category(&self, category: Category) -> Result<Category> {
        let mut conn = self.pool.acquire().await?;
        write_category(&mut conn, category).await
    }

    async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>> {
        let sql = format!("SELECT {MANUFACTURER_COLUMNS} FROM manufacturers ORDER BY id");
        Ok(sqlx::query_as::<_, Manufacturer>(&sql).fetch_all(&self.pool).await?)
    }

    async fn manufacturer_by_id(&self, id: i64) -> Result<Option<Manufacturer>> {
        let sql = format!("SELECT {MANUFACTURER_COLUMNS} FROM manufacturers WHERE id = $1");
        Ok(sqlx::query_as::<_, Manufacturer>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_manufacturer(&self, name: &str, country: &str, info: &str) -> Result<Option<Manufacturer>> {
        let sql = format!(
            "SELECT {MANUFACTURER_COLUMNS} FROM manufacturers \
             WHERE name = $1 AND country = $2 AND info = $3 ORDER BY id LIMIT 1"
        );
        Ok(sqlx::query_as::<_, Manufacturer>(&sql)
            .bind(name)
            .bind(country)
            .bind(info)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_manufacturer(&self, manufacturer: Manufacturer) -> Result<Manufacturer> {
        let sql = format!(
            "INSERT INTO manufacturers (name, country, info) VALUES ($1, $2, $3) RETURNING {MANUFACTURER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Manufacturer>(&sql)
            .bind(&manufacturer.name)
            .bind(&manufacturer.country)
            .bind(&manufacturer.info)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_manufacturer(&self, manufacturer: Manufacturer) -> Result<Manufacturer> {
        let mut conn = self.pool.acquire().await?;
        write_manufacturer(&mut conn, manufacturer).await
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE ($1::BIGINT IS NULL OR category_id = $1) \
               AND ($2::TEXT IS NULL OR brand = $2) \
               AND ($3::BOOLEAN IS NULL OR (amount > 0) = $3) \
             ORDER BY addition_date, id"
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(filter.category_id)
            .bind(filter.brand)
            .bind(filter.in_stock)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn product_by_id(&self, id: i64) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1");
        Ok(sqlx::query_as::<_, Product>(&sql).bind(slug).fetch_optional(&self.pool).await?)
    }

    async fn insert_product(&self, mut product: Product) -> Result<Product> {
        product.before_save()?;
        let sql = format!(
            "INSERT INTO products \
             (title, slug, category_id, price, brand, manufacturer_id, expiration_date, barcode, amount, info) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&product.title)
            .bind(&product.slug)
            .bind(product.category_id)
            .bind(product.price)
            .bind(&product.brand)
            .bind(product.manufacturer_id)
            .bind(product.expiration_date)
            .bind(&product.barcode)
            .bind(product.amount)
            .bind(&product.info)
            .fetch_one(&self.pool)
            .await
            .map_err(constraint("Product"))
    }

    async fn update_product(&self, update: ProductUpdate) -> Result<Product> {
        let ProductUpdate { product, category, manufacturer } = update;
        let mut tx = self.pool.begin().await?;
        if let Some(category) = category {
            write_category(&mut tx, category).await?;
        }
        if let Some(manufacturer) = manufacturer {
            write_manufacturer(&mut tx, manufacturer).await?;
        }
        let product = write_product(&mut tx, product).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn delete_product(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_ratings(&self) -> Result<Vec<Rating>> {
        let rows = sqlx::query_as::<_, RatingRow>("SELECT id, product_id, rating_set, slug FROM ratings ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn rating_for_product(&self, product_id: i64) -> Result<Option<Rating>> {
        let row = sqlx::query_as::<_, RatingRow>(
            "SELECT id, product_id, rating_set, slug FROM ratings WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Rating::from))
    }

    async fn save_rating(&self, rating: Rating) -> Result<Rating> {
        let row = sqlx::query_as::<_, RatingRow>(
            "INSERT INTO ratings (product_id, rating_set, slug) VALUES ($1, $2, $3) \
             ON CONFLICT (product_id) DO UPDATE SET rating_set = EXCLUDED.rating_set, slug = EXCLUDED.slug \
             RETURNING id, product_id, rating_set, slug",
        )
        .bind(rating.product_id)
        .bind(Json(rating.rating_set))
        .bind(rating.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint("Rating"))?;
        Ok(row.into())
    }

    async fn list_pharmacies(&self) -> Result<Vec<Pharmacy>> {
        let sql = format!("SELECT {PHARMACY_COLUMNS} FROM pharmacies ORDER BY id");
        Ok(sqlx::query_as::<_, Pharmacy>(&sql).fetch_all(&self.pool).await?)
    }

    async fn pharmacy_by_id(&self, id: i64) -> Result<Option<Pharmacy>> {
        let sql = format!("SELECT {PHARMACY_COLUMNS} FROM pharmacies WHERE id = $1");
        Ok(sqlx::query_as::<_, Pharmacy>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn insert_pharmacy(&self, pharmacy: Pharmacy, product_ids: &[i64]) -> Result<Pharmacy> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "INSERT INTO pharmacies (address, opened_at, closed_at, number) \
             VALUES ($1, $2, $3, $4) RETURNING {PHARMACY_COLUMNS}"
        );
        let pharmacy = sqlx::query_as::<_, Pharmacy>(&sql)
            .bind(&pharmacy.address)
            .bind(pharmacy.opened_at)
            .bind(pharmacy.closed_at)
            .bind(&pharmacy.number)
            .fetch_one(&mut *tx)
            .await
            .map_err(constraint("Pharmacy"))?;
        sqlx::query("INSERT INTO pharmacy_products (pharmacy_id, product_id) SELECT $1, UNNEST($2::BIGINT[])")
            .bind(pharmacy.id)
            .bind(product_ids.to_vec())
            .execute(&mut *tx)
            .await
            .map_err(constraint("Pharmacy product"))?;
        tx.commit().await?;
        Ok(pharmacy)
    }

    async fn pharmacy_products(&self, pharmacy_id: i64) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {JOINED_PRODUCT_COLUMNS} FROM products p \
             JOIN pharmacy_products pp ON pp.product_id = p.id WHERE pp.pharmacy_id = $1 ORDER BY p.id"
        );
        Ok(sqlx::query_as::<_, Product>(&sql).bind(pharmacy_id).fetch_all(&self.pool).await?)
    }

    async fn list_comments(&self, filter: CommentFilter) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE ($1::BIGINT IS NULL OR product_id = $1) AND ($2::BOOLEAN IS NULL OR checked = $2) ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(filter.product_id)
            .bind(filter.checked)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn comment_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        Ok(sqlx::query_as::<_, Comment>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment> {
        let sql = format!(
            "INSERT INTO comments (product_id, customer_id, commenter, changed_at, comment_field, checked) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&sql)
            .bind(comment.product_id)
            .bind(comment.customer_id)
            .bind(&comment.commenter)
            .bind(comment.changed_at)
            .bind(&comment.comment_field)
            .bind(comment.checked)
            .fetch_one(&self.pool)
            .await
            .map_err(constraint("Comment"))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn moderate_comments(&self, approved_ids: &[i64]) -> Result<ModerationOutcome> {
        let mut tx = self.pool.begin().await?;
        let approved: Vec<i64> =
            sqlx::query_scalar("UPDATE comments SET checked = TRUE WHERE id = ANY($1) RETURNING id")
                .bind(approved_ids.to_vec())
                .fetch_all(&mut *tx)
                .await?;
        let deleted: Vec<i64> = sqlx::query_scalar("DELETE FROM comments WHERE checked = FALSE RETURNING id")
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(ModerationOutcome { approved, deleted })
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn positions_by_ids(&self, ids: &[i64]) -> Result<Vec<Position>> {
        Ok(sqlx::query_as::<_, Position>(
            "SELECT id, customer_id, product_id, amount FROM cart_positions WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_orders(&self, customer_id: Option<i64>) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE ($1::BIGINT IS NULL OR customer_id = $1) ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql).bind(customer_id).fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    async fn order_by_id(&self, id: i64) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    async fn insert_order(&self, mut order: Order) -> Result<Order> {
        order.before_save()?;
        let mut tx = self.pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (customer_id, created_at, payment_status, delivery_status, order_key) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(order.customer_id)
        .bind(order.created_at)
        .bind(order.payment_status.as_str())
        .bind(order.delivery_status.as_str())
        .bind(&order.key)
        .fetch_one(&mut *tx)
        .await?;
        let position_ids: Vec<i64> = order.lines.iter().map(|l| l.position_id).collect();
        sqlx::query("INSERT INTO order_positions (order_id, position_id) SELECT $1, UNNEST($2::BIGINT[])")
            .bind(id)
            .bind(position_ids)
            .execute(&mut *tx)
            .await
            .map_err(constraint("Order position"))?;
        tx.commit().await?;
        self.order_by_id(id).await?.ok_or_else(|| StoreError::not_found("Order", id))
    }

    async fn update_order(&self, mut order: Order) -> Result<Order> {
        order.before_save()?;
        let result = sqlx::query(
            "UPDATE orders SET delivery_method = $2, payment_method = $3, payment_status = $4, delivery_status = $5, \
             pharmacy_id = $6, receipt_date = $7, receipt_time = $8, stripe_order_id = $9, stripe_payment_id = $10, \
             order_key = $11, is_paid = $12, in_progress = $13, closed = $14, address = $15, post_index = $16 \
             WHERE id = $1",
        )
        .bind(order.id)
        .bind(order.delivery_method.map(|m| m.as_str()))
        .bind(order.payment_method.map(|m| m.as_str()))
        .bind(order.payment_status.as_str())
        .bind(order.delivery_status.as_str())
        .bind(order.pharmacy_id)
        .bind(order.receipt_date)
        .bind(order.receipt_time)
        .bind(&order.stripe_order_id)
        .bind(&order.stripe_payment_id)
        .bind(&order.key)
        .bind(order.is_paid)
        .bind(order.in_progress)
        .bind(order.closed)
        .bind(&order.address)
        .bind(&order.post_index)
        .execute(&self.pool)
        .await
        .map_err(constraint("Order"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Order", order.id));
        }
        self.order_by_id(order.id).await?.ok_or_else(|| StoreError::not_found("Order", order.id))
    }
}

//! Staff list views.
//!
//! Each registered entity declares the columns it displays and the fields it
//! can be filtered on. Rows are rendered as display strings; a missing value
//! shows the view's empty placeholder.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::StoreError;
use crate::store::{OrderStore, ProductFilter};
use crate::Result;

/// Placeholder for empty cells when a view does not set its own.
const DEFAULT_EMPTY_VALUE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListView {
    pub entity: &'static str,
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub empty_value_display: &'static str,
}

pub const PRODUCT: ListView = ListView {
    entity: "product",
    list_display: &["id", "title", "slug", "category", "price", "brand", "amount", "is_in_stock"],
    list_filter: &["category", "brand", "price", "amount"],
    empty_value_display: "undefined",
};

pub const RATING: ListView = ListView {
    entity: "rating",
    list_display: &["product", "slug", "rating_set", "average_rating"],
    list_filter: &[],
    empty_value_display: DEFAULT_EMPTY_VALUE,
};

pub const CATEGORY: ListView = ListView {
    entity: "category",
    list_display: &["title", "is_subcategory", "parent_title"],
    list_filter: &[],
    empty_value_display: DEFAULT_EMPTY_VALUE,
};

pub const MANUFACTURER: ListView = ListView {
    entity: "manufacturer",
    list_display: &["name", "country"],
    list_filter: &["country"],
    empty_value_display: "undefined",
};

pub const ORDER: ListView = ListView {
    entity: "order",
    list_display: &[
        "id",
        "key",
        "customer_id",
        "numb_of_positions",
        "total_price",
        "created_at",
        "delivery_method",
        "delivery_status",
        "payment_method",
        "payment_status",
        "stripe_order_id",
        "stripe_payment_id",
        "is_paid",
        "in_progress",
        "closed",
    ],
    list_filter: &["is_paid", "closed", "customer_id", "created_at", "payment_status", "delivery_method"],
    empty_value_display: "undefined",
};

pub const VIEWS: &[ListView] = &[PRODUCT, RATING, CATEGORY, MANUFACTURER, ORDER];

pub fn view(entity: &str) -> Option<&'static ListView> { VIEWS.iter().find(|v| v.entity == entity) }

/// Rendered list: one row per record, cells ordered as `columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminPage {
    pub entity: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

type Record = HashMap<&'static str, Option<String>>;

fn cell(value: impl ToString) -> Option<String> {
    let value = value.to_string();
    (!value.is_empty()).then_some(value)
}

fn optional<T: ToString>(value: Option<T>) -> Option<String> { value.and_then(cell) }

impl ListView {
    fn check_filters(&self, filters: &BTreeMap<String, String>) -> Result<()> {
        match filters.keys().find(|f| !self.list_filter.iter().any(|allowed| *allowed == f.as_str())) {
            Some(field) => Err(StoreError::Validation(format!("'{}' cannot be filtered by '{field}'", self.entity))),
            None => Ok(()),
        }
    }

    /// Exact match on the displayed value; `created_at` matches by prefix so a
    /// date selects the whole day.
    fn accepts(&self, record: &Record, filters: &BTreeMap<String, String>) -> bool {
        filters.iter().all(|(field, wanted)| {
            let shown = record.get(field.as_str()).cloned().flatten();
            let shown = shown.as_deref().unwrap_or(self.empty_value_display);
            if field == "created_at" { shown.starts_with(wanted.as_str()) } else { shown == wanted }
        })
    }

    fn render(&self, records: Vec<Record>, filters: &BTreeMap<String, String>) -> AdminPage {
        let rows = records
            .iter()
            .filter(|r| self.accepts(r, filters))
            .map(|r| {
                self.list_display
                    .iter()
                    .map(|column| {
                        r.get(column).cloned().flatten().unwrap_or_else(|| self.empty_value_display.to_string())
                    })
                    .collect()
            })
            .collect();
        AdminPage { entity: self.entity, columns: self.list_display, rows }
    }
}

pub struct AdminService<S> {
    store: Arc<S>,
}

impl<S> Clone for AdminService<S> {
    fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: OrderStore> AdminService<S> {
    pub fn new(store: Arc<S>) -> Self { Self { store } }

    pub async fn list(&self, entity: &str, filters: &BTreeMap<String, String>) -> Result<AdminPage> {
        let view = view(entity).ok_or_else(|| StoreError::not_found("List view", entity))?;
        view.check_filters(filters)?;
        let records = match view.entity {
            "product" => self.products().await?,
            "rating" => self.ratings().await?,
            "category" => self.categories().await?,
            "manufacturer" => self.manufacturers().await?,
            _ => self.orders().await?,
        };
        Ok(view.render(records, filters))
    }

    async fn products(&self) -> Result<Vec<Record>> {
        let categories: HashMap<i64, String> =
            self.store.list_categories().await?.into_iter().map(|c| (c.id, c.title)).collect();
        let products = self.store.list_products(ProductFilter::default()).await?;
        Ok(products
            .into_iter()
            .map(|p| {
                Record::from([
                    ("id", cell(p.id)),
                    ("title", cell(&p.title)),
                    ("slug", cell(&p.slug)),
                    ("category", optional(categories.get(&p.category_id))),
                    ("price", cell(p.price)),
                    ("brand", cell(&p.brand)),
                    ("amount", cell(p.amount)),
                    ("is_in_stock", cell(p.is_in_stock())),
                ])
            })
            .collect())
    }

    async fn ratings(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for rating in self.store.list_ratings().await? {
            let product = self.store.product_by_id(rating.product_id).await?;
            let rating_set = serde_json::to_string(&rating.rating_set).map_err(|e| StoreError::Validation(e.to_string()))?;
            records.push(Record::from([
                ("product", optional(product.map(|p| p.title))),
                ("slug", optional(rating.slug.as_ref())),
                ("rating_set", cell(rating_set)),
                ("average_rating", optional(rating.average_rating())),
            ]));
        }
        Ok(records)
    }

    async fn categories(&self) -> Result<Vec<Record>> {
        let categories = self.store.list_categories().await?;
        let titles: HashMap<i64, String> = categories.iter().map(|c| (c.id, c.title.clone())).collect();
        Ok(categories
            .iter()
            .map(|c| {
                Record::from([
                    ("title", cell(&c.title)),
                    ("is_subcategory", cell(c.is_subcategory())),
                    ("parent_title", optional(c.parent_id.and_then(|id| titles.get(&id)))),
                ])
            })
            .collect())
    }

    async fn manufacturers(&self) -> Result<Vec<Record>> {
        let manufacturers = self.store.list_manufacturers().await?;
        Ok(manufacturers
            .iter()
            .map(|m| Record::from([("name", cell(&m.name)), ("country", cell(&m.country))]))
            .collect())
    }

    async fn orders(&self) -> Result<Vec<Record>> {
        let orders = self.store.list_orders(None).await?;
        Ok(orders
            .iter()
            .map(|o| {
                Record::from([
                    ("id", cell(o.id)),
                    ("key", optional(o.key.as_ref())),
                    ("customer_id", cell(o.customer_id)),
                    ("numb_of_positions", cell(o.numb_of_positions())),
                    ("total_price", cell(o.total_price())),
                    ("created_at", cell(o.created_at.format("%Y-%m-%d %H:%M:%S"))),
                    ("delivery_method", optional(o.delivery_method)),
                    ("delivery_status", cell(o.delivery_status)),
                    ("payment_method", optional(o.payment_method)),
                    ("payment_status", cell(o.payment_status)),
                    ("stripe_order_id", optional(o.stripe_order_id.as_ref())),
                    ("stripe_payment_id", optional(o.stripe_payment_id.as_ref())),
                    ("is_paid", cell(o.is_paid)),
                    ("in_progress", cell(o.in_progress)),
                    ("closed", cell(o.closed)),
                ])
            })
            .collect())
    }
}

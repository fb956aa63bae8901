//! Product Aggregate

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::BeforeSave;
use crate::domain::value_objects::Slug;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category_id: i64,
    pub price: Decimal,
    pub brand: String,
    pub manufacturer_id: i64,
    pub expiration_date: NaiveDate,
    pub addition_date: NaiveDate,
    pub barcode: String,
    pub amount: i32,
    pub info: String,
}

impl Product {
    pub fn is_in_stock(&self) -> bool { self.amount > 0 }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}/catalog/{}", base_url.trim_end_matches('/'), self.slug)
    }
}

impl BeforeSave for Product {
    fn before_save(&mut self) -> crate::Result<()> {
        self.slug = Slug::from_title(&self.title)?.into_inner();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample(title: &str, price: Decimal, amount: i32) -> Product {
    Product {
        id: 0,
        title: title.into(),
        slug: String::new(),
        category_id: 1,
        price,
        brand: "Acme".into(),
        manufacturer_id: 1,
        expiration_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        addition_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        barcode: "4600000000001".into(),
        amount,
        info: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_stock_tracks_amount() {
        for (amount, expected) in [(-3, false), (-1, false), (0, false), (1, true), (250, true)] {
            let p = sample("Aspirin", Decimal::new(199, 2), amount);
            assert_eq!(p.is_in_stock(), expected, "amount {amount}");
        }
    }

    #[test]
    fn test_reslug_on_update() {
        let mut p = sample("Aspirin 100mg", Decimal::ONE, 1);
        p.before_save().unwrap();
        assert_eq!(p.slug, "aspirin-100mg");
        p.title = "Aspirin Cardio".into();
        p.before_save().unwrap();
        assert_eq!(p.slug, "aspirin-cardio");
    }

    #[test]
    fn test_url() {
        let mut p = sample("Aspirin", Decimal::ONE, 1);
        p.before_save().unwrap();
        assert_eq!(p.url("http://127.0.0.1:8000/"), "http://127.0.0.1:8000/catalog/aspirin");
    }
}

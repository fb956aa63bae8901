use chrono::{Local, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pharmacy {
    pub id: i64,
    pub address: String,
    pub opened_at: NaiveTime,
    pub closed_at: NaiveTime,
    pub number: String,
}

impl Pharmacy {
    /// Inclusive on both ends. Hours that wrap past midnight never report open.
    pub fn is_open_at(&self, time: NaiveTime) -> bool {
        self.opened_at <= time && time <= self.closed_at
    }

    /// Evaluated against the server's local clock.
    pub fn is_opened(&self) -> bool { self.is_open_at(Local::now().time()) }
}

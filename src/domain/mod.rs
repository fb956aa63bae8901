//! Domain layer: entities, derived fields and business rules

pub mod aggregates;
pub mod value_objects;

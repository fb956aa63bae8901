//! Category Aggregate

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::BeforeSave;
use crate::domain::value_objects::Slug;
use crate::error::StoreError;

/// Taxonomy node. A category with a parent is a subcategory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub parent_id: Option<i64>,
}

impl Category {
    /// Unsaved category; the store assigns `id` and `slug` on insert.
    pub fn new(title: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self { id: 0, title: title.into(), slug: String::new(), parent_id }
    }

    pub fn is_subcategory(&self) -> bool { self.parent_id.is_some() }

    /// Re-parents the category. `parents` maps every stored category id to
    /// its parent id; a parent that sits anywhere below this category is rejected.
    pub fn set_parent(
        &mut self,
        parent: Option<&Category>,
        parents: &HashMap<i64, Option<i64>>,
    ) -> crate::Result<()> {
        if let Some(parent) = parent {
            let mut cursor = Some(parent.id);
            let mut steps = 0;
            while let Some(id) = cursor {
                if self.id != 0 && id == self.id {
                    return Err(StoreError::Validation(format!(
                        "Category '{}' cannot be nested under itself",
                        self.title
                    )));
                }
                steps += 1;
                if steps > parents.len() {
                    break;
                }
                cursor = parents.get(&id).copied().flatten();
            }
        }
        self.parent_id = parent.map(|p| p.id);
        Ok(())
    }
}

impl BeforeSave for Category {
    fn before_save(&mut self) -> crate::Result<()> {
        self.slug = Slug::from_title(&self.title)?.into_inner();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_follows_title_on_every_save() {
        let mut c = Category::new("Pain Relief", None);
        c.before_save().unwrap();
        assert_eq!(c.slug, "pain-relief");
        c.before_save().unwrap();
        assert_eq!(c.slug, "pain-relief");
        c.title = "Headache & Pain".into();
        c.before_save().unwrap();
        assert_eq!(c.slug, "headache-pain");
    }

    fn stored(id: i64, title: &str, parent_id: Option<i64>) -> Category {
        Category { id, title: title.into(), slug: String::new(), parent_id }
    }

    #[test]
    fn test_subcategory() {
        let parent = stored(1, "Vitamins", None);
        let mut child = stored(2, "Vitamin D", None);
        let parents = HashMap::from([(1, None), (2, None)]);
        assert!(!child.is_subcategory());
        child.set_parent(Some(&parent), &parents).unwrap();
        assert!(child.is_subcategory());
        assert!(parent.clone().set_parent(Some(&parent), &parents).is_err());
    }

    #[test]
    fn test_parent_cannot_be_a_descendant() {
        // Medicines > Pain Relief > Headache
        let mut medicines = stored(1, "Medicines", None);
        let pain_relief = stored(2, "Pain Relief", Some(1));
        let headache = stored(3, "Headache", Some(2));
        let parents = HashMap::from([(1, None), (2, Some(1)), (3, Some(2))]);

        assert!(medicines.set_parent(Some(&pain_relief), &parents).is_err());
        let err = medicines.set_parent(Some(&headache), &parents).unwrap_err();
        assert!(err.to_string().contains("nested under itself"));
        assert_eq!(medicines.parent_id, None);

        let mut moved = headache.clone();
        moved.set_parent(Some(&medicines), &parents).unwrap();
        assert_eq!(moved.parent_id, Some(1));
    }
}

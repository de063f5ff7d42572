use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use salesforge_core::sales;

/// Entity types that receive their own identifier sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customer,
    Supplier,
    Employee,
    Product,
    Sale,
    LineItem,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Customer,
        EntityKind::Supplier,
        EntityKind::Employee,
        EntityKind::Product,
        EntityKind::Sale,
        EntityKind::LineItem,
    ];

    /// Table holding rows of this entity.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Customer => sales::CUSTOMERS,
            EntityKind::Supplier => sales::SUPPLIERS,
            EntityKind::Employee => sales::EMPLOYEES,
            EntityKind::Product => sales::PRODUCTS,
            EntityKind::Sale => sales::SALES,
            EntityKind::LineItem => sales::ORDER_DETAILS,
        }
    }
}

/// Issues dense identifiers starting at 1, one sequence per entity type.
///
/// Identifiers are never handed out twice; a failed run restarts from a
/// fresh allocator against a freshly installed schema.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    issued: BTreeMap<EntityKind, i64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, kind: EntityKind) -> i64 {
        let last = self.issued.entry(kind).or_insert(0);
        *last += 1;
        *last
    }

    /// Last identifier issued for `kind`, or 0 when none was issued.
    pub fn issued(&self, kind: EntityKind) -> i64 {
        self.issued.get(&kind).copied().unwrap_or(0)
    }

    /// Every identifier issued so far for `kind`.
    pub fn ids(&self, kind: EntityKind) -> RangeInclusive<i64> {
        1..=self.issued(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_dense_and_scoped_per_entity() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next(EntityKind::Customer), 1);
        assert_eq!(ids.next(EntityKind::Customer), 2);
        assert_eq!(ids.next(EntityKind::Product), 1);
        assert_eq!(ids.next(EntityKind::Customer), 3);

        assert_eq!(ids.issued(EntityKind::Customer), 3);
        assert_eq!(ids.issued(EntityKind::Product), 1);
        assert_eq!(ids.issued(EntityKind::Sale), 0);
        assert_eq!(ids.ids(EntityKind::Customer).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(ids.ids(EntityKind::Sale).next().is_none());
    }

    #[test]
    fn entity_tables_follow_the_schema() {
        assert_eq!(EntityKind::LineItem.table(), "order_details");
        assert_eq!(EntityKind::Sale.table(), "sales");
    }
}

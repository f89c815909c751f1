//! Every foreign-key column pointing at a mergeable table. Adding a column
//! that references one of these tables means adding it here, or merges and
//! deletes will miss it.

use crate::models::reference::{ForeignKeyRef, ReferenceKind};

// Entries are repointed in slice order. Every merge path must touch
// `locations` rows before `purchase_orders` rows: a location merge holds its
// location locks while it updates orders, so the reverse order here could
// deadlock against it.
const SITE_REFERENCES: &[ForeignKeyRef] = &[
    ForeignKeyRef {
        table: "locations",
        column: "site_id",
    },
    ForeignKeyRef {
        table: "purchase_orders",
        column: "site_id",
    },
];

const LOCATION_REFERENCES: &[ForeignKeyRef] = &[ForeignKeyRef {
    table: "purchase_orders",
    column: "location_id",
}];

const STAGE_REFERENCES: &[ForeignKeyRef] = &[ForeignKeyRef {
    table: "purchase_orders",
    column: "stage_id",
}];

const SUPPLIER_REFERENCES: &[ForeignKeyRef] = &[ForeignKeyRef {
    table: "purchase_orders",
    column: "supplier_id",
}];

pub fn references_to(kind: ReferenceKind) -> &'static [ForeignKeyRef] {
    match kind {
        ReferenceKind::Site => SITE_REFERENCES,
        ReferenceKind::Location => LOCATION_REFERENCES,
        ReferenceKind::Stage => STAGE_REFERENCES,
        ReferenceKind::Supplier => SUPPLIER_REFERENCES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_is_referenced_by_purchase_orders() {
        for kind in ReferenceKind::ALL {
            let refs = references_to(kind);
            assert!(
                refs.iter().any(|r| r.table == "purchase_orders"),
                "{kind} has no purchase order reference"
            );
        }
    }

    #[test]
    fn sites_are_also_referenced_by_locations() {
        assert!(references_to(ReferenceKind::Site).contains(&ForeignKeyRef {
            table: "locations",
            column: "site_id",
        }));
    }

    #[test]
    fn locations_are_repointed_before_purchase_orders() {
        for kind in ReferenceKind::ALL {
            let tables: Vec<&str> = references_to(kind).iter().map(|r| r.table).collect();
            let first_order = tables.iter().position(|t| *t == "purchase_orders");
            if let Some(location) = tables.iter().position(|t| *t == "locations") {
                assert!(Some(location) < first_order, "{kind}: {tables:?}");
            }
        }
    }

    #[test]
    fn no_kind_references_its_own_table() {
        for kind in ReferenceKind::ALL {
            assert!(references_to(kind).iter().all(|r| r.table != kind.table()));
        }
    }
}

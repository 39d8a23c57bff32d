//! Cart line merging: a cart holds at most one line per
//! (product, exact variation set) pair.

use uuid::Uuid;

/// An existing cart line for the product being added.
#[derive(Clone, Debug)]
pub struct ExistingItem {
    pub id: Uuid,
    pub quantity: i32,
    pub variation_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeDecision {
    /// An exact variation-set match exists with room below stock.
    Increment { item_id: Uuid, new_quantity: i32 },
    /// An exact match exists but is already at stock; leave it unchanged.
    AtStockLimit { item_id: Uuid, stock: i32 },
    /// No line carries this exact variation set.
    NewItem,
}

/// Variation selections compare as sets: order and duplicates don't
/// matter.
pub fn same_variation_set(a: &[Uuid], b: &[Uuid]) -> bool {
    normalized(a) == normalized(b)
}

fn normalized(ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Decide how an add-to-cart lands against the existing lines for this
/// product.
pub fn merge_decision(
    existing: &[ExistingItem],
    selected: &[Uuid],
    stock: i32,
) -> MergeDecision {
    for item in existing {
        if same_variation_set(&item.variation_ids, selected) {
            if item.quantity < stock {
                return MergeDecision::Increment {
                    item_id: item.id,
                    new_quantity: item.quantity + 1,
                };
            }
            return MergeDecision::AtStockLimit {
                item_id: item.id,
                stock,
            };
        }
    }
    MergeDecision::NewItem
}

/// Clamp a requested quantity to `[1, stock]`. Zero and negative
/// requests land on 1, as does any request against zero stock.
pub fn clamp_quantity(requested: i32, stock: i32) -> i32 {
    requested.max(1).min(stock.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, variation_ids: Vec<Uuid>) -> ExistingItem {
        ExistingItem {
            id: Uuid::new_v4(),
            quantity,
            variation_ids,
        }
    }

    #[test]
    fn variation_sets_compare_order_insensitively() {
        let red = Uuid::new_v4();
        let large = Uuid::new_v4();
        assert!(same_variation_set(&[red, large], &[large, red]));
        assert!(same_variation_set(&[red, red], &[red]));
        assert!(!same_variation_set(&[red], &[large]));
        assert!(same_variation_set(&[], &[]));
    }

    #[test]
    fn matching_set_increments_existing_line() {
        let red = Uuid::new_v4();
        let existing = vec![item(2, vec![red])];
        let decision = merge_decision(&existing, &[red], 10);
        assert_eq!(
            decision,
            MergeDecision::Increment {
                item_id: existing[0].id,
                new_quantity: 3
            }
        );
    }

    #[test]
    fn different_set_creates_new_line() {
        let red = Uuid::new_v4();
        let blue = Uuid::new_v4();
        let existing = vec![item(2, vec![red])];
        assert_eq!(merge_decision(&existing, &[blue], 10), MergeDecision::NewItem);
        // A bare selection is its own set too.
        assert_eq!(merge_decision(&existing, &[], 10), MergeDecision::NewItem);
    }

    #[test]
    fn increment_is_capped_at_stock() {
        let red = Uuid::new_v4();
        let existing = vec![item(3, vec![red])];
        assert_eq!(
            merge_decision(&existing, &[red], 3),
            MergeDecision::AtStockLimit {
                item_id: existing[0].id,
                stock: 3
            }
        );
    }

    #[test]
    fn quantity_clamps_to_stock_and_floor_of_one() {
        assert_eq!(clamp_quantity(7, 5), 5);
        assert_eq!(clamp_quantity(3, 5), 3);
        assert_eq!(clamp_quantity(0, 5), 1);
        assert_eq!(clamp_quantity(-4, 5), 1);
        assert_eq!(clamp_quantity(2, 0), 1);
    }
}

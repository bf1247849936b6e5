//! Property tests for message reconciliation.
//!
//! Random streams of pallet and association messages over a small tag space,
//! with product ids shared between tags, are replayed against a repository,
//! checking after every message that:
//!
//! - unsuccessful messages leave the repository untouched
//! - a new tag adds exactly one event and makes it current
//! - an association with an operator changes only operator and status, and
//!   only on the event carrying that tag
//! - a known tag without operator changes nothing

use std::sync::Arc;

use chrono::{Local, TimeZone};
use kiosk_core::{FixedClock, Product, ProductEvent, ProductStatus};
use kiosk_protocol::InboundMessage;
use kiosk_store::{ProductRepository, Reconciliation, reconcile};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
struct Step {
    success: bool,
    tag: u8,
    operator: Option<String>,
}

fn arb_step() -> impl Strategy<Value = Step> {
    (
        prop::bool::weighted(0.85),
        0u8..4,
        prop_oneof![
            Just(None),
            Just(Some(String::new())),
            "[A-Z][a-z]{2,6}".prop_map(Some),
        ],
    )
        .prop_map(|(success, tag, operator)| Step {
            success,
            tag,
            operator,
        })
}

fn to_message(step: &Step) -> InboundMessage {
    let mut value = json!({
        "success": step.success,
        "product": {
            // Fewer ids than tags, so distinct tags share product ids.
            "id": format!("P{}", step.tag % 2),
            "epc": format!("E{}", step.tag),
            "name": format!("Producto {}", step.tag),
            "netWeight": "25",
        },
    });
    if let Some(name) = &step.operator {
        value["operatorInfo"] = json!({ "nombreOperador": name });
    }
    InboundMessage::from_value(value)
}

fn snapshot(repo: &ProductRepository) -> Vec<ProductEvent> {
    repo.products().map(|event| (**event).clone()).collect()
}

fn without_operator(product: &Product) -> Product {
    Product {
        operator: String::new(),
        status: ProductStatus::Pending,
        ..product.clone()
    }
}

proptest! {
    #[test]
    fn reconciliation_invariants(steps in prop::collection::vec(arb_step(), 1..40)) {
        let clock = FixedClock(Local.with_ymd_and_hms(2024, 1, 7, 8, 0, 0).unwrap());
        let mut repo = ProductRepository::new();

        for step in &steps {
            let message = to_message(step);
            let before = snapshot(&repo);
            let revision_before = repo.revision();
            let current_before = repo.current().cloned();
            let known = before.iter().any(|e| e.product.epc == format!("E{}", step.tag));

            let outcome = reconcile(&mut repo, &message, &clock);
            let after = snapshot(&repo);

            if !step.success {
                prop_assert_eq!(&outcome, &Reconciliation::Ignored);
                prop_assert_eq!(&after, &before);
                prop_assert_eq!(repo.revision(), revision_before);
                continue;
            }

            if !known {
                let is_added = matches!(outcome, Reconciliation::Added { .. });
                prop_assert!(is_added);
                prop_assert_eq!(after.len(), before.len() + 1);
                prop_assert_eq!(&after[1..], &before[..]);
                let current = repo.current().unwrap();
                prop_assert!(Arc::ptr_eq(current, repo.get(0).unwrap()));
                prop_assert_eq!(current.product.epc.clone(), format!("E{}", step.tag));
                let expected_status = if step.operator.is_some() {
                    ProductStatus::Success
                } else {
                    ProductStatus::Pending
                };
                prop_assert_eq!(current.product.status, expected_status);
                continue;
            }

            prop_assert_eq!(after.len(), before.len());
            match step.operator.as_deref().filter(|name| !name.is_empty()) {
                Some(name) => {
                    let is_associated = matches!(outcome, Reconciliation::Associated { .. });
                    prop_assert!(is_associated);
                    for (old, new) in before.iter().zip(&after) {
                        prop_assert_eq!(without_operator(&old.product), without_operator(&new.product));
                        prop_assert_eq!(old.rssi, new.rssi);
                        prop_assert_eq!(&old.timestamp, &new.timestamp);
                        if old.product.epc == format!("E{}", step.tag) {
                            prop_assert_eq!(new.product.operator.as_str(), name);
                            prop_assert_eq!(new.product.status, ProductStatus::Success);
                        } else {
                            prop_assert_eq!(old, new);
                        }
                    }
                }
                None => {
                    prop_assert!(!outcome.is_mutation());
                    prop_assert_eq!(&after, &before);
                    prop_assert_eq!(repo.revision(), revision_before);
                    let same_current = match (&current_before, repo.current()) {
                        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                        (None, None) => true,
                        _ => false,
                    };
                    prop_assert!(same_current);
                }
            }
        }

        // A tag is never stored twice.
        let mut epcs: Vec<_> = repo.products().map(|e| e.product.epc.clone()).collect();
        let total = epcs.len();
        epcs.sort();
        epcs.dedup();
        prop_assert_eq!(epcs.len(), total);
    }
}

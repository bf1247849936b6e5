use tracing::{debug, info, trace};

use kiosk_core::Clock;
use kiosk_protocol::InboundMessage;

use crate::ProductRepository;

/// What [`reconcile`] did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The message was not successful; nothing changed.
    Ignored,

    /// The tag was already known and the message carried an operator.
    Associated {
        product_id: String,
        operator: String,
        replaced: usize,
    },

    /// The tag was already known and the message carried no operator name.
    AlreadyKnown { product_id: String },

    /// A new event was created and made current.
    Added { product_id: String, epc: String },
}

impl Reconciliation {
    /// Returns `true` if the repository was mutated.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Reconciliation::Associated { .. } | Reconciliation::Added { .. }
        )
    }
}

/// Merge one inbound message into the repository.
///
/// 1. Unsuccessful messages are ignored.
/// 2. The tag key is the message's `epc`, else its `id`.
/// 3. If an event with that tag exists, the message is an association: a
///    non-empty operator name updates that event's operator, otherwise
///    nothing happens. A second event is never created for a known tag.
/// 4. Otherwise a new event is built from the message and added.
///
/// An empty tag key never matches an existing event.
pub fn reconcile(
    repo: &mut ProductRepository,
    message: &InboundMessage,
    clock: &dyn Clock,
) -> Reconciliation {
    if !message.success {
        trace!("unsuccessful message ignored");
        return Reconciliation::Ignored;
    }

    let tag_key = message.tag_key();
    let existing = if tag_key.is_empty() {
        None
    } else {
        repo.find_by_epc(tag_key)
            .map(|event| event.product.id.clone())
    };

    if let Some(product_id) = existing {
        return match message.operator_name() {
            Some(operator) => {
                let replaced = repo.update_operator_by_epc(tag_key, operator);
                info!(%product_id, epc = %tag_key, %operator, "operator associated");
                Reconciliation::Associated {
                    product_id,
                    operator: operator.to_string(),
                    replaced,
                }
            }
            None => {
                debug!(%product_id, epc = %tag_key, "known tag without operator, nothing to do");
                Reconciliation::AlreadyKnown { product_id }
            }
        };
    }

    let event = message.to_event(clock);
    let product_id = event.product.id.clone();
    let epc = event.product.epc.clone();
    info!(
        %product_id,
        %epc,
        status = %event.product.status,
        "new product detected"
    );
    repo.add_event(event);

    Reconciliation::Added { product_id, epc }
}

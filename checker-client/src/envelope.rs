//! Envelope normalization
//!
//! The backend wraps payloads inconsistently depending on the
//! endpoint. All shape-sniffing lives here; callers always receive one
//! canonical shape per resource.

use crate::error::{ClientError, ClientResult};
use shared::response::{DataEnvelope, OrderDetailPayload, OrderWithCheckers};

/// Unwrap the plain `{ data: ... }` envelope.
pub fn unwrap_data<T>(envelope: DataEnvelope<T>) -> T {
    envelope.data
}

/// Normalize the two observed order-detail shapes to one value.
///
/// `GET /admin/orders/:id` answers either with the detail object or a
/// single-element array of it. An empty array means the order does not
/// exist despite the 200.
pub fn normalize_order_detail(payload: OrderDetailPayload) -> ClientResult<OrderWithCheckers> {
    match payload {
        OrderDetailPayload::Detail(detail) => Ok(detail),
        OrderDetailPayload::List(mut list) => {
            if list.is_empty() {
                return Err(ClientError::InvalidResponse(
                    "order detail envelope contained no entries".into(),
                ));
            }
            Ok(list.swap_remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Order;
    use shared::types::WaecType;

    fn detail() -> OrderWithCheckers {
        OrderWithCheckers {
            order: Order {
                id: "o1".into(),
                phone: "233543482189".into(),
                email: "a@b.com".into(),
                waec_type: WaecType::Bece,
                quantity: 2,
                status: Default::default(),
                payment_status: Default::default(),
                payment_reference: None,
                amount: None,
                created_at: "2026-01-01".into(),
                updated_at: None,
            },
            checkers: vec![],
        }
    }

    #[test]
    fn test_both_shapes_normalize_to_same_value() {
        let flat = normalize_order_detail(OrderDetailPayload::Detail(detail())).unwrap();
        let wrapped = normalize_order_detail(OrderDetailPayload::List(vec![detail()])).unwrap();
        assert_eq!(flat.order.id, wrapped.order.id);
    }

    #[test]
    fn test_empty_list_is_invalid() {
        let err = normalize_order_detail(OrderDetailPayload::List(vec![])).unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }
}

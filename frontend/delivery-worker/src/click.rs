use event_schema::{NotificationKind, RoutingHints};

pub const DISMISS_ACTION: &str = "dismiss";
pub const VIEW_ORDER_ACTION: &str = "view_order";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// Close the notification and do nothing else
    Dismiss,
    Open(String),
}

/// Resolve where a notification click should take the user
///
/// The clicked action wins over the notification type; types that lack the
/// identifier they route on fall through to the explicit `url` and then `/`.
pub fn resolve_click(hints: &RoutingHints, action: Option<&str>) -> ClickTarget {
    match action {
        Some(DISMISS_ACTION) => return ClickTarget::Dismiss,
        Some(VIEW_ORDER_ACTION) => {
            if let Some(order_id) = &hints.order_id {
                return ClickTarget::Open(format!("/order/{}/receipt", order_id));
            }
        }
        _ => {}
    }

    let by_kind = match (&hints.kind, &hints.restaurant_id, &hints.table_id) {
        (Some(NotificationKind::NewOrder), Some(restaurant_id), _) => {
            Some(format!("/restaurant/{}/orders", restaurant_id))
        }
        (Some(NotificationKind::OrderStatus), _, Some(table_id)) => {
            Some(format!("/menu/view/{}", table_id))
        }
        _ => None,
    };

    ClickTarget::Open(
        by_kind
            .or_else(|| hints.url.clone())
            .unwrap_or_else(|| "/".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_schema::Notification;

    fn hints(pairs: &[(&str, &str)]) -> RoutingHints {
        pairs
            .iter()
            .fold(Notification::new("t", "b"), |n, (k, v)| n.with_data(*k, *v))
            .hints()
    }

    #[test]
    fn test_routes_by_kind() {
        assert_eq!(
            resolve_click(&hints(&[("type", "new_order"), ("restaurantId", "3")]), None),
            ClickTarget::Open("/restaurant/3/orders".to_string())
        );
        assert_eq!(
            resolve_click(&hints(&[("type", "order_status"), ("tableId", "5")]), None),
            ClickTarget::Open("/menu/view/5".to_string())
        );
        assert_eq!(
            resolve_click(&hints(&[("type", "promo"), ("url", "/specials")]), None),
            ClickTarget::Open("/specials".to_string())
        );
        assert_eq!(
            resolve_click(&hints(&[]), None),
            ClickTarget::Open("/".to_string())
        );
    }

    #[test]
    fn test_actions_override_kind() {
        let order = hints(&[("type", "order_status"), ("tableId", "5"), ("orderId", "88")]);
        assert_eq!(
            resolve_click(&order, Some("view_order")),
            ClickTarget::Open("/order/88/receipt".to_string())
        );
        assert_eq!(resolve_click(&order, Some("dismiss")), ClickTarget::Dismiss);
        // Unknown action falls back to the type route
        assert_eq!(
            resolve_click(&order, Some("later")),
            ClickTarget::Open("/menu/view/5".to_string())
        );
    }

    #[test]
    fn test_view_order_without_order_id() {
        assert_eq!(
            resolve_click(&hints(&[("url", "/x")]), Some("view_order")),
            ClickTarget::Open("/x".to_string())
        );
    }
}

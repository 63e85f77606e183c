//! Integration tests for the sale command handlers.
//!
//! These tests drive the full path from command to repository and broker:
//! discount application, aggregate validation, persistence, and the
//! best-effort publishing of sale messages.

use chrono::{Duration, Utc};
use common::{ItemId, SaleId};
use domain::{
    CancelSale, CancelSaleItem, CreateSale, DeleteSale, ErrorKind, GetAllSales, GetSale,
    InMemorySaleRepository, SaleError, SaleItemInput, SaleRepository, SaleService, UpdateSale,
};
use messaging::{
    BrokerSettings, EventPublisher, InMemoryTransport, SaleCreatedMessage, SaleModifiedMessage,
    routing_keys,
};
use rust_decimal::Decimal;

type TestService = SaleService<InMemorySaleRepository, EventPublisher<InMemoryTransport>>;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Helper to create a sale service wired to in-memory adapters
fn create_service() -> (TestService, InMemoryTransport) {
    create_service_with(BrokerSettings::default())
}

fn create_service_with(settings: BrokerSettings) -> (TestService, InMemoryTransport) {
    let transport = InMemoryTransport::new();
    let publisher = EventPublisher::new(settings, transport.clone());
    (
        SaleService::new(InMemorySaleRepository::new(), publisher),
        transport,
    )
}

fn create_cmd(number: &str, items: Vec<SaleItemInput>) -> CreateSale {
    CreateSale::new(
        number,
        Utc::now() - Duration::hours(2),
        "Alice",
        "Downtown",
        items,
    )
}

fn two_line_sale(number: &str) -> CreateSale {
    create_cmd(
        number,
        vec![
            SaleItemInput::new("Product A", 5, dec("10")),
            SaleItemInput::new("Product B", 10, dec("15")),
        ],
    )
}

mod create {
    use super::*;

    #[tokio::test]
    async fn create_sale_persists_and_publishes() {
        let (service, transport) = create_service();

        let sale = service
            .create_sale(two_line_sale("S-100"))
            .await
            .unwrap();

        assert_eq!(sale.total_amount(), dec("165"));
        assert!(!sale.is_cancelled());
        assert!(sale.items().iter().all(|item| item.sale_id() == sale.id()));

        let stored = service
            .get_sale(GetSale::new(sale.id()))
            .await
            .unwrap();
        assert_eq!(stored, sale);

        let sent = transport.sent().await;
        assert_eq!(sent.len(), 1);
        let envelope = &sent[0];
        assert_eq!(envelope.routing_key, routing_keys::SALE_CREATED);
        assert_eq!(envelope.message_type, "SaleCreatedMessage");
        assert_eq!(envelope.correlation_id, sale.id().to_string());

        let body: SaleCreatedMessage = serde_json::from_slice(&envelope.body).unwrap();
        assert_eq!(body.sale_id, sale.id());
        assert_eq!(body.sale_number, "S-100");
        assert_eq!(body.total_amount, dec("165"));
        assert_eq!(body.items.len(), 2);
    }

    #[tokio::test]
    async fn body_uses_camel_case_and_string_decimals() {
        let (service, transport) = create_service();
        service
            .create_sale(create_cmd(
                "S-101",
                vec![SaleItemInput::new("Widget", 10, dec("123.456"))],
            ))
            .await
            .unwrap();

        let envelope = &transport.sent().await[0];
        let json: serde_json::Value = serde_json::from_slice(&envelope.body).unwrap();

        assert_eq!(json["saleNumber"], "S-101");
        assert_eq!(json["totalAmount"], "987.648");
        assert_eq!(json["items"][0]["unitPrice"], "123.456");
        assert_eq!(json["items"][0]["isCancelled"], false);
        assert!(json.get("sale_number").is_none());
    }

    #[tokio::test]
    async fn duplicate_sale_number_is_conflict() {
        let (service, transport) = create_service();
        service
            .create_sale(two_line_sale("S-200"))
            .await
            .unwrap();

        let err = service
            .create_sale(two_line_sale("S-200"))
            .await
            .unwrap_err();

        assert!(matches!(err, SaleError::DuplicateSaleNumber { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(service.repository().sale_count().await, 1);
        assert_eq!(transport.sent_count().await, 1);
    }

    #[tokio::test]
    async fn shape_violations_are_all_reported() {
        let (service, _) = create_service();
        let cmd = CreateSale::new(
            "",
            Utc::now() + Duration::days(1),
            "",
            "Downtown",
            vec![SaleItemInput::new("Widget", 0, dec("-1"))],
        );

        let err = service.create_sale(cmd).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("saleNumber"));
        assert!(errors.has_field("saleDate"));
        assert!(errors.has_field("customer"));
        assert!(errors.has_field("items[0].quantity"));
        assert!(errors.has_field("items[0].unitPrice"));
    }

    #[tokio::test]
    async fn sale_without_items_is_rejected() {
        let (service, _) = create_service();

        let err = service
            .create_sale(create_cmd("S-300", vec![]))
            .await
            .unwrap_err();

        assert!(err.validation_errors().unwrap().has_field("items"));
        assert_eq!(service.repository().sale_count().await, 0);
    }

    #[tokio::test]
    async fn more_than_twenty_identical_items_is_rejected() {
        let (service, transport) = create_service();

        let err = service
            .create_sale(create_cmd(
                "S-301",
                vec![
                    SaleItemInput::new("Widget", 20, dec("1")),
                    SaleItemInput::new("Gadget", 21, dec("1")),
                ],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("Gadget"));
        assert_eq!(service.repository().sale_count().await, 0);
        assert_eq!(transport.sent_count().await, 0);
    }

    #[tokio::test]
    async fn line_total_out_of_range_is_rejected() {
        let (service, transport) = create_service();

        let err = service
            .create_sale(create_cmd(
                "S-302",
                vec![SaleItemInput::new("Widget", 2, Decimal::MAX)],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.validation_errors().unwrap().has_field("items[0].unitPrice"));
        assert_eq!(service.repository().sale_count().await, 0);
        assert_eq!(transport.sent_count().await, 0);
    }

    #[tokio::test]
    async fn sale_total_out_of_range_is_rejected() {
        let (service, transport) = create_service();

        // Each line fits on its own; only their sum overflows
        let err = service
            .create_sale(create_cmd(
                "S-303",
                vec![
                    SaleItemInput::new("Widget", 1, Decimal::MAX),
                    SaleItemInput::new("Gadget", 1, Decimal::MAX),
                ],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.validation_errors().unwrap().has_field("totalAmount"));
        assert_eq!(service.repository().sale_count().await, 0);
        assert_eq!(transport.sent_count().await, 0);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn update_reconciles_items_by_product_name() {
        let (service, transport) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-400"))
            .await
            .unwrap();
        let product_a = sale.items()[0].id();

        let updated = service
            .update_sale(UpdateSale::new(
                sale.id(),
                "Bob",
                "Uptown",
                vec![
                    SaleItemInput::new("product a", 2, dec("10")),
                    SaleItemInput::new("Product C", 4, dec("25")),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(updated.customer(), "Bob");
        assert_eq!(updated.branch(), "Uptown");
        assert_eq!(updated.sale_number(), "S-400");
        assert_eq!(updated.item_count(), 2);

        // Matched item keeps its identity but drops to the undiscounted tier
        let a = updated.item(product_a).unwrap();
        assert_eq!(a.quantity(), 2);
        assert_eq!(a.discount(), Decimal::ZERO);
        assert_eq!(a.total_amount(), dec("20"));

        let c = &updated.items()[1];
        assert_eq!(c.product(), "Product C");
        assert_eq!(c.discount(), dec("0.10"));
        assert_eq!(c.total_amount(), dec("90"));

        assert!(updated.items().iter().all(|i| i.product() != "Product B"));
        assert_eq!(updated.total_amount(), dec("110"));
        assert!(updated.updated_at().is_some());

        let modified = transport
            .sent_with_routing_key(routing_keys::SALE_MODIFIED)
            .await;
        assert_eq!(modified.len(), 1);
        let body: SaleModifiedMessage = serde_json::from_slice(&modified[0].body).unwrap();
        assert_eq!(body.total_amount, dec("110"));
        assert_eq!(body.customer, "Bob");
    }

    #[tokio::test]
    async fn repeated_product_names_collapse_into_one_item() {
        let (service, _) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-401"))
            .await
            .unwrap();

        let updated = service
            .update_sale(UpdateSale::new(
                sale.id(),
                "Alice",
                "Downtown",
                vec![
                    SaleItemInput::new("Product B", 4, dec("15")),
                    SaleItemInput::new("PRODUCT B", 12, dec("15")),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(updated.item_count(), 1);
        assert_eq!(updated.items()[0].quantity(), 12);
        assert_eq!(updated.items()[0].discount(), dec("0.20"));
        assert_eq!(updated.total_amount(), dec("144"));
    }

    #[tokio::test]
    async fn update_over_limit_leaves_stored_sale_untouched() {
        let (service, transport) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-402"))
            .await
            .unwrap();

        let err = service
            .update_sale(UpdateSale::new(
                sale.id(),
                "Alice",
                "Downtown",
                vec![SaleItemInput::new("Product A", 25, dec("10"))],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, SaleError::QuantityLimitExceeded { quantity: 25, .. }));

        let stored = service.get_sale(GetSale::new(sale.id())).await.unwrap();
        assert_eq!(stored, sale);
        assert!(
            transport
                .sent_with_routing_key(routing_keys::SALE_MODIFIED)
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn update_out_of_range_price_leaves_stored_sale_untouched() {
        let (service, transport) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-403"))
            .await
            .unwrap();

        let err = service
            .update_sale(UpdateSale::new(
                sale.id(),
                "Bob",
                "Uptown",
                vec![
                    SaleItemInput::new("Product A", 5, dec("10")),
                    SaleItemInput::new("Product B", 10, Decimal::MAX),
                ],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.validation_errors().unwrap().has_field("items[1].unitPrice"));

        let stored = service.get_sale(GetSale::new(sale.id())).await.unwrap();
        assert_eq!(stored, sale);
        assert!(
            transport
                .sent_with_routing_key(routing_keys::SALE_MODIFIED)
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn update_unknown_sale_is_not_found() {
        let (service, _) = create_service();

        let err = service
            .update_sale(UpdateSale::new(
                SaleId::new(),
                "Alice",
                "Downtown",
                vec![SaleItemInput::new("Widget", 1, dec("1"))],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn update_cancelled_sale_is_conflict() {
        let (service, _) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-403"))
            .await
            .unwrap();
        service.cancel_sale(CancelSale::new(sale.id())).await.unwrap();

        let err = service
            .update_sale(UpdateSale::new(
                sale.id(),
                "Alice",
                "Downtown",
                vec![SaleItemInput::new("Widget", 1, dec("1"))],
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SaleError::SaleAlreadyCancelled {
                action: "update",
                ..
            }
        ));
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn cancel_sale_publishes_once() {
        let (service, transport) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-500"))
            .await
            .unwrap();

        let cancelled = service.cancel_sale(CancelSale::new(sale.id())).await.unwrap();

        assert!(cancelled.is_cancelled());
        assert!(cancelled.updated_at().is_some());

        let envelopes = transport
            .sent_with_routing_key(routing_keys::SALE_CANCELLED)
            .await;
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].message_type, "SaleCancelledMessage");
        assert_eq!(envelopes[0].correlation_id, sale.id().to_string());
    }

    #[tokio::test]
    async fn cancelling_twice_is_conflict() {
        let (service, transport) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-501"))
            .await
            .unwrap();
        service.cancel_sale(CancelSale::new(sale.id())).await.unwrap();

        let err = service
            .cancel_sale(CancelSale::new(sale.id()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            transport
                .sent_with_routing_key(routing_keys::SALE_CANCELLED)
                .await
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn cancel_item_excludes_it_from_total() {
        let (service, transport) = create_service();
        let sale = service
            .create_sale(create_cmd(
                "S-502",
                vec![
                    SaleItemInput::new("Product A", 1, dec("50")),
                    SaleItemInput::new("Product B", 1, dec("15")),
                ],
            ))
            .await
            .unwrap();
        let item_id = sale.items()[0].id();

        let result = service
            .cancel_sale_item(CancelSaleItem::new(sale.id(), item_id))
            .await
            .unwrap();

        assert_eq!(result.sale_id, sale.id());
        assert_eq!(result.item_id, item_id);
        assert!(result.is_cancelled);
        assert_eq!(result.new_total_amount, dec("15"));

        let stored = service.get_sale(GetSale::new(sale.id())).await.unwrap();
        assert!(stored.item(item_id).unwrap().is_cancelled());
        assert_eq!(stored.total_amount(), dec("15"));
        assert!(!stored.is_cancelled());

        let envelopes = transport
            .sent_with_routing_key(routing_keys::ITEM_CANCELLED)
            .await;
        assert_eq!(envelopes.len(), 1);
        let json: serde_json::Value = envelopes[0].body_json().unwrap();
        assert_eq!(json["itemId"], item_id.to_string());
        assert_eq!(json["product"], "Product A");
    }

    #[tokio::test]
    async fn cancelling_items_never_increases_total() {
        let (service, _) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-503"))
            .await
            .unwrap();

        let mut previous = sale.total_amount();
        for item in sale.items() {
            let result = service
                .cancel_sale_item(CancelSaleItem::new(sale.id(), item.id()))
                .await
                .unwrap();
            assert!(result.new_total_amount <= previous);
            previous = result.new_total_amount;
        }

        assert_eq!(previous, Decimal::ZERO);
    }

    #[tokio::test]
    async fn cancel_item_twice_is_conflict() {
        let (service, _) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-504"))
            .await
            .unwrap();
        let cmd = CancelSaleItem::new(sale.id(), sale.items()[1].id());
        service.cancel_sale_item(cmd).await.unwrap();

        let err = service.cancel_sale_item(cmd).await.unwrap_err();

        assert!(matches!(err, SaleError::ItemAlreadyCancelled { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn cancel_item_of_cancelled_sale_is_conflict() {
        let (service, _) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-505"))
            .await
            .unwrap();
        service.cancel_sale(CancelSale::new(sale.id())).await.unwrap();

        let err = service
            .cancel_sale_item(CancelSaleItem::new(sale.id(), sale.items()[0].id()))
            .await
            .unwrap_err();

        assert!(matches!(err, SaleError::SaleAlreadyCancelled { .. }));
    }

    #[tokio::test]
    async fn cancel_unknown_item_is_not_found() {
        let (service, _) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-506"))
            .await
            .unwrap();

        let err = service
            .cancel_sale_item(CancelSaleItem::new(sale.id(), ItemId::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, SaleError::ItemNotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn get_missing_sale_is_not_found() {
        let (service, _) = create_service();

        let err = service
            .get_sale(GetSale::new(SaleId::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, SaleError::SaleNotFound { .. }));
    }

    #[tokio::test]
    async fn get_with_empty_id_is_validation_error() {
        let (service, _) = create_service();

        let err = service
            .get_sale(GetSale::new(SaleId::nil()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn get_all_returns_every_sale() {
        let (service, _) = create_service();
        for number in ["S-600", "S-601", "S-602"] {
            service.create_sale(two_line_sale(number)).await.unwrap();
        }

        let sales = service.get_all_sales(GetAllSales).await.unwrap();

        assert_eq!(sales.len(), 3);
        assert!(
            sales
                .windows(2)
                .all(|pair| pair[0].created_at() <= pair[1].created_at())
        );
    }

    #[tokio::test]
    async fn delete_removes_sale_without_publishing() {
        let (service, transport) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-603"))
            .await
            .unwrap();
        transport.clear().await;

        service.delete_sale(DeleteSale::new(sale.id())).await.unwrap();

        assert!(
            service
                .repository()
                .get_by_id(sale.id())
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(transport.sent_count().await, 0);

        let err = service
            .delete_sale(DeleteSale::new(sale.id()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

mod publishing {
    use super::*;

    #[tokio::test]
    async fn broker_failure_does_not_fail_the_command() {
        let (service, transport) = create_service();
        transport.set_fail_on_send(true).await;

        let sale = service
            .create_sale(two_line_sale("S-700"))
            .await
            .unwrap();
        let cancelled = service.cancel_sale(CancelSale::new(sale.id())).await.unwrap();

        assert!(cancelled.is_cancelled());
        let stored = service.get_sale(GetSale::new(sale.id())).await.unwrap();
        assert!(stored.is_cancelled());
        assert_eq!(transport.sent_count().await, 0);
    }

    #[tokio::test]
    async fn disabled_publishing_skips_the_transport() {
        let (service, transport) = create_service_with(BrokerSettings::disabled());

        let sale = service
            .create_sale(two_line_sale("S-701"))
            .await
            .unwrap();

        assert_eq!(service.repository().sale_count().await, 1);
        assert_eq!(sale.total_amount(), dec("165"));
        assert_eq!(transport.sent_count().await, 0);
    }

    #[tokio::test]
    async fn one_message_per_state_transition() {
        let (service, transport) = create_service();
        let sale = service
            .create_sale(two_line_sale("S-702"))
            .await
            .unwrap();
        service
            .update_sale(UpdateSale::new(
                sale.id(),
                "Alice",
                "Downtown",
                vec![SaleItemInput::new("Product A", 6, dec("10"))],
            ))
            .await
            .unwrap();
        let updated = service.get_sale(GetSale::new(sale.id())).await.unwrap();
        service
            .cancel_sale_item(CancelSaleItem::new(sale.id(), updated.items()[0].id()))
            .await
            .unwrap();
        service.cancel_sale(CancelSale::new(sale.id())).await.unwrap();

        let keys: Vec<String> = transport
            .sent()
            .await
            .into_iter()
            .map(|envelope| envelope.routing_key)
            .collect();

        assert_eq!(
            keys,
            vec![
                routing_keys::SALE_CREATED,
                routing_keys::SALE_MODIFIED,
                routing_keys::ITEM_CANCELLED,
                routing_keys::SALE_CANCELLED,
            ]
        );
    }

    #[tokio::test]
    async fn repository_outage_is_internal_error() {
        let (service, transport) = create_service();
        service.repository().set_unavailable(true).await;

        let err = service
            .create_sale(two_line_sale("S-703"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(transport.sent_count().await, 0);
    }
}

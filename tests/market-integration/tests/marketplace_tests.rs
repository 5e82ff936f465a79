use mayorista_common::catalog::CatalogFilter;
use mayorista_common::identity::{Location, UserRole};
use mayorista_common::notification::NotificationKind;
use mayorista_common::order::OrderStatus;
use mayorista_common::product::{ConservationType, ProductDraft};
use mayorista_common::store::{self, Partition, Snapshot};
use mayorista_common::{MarketConfig, MarketError};
use mayorista_delegate::{MarketRequest, MarketResponse};
use mayorista_market_integration::harness::TestHarness;
use mayorista_node::settings::{load_session, save_session};
use mayorista_node::JsonFileStore;

/// A cart spanning two suppliers becomes one order per supplier, and each
/// supplier is notified once.
#[test]
fn multi_supplier_cart_splits_into_orders() {
    let mut h = TestHarness::setup();
    let rice = h.sur.add_product("Arroz Blanco", "Saman", 9_000, 50);
    let oil = h.norte.add_product("Aceite Girasol", "Optimo", 15_000, 50);
    let sugar = h.sur.add_product("Azúcar", "Bella Unión", 4_000, 50);

    h.ana.buy(&rice.id, 3);
    h.ana.buy(&oil.id, 1);
    h.ana.buy(&sugar.id, 2);

    let summary = h.ana.client.cart_summary().unwrap();
    assert_eq!(summary.groups.len(), 2);
    assert_eq!(summary.item_count, 6);
    assert_eq!(summary.total, 3 * 9_000 + 15_000 + 2 * 4_000);

    let orders = h.ana.client.confirm_cart().unwrap();
    assert_eq!(orders.len(), 2);
    assert!(h.ana.client.session().cart.is_empty());

    let to_sur = orders.iter().find(|o| &o.supplier_id == h.sur.id()).unwrap();
    assert_eq!(to_sur.items.len(), 2);
    assert_eq!(to_sur.total, 3 * 9_000 + 2 * 4_000);
    assert_eq!(to_sur.merchant_name.as_deref(), Some("Almacén Ana"));
    let to_norte = orders.iter().find(|o| &o.supplier_id == h.norte.id()).unwrap();
    assert_eq!(to_norte.total, 15_000);

    for order in &orders {
        assert!(order.is_consistent());
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.is_read_by_supplier);
        assert_eq!(&order.merchant_id, h.ana.id());
        assert!(order.items.iter().all(|i| i.product.supplier_id == order.supplier_id));
    }

    for supplier in [&h.sur, &h.norte] {
        let notes = supplier.client.notifications().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Order);
        assert_eq!(notes[0].title, "Nuevo Pedido Recibido");
        assert_eq!(supplier.client.my_orders().unwrap().len(), 1);
    }
}

/// Price 100, quantity 2, supplier minimum 150: total 200 and not flagged.
#[test]
fn order_total_and_minimum_check() {
    let mut h = TestHarness::setup();
    h.sur.client.set_min_order_value(Some(150)).unwrap();
    let item = h.sur.add_product("Yerba", "Canarias", 100, 10);

    h.ana.buy(&item.id, 2);
    let summary = h.ana.client.cart_summary().unwrap();
    let group = &summary.groups[0];
    assert_eq!(group.subtotal, 200);
    assert_eq!(group.minimum, 150);
    assert!(!group.below_minimum);

    let orders = h.ana.client.confirm_cart().unwrap();
    assert_eq!(orders[0].total, 200);
}

/// Suppliers without their own minimum use the configured default, and a
/// short order is flagged but still goes through.
#[test]
fn below_minimum_is_flagged_not_blocked() {
    let mut h = TestHarness::with_config(MarketConfig {
        default_min_order_value: 50_000,
        ..Default::default()
    });
    let item = h.norte.add_product("Fideos", "Adria", 5_000, 10);
    h.beto.buy(&item.id, 2);

    let group = &h.beto.client.cart_summary().unwrap().groups[0];
    assert_eq!(group.minimum, 50_000);
    assert!(group.below_minimum);
    assert_eq!(h.beto.client.confirm_cart().unwrap().len(), 1);
}

/// Opening an unread order twice yields exactly one "order opened"
/// notification for the merchant.
#[test]
fn opening_an_order_notifies_merchant_once() {
    let mut h = TestHarness::setup();
    let item = h.sur.add_product("Leche", "Conaprole", 4_200, 20);
    h.ana.buy(&item.id, 1);
    let order = h.ana.client.confirm_cart().unwrap().remove(0);

    assert_eq!(h.sur.client.unread_notifications().unwrap(), 1);
    let opened = h.sur.client.open_order(&order.id).unwrap();
    assert!(opened.is_read_by_supplier);
    assert_eq!(h.sur.client.unread_notifications().unwrap(), 0);

    h.sur.client.open_order(&order.id).unwrap();
    let for_ana = h.ana.client.notifications().unwrap();
    let opened_notes: Vec<_> = for_ana.iter().filter(|n| n.title == "Pedido Abierto").collect();
    assert_eq!(opened_notes.len(), 1);
    assert_eq!(opened_notes[0].order_id.as_ref(), Some(&order.id));
    assert!(opened_notes[0].message.starts_with("Distribuidora Sur ha visto tu pedido"));

    assert_eq!(h.sur.client.sales_summary().unwrap().unread, 0);
}

/// The merchant viewing their own order does not mark it read for the supplier.
#[test]
fn merchant_view_leaves_supplier_flag_alone() {
    let mut h = TestHarness::setup();
    let item = h.sur.add_product("Leche", "Conaprole", 4_200, 20);
    h.ana.buy(&item.id, 1);
    let order = h.ana.client.confirm_cart().unwrap().remove(0);

    let seen = h.ana.client.open_order(&order.id).unwrap();
    assert!(!seen.is_read_by_supplier);
    assert_eq!(h.sur.client.sales_summary().unwrap().unread, 1);

    // Other merchants cannot see it at all.
    assert!(matches!(
        h.beto.client.open_order(&order.id),
        Err(MarketError::OrderNotFound(_))
    ));
}

#[test]
fn order_status_only_moves_forward() {
    let mut h = TestHarness::setup();
    let item = h.sur.add_product("Harina", "Cañuelas", 3_000, 20);
    h.ana.buy(&item.id, 4);
    let order = h.ana.client.confirm_cart().unwrap().remove(0);

    let shipped = h.sur.client.advance_order(&order.id, OrderStatus::Shipped).unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert!(matches!(
        h.sur.client.advance_order(&order.id, OrderStatus::Received),
        Err(MarketError::InvalidTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Received
        })
    ));
    assert!(matches!(
        h.norte.client.advance_order(&order.id, OrderStatus::Delivered),
        Err(MarketError::OrderNotFound(_))
    ));
    assert!(matches!(
        h.ana.client.advance_order(&order.id, OrderStatus::Delivered),
        Err(MarketError::WrongRole { .. })
    ));

    h.sur.client.advance_order(&order.id, OrderStatus::Delivered).unwrap();
    let status_notes = h
        .ana
        .client
        .notifications()
        .unwrap()
        .into_iter()
        .filter(|n| n.title == "Estado del Pedido")
        .count();
    assert_eq!(status_notes, 2);
    assert_eq!(h.ana.client.my_orders().unwrap()[0].status, OrderStatus::Delivered);
}

#[test]
fn export_rows_match_order() {
    let mut h = TestHarness::setup();
    let a = h.sur.add_product("Arroz", "Saman", 9_000, 20);
    let b = h.sur.add_product("Aceite", "Optimo", 15_000, 20);
    h.ana.buy(&a.id, 2);
    h.ana.buy(&b.id, 1);
    let order = h.ana.client.confirm_cart().unwrap().remove(0);

    let rows = h.sur.client.export_order(&order.id).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.iter().map(|r| r.subtotal).sum::<u64>(), order.total);
    assert!(h.norte.client.export_order(&order.id).is_err());
}

/// Only suppliers covering the merchant's locality show up when filtering
/// by location.
#[test]
fn catalog_location_filter_follows_coverage() {
    let mut h = TestHarness::setup();
    h.sur.cover("Montevideo", &["Pocitos", "Centro"]);
    h.norte.cover("Salto", &["Salto"]);
    h.sur.add_product("Arroz Blanco", "Saman", 9_000, 10);
    h.norte.add_product("arroz blanco", "SAMAN", 8_000, 10);
    h.norte.add_product("Vino Tannat", "Bodega Salteña", 30_000, 10);

    let everything = h.ana.client.browse(&CatalogFilter::default()).unwrap();
    assert_eq!(everything.len(), 2);
    assert_eq!(everything[0].offers.len(), 2);
    assert_eq!(everything[0].cheapest().price, 8_000);

    let near_ana = CatalogFilter::near(&Location {
        department: "Montevideo".into(),
        locality: "Pocitos".into(),
    });
    let local = h.ana.client.browse(&near_ana).unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].offers.len(), 1);
    assert_eq!(&local[0].offers[0].supplier_id, h.sur.id());

    let whole_dept = CatalogFilter {
        department: Some("Salto".into()),
        ..Default::default()
    };
    assert_eq!(h.ana.client.browse(&whole_dept).unwrap().len(), 2);

    let nobody = CatalogFilter::near(&Location {
        department: "Canelones".into(),
        locality: "Pando".into(),
    });
    assert!(h.beto.client.browse(&nobody).unwrap().is_empty());

    assert_eq!(
        h.beto.client.brands().unwrap(),
        vec!["Bodega Salteña", "SAMAN", "Saman"]
    );
}

#[test]
fn out_of_stock_products_stay_out_of_the_cart() {
    let mut h = TestHarness::setup();
    let gone = h.sur.add_product("Dulce de Leche", "Conaprole", 8_000, 0);
    assert!(matches!(
        h.ana.client.add_to_cart(&gone.id),
        Err(MarketError::OutOfStock(_))
    ));
    let in_stock = h
        .ana
        .client
        .browse(&CatalogFilter {
            only_in_stock: true,
            ..Default::default()
        })
        .unwrap();
    assert!(in_stock.is_empty());
    // Zero stock is at or below the minimum, so the supplier was warned.
    assert_eq!(h.sur.client.low_stock().unwrap().len(), 1);
    let kinds: Vec<_> = h.sur.client.notifications().unwrap().into_iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Stock]);
}

#[test]
fn clearing_one_supplier_keeps_the_rest() {
    let mut h = TestHarness::setup();
    let a = h.sur.add_product("Arroz", "Saman", 9_000, 20);
    let b = h.norte.add_product("Vino", "Bodega Salteña", 30_000, 20);
    h.beto.buy(&a.id, 1);
    h.beto.buy(&b.id, 2);

    let sur_id = h.sur.id().clone();
    assert_eq!(h.beto.client.clear_supplier_cart(&sur_id).unwrap(), 1);
    let summary = h.beto.client.cart_summary().unwrap();
    assert_eq!(summary.groups.len(), 1);
    assert_eq!(&summary.groups[0].supplier_id, h.norte.id());
    assert_eq!(summary.total, 60_000);
}

#[test]
fn chat_between_merchant_and_supplier() {
    let mut h = TestHarness::setup();
    let sur_id = h.sur.id().clone();
    let ana_id = h.ana.id().clone();

    h.ana.client.send_message(&sur_id, "  ¿Tienen stock de arroz?  ").unwrap();
    h.ana.client.send_message(&sur_id, "Necesito 20 fardos").unwrap();
    assert!(matches!(
        h.ana.client.send_message(&sur_id, "   "),
        Err(MarketError::EmptyMessage)
    ));
    assert_eq!(h.sur.client.unread_messages().unwrap(), 2);

    let thread = h.sur.client.conversation(&ana_id).unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].text, "¿Tienen stock de arroz?");
    assert_eq!(h.sur.client.unread_messages().unwrap(), 0);

    h.sur.client.send_message(&ana_id, "Sí, hay stock").unwrap();
    let inbox = h.ana.client.conversations().unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(&inbox[0].partner_id, h.sur.id());
    assert_eq!(inbox[0].message_count, 3);
    assert_eq!(inbox[0].unread, 1);
    assert_eq!(h.ana.client.mark_messages_read(&sur_id).unwrap(), 1);
}

#[test]
fn bulk_import_is_all_or_nothing() {
    let mut h = TestHarness::setup();
    let bad: Vec<_> = serde_json::from_str(
        r#"[{"Nombre": "Arroz", "Precio": 90}, {"Nombre": "Aceite", "Stock": -1}]"#,
    )
    .unwrap();
    assert!(matches!(
        h.sur.client.import_products(&bad),
        Err(MarketError::Import(_))
    ));
    assert!(h.sur.client.my_products().unwrap().is_empty());

    let good: Vec<_> = serde_json::from_str(
        r#"[{"SKU": "A1", "Nombre": "Arroz", "Precio": "90,50"}, {"Producto": "Aceite", "Oferta": 1}]"#,
    )
    .unwrap();
    let imported = h.sur.client.import_products(&good).unwrap();
    assert_eq!(imported.len(), 2);
    assert_eq!(imported[0].price, 9_050);
    assert!(imported[1].is_sale);
    assert_eq!(h.sur.client.my_products().unwrap().len(), 2);
    assert!(h.norte.client.my_products().unwrap().is_empty());
}

#[test]
fn sessions_resume_from_disk() {
    let mut h = TestHarness::setup();
    let item = h.sur.add_product("Arroz", "Saman", 9_000, 20);
    h.ana.buy(&item.id, 2);
    save_session(h.data_dir(), h.ana.client.session()).unwrap();

    let session = load_session(h.data_dir()).unwrap();
    let resumed = mayorista_delegate::MarketDelegate::with_session(
        JsonFileStore::new(h.data_dir()),
        MarketConfig::default(),
        session,
    );
    assert_eq!(resumed.current_user().unwrap().id, h.ana.user.id);
    assert_eq!(resumed.cart_summary().unwrap().total, 18_000);
}

#[test]
fn login_by_email_and_role() {
    let h = TestHarness::setup();
    let mut client = h.new_client();
    assert!(matches!(client.current_user(), Err(MarketError::NotLoggedIn)));
    assert!(matches!(
        client.login("ventas@sur.com.uy", UserRole::Merchant),
        Err(MarketError::UserNotFound { .. })
    ));
    let user = client.login("VENTAS@sur.com.uy", UserRole::Supplier).unwrap();
    assert_eq!(&user.id, h.sur.id());
    assert_eq!(client.suppliers().unwrap().len(), 2);
}

/// Partitions dumped from the browser build are plain arrays; they load as
/// revision 0 and the first write upgrades them.
#[test]
fn reads_raw_local_storage_dump() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("b2b_users.json"),
        r#"[{
            "id": "u-1700000000000",
            "name": "ventas",
            "email": "ventas@dist.com.uy",
            "role": "SUPPLIER",
            "businessName": "Distribuidora Vieja",
            "isVerified": true,
            "location": {"department": "Montevideo", "locality": "Centro"},
            "coverage": [{
                "department": "Montevideo",
                "localities": [{"name": "Centro", "schedule": {"days": ["Lunes", "Jueves"], "hours": "08:00 - 18:00"}}]
            }]
        }]"#,
    )
    .unwrap();

    let milk = r#""id": "p-1700000000001",
            "productNumber": "ART-1",
            "supplierId": "u-1700000000000",
            "name": "Leche Entera",
            "description": "",
            "category": "Lácteos",
            "image": "https://img.example/leche.png",
            "price": 89.9,
            "oldPrice": 95,
            "brand": "Conaprole",
            "conservation": "Frío",
            "unit": "Litro",
            "stock": 40,
            "minStock": 10,
            "isSale": true"#;
    std::fs::write(tmp.path().join("b2b_products.json"), format!("[{{{milk}}}]")).unwrap();
    std::fs::write(
        tmp.path().join("b2b_orders.json"),
        format!(
            r#"[{{
                "id": "ord-1700000000002",
                "supplierId": "u-1700000000000",
                "merchantId": "u-1700000000003",
                "merchantName": "Almacén Viejo",
                "items": [{{{milk}, "quantity": 2}}],
                "total": 179.8,
                "status": "pending",
                "isReadBySupplier": false,
                "createdAt": "2024-05-01T12:00:00.000Z"
            }}]"#
        ),
    )
    .unwrap();

    let mut client = mayorista_market_integration::client(tmp.path(), MarketConfig::default());
    let user = client.login("ventas@dist.com.uy", UserRole::Supplier).unwrap();
    assert_eq!(user.business_name, "Distribuidora Vieja");
    assert!(user.coverage.as_ref().unwrap().covers("Montevideo", Some("Centro")));

    let products = client.my_products().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!((products[0].price, products[0].old_price), (8_990, Some(9_500)));
    assert_eq!(products[0].conservation, ConservationType::Cold);

    let orders = client.my_orders().unwrap();
    assert_eq!(orders[0].total, 17_980);
    assert!(orders[0].is_consistent());
    assert_eq!(client.sales_summary().unwrap().total_sales, 17_980);

    client.set_min_order_value(Some(100_000)).unwrap();
    client
        .save_product(ProductDraft {
            id: Some(products[0].id.clone()),
            stock: Some(35),
            ..Default::default()
        })
        .unwrap();

    let store = JsonFileStore::new(tmp.path());
    let users: Snapshot<serde_json::Value> = store::load(&store, Partition::Users).unwrap();
    assert_eq!(users.revision, 1);
    assert_eq!(users.records[0]["minOrderValue"], 1_000);
    let products: Snapshot<serde_json::Value> = store::load(&store, Partition::Products).unwrap();
    assert_eq!(products.records[0]["price"], 89.9);
    assert_eq!(products.records[0]["conservation"], "Frío");
    assert_eq!(products.records[0]["stock"], 35);
}

#[test]
fn raw_requests_dispatch() {
    let mut h = TestHarness::setup();
    let response = h.norte.client.handle_request(MarketRequest::ToggleLocality {
        department: "Salto".into(),
        locality: "Belén".into(),
    });
    assert!(matches!(response, MarketResponse::Selected(true)));

    let response = h.norte.client.handle_request(MarketRequest::ToggleLocality {
        department: "Salto".into(),
        locality: "Pocitos".into(),
    });
    match response {
        MarketResponse::Error(msg) => assert!(msg.contains("Pocitos")),
        other => panic!("Expected Error, got {:?}", other),
    }

    let response = h.ana.client.handle_request(MarketRequest::Suppliers);
    match response {
        MarketResponse::Users(users) => assert!(users.iter().all(|u| u.role == UserRole::Supplier)),
        other => panic!("Expected Users, got {:?}", other),
    }
}

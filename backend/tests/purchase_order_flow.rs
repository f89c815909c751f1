use procurement_backend::{
    error::AppError,
    models::{
        reference::{Location, LocationPayload, Stage},
        invoice::{CreateInvoice, UpdateInvoice},
        purchase_order::{DocumentStatus, LineItem, UpdatePurchaseOrder},
        reconciliation::BalanceState,
        user::UserRole,
    },
    repositories::purchase_order::PurchaseOrderFilters,
    services::{
        invoice as invoice_service, purchase_order as purchase_order_service,
        reference as reference_service,
    },
    utils::pagination::PageRequest,
};

mod support;

use support::{
    actor_for, audit_count, dec, integration_guard, po_payload, seed_references, seed_site,
    seed_stage, seed_user, test_pool, unique,
};

fn invoice(net: &str) -> CreateInvoice {
    CreateInvoice {
        invoice_number: unique("INV"),
        invoice_date: None,
        net_amount: dec(net),
        vat_rate: dec("0.23"),
    }
}

#[tokio::test]
async fn uninvoiced_balance_tracks_invoices_and_credit_notes() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let staff = seed_user(&pool, UserRole::Staff).await;
    let actor = actor_for(&staff);
    let refs = seed_references(&pool).await;

    let created = purchase_order_service::create(&pool, po_payload(&refs, dec("1000"), dec("0.23")), &actor)
        .await
        .expect("create po");
    let id = created.purchase_order.id;
    assert_eq!(created.purchase_order.total_amount, dec("1230.00"));
    assert_eq!(created.uninvoiced_net, dec("1000"));
    assert_eq!(created.uninvoiced_gross, dec("1230.00"));

    invoice_service::create(&pool, id, invoice("400"), &actor)
        .await
        .expect("invoice");
    let source = procurement_backend::services::reconciliation::PgReconciliationSource::new(pool.clone());
    let read = purchase_order_service::get(&source, id).await.expect("get");
    assert_eq!(read.uninvoiced_net, dec("600"));

    let credit = invoice_service::create(&pool, id, invoice("-100"), &actor)
        .await
        .expect("credit note");
    assert!(credit.is_credit_note());
    let read = purchase_order_service::get(&source, id).await.expect("get");
    assert_eq!(read.uninvoiced_net, dec("700"));
    assert_eq!(read.reconciliation.invoice_count, 2);

    invoice_service::cancel(&pool, credit.id, &actor)
        .await
        .expect("cancel credit note");
    let read = purchase_order_service::get(&source, id).await.expect("get");
    assert_eq!(read.uninvoiced_net, dec("600"));

    let over = invoice_service::create(&pool, id, invoice("900"), &actor)
        .await
        .expect("over invoice");
    let read = purchase_order_service::get(&source, id).await.expect("get");
    assert_eq!(read.uninvoiced_net, dec("-300"));
    assert_eq!(read.reconciliation.state, BalanceState::Over);

    invoice_service::update(
        &pool,
        over.id,
        UpdateInvoice {
            net_amount: Some(dec("600")),
            ..Default::default()
        },
        &actor,
    )
    .await
    .expect("update invoice");
    let read = purchase_order_service::get(&source, id).await.expect("get");
    assert!(read.uninvoiced_net.is_zero());
    assert_eq!(read.reconciliation.state, BalanceState::Settled);

    assert_eq!(audit_count(&pool, "invoices", over.id.get(), None).await, 2);
    assert_eq!(audit_count(&pool, "invoices", credit.id.get(), Some("CANCEL")).await, 1);
}

#[tokio::test]
async fn each_purchase_order_mutation_writes_exactly_one_record() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let staff = seed_user(&pool, UserRole::Staff).await;
    let actor = actor_for(&staff);
    let refs = seed_references(&pool).await;

    let created = purchase_order_service::create(&pool, po_payload(&refs, dec("500"), dec("0.135")), &actor)
        .await
        .expect("create");
    let id = created.purchase_order.id;
    assert_eq!(audit_count(&pool, "purchase_orders", id.get(), Some("CREATE")).await, 1);

    let updated = purchase_order_service::update(
        &pool,
        id,
        UpdatePurchaseOrder {
            description: Some("Scaffolding, phase 2".into()),
            ..Default::default()
        },
        &actor,
    )
    .await
    .expect("update");
    assert_eq!(updated.purchase_order.net_amount, dec("500"));
    assert_eq!(audit_count(&pool, "purchase_orders", id.get(), Some("UPDATE")).await, 1);

    let cancelled = purchase_order_service::cancel(&pool, id, &actor)
        .await
        .expect("cancel");
    assert_eq!(cancelled.purchase_order.status, DocumentStatus::Cancelled);
    assert_eq!(audit_count(&pool, "purchase_orders", id.get(), Some("CANCEL")).await, 1);
    assert_eq!(audit_count(&pool, "purchase_orders", id.get(), None).await, 3);

    let err = purchase_order_service::cancel(&pool, id, &actor)
        .await
        .expect_err("double cancel");
    assert!(matches!(err, AppError::Conflict(_)));
    let err = purchase_order_service::update(&pool, id, UpdatePurchaseOrder::default(), &actor)
        .await
        .expect_err("update cancelled");
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(audit_count(&pool, "purchase_orders", id.get(), None).await, 3);
}

#[tokio::test]
async fn invoices_require_an_active_order() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let staff = seed_user(&pool, UserRole::Staff).await;
    let actor = actor_for(&staff);
    let refs = seed_references(&pool).await;

    let err = invoice_service::create(
        &pool,
        procurement_backend::types::PurchaseOrderId::new(i64::MAX),
        invoice("10"),
        &actor,
    )
    .await
    .expect_err("missing order");
    assert!(matches!(err, AppError::NotFound(_)));

    let po = purchase_order_service::create(&pool, po_payload(&refs, dec("100"), dec("0")), &actor)
        .await
        .expect("create");
    purchase_order_service::cancel(&pool, po.purchase_order.id, &actor)
        .await
        .expect("cancel");
    let err = invoice_service::create(&pool, po.purchase_order.id, invoice("10"), &actor)
        .await
        .expect_err("cancelled order");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_numbers_and_mismatched_line_items_are_rejected() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let staff = seed_user(&pool, UserRole::Staff).await;
    let actor = actor_for(&staff);
    let refs = seed_references(&pool).await;

    let payload = po_payload(&refs, dec("100"), dec("0.23"));
    purchase_order_service::create(&pool, payload.clone(), &actor)
        .await
        .expect("first");
    let err = purchase_order_service::create(&pool, payload, &actor)
        .await
        .expect_err("duplicate po number");
    assert!(matches!(err, AppError::Conflict(_)));

    let mut payload = po_payload(&refs, dec("100"), dec("0.23"));
    payload.line_items = Some(vec![LineItem {
        description: "Steel mesh".into(),
        quantity: Some(dec("4")),
        unit_price: Some(dec("20")),
        amount: dec("80"),
    }]);
    let err = purchase_order_service::create(&pool, payload, &actor)
        .await
        .expect_err("line items mismatch");
    assert!(matches!(err, AppError::Validation(_)));

    let po = purchase_order_service::create(&pool, po_payload(&refs, dec("50"), dec("0")), &actor)
        .await
        .expect("create");
    let number = unique("INV");
    let first = CreateInvoice {
        invoice_number: number.clone(),
        ..invoice("10")
    };
    invoice_service::create(&pool, po.purchase_order.id, first.clone(), &actor)
        .await
        .expect("first invoice");
    let err = invoice_service::create(&pool, po.purchase_order.id, first, &actor)
        .await
        .expect_err("duplicate invoice number");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn list_embeds_reconciliation_per_order() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let staff = seed_user(&pool, UserRole::Staff).await;
    let actor = actor_for(&staff);
    let refs = seed_references(&pool).await;

    let first = purchase_order_service::create(&pool, po_payload(&refs, dec("300"), dec("0")), &actor)
        .await
        .expect("first");
    purchase_order_service::create(&pool, po_payload(&refs, dec("700"), dec("0")), &actor)
        .await
        .expect("second");
    invoice_service::create(&pool, first.purchase_order.id, invoice("100"), &actor)
        .await
        .expect("invoice");

    let filters = PurchaseOrderFilters {
        supplier_id: Some(refs.supplier.id),
        ..Default::default()
    };
    let page = purchase_order_service::list(&pool, &filters, PageRequest::default())
        .await
        .expect("list");
    assert_eq!(page.pagination.total, 2);
    let listed_first = page
        .data
        .iter()
        .find(|po| po.purchase_order.id == first.purchase_order.id)
        .expect("first listed");
    assert_eq!(listed_first.uninvoiced_net, dec("200"));
    let other = page
        .data
        .iter()
        .find(|po| po.purchase_order.id != first.purchase_order.id)
        .expect("second listed");
    assert_eq!(other.uninvoiced_net, dec("700"));
}

#[tokio::test]
async fn referenced_entities_cannot_be_deleted_or_moved() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let staff = seed_user(&pool, UserRole::Staff).await;
    let actor = actor_for(&staff);
    let refs = seed_references(&pool).await;
    purchase_order_service::create(&pool, po_payload(&refs, dec("10"), dec("0")), &actor)
        .await
        .expect("create");

    let err = reference_service::delete::<Stage>(&pool, refs.stage.id.get(), &actor)
        .await
        .expect_err("referenced stage");
    assert!(matches!(err, AppError::Conflict(_)));

    let other_site = seed_site(&pool).await;
    let err = reference_service::update::<Location>(
        &pool,
        refs.location.id.get(),
        LocationPayload {
            site_id: other_site.id,
            name: refs.location.name.clone(),
        },
        &actor,
    )
    .await
    .expect_err("move referenced location");
    assert!(matches!(err, AppError::Conflict(_)));

    let renamed = reference_service::update::<Location>(
        &pool,
        refs.location.id.get(),
        LocationPayload {
            site_id: refs.site.id,
            name: unique("Bay"),
        },
        &actor,
    )
    .await
    .expect("rename keeps the site");
    assert_eq!(renamed.site_id, refs.site.id);

    let unused = seed_stage(&pool).await;
    reference_service::delete::<Stage>(&pool, unused.id.get(), &actor)
        .await
        .expect("delete unused stage");
    assert_eq!(audit_count(&pool, "stages", unused.id.get(), Some("DELETE")).await, 1);
    let err = reference_service::get::<Stage>(&pool, unused.id.get())
        .await
        .expect_err("gone");
    assert!(matches!(err, AppError::NotFound(_)));
}

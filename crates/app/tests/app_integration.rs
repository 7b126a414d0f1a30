//! Integration tests for the assembled storefront.

use std::sync::OnceLock;

use app::{AppError, Config, LogFormat, Storefront, telemetry};
use checkout::CheckoutError;
use common::{Money, SessionId, UserId};
use domain::Customer;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{Catalog, Product};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            telemetry::install_metrics(&Config::default())
                .expect("failed to install Prometheus recorder")
                .expect("no listener configured, a handle is returned")
        })
        .clone()
}

fn customer() -> Customer {
    Customer::new(UserId::new(), "frank", "frank@example.com")
}

#[tokio::test]
async fn checkout_metrics_are_recorded() {
    let handle = get_metrics_handle();
    let storefront = Storefront::in_memory();
    let product = Product::new("Widget", Money::from_cents(1000), 1);
    storefront.store.insert_product(product.clone()).await.unwrap();

    let session = SessionId::new();
    storefront.carts.add(session, product.id, 1).await.unwrap();
    storefront
        .checkout
        .checkout_session(&storefront.carts, &customer(), session)
        .await
        .unwrap();

    storefront.carts.add(session, product.id, 1).await.unwrap();
    let result = storefront
        .checkout
        .checkout_session(&storefront.carts, &customer(), session)
        .await;
    assert!(matches!(result, Err(CheckoutError::InsufficientStock { .. })));

    let rendered = handle.render();
    assert!(rendered.contains("checkout_attempts_total"));
    assert!(rendered.contains("checkout_completed_total"));
    assert!(rendered.contains("checkout_failed_total{reason=\"insufficient_stock\"}"));
    assert!(rendered.contains("cart_mutations_total{operation=\"add\"}"));
    assert!(rendered.contains("checkout_duration_seconds"));
}

#[tokio::test]
async fn session_cart_survives_between_requests() {
    let storefront = Storefront::in_memory();
    let product = Product::new("Widget", Money::from_cents(250), 10);
    storefront.store.insert_product(product.clone()).await.unwrap();
    let session = SessionId::new();

    storefront.carts.add(session, product.id, 2).await.unwrap();
    storefront.carts.add(session, product.id, 2).await.unwrap();

    let priced = storefront.carts.snapshot_with_pricing(session).await.unwrap();
    assert_eq!(priced.total, Money::from_cents(1000));
}

#[test]
fn tracing_installs_once() {
    let config = Config {
        log_filter: "warn".to_string(),
        log_format: LogFormat::Json,
        ..Config::default()
    };

    let first = telemetry::init_tracing(&config);
    let second = telemetry::init_tracing(&config);

    assert!(first.is_ok());
    assert!(matches!(second, Err(AppError::Telemetry(_))));
}

#[test]
fn invalid_log_filter_is_rejected() {
    let config = Config {
        log_filter: "checkout=notalevel".to_string(),
        ..Config::default()
    };
    assert!(matches!(
        telemetry::init_tracing(&config),
        Err(AppError::Telemetry(_))
    ));
}

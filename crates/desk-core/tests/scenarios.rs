//! End-to-end scenarios across the public order and price APIs.

use async_trait::async_trait;
use desk_order::Order;
use desk_price::{CachingPriceProxy, PriceError, PriceSourceInterface};
use desk_types::{
	ConfigSchema, DeskEvent, EventBus, OrderEvent, OrderStatus, Schema, Transition,
	ValidationError,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct NoConfig;

impl ConfigSchema for NoConfig {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Returns 100 for BTCUSDT and counts every call.
#[derive(Default)]
struct BtcStub {
	calls: AtomicUsize,
}

#[async_trait]
impl PriceSourceInterface for BtcStub {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoConfig)
	}

	async fn lookup(&self, symbol: &str) -> Result<Decimal, PriceError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		match symbol {
			"BTCUSDT" => Ok(Decimal::from(100)),
			other => Err(PriceError::SymbolNotSupported(other.to_string())),
		}
	}
}

#[test]
fn order_fills_once_then_reports_no_transition() {
	let bus = EventBus::new(8);
	let mut events = bus.subscribe();
	let mut order = Order::new("BTCUSDT");
	assert_eq!(order.status(), OrderStatus::Pending);

	assert_eq!(order.advance(&bus), Transition::Filled);
	assert_eq!(order.status(), OrderStatus::Filled);
	assert!(matches!(
		events.try_recv().unwrap(),
		DeskEvent::Order(OrderEvent::Filled { .. })
	));

	assert_eq!(order.advance(&bus), Transition::NoTransition);
	assert_eq!(order.status(), OrderStatus::Filled);
	assert!(matches!(
		events.try_recv().unwrap(),
		DeskEvent::Order(OrderEvent::NoTransition { .. })
	));
}

#[tokio::test]
async fn proxy_fetches_btc_once() {
	let stub = Arc::new(BtcStub::default());
	let proxy = CachingPriceProxy::new(stub.clone());

	assert_eq!(proxy.get_price("BTCUSDT").await.unwrap(), Decimal::from(100));
	assert_eq!(proxy.get_price("BTCUSDT").await.unwrap(), Decimal::from(100));
	assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn proxy_errors_propagate_uncached() {
	let stub = Arc::new(BtcStub::default());
	let proxy = CachingPriceProxy::new(stub.clone());

	for _ in 0..3 {
		assert_eq!(
			proxy.get_price("ETHUSDT").await,
			Err(PriceError::SymbolNotSupported("ETHUSDT".into()))
		);
	}
	assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
	assert!(proxy.is_empty().await);
}

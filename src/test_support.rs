//! 测试共用的订单样例、带计数的仓储以及仓储契约测试。

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Delivery, Item, Order, Payment};
use crate::infrastructure::InMemoryOrderRepository;
use crate::ports::OrderRepositoryPort;
use async_trait::async_trait;
use chrono::TimeZone;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 与示例消息一致的合法订单，支付交易号与订单号相同
pub fn sample_order(order_uid: &str) -> Order {
    Order {
        order_uid: order_uid.to_string(),
        track_number: "WBILMTESTTRACK".to_string(),
        entry: "WBIL".to_string(),
        delivery: Some(Delivery {
            id: None,
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        }),
        payment: Some(Payment {
            transaction: order_uid.to_string(),
            request_id: String::new(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1817.0,
            payment_dt: 1637907727,
            bank: "alpha".to_string(),
            delivery_cost: 1500.0,
            goods_total: 317.0,
            custom_fee: 0.0,
        }),
        items: Some(vec![Item {
            chrt_id: 9934930,
            track_number: "WBILMTESTTRACK".to_string(),
            price: 453.0,
            rid: "ab4219087a764ae0btest".to_string(),
            name: "Mascaras".to_string(),
            sale: 30.0,
            size: "0".to_string(),
            total_price: 317.0,
            nm_id: 2389212,
            brand: "Vivienne Sabo".to_string(),
            status: 202,
            order_uid: String::new(),
        }]),
        locale: "en".to_string(),
        internal_signature: String::new(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shard_key: "9".to_string(),
        sm_id: 99,
        date_created: chrono::Utc
            .with_ymd_and_hms(2021, 11, 26, 6, 22, 19)
            .unwrap(),
        oof_shard: "1".to_string(),
    }
}

/// 记录调用次数、可注入故障的内存仓储
#[derive(Default)]
pub struct InstrumentedRepository {
    inner: InMemoryOrderRepository,
    failing: AtomicBool,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    stored: AtomicUsize,
}

impl InstrumentedRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开启后所有操作都返回基础设施错误
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// 成功写入的订单数
    pub fn stored_count(&self) -> usize {
        self.stored.load(Ordering::SeqCst)
    }

    fn injected_failure(&self) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Cache("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepositoryPort for InstrumentedRepository {
    async fn get_order(&self, order_uid: &str) -> DomainResult<Order> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        self.inner.get_order(order_uid).await
    }

    async fn create_order(&self, order: &Order) -> DomainResult<Order> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        let stored = self.inner.create_order(order).await?;
        self.stored.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }
}

/// 所有仓储实现都必须满足的行为
///
/// `uid_prefix` 用于在共享数据库上避免订单号冲突。
pub async fn assert_repository_contract<R: OrderRepositoryPort + ?Sized>(
    repository: &R,
    uid_prefix: &str,
) {
    let missing = format!("{}-missing", uid_prefix);
    let err = repository.get_order(&missing).await.unwrap_err();
    assert!(
        matches!(&err, DomainError::NotFound(uid) if *uid == missing),
        "expected not found, got {err:?}"
    );

    let order_uid = format!("{}-order", uid_prefix);
    let mut order = sample_order(&order_uid);
    let mut second_item = order.items.as_ref().unwrap()[0].clone();
    second_item.chrt_id = 9934931;
    second_item.order_uid = "forged".to_string();
    order.items.as_mut().unwrap().push(second_item);

    let stored = repository.create_order(&order).await.unwrap();
    assert_eq!(stored.order_uid, order_uid);
    assert_eq!(stored.item_count(), 2);
    assert!(stored
        .items
        .as_ref()
        .unwrap()
        .iter()
        .all(|item| item.order_uid == order_uid));

    let fetched = repository.get_order(&order_uid).await.unwrap();
    assert_eq!(fetched, stored);

    let err = repository.create_order(&order).await.unwrap_err();
    assert!(
        matches!(&err, DomainError::AlreadyExists(_)),
        "expected already exists, got {err:?}"
    );

    let precise_uid = format!("{}-precise", uid_prefix);
    let mut precise = sample_order(&precise_uid);
    precise.date_created = chrono::Utc
        .with_ymd_and_hms(2021, 11, 26, 6, 22, 19)
        .unwrap()
        + chrono::Duration::nanoseconds(123_456_789);
    let stored = repository.create_order(&precise).await.unwrap();
    let fetched = repository.get_order(&precise_uid).await.unwrap();
    assert_eq!(fetched, stored);

    let empty_uid = format!("{}-empty", uid_prefix);
    let mut empty = sample_order(&empty_uid);
    empty.items = Some(Vec::new());
    repository.create_order(&empty).await.unwrap();
    let fetched = repository.get_order(&empty_uid).await.unwrap();
    assert_eq!(fetched.items, Some(Vec::new()));
}

use crate::domain::errors::{DomainError, DomainResult, ValidationError};
use crate::domain::{Delivery, Item, Order, Payment};
use crate::ports::order_repository_port::OrderRepositoryPort;
use async_trait::async_trait;
use chrono::SubsecRound;
use sqlx::{Pool, Postgres, Transaction};
use std::sync::Arc;
use tracing::debug;

/// 订单表主键约束名，用于区分订单重复和其他唯一性冲突
const ORDERS_PKEY: &str = "orders_pkey";

/// TIMESTAMPTZ 只保留微秒
const TIMESTAMP_PRECISION: u16 = 6;

/// PostgreSQL订单仓储实现
///
/// 使用四张表：
/// - `orders` 存储订单本身；
/// - `deliveries` 存储配送信息：`orders.delivery_id -> deliveries.id`；
/// - `payments` 存储支付信息：`orders.transaction -> payments.transaction`；
/// - `items` 存储商品：`items.order_uid -> orders.order_uid`。
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: Arc<Pool<Postgres>>,
}

impl PostgresOrderRepository {
    pub fn new(pool: Arc<Pool<Postgres>>) -> Self {
        Self { pool }
    }

    async fn order_exists(&self, order_uid: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM orders WHERE order_uid = $1)")
            .bind(order_uid)
            .fetch_one(&*self.pool)
            .await
    }

    /// 支付交易号冲突：订单本身已存在时为重复订单，否则为关联记录冲突
    ///
    /// 唯一性冲突要等占用方事务提交后才会报告，此时在事务外已能看到已提交的订单。
    async fn payment_write_error(&self, err: sqlx::Error, order: &Order) -> DomainError {
        if !is_unique_violation(&err) {
            return DomainError::Database(err);
        }

        match self.order_exists(&order.order_uid).await {
            Ok(true) => DomainError::AlreadyExists(order.order_uid.clone()),
            Ok(false) => transaction_conflict(order),
            Err(e) => DomainError::Database(e),
        }
    }
}

#[async_trait]
impl OrderRepositoryPort for PostgresOrderRepository {
    /// 在同一事务中读取订单头及其商品
    async fn get_order(&self, order_uid: &str) -> DomainResult<Order> {
        let order_query = r#"
            SELECT o.order_uid, o.track_number, o.entry, o.locale,
                   o.internal_signature, o.customer_id, o.delivery_service,
                   o.shardkey, o.sm_id, o.date_created, o.oof_shard,
                   d.id AS delivery_id, d.name AS delivery_name,
                   d.phone AS delivery_phone, d.zip AS delivery_zip,
                   d.city AS delivery_city, d.address AS delivery_address,
                   d.region AS delivery_region, d.email AS delivery_email,
                   p.transaction AS payment_transaction,
                   p.request_id AS payment_request_id,
                   p.currency AS payment_currency, p.provider AS payment_provider,
                   p.amount AS payment_amount, p.payment_dt AS payment_payment_dt,
                   p.bank AS payment_bank, p.delivery_cost AS payment_delivery_cost,
                   p.goods_total AS payment_goods_total,
                   p.custom_fee AS payment_custom_fee
            FROM orders o
            JOIN deliveries d ON d.id = o.delivery_id
            JOIN payments p ON p.transaction = o.transaction
            WHERE o.order_uid = $1
        "#;

        let items_query = r#"
            SELECT chrt_id, track_number, price, rid, name, sale, size,
                   total_price, nm_id, brand, status, order_uid
            FROM items
            WHERE order_uid = $1
        "#;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(order_query)
            .bind(order_uid)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DomainError::NotFound(order_uid.to_string()))?;

        let items = sqlx::query_as::<_, ItemRow>(items_query)
            .bind(order_uid)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!("Order loaded from database: {}", order_uid);
        Ok(row.into_order(items))
    }

    /// 在同一事务中依次写入支付、配送、订单头和商品，任一步失败整体回滚
    async fn create_order(&self, order: &Order) -> DomainResult<Order> {
        let mut stored = order.clone();
        stored.assign_item_owner();
        stored.date_created = stored.date_created.trunc_subsecs(TIMESTAMP_PRECISION);

        let payment = stored
            .payment
            .as_ref()
            .ok_or(ValidationError::MissingPayment)?;
        let delivery = stored
            .delivery
            .as_ref()
            .ok_or(ValidationError::MissingDelivery)?;

        // 未提交的事务在 drop 时自动回滚
        let mut tx = self.pool.begin().await?;

        if let Err(e) = insert_payment(&mut tx, payment).await {
            tx.rollback().await?;
            return Err(self.payment_write_error(e, &stored).await);
        }

        let delivery_id = insert_delivery(&mut tx, delivery).await?;

        insert_order_header(&mut tx, &stored, delivery_id, &payment.transaction)
            .await
            .map_err(|e| map_write_error(e, &stored))?;

        for item in stored.items.iter().flatten() {
            insert_item(&mut tx, item).await?;
        }

        tx.commit().await?;

        if let Some(delivery) = stored.delivery.as_mut() {
            delivery.id = Some(delivery_id);
        }

        debug!("Order saved to database: {}", stored.order_uid);
        Ok(stored)
    }
}

async fn insert_payment(
    tx: &mut Transaction<'_, Postgres>,
    payment: &Payment,
) -> Result<(), sqlx::Error> {
    let query = r#"
        INSERT INTO payments (
            transaction, request_id, currency, provider, amount,
            payment_dt, bank, delivery_cost, goods_total, custom_fee
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    "#;

    sqlx::query(query)
        .bind(&payment.transaction)
        .bind(&payment.request_id)
        .bind(&payment.currency)
        .bind(&payment.provider)
        .bind(payment.amount)
        .bind(payment.payment_dt)
        .bind(&payment.bank)
        .bind(payment.delivery_cost)
        .bind(payment.goods_total)
        .bind(payment.custom_fee)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// 写入配送信息并返回数据库生成的主键
async fn insert_delivery(
    tx: &mut Transaction<'_, Postgres>,
    delivery: &Delivery,
) -> Result<i64, sqlx::Error> {
    let query = r#"
        INSERT INTO deliveries (name, phone, zip, city, address, region, email)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
    "#;

    sqlx::query_scalar::<_, i64>(query)
        .bind(&delivery.name)
        .bind(&delivery.phone)
        .bind(&delivery.zip)
        .bind(&delivery.city)
        .bind(&delivery.address)
        .bind(&delivery.region)
        .bind(&delivery.email)
        .fetch_one(&mut **tx)
        .await
}

async fn insert_order_header(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
    delivery_id: i64,
    transaction: &str,
) -> Result<(), sqlx::Error> {
    let query = r#"
        INSERT INTO orders (
            order_uid, track_number, entry, delivery_id, transaction,
            locale, internal_signature, customer_id, delivery_service,
            shardkey, sm_id, date_created, oof_shard
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
    "#;

    sqlx::query(query)
        .bind(&order.order_uid)
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(delivery_id)
        .bind(transaction)
        .bind(&order.locale)
        .bind(&order.internal_signature)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(&order.shard_key)
        .bind(order.sm_id)
        .bind(order.date_created)
        .bind(&order.oof_shard)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

async fn insert_item(tx: &mut Transaction<'_, Postgres>, item: &Item) -> Result<(), sqlx::Error> {
    let query = r#"
        INSERT INTO items (
            chrt_id, track_number, price, rid, name, sale, size,
            total_price, nm_id, brand, status, order_uid
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
    "#;

    sqlx::query(query)
        .bind(item.chrt_id)
        .bind(&item.track_number)
        .bind(item.price)
        .bind(&item.rid)
        .bind(&item.name)
        .bind(item.sale)
        .bind(&item.size)
        .bind(item.total_price)
        .bind(item.nm_id)
        .bind(&item.brand)
        .bind(item.status)
        .bind(&item.order_uid)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn transaction_conflict(order: &Order) -> DomainError {
    let transaction = order
        .payment
        .as_ref()
        .map(|payment| payment.transaction.as_str())
        .unwrap_or_default();
    DomainError::Conflict(format!(
        "payment transaction {} is already used by another order",
        transaction
    ))
}

/// 订单主键冲突视为订单已存在，其他唯一约束冲突为关联记录冲突
fn map_write_error(err: sqlx::Error, order: &Order) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some(ORDERS_PKEY) {
                return DomainError::AlreadyExists(order.order_uid.clone());
            }
            return transaction_conflict(order);
        }
    }

    DomainError::Database(err)
}

/// 订单头连接配送与支付后的数据库行
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_uid: String,
    track_number: String,
    entry: String,
    locale: String,
    internal_signature: String,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: i64,
    date_created: chrono::DateTime<chrono::Utc>,
    oof_shard: String,
    delivery_id: i64,
    delivery_name: String,
    delivery_phone: String,
    delivery_zip: String,
    delivery_city: String,
    delivery_address: String,
    delivery_region: String,
    delivery_email: String,
    payment_transaction: String,
    payment_request_id: String,
    payment_currency: String,
    payment_provider: String,
    payment_amount: f64,
    payment_payment_dt: i64,
    payment_bank: String,
    payment_delivery_cost: f64,
    payment_goods_total: f64,
    payment_custom_fee: f64,
}

impl OrderRow {
    fn into_order(self, items: Vec<ItemRow>) -> Order {
        Order {
            order_uid: self.order_uid,
            track_number: self.track_number,
            entry: self.entry,
            delivery: Some(Delivery {
                id: Some(self.delivery_id),
                name: self.delivery_name,
                phone: self.delivery_phone,
                zip: self.delivery_zip,
                city: self.delivery_city,
                address: self.delivery_address,
                region: self.delivery_region,
                email: self.delivery_email,
            }),
            payment: Some(Payment {
                transaction: self.payment_transaction,
                request_id: self.payment_request_id,
                currency: self.payment_currency,
                provider: self.payment_provider,
                amount: self.payment_amount,
                payment_dt: self.payment_payment_dt,
                bank: self.payment_bank,
                delivery_cost: self.payment_delivery_cost,
                goods_total: self.payment_goods_total,
                custom_fee: self.payment_custom_fee,
            }),
            items: Some(items.into_iter().map(ItemRow::into_item).collect()),
            locale: self.locale,
            internal_signature: self.internal_signature,
            customer_id: self.customer_id,
            delivery_service: self.delivery_service,
            shard_key: self.shardkey,
            sm_id: self.sm_id,
            date_created: self.date_created,
            oof_shard: self.oof_shard,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    chrt_id: i64,
    track_number: String,
    price: f64,
    rid: String,
    name: String,
    sale: f64,
    size: String,
    total_price: f64,
    nm_id: i64,
    brand: String,
    status: i32,
    order_uid: String,
}

impl ItemRow {
    fn into_item(self) -> Item {
        Item {
            chrt_id: self.chrt_id,
            track_number: self.track_number,
            price: self.price,
            rid: self.rid,
            name: self.name,
            sale: self.sale,
            size: self.size,
            total_price: self.total_price,
            nm_id: self.nm_id,
            brand: self.brand,
            status: self.status,
            order_uid: self.order_uid,
        }
    }
}

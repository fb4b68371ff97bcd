use crate::domain::errors::{ItemViolation, PaymentViolation, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 订单实体（聚合根）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    /// 订单唯一标识
    pub order_uid: String,

    pub track_number: String,

    /// 下单渠道
    pub entry: String,

    /// 配送信息
    pub delivery: Option<Delivery>,

    /// 支付信息
    pub payment: Option<Payment>,

    /// 商品列表
    pub items: Option<Vec<Item>>,

    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,

    /// 分片键
    #[serde(rename = "shardkey")]
    pub shard_key: String,

    pub sm_id: i64,

    /// 创建时间
    pub date_created: DateTime<Utc>,

    pub oof_shard: String,
}

impl Order {
    /// 校验订单，遇到第一个错误立即返回
    ///
    /// 检查顺序固定：uid → 配送 → 支付 → 支付字段 → 商品列表 → 每个商品。
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order_uid.is_empty() {
            return Err(ValidationError::MissingOrderUid);
        }

        if self.delivery.is_none() {
            return Err(ValidationError::MissingDelivery);
        }

        let payment = self.payment.as_ref().ok_or(ValidationError::MissingPayment)?;
        payment
            .validate()
            .map_err(ValidationError::InvalidPayment)?;

        let items = self.items.as_ref().ok_or(ValidationError::MissingItems)?;
        for (index, item) in items.iter().enumerate() {
            item.validate()
                .map_err(|violation| ValidationError::InvalidItem { index, violation })?;
        }

        Ok(())
    }

    /// 将商品归属到当前订单（写入时由存储层调用，不信任消息中的值）
    pub fn assign_item_owner(&mut self) {
        if let Some(items) = self.items.as_mut() {
            for item in items {
                item.order_uid = self.order_uid.clone();
            }
        }
    }

    /// 商品数量
    pub fn item_count(&self) -> usize {
        self.items.as_ref().map_or(0, Vec::len)
    }
}

/// 配送信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delivery {
    /// 数据库生成的主键，不对外暴露
    #[serde(skip)]
    pub id: Option<i64>,

    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// 支付信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    /// 交易号（与订单关联的自然键）
    pub transaction: String,

    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: f64,

    /// 支付时间（Unix 秒）
    pub payment_dt: i64,

    pub bank: String,
    pub delivery_cost: f64,
    pub goods_total: f64,
    pub custom_fee: f64,
}

impl Payment {
    pub fn validate(&self) -> Result<(), PaymentViolation> {
        if self.transaction.is_empty() {
            return Err(PaymentViolation::EmptyTransaction);
        }

        Ok(())
    }
}

/// 订单商品
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: f64,
    pub rid: String,
    pub name: String,
    pub sale: f64,
    pub size: String,
    pub total_price: f64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,

    /// 所属订单，由存储层写入
    #[serde(skip)]
    pub order_uid: String,
}

impl Item {
    pub fn validate(&self) -> Result<(), ItemViolation> {
        if self.chrt_id == 0 {
            return Err(ItemViolation::ZeroChrtId);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_order;

    const SAMPLE_PAYLOAD: &str = r#"{
        "order_uid": "b563feb7b2b84b6test",
        "track_number": "WBILMTESTTRACK",
        "entry": "WBIL",
        "delivery": {
            "name": "Test Testov",
            "phone": "+9720000000",
            "zip": "2639809",
            "city": "Kiryat Mozkin",
            "address": "Ploshad Mira 15",
            "region": "Kraiot",
            "email": "test@gmail.com"
        },
        "payment": {
            "transaction": "b563feb7b2b84b6test",
            "request_id": "",
            "currency": "USD",
            "provider": "wbpay",
            "amount": 1817,
            "payment_dt": 1637907727,
            "bank": "alpha",
            "delivery_cost": 1500,
            "goods_total": 317,
            "custom_fee": 0
        },
        "items": [
            {
                "chrt_id": 9934930,
                "track_number": "WBILMTESTTRACK",
                "price": 453,
                "rid": "ab4219087a764ae0btest",
                "name": "Mascaras",
                "sale": 30,
                "size": "0",
                "total_price": 317,
                "nm_id": 2389212,
                "brand": "Vivienne Sabo",
                "status": 202
            }
        ],
        "locale": "en",
        "internal_signature": "",
        "customer_id": "test",
        "delivery_service": "meest",
        "shardkey": "9",
        "sm_id": 99,
        "date_created": "2021-11-26T06:22:19Z",
        "oof_shard": "1"
    }"#;

    #[test]
    fn test_decode_sample_payload() {
        let order: Order = serde_json::from_str(SAMPLE_PAYLOAD).unwrap();

        assert_eq!(order.order_uid, "b563feb7b2b84b6test");
        assert_eq!(order.shard_key, "9");
        assert_eq!(order.item_count(), 1);
        let item = &order.items.as_ref().unwrap()[0];
        assert_eq!(item.chrt_id, 9934930);
        assert_eq!(item.price, 453.0);
        assert!(item.order_uid.is_empty());
        assert!(order.validate().is_ok());
        assert_eq!(order, sample_order("b563feb7b2b84b6test"));
    }

    #[test]
    fn test_hidden_fields_are_not_serialized() {
        let mut order = sample_order("uid-1");
        order.delivery.as_mut().unwrap().id = Some(42);
        order.assign_item_owner();

        let json = serde_json::to_value(&order).unwrap();
        assert!(json["delivery"].get("id").is_none());
        assert!(json["items"][0].get("order_uid").is_none());
        assert_eq!(json["shardkey"], "9");
    }

    #[test]
    fn test_inbound_item_owner_is_ignored() {
        let payload = r#"{"order_uid":"a","items":[{"chrt_id":1,"order_uid":"forged"}]}"#;
        let order: Order = serde_json::from_str(payload).unwrap();

        assert_eq!(order.items.unwrap()[0].order_uid, "");
    }

    #[test]
    fn test_missing_sections_decode_as_absent() {
        let order: Order =
            serde_json::from_str(r#"{"order_uid":"a","delivery":null}"#).unwrap();

        assert!(order.delivery.is_none());
        assert!(order.payment.is_none());
        assert!(order.items.is_none());
    }

    #[test]
    fn test_validate_order_uid_first() {
        let order = Order::default();
        assert_eq!(order.validate(), Err(ValidationError::MissingOrderUid));
    }

    #[test]
    fn test_validate_check_order() {
        let mut order = sample_order("uid-1");
        order.delivery = None;
        order.payment = None;
        assert_eq!(order.validate(), Err(ValidationError::MissingDelivery));

        let mut order = sample_order("uid-1");
        order.payment = None;
        order.items = None;
        assert_eq!(order.validate(), Err(ValidationError::MissingPayment));

        let mut order = sample_order("uid-1");
        order.payment.as_mut().unwrap().transaction.clear();
        order.items = None;
        assert_eq!(
            order.validate(),
            Err(ValidationError::InvalidPayment(
                PaymentViolation::EmptyTransaction
            ))
        );

        let mut order = sample_order("uid-1");
        order.items = None;
        assert_eq!(order.validate(), Err(ValidationError::MissingItems));
    }

    #[test]
    fn test_validate_reports_first_bad_item() {
        let mut order = sample_order("uid-1");
        let mut bad = order.items.as_ref().unwrap()[0].clone();
        bad.chrt_id = 0;
        let items = order.items.as_mut().unwrap();
        items.push(bad.clone());
        items.push(bad);

        assert_eq!(
            order.validate(),
            Err(ValidationError::InvalidItem {
                index: 1,
                violation: ItemViolation::ZeroChrtId,
            })
        );
    }

    #[test]
    fn test_empty_item_list_is_valid() {
        let mut order = sample_order("uid-1");
        order.items = Some(Vec::new());

        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_assign_item_owner() {
        let mut order = sample_order("uid-7");
        order.assign_item_owner();

        assert!(order
            .items
            .unwrap()
            .iter()
            .all(|item| item.order_uid == "uid-7"));
    }
}

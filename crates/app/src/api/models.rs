//! API models and wire normalization.
//!
//! The backend speaks a loosely-typed dialect: localized (Russian) field
//! names, numbers that arrive as strings, and epoch-zero sentinels standing
//! in for "no value". Everything crossing the boundary is normalized here
//! into the typed internal models; raw backend field names never leak past
//! this module.

use apotheca::{
    products::{Batch, Product, sort_batches},
    status::{OrderStage, StageFlags},
};
use jiff::{Timestamp, civil::DateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel the backend uses for "no date" in RFC 3339 fields.
const EPOCH_ZERO_RFC3339: &str = "0001-01-01T00:00:00Z";

/// Sentinel the backend uses for "no date" in localized stage timestamps.
const EPOCH_ZERO_STAGE: &str = "01.01.0001 0:00:00";

/// Localized format of stage timestamps.
const STAGE_TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

// ---------------------------------------------------------------------------
// Internal models
// ---------------------------------------------------------------------------

/// Normalized user profile. Persisted under the `user` storage key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable backend identifier; scopes the per-user cart.
    pub id: Option<String>,

    /// Counterparty full name.
    pub name: Option<String>,

    /// Firm the counterparty belongs to.
    pub firm: Option<String>,

    /// Counterparty kind.
    pub kind: Option<String>,

    /// Address.
    pub address: Option<String>,

    /// Phone number.
    pub phone: Option<String>,

    /// Assigned account manager.
    pub manager: Option<String>,
}

/// Result of a successful sign-in or password set.
#[derive(Debug, Clone)]
pub struct SignedIn {
    /// Bearer token for authorized calls.
    pub access_token: String,

    /// Token used to mint a replacement bearer token.
    pub refresh_token: Option<String>,

    /// The signed-in user.
    pub user: UserProfile,
}

/// Result of a token refresh.
#[derive(Debug, Clone)]
pub struct RefreshedSession {
    /// Replacement bearer token.
    pub access_token: String,

    /// Rotated refresh token, when the backend issues one.
    pub refresh_token: Option<String>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Backend identifier.
    pub id: Option<String>,

    /// Filter key products reference.
    pub key: String,

    /// Display name.
    pub name: String,
}

/// A promotional banner.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    /// Backend identifier.
    pub id: Option<String>,

    /// Image location.
    pub image_url: Option<String>,

    /// Target the banner links to.
    pub link: Option<String>,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// Page the listing is on, 1-based.
    pub current_page: u32,

    /// Last available page.
    pub last_page: u32,
}

impl PageMeta {
    /// Whether further pages exist.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.current_page < self.last_page
    }
}

/// One page of the product listing.
#[derive(Debug, Clone)]
pub struct ProductPage {
    /// Normalized products.
    pub products: Vec<Product>,

    /// Pagination metadata; absent meta normalizes to a single page.
    pub meta: PageMeta,
}

/// A line of a past order, as reported by the order history.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    /// Display name.
    pub name: String,

    /// Unit price.
    pub price: Decimal,

    /// Ordered quantity.
    pub quantity: u32,
}

/// A customer order in the history listing.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    /// Backend identifier, used for the status endpoints.
    pub id: String,

    /// Human-facing order code.
    pub code: String,

    /// Raw status label from the listing (the per-stage record comes from
    /// the status endpoint instead).
    pub status: Option<String>,

    /// Creation time.
    pub created_at: Option<Timestamp>,

    /// Expected delivery time display field.
    pub delivery_time: Option<String>,

    /// Courier display field.
    pub courier: Option<String>,

    /// Order lines.
    pub items: Vec<OrderItem>,
}

impl OrderSummary {
    /// Sum of line price × quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }
}

/// One page of the order history.
#[derive(Debug, Clone)]
pub struct OrderPage {
    /// Orders on this page.
    pub orders: Vec<OrderSummary>,

    /// Total matching orders across all pages.
    pub total: u64,
}

/// The per-stage status record of one order.
#[derive(Debug, Clone)]
pub struct OrderStatus {
    /// Order identifier.
    pub order_id: String,

    /// Normalized stage flags.
    pub flags: StageFlags,
}

/// Backend acknowledgement of a submitted order.
#[derive(Debug, Clone, Default)]
pub struct OrderAccepted {
    /// Identifier of the created order, when echoed.
    pub id: Option<String>,

    /// Human-facing code of the created order, when echoed.
    pub code: Option<String>,
}

/// Backend acknowledgement of a receipt confirmation.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReceipt {
    /// Server-stamped delivery time; replaces the optimistic local stamp.
    pub delivered_at: Option<DateTime>,
}

/// A per-product availability figure from a stock-conflict response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    /// Product code the adjustment applies to.
    pub product_code: String,

    /// Quantity the backend can actually fulfil; zero means out of stock.
    pub available: u32,
}

/// Export format for per-order reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Portable document.
    Pdf,

    /// Spreadsheet.
    Xlsx,
}

impl ReportFormat {
    /// Query-parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
        }
    }
}

/// An order submission payload: one entry per basket line, grouped by
/// product and selected batch.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    /// Submitted lines.
    pub items: Vec<NewOrderItem>,
}

/// One submitted order line.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderItem {
    /// Display name.
    pub name: String,

    /// Unit price of the selected batch.
    pub price: Decimal,

    /// Resolved product identity.
    pub product_code: String,

    /// Ordered quantity.
    pub quantity: u32,

    /// Expiry of the selected batch, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Wire DTOs
// ---------------------------------------------------------------------------

/// The backend's standard response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub code: Option<i64>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub payload: Option<T>,

    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInPayload {
    pub token: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(flatten)]
    pub user: ProfileDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshPayload {
    pub token: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProfileDto {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(rename = "Наименование", default)]
    pub name: Option<String>,

    #[serde(rename = "Фирма", default)]
    pub firm: Option<String>,

    #[serde(rename = "ВидКонтрагента", default)]
    pub kind: Option<String>,

    #[serde(rename = "Адрес", default)]
    pub address: Option<String>,

    #[serde(rename = "Телефон", default)]
    pub phone: Option<String>,

    #[serde(rename = "МенеджерКонтрагента", default)]
    pub manager: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsPayload {
    #[serde(default)]
    pub data: Vec<ProductDto>,

    #[serde(default)]
    pub meta: Option<PageMetaDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageMetaDto {
    #[serde(default)]
    pub current_page: Option<u32>,

    #[serde(default)]
    pub last_page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProductDto {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(rename = "Код", default)]
    pub code: Option<Value>,

    #[serde(rename = "Артикул", default)]
    pub article: Option<Value>,

    #[serde(rename = "Наименование", default)]
    pub name: Option<String>,

    #[serde(rename = "Производитель", default)]
    pub manufacturer: Option<String>,

    #[serde(rename = "Срок", default)]
    pub expiry: Option<String>,

    #[serde(rename = "Цена", default)]
    pub price: Option<Value>,

    #[serde(rename = "Количество", default)]
    pub stock: Option<Value>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(rename = "Партии", default)]
    pub batches: Vec<BatchDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchDto {
    #[serde(rename = "Срок", default)]
    pub expiry: Option<String>,

    #[serde(rename = "Цена", default)]
    pub price: Option<Value>,

    #[serde(rename = "Количество", default)]
    pub stock: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryDto {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BannerDto {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderDto {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub delivery_time: Option<String>,

    #[serde(default)]
    pub courier: Option<String>,

    #[serde(default)]
    pub items: Vec<OrderItemDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderItemDto {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub price: Option<Value>,

    #[serde(default)]
    pub quantity: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderStatusPayload {
    #[serde(default)]
    pub order_id: Option<Value>,

    #[serde(default)]
    pub status: Option<StatusDto>,
}

/// Raw per-stage record: a "Да"/"Нет" flag and a localized timestamp per
/// stage. Any field outside this set is ignored by deserialization, which is
/// exactly the "unknown flags are not an error" contract.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusDto {
    #[serde(rename = "Оформлено", default)]
    pub issued: Option<String>,

    #[serde(rename = "КОбработке", default)]
    pub processing: Option<String>,

    #[serde(rename = "КСборке", default)]
    pub assembling: Option<String>,

    #[serde(rename = "ГотовКДоставке", default)]
    pub ready_for_delivery: Option<String>,

    #[serde(rename = "ВПути", default)]
    pub in_transit: Option<String>,

    #[serde(rename = "Доставлен", default)]
    pub delivered: Option<String>,

    #[serde(rename = "ДатаОформлено", default)]
    pub issued_at: Option<String>,

    #[serde(rename = "ДатаКОбработке", default)]
    pub processing_at: Option<String>,

    #[serde(rename = "ДатаКСборке", default)]
    pub assembling_at: Option<String>,

    #[serde(rename = "ДатаГотовКДоставке", default)]
    pub ready_for_delivery_at: Option<String>,

    #[serde(rename = "ДатаВПути", default)]
    pub in_transit_at: Option<String>,

    #[serde(rename = "ДатаДоставлен", default)]
    pub delivered_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmPayload {
    #[serde(rename = "ДатаДоставлен", default)]
    pub delivered_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConflictBody {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub changes: Vec<StockChangeDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StockChangeDto {
    #[serde(rename = "Код", default)]
    pub code: Option<Value>,

    #[serde(rename = "Количество", default)]
    pub quantity: Option<Value>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Renders a backend identity value (string or number) as text.
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses a backend money value (string or number), defaulting to zero the
/// way the web client's `parseFloat(…) || 0` did.
pub(crate) fn decimal(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::String(s)) => s.trim().parse().unwrap_or(Decimal::ZERO),
        Some(Value::Number(n)) => n.to_string().parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Parses a backend count value (string or number).
pub(crate) fn count(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        _ => None,
    }
}

/// Parses an RFC 3339 date field, mapping the epoch-zero sentinel and
/// malformed input to `None`.
pub(crate) fn parse_expiry(raw: Option<&str>) -> Option<Timestamp> {
    let raw = raw?.trim();

    if raw.is_empty() || raw == EPOCH_ZERO_RFC3339 {
        return None;
    }

    raw.parse().ok()
}

/// Whether a "Да"/"Нет" stage flag is set.
pub(crate) fn stage_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|value| value.trim() == "Да")
}

/// Parses a localized stage timestamp, mapping the epoch-zero sentinel and
/// malformed input to `None`.
pub(crate) fn stage_timestamp(raw: Option<&str>) -> Option<DateTime> {
    let raw = raw?.trim();

    if raw.is_empty() || raw == EPOCH_ZERO_STAGE {
        return None;
    }

    DateTime::strptime(STAGE_TIMESTAMP_FORMAT, raw).ok()
}

impl ProductDto {
    /// Normalizes the record into the internal product model; batches end up
    /// in FEFO order. A record without a batch list becomes a single batch
    /// built from the product-level price/expiry/stock fields.
    pub(crate) fn normalize(self) -> Product {
        let mut batches: Vec<Batch> = if self.batches.is_empty() {
            vec![Batch {
                expiry: parse_expiry(self.expiry.as_deref()),
                price: decimal(self.price.as_ref()),
                stock: count(self.stock.as_ref()),
            }]
        } else {
            self.batches
                .into_iter()
                .map(|batch| Batch {
                    expiry: parse_expiry(batch.expiry.as_deref()),
                    price: decimal(batch.price.as_ref()),
                    stock: count(batch.stock.as_ref()),
                })
                .collect()
        };

        sort_batches(&mut batches);

        Product {
            id: text(self.id.as_ref()),
            code: text(self.code.as_ref()),
            article: text(self.article.as_ref()),
            name: self.name.unwrap_or_default(),
            manufacturer: self.manufacturer,
            category: self.category.or(self.key),
            batches,
        }
    }
}

impl ProfileDto {
    pub(crate) fn normalize(self) -> UserProfile {
        UserProfile {
            id: text(self.id.as_ref()),
            name: self.name,
            firm: self.firm,
            kind: self.kind,
            address: self.address,
            phone: self.phone,
            manager: self.manager,
        }
    }
}

impl CategoryDto {
    pub(crate) fn normalize(self) -> Option<Category> {
        let key = self.key?;

        Some(Category {
            id: text(self.id.as_ref()),
            name: self.name.unwrap_or_else(|| key.clone()),
            key,
        })
    }
}

impl BannerDto {
    pub(crate) fn normalize(self) -> Banner {
        Banner {
            id: text(self.id.as_ref()),
            image_url: self.image,
            link: self.url,
        }
    }
}

impl OrderDto {
    /// Normalizes a history entry; entries without an identifier are
    /// unusable downstream and map to `None`.
    pub(crate) fn normalize(self) -> Option<OrderSummary> {
        let id = text(self.id.as_ref())?;

        Some(OrderSummary {
            code: self.code.unwrap_or_else(|| id.clone()),
            id,
            status: self.status,
            created_at: parse_expiry(self.created_at.as_deref()),
            delivery_time: self.delivery_time,
            courier: self.courier,
            items: self
                .items
                .into_iter()
                .filter_map(OrderItemDto::normalize)
                .collect(),
        })
    }
}

impl OrderItemDto {
    pub(crate) fn normalize(self) -> Option<OrderItem> {
        Some(OrderItem {
            name: self.name?,
            price: decimal(self.price.as_ref()),
            quantity: count(self.quantity.as_ref()).unwrap_or(1),
        })
    }
}

impl StatusDto {
    /// Maps the raw flag record onto the canonical stage pipeline. The
    /// mapping is explicit and total: every known stage gets its slot, and
    /// anything else in the record was already dropped by deserialization.
    pub(crate) fn normalize(&self) -> StageFlags {
        let mut flags = StageFlags::default();

        let slots: [(OrderStage, &Option<String>, &Option<String>); 6] = [
            (OrderStage::Issued, &self.issued, &self.issued_at),
            (OrderStage::Processing, &self.processing, &self.processing_at),
            (OrderStage::Assembling, &self.assembling, &self.assembling_at),
            (
                OrderStage::ReadyForDelivery,
                &self.ready_for_delivery,
                &self.ready_for_delivery_at,
            ),
            (OrderStage::InTransit, &self.in_transit, &self.in_transit_at),
            (OrderStage::Delivered, &self.delivered, &self.delivered_at),
        ];

        for (stage, flag, at) in slots {
            flags.set(
                stage,
                stage_flag(flag.as_deref()),
                stage_timestamp(at.as_deref()),
            );
        }

        flags
    }
}

impl ConflictBody {
    pub(crate) fn adjustments(&self) -> Vec<StockAdjustment> {
        self.changes
            .iter()
            .filter_map(|change| {
                Some(StockAdjustment {
                    product_code: text(change.code.as_ref())?,
                    available: count(change.quantity.as_ref()).unwrap_or(0),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_record_normalizes_localized_fields() {
        let raw = serde_json::json!({
            "id": "P1",
            "Наименование": "Парацетамол 500мг",
            "Производитель": "Фармстандарт",
            "Срок": "2026-03-01T00:00:00Z",
            "Цена": "12.50",
            "Количество": 40,
            "category": "analgesics"
        });

        let product: Product = serde_json::from_value::<ProductDto>(raw)
            .expect("dto should deserialize")
            .normalize();

        assert_eq!(product.id.as_deref(), Some("P1"));
        assert_eq!(product.name, "Парацетамол 500мг");
        assert_eq!(product.category.as_deref(), Some("analgesics"));

        let batch = product.lead_batch().expect("batch should exist");

        assert_eq!(batch.price, Decimal::new(1250, 2));
        assert_eq!(batch.stock, Some(40));
        assert!(batch.expiry.is_some());
    }

    #[test]
    fn numeric_code_becomes_a_stable_string_key() {
        let raw = serde_json::json!({
            "Код": 10_234,
            "Наименование": "Ибупрофен"
        });

        let product = serde_json::from_value::<ProductDto>(raw)
            .expect("dto should deserialize")
            .normalize();

        assert_eq!(product.code.as_deref(), Some("10234"));
        assert_eq!(
            product.key().map(|k| k.to_string()),
            Some("10234".to_string())
        );
    }

    #[test]
    fn epoch_zero_expiry_normalizes_to_none() {
        let raw = serde_json::json!({
            "id": "P1",
            "Наименование": "Капли",
            "Срок": "0001-01-01T00:00:00Z",
            "Цена": 8
        });

        let product = serde_json::from_value::<ProductDto>(raw)
            .expect("dto should deserialize")
            .normalize();

        let batch = product.lead_batch().expect("batch should exist");

        assert_eq!(batch.expiry, None);
    }

    #[test]
    fn batch_list_sorts_fefo() {
        let raw = serde_json::json!({
            "id": "P1",
            "Наименование": "Сироп",
            "Партии": [
                { "Срок": "0001-01-01T00:00:00Z", "Цена": "30", "Количество": 5 },
                { "Срок": "2026-06-01T00:00:00Z", "Цена": "20", "Количество": 8 },
                { "Срок": "2025-11-01T00:00:00Z", "Цена": "10", "Количество": 3 }
            ]
        });

        let product = serde_json::from_value::<ProductDto>(raw)
            .expect("dto should deserialize")
            .normalize();

        let prices: Vec<_> = product.batches.iter().map(|b| b.price).collect();

        assert_eq!(
            prices,
            vec![Decimal::from(10), Decimal::from(20), Decimal::from(30)],
            "batches must come back earliest expiry first, no-expiry last"
        );
    }

    #[test]
    fn status_record_projects_to_last_reached_stage() {
        let raw = serde_json::json!({
            "Оформлено": "Да",
            "КОбработке": "Да",
            "КСборке": "Нет",
            "ГотовКДоставке": "Нет",
            "ВПути": "Нет",
            "Доставлен": "Нет",
            "ДатаОформлено": "13.05.2025 14:30:00",
            "ДатаКОбработке": "01.01.0001 0:00:00",
            "НеизвестноеПоле": "Да"
        });

        let flags = serde_json::from_value::<StatusDto>(raw)
            .expect("dto should deserialize")
            .normalize();

        assert_eq!(flags.current_stage(), OrderStage::Processing);
        assert_eq!(flags.current_stage_index(), 1);
        assert!(
            flags.issued.at.is_some(),
            "a real stage timestamp must survive normalization"
        );
        assert_eq!(
            flags.processing.at, None,
            "the epoch-zero sentinel must normalize to None"
        );
    }

    #[test]
    fn empty_status_record_defaults_to_issued() {
        let flags = StatusDto::default().normalize();

        assert_eq!(flags.current_stage(), OrderStage::Issued);
    }

    #[test]
    fn conflict_changes_normalize_to_adjustments() {
        let raw = serde_json::json!({
            "message": "Часть товаров недоступна",
            "changes": [
                { "Код": "P1", "Количество": 2 },
                { "Код": "P2", "Количество": "0" },
                { "Количество": 5 }
            ]
        });

        let body: ConflictBody = serde_json::from_value(raw).expect("body should deserialize");
        let adjustments = body.adjustments();

        assert_eq!(
            adjustments,
            vec![
                StockAdjustment {
                    product_code: "P1".to_string(),
                    available: 2,
                },
                StockAdjustment {
                    product_code: "P2".to_string(),
                    available: 0,
                },
            ],
            "entries without a product code must be dropped"
        );
    }

    #[test]
    fn sign_in_payload_flattens_user_fields() {
        let raw = serde_json::json!({
            "token": "bearer-1",
            "refresh_token": "refresh-1",
            "id": "U7",
            "Наименование": "ООО Аптека",
            "Фирма": "Главная"
        });

        let payload: SignInPayload = serde_json::from_value(raw).expect("payload should parse");
        let user = payload.user.normalize();

        assert_eq!(payload.token.as_deref(), Some("bearer-1"));
        assert_eq!(payload.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(user.id.as_deref(), Some("U7"));
        assert_eq!(user.name.as_deref(), Some("ООО Аптека"));
    }
}

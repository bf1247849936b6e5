//! Product messages pushed by the reader service.
//!
//! The reader service is loosely typed: fields may be missing, `null`, empty,
//! or numbers where strings are expected. Deserialization here never fails on
//! shape. Anything unusable is read as absent, and [`InboundMessage::to_event`]
//! fills absent fields from the [`fallback`](crate::fallback) table.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use kiosk_core::{Clock, OperatorInfo, Product, ProductEvent, ProductStatus};

use crate::fallback::{self, ProductField};

/// Product section of an inbound message, all fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub epc: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub net_weight: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pieces: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub unit_of_measure: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub print_card: Option<String>,
    #[serde(default, rename = "tipoEtiqueta", deserialize_with = "lenient_string")]
    pub label_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub area: Option<String>,
    #[serde(default, rename = "claveProducto", deserialize_with = "lenient_string")]
    pub product_code: Option<String>,
    #[serde(default, rename = "pesoBruto", deserialize_with = "lenient_string")]
    pub gross_weight: Option<String>,
    #[serde(default, rename = "pesoTarima", deserialize_with = "lenient_string")]
    pub pallet_weight: Option<String>,
    #[serde(default, rename = "fechaEntrada", deserialize_with = "lenient_string")]
    pub entry_date: Option<String>,
    #[serde(default, rename = "horaEntrada", deserialize_with = "lenient_string")]
    pub entry_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rfid: Option<String>,
}

impl WireProduct {
    /// Raw value of a field, `None` when absent or empty.
    pub fn get(&self, field: ProductField) -> Option<&str> {
        let value = match field {
            ProductField::Id => &self.id,
            ProductField::Name => &self.name,
            ProductField::Epc => &self.epc,
            ProductField::ImageUrl => &self.image_url,
            ProductField::NetWeight => &self.net_weight,
            ProductField::Pieces => &self.pieces,
            ProductField::UnitOfMeasure => &self.unit_of_measure,
            ProductField::PrintCard => &self.print_card,
            ProductField::LabelType => &self.label_type,
            ProductField::Area => &self.area,
            ProductField::ProductCode => &self.product_code,
            ProductField::GrossWeight => &self.gross_weight,
            ProductField::PalletWeight => &self.pallet_weight,
            ProductField::EntryDate => &self.entry_date,
            ProductField::EntryTime => &self.entry_time,
            ProductField::Rfid => &self.rfid,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }
}

/// Operator section of an inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireOperatorInfo {
    #[serde(default, rename = "nombreOperador", deserialize_with = "lenient_string")]
    pub operator_name: Option<String>,
}

impl WireOperatorInfo {
    /// Operator name, `None` when absent or empty.
    pub fn name(&self) -> Option<&str> {
        self.operator_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// A message received on `NewAssociation` or `NewPallet`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    #[serde(default, deserialize_with = "lenient_truthy")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_object")]
    pub product: WireProduct,
    #[serde(default, deserialize_with = "lenient_optional_object")]
    pub operator_info: Option<WireOperatorInfo>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub rssi: Option<i64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub antenna_port: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
}

impl InboundMessage {
    /// Read a message from an arbitrary JSON value.
    ///
    /// Never fails: a value that is not an object yields a message with
    /// `success == false`, which the kiosk ignores.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_else(|error| {
                tracing::debug!(%error, "unreadable product message, treating as unsuccessful");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Deduplication key: the tag identifier, else the generic identifier.
    ///
    /// Empty when the message carries neither.
    pub fn tag_key(&self) -> &str {
        self.product
            .get(ProductField::Epc)
            .or_else(|| self.product.get(ProductField::Id))
            .unwrap_or_default()
    }

    /// Operator name carried by an association, if any.
    pub fn operator_name(&self) -> Option<&str> {
        self.operator_info.as_ref().and_then(WireOperatorInfo::name)
    }

    /// Returns `true` if the message carries an operator section at all.
    pub fn is_association(&self) -> bool {
        self.operator_info.is_some()
    }

    /// Build a fresh repository event from this message.
    ///
    /// Status is `success` when an operator section is present, `pending`
    /// otherwise. Absent fields are resolved through the fallback table.
    pub fn to_event(&self, clock: &dyn Clock) -> ProductEvent {
        let tag_key = self.tag_key();
        let field = |field: ProductField| match self.product.get(field) {
            Some(value) => value.to_string(),
            None => field.fallback().resolve(tag_key, clock),
        };

        let (status, operator) = match &self.operator_info {
            Some(info) => (
                ProductStatus::Success,
                info.name()
                    .map(str::to_string)
                    .unwrap_or_else(|| fallback::OPERATOR.resolve(tag_key, clock)),
            ),
            None => (
                ProductStatus::Pending,
                fallback::OPERATOR.resolve(tag_key, clock),
            ),
        };

        let product = Product {
            id: field(ProductField::Id),
            name: field(ProductField::Name),
            epc: field(ProductField::Epc),
            status,
            image_url: field(ProductField::ImageUrl),
            net_weight: field(ProductField::NetWeight),
            pieces: field(ProductField::Pieces),
            unit_of_measure: field(ProductField::UnitOfMeasure),
            print_card: field(ProductField::PrintCard),
            operator,
            label_type: field(ProductField::LabelType),
            area: field(ProductField::Area),
            product_code: field(ProductField::ProductCode),
            gross_weight: field(ProductField::GrossWeight),
            pallet_weight: field(ProductField::PalletWeight),
            entry_date: field(ProductField::EntryDate),
            entry_time: field(ProductField::EntryTime),
            rfid: field(ProductField::Rfid),
        };

        ProductEvent {
            success: true,
            product,
            operator_info: self.operator_info.as_ref().map(|info| OperatorInfo {
                name: info.operator_name.clone(),
            }),
            rssi: self
                .rssi
                .and_then(|v| i32::try_from(v).ok())
                .unwrap_or(fallback::RSSI),
            antenna_port: self
                .antenna_port
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(fallback::ANTENNA_PORT),
            timestamp: self
                .timestamp
                .clone()
                .filter(|ts| !ts.is_empty())
                .unwrap_or_else(|| fallback::TIMESTAMP.resolve(tag_key, clock)),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_integer<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Truthiness as the reader service's clients understand it.
fn lenient_truthy<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    })
}

fn lenient_object<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    Ok(lenient_optional_object(deserializer)?.unwrap_or_default())
}

fn lenient_optional_object<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => Some(serde_json::from_value(value).unwrap_or_default()),
        _ => None,
    })
}

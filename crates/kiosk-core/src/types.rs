use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a detected product.
///
/// A product starts `Pending` when it is detected without an operator and
/// becomes `Success` once an operator is associated with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Pending,
    Success,
    Error,
}

impl ProductStatus {
    /// Returns `true` if an operator has been associated.
    #[inline]
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, ProductStatus::Success)
    }

    /// Returns `true` if the product is still waiting for an operator.
    #[inline]
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, ProductStatus::Pending)
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProductStatus::Pending => write!(f, "pending"),
            ProductStatus::Success => write!(f, "success"),
            ProductStatus::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ProductStatus::Pending),
            "success" => Ok(ProductStatus::Success),
            "error" => Ok(ProductStatus::Error),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// A product as detected by the RFID reader.
///
/// All descriptive fields are kept as display strings; the reader service
/// already formats weights and counts, and missing values are filled with
/// fallback literals before a `Product` is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stable identifier.
    pub id: String,
    pub name: String,
    /// Hardware tag identifier, the deduplication key.
    pub epc: String,
    pub status: ProductStatus,
    pub image_url: String,
    pub net_weight: String,
    pub pieces: String,
    pub unit_of_measure: String,
    pub print_card: String,
    /// Operator display name, the only field that changes after creation.
    pub operator: String,
    pub label_type: String,
    pub area: String,
    pub product_code: String,
    pub gross_weight: String,
    pub pallet_weight: String,
    pub entry_date: String,
    pub entry_time: String,
    /// Raw tag value as read by the antenna.
    pub rfid: String,
}

impl Product {
    /// Return a copy with the operator assigned and status forced to success.
    #[must_use]
    pub fn with_operator(&self, operator: &str) -> Self {
        Self {
            operator: operator.to_string(),
            status: ProductStatus::Success,
            ..self.clone()
        }
    }
}

/// Operator associated with a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorInfo {
    pub name: Option<String>,
}

impl OperatorInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Operator name if present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// One received product detection, as held by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEvent {
    pub success: bool,
    pub product: Product,
    pub operator_info: Option<OperatorInfo>,
    /// Signal strength reading.
    pub rssi: i32,
    pub antenna_port: u32,
    pub timestamp: String,
}

impl ProductEvent {
    /// Return a copy whose product carries the given operator.
    #[must_use]
    pub fn with_operator(&self, operator: &str) -> Self {
        Self {
            product: self.product.with_operator(operator),
            ..self.clone()
        }
    }

    /// Product identifier shortcut.
    pub fn product_id(&self) -> &str {
        &self.product.id
    }

    /// Hardware tag identifier shortcut.
    pub fn epc(&self) -> &str {
        &self.product.epc
    }
}

/// State of the real-time hub connection as shown on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Initial connection attempt in progress.
    Connecting,
    Connected,
    /// Connection lost, automatic reconnection in progress.
    Reconnecting,
    /// Not connected and not trying to.
    Disconnected,
}

impl ConnectionStatus {
    #[inline]
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Reconnecting => write!(f, "Reconnecting"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}

//! Fallback policy for absent inbound fields.
//!
//! Every product field the reader service may omit is listed in
//! [`FALLBACKS`] together with the value it takes when absent. The table is
//! the single place that defines the defaulting contract; message
//! normalization only looks values up here.
//!
//! | Field            | Fallback                          |
//! |------------------|-----------------------------------|
//! | `id`             | tag key (`epc`, else `id`)        |
//! | `epc`            | tag key                           |
//! | `name`           | `Producto sin nombre`             |
//! | `imageUrl`       | `/placeholder.svg`                |
//! | measurements     | `N/A`                             |
//! | `fechaEntrada`   | current instant, RFC 3339 UTC     |
//! | `horaEntrada`    | current local time `HH:MM:SS`     |
//! | `rfid`           | empty string                      |

use chrono::{SecondsFormat, Utc};

use kiosk_core::Clock;
use kiosk_core::constants::{NOT_AVAILABLE, PLACEHOLDER_IMAGE, UNASSIGNED_OPERATOR, UNNAMED_PRODUCT};

/// Product fields carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    Id,
    Name,
    Epc,
    ImageUrl,
    NetWeight,
    Pieces,
    UnitOfMeasure,
    PrintCard,
    LabelType,
    Area,
    ProductCode,
    GrossWeight,
    PalletWeight,
    EntryDate,
    EntryTime,
    Rfid,
}

/// How an absent value is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// A fixed literal.
    Literal(&'static str),
    /// The message's tag key.
    TagKey,
    /// The current instant as RFC 3339 UTC with milliseconds.
    CurrentInstant,
    /// The current local wall-clock time.
    CurrentTime,
}

/// Fallback for every product field, in wire order.
pub const FALLBACKS: [(ProductField, Fallback); 16] = [
    (ProductField::Id, Fallback::TagKey),
    (ProductField::Name, Fallback::Literal(UNNAMED_PRODUCT)),
    (ProductField::Epc, Fallback::TagKey),
    (ProductField::ImageUrl, Fallback::Literal(PLACEHOLDER_IMAGE)),
    (ProductField::NetWeight, Fallback::Literal(NOT_AVAILABLE)),
    (ProductField::Pieces, Fallback::Literal(NOT_AVAILABLE)),
    (ProductField::UnitOfMeasure, Fallback::Literal(NOT_AVAILABLE)),
    (ProductField::PrintCard, Fallback::Literal(NOT_AVAILABLE)),
    (ProductField::LabelType, Fallback::Literal(NOT_AVAILABLE)),
    (ProductField::Area, Fallback::Literal(NOT_AVAILABLE)),
    (ProductField::ProductCode, Fallback::Literal(NOT_AVAILABLE)),
    (ProductField::GrossWeight, Fallback::Literal(NOT_AVAILABLE)),
    (ProductField::PalletWeight, Fallback::Literal(NOT_AVAILABLE)),
    (ProductField::EntryDate, Fallback::CurrentInstant),
    (ProductField::EntryTime, Fallback::CurrentTime),
    (ProductField::Rfid, Fallback::Literal("")),
];

/// Operator name for products without an associated operator.
pub const OPERATOR: Fallback = Fallback::Literal(UNASSIGNED_OPERATOR);

/// Event timestamp when the message has none.
pub const TIMESTAMP: Fallback = Fallback::CurrentInstant;

/// Signal strength when the message has none.
pub const RSSI: i32 = 0;

/// Antenna port when the message has none.
pub const ANTENNA_PORT: u32 = 0;

impl ProductField {
    /// Field name as it appears on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            ProductField::Id => "id",
            ProductField::Name => "name",
            ProductField::Epc => "epc",
            ProductField::ImageUrl => "imageUrl",
            ProductField::NetWeight => "netWeight",
            ProductField::Pieces => "pieces",
            ProductField::UnitOfMeasure => "unitOfMeasure",
            ProductField::PrintCard => "printCard",
            ProductField::LabelType => "tipoEtiqueta",
            ProductField::Area => "area",
            ProductField::ProductCode => "claveProducto",
            ProductField::GrossWeight => "pesoBruto",
            ProductField::PalletWeight => "pesoTarima",
            ProductField::EntryDate => "fechaEntrada",
            ProductField::EntryTime => "horaEntrada",
            ProductField::Rfid => "rfid",
        }
    }

    /// Fallback declared for this field in [`FALLBACKS`].
    pub fn fallback(self) -> Fallback {
        FALLBACKS
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, fallback)| *fallback)
            .unwrap_or(Fallback::Literal(NOT_AVAILABLE))
    }
}

impl Fallback {
    /// Produce the fallback value.
    pub fn resolve(&self, tag_key: &str, clock: &dyn Clock) -> String {
        match self {
            Fallback::Literal(value) => (*value).to_string(),
            Fallback::TagKey => tag_key.to_string(),
            Fallback::CurrentInstant => clock
                .now()
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            Fallback::CurrentTime => clock.now().format("%H:%M:%S").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use kiosk_core::FixedClock;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn test_table_covers_every_field_once() {
        let fields: HashSet<_> = FALLBACKS.iter().map(|(field, _)| *field).collect();
        assert_eq!(fields.len(), FALLBACKS.len());

        let names: HashSet<_> = FALLBACKS.iter().map(|(field, _)| field.wire_name()).collect();
        assert_eq!(names.len(), FALLBACKS.len());
    }

    #[rstest]
    #[case(ProductField::Name, Fallback::Literal("Producto sin nombre"))]
    #[case(ProductField::ImageUrl, Fallback::Literal("/placeholder.svg"))]
    #[case(ProductField::PalletWeight, Fallback::Literal("N/A"))]
    #[case(ProductField::Rfid, Fallback::Literal(""))]
    #[case(ProductField::Epc, Fallback::TagKey)]
    #[case(ProductField::EntryDate, Fallback::CurrentInstant)]
    fn test_declared_fallbacks(#[case] field: ProductField, #[case] expected: Fallback) {
        assert_eq!(field.fallback(), expected);
    }

    #[test]
    fn test_resolve_uses_clock() {
        let now = Local.with_ymd_and_hms(2024, 1, 7, 14, 5, 9).unwrap();
        let clock = FixedClock(now);

        assert_eq!(Fallback::CurrentTime.resolve("", &clock), "14:05:09");
        let instant = Fallback::CurrentInstant.resolve("", &clock);
        let parsed = chrono::DateTime::parse_from_rfc3339(&instant).unwrap();
        assert_eq!(parsed, now);
        assert!(instant.ends_with(".000Z"));
    }

    #[test]
    fn test_resolve_tag_key() {
        let clock = FixedClock(Local::now());
        assert_eq!(Fallback::TagKey.resolve("E200", &clock), "E200");
        assert_eq!(OPERATOR.resolve("E200", &clock), "Indefinido");
    }
}

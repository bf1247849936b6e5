//! Benchmarks for turning inbound product payloads into product events.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench normalization_bench
//! ```

use chrono::{Local, TimeZone};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;
use kiosk_core::FixedClock;
use kiosk_protocol::InboundMessage;

fn complete_payload() -> Value {
    json!({
        "success": true,
        "product": {
            "id": "P-1",
            "name": "Tarima de cartón",
            "epc": "E28011700000020F",
            "imageUrl": "/img/p1.png",
            "netWeight": 120,
            "pieces": "4",
            "unitOfMeasure": "KG",
            "printCard": "PC-1",
            "tipoEtiqueta": "A",
            "area": "EMPAQUE",
            "claveProducto": "CLV-1",
            "pesoBruto": "130",
            "pesoTarima": "10",
            "fechaEntrada": "2024-01-07T00:00:00",
            "horaEntrada": "08:15:00",
            "rfid": "E280"
        },
        "operatorInfo": { "nombreOperador": "Juan" },
        "rssi": -40,
        "antennaPort": 1,
        "timestamp": "2024-01-07T08:15:00.000Z"
    })
}

fn sparse_payload() -> Value {
    json!({ "success": true, "product": { "epc": "E1" } })
}

/// Benchmark lenient parsing plus fallback filling.
fn bench_to_event(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_event");
    group.throughput(Throughput::Elements(1));

    let clock = FixedClock(Local.with_ymd_and_hms(2024, 1, 7, 8, 30, 0).unwrap());

    for (name, payload) in [("complete", complete_payload()), ("sparse", sparse_payload())] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &payload, |b, payload| {
            b.iter(|| {
                let message = InboundMessage::from_value(black_box(payload.clone()));
                black_box(message.to_event(&clock));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_to_event);
criterion_main!(benches);

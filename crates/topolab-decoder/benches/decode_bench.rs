//! Benchmarks for the Topolab header decoder
//!
//! Measures performance of:
//! - Hex tokenization
//! - Full-chain decoding of common frames
//! - Deep chains through GRE tunnels

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use topolab_decoder::{decode_packet, HexStream};

const ETH_IP: &str = "00 00 5e 00 53 01 00 00 5e 00 53 02 08 00";

fn arp_request() -> String {
    "ff ff ff ff ff ff 00 11 22 33 44 55 08 06 00 01 08 00 06 04 00 01 \
     00 11 22 33 44 55 c0 a8 01 0a 00 00 00 00 00 00 c0 a8 01 01"
        .to_string()
}

fn icmp_echo() -> String {
    format!(
        "{ETH_IP} 45 00 00 1c 1c 46 40 00 40 01 b1 e6 c0 00 02 01 c0 00 02 02 \
         08 00 f7 fe 00 01 00 01"
    )
}

fn rstp_bpdu() -> String {
    "01 80 c2 00 00 00 00 11 22 33 44 55 00 27 42 42 03 00 00 02 02 3c \
     80 00 00 11 22 33 44 55 00 00 00 00 80 00 00 11 22 33 44 55 80 01 \
     00 00 14 00 02 00 0f 00 00"
        .to_string()
}

/// IPv4 over GRE over IPv4, `depth` times.
fn gre_tunnel(depth: usize) -> String {
    let mut inner = "00 35 00 35 00 08 00 00".to_string();
    let mut total = 28;
    inner = format!(
        "45 00 00 {total:02x} 00 01 00 00 40 11 00 00 0a 00 00 01 0a 00 00 02 {inner}"
    );
    for _ in 0..depth {
        total += 24;
        inner = format!(
            "45 00 00 {total:02x} 00 01 00 00 40 2f 00 00 c6 33 64 01 c6 33 64 02 00 00 08 00 {inner}"
        );
    }
    format!("{ETH_IP} {inner}")
}

/// Benchmark tokenizing the raw octet text
fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for &len in &[64usize, 512, 1500] {
        let raw = vec!["ab"; len].join(" ");
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &raw, |b, raw| {
            b.iter(|| HexStream::parse(black_box(raw)))
        });
    }
    group.finish();
}

/// Benchmark decoding common frames end to end
fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");

    for (name, raw) in [
        ("arp", arp_request()),
        ("icmp", icmp_echo()),
        ("rstp", rstp_bpdu()),
    ] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(name), &raw, |b, raw| {
            b.iter(|| decode_packet(black_box(raw)))
        });
    }
    group.finish();
}

/// Benchmark chains of increasing depth
fn bench_tunnels(c: &mut Criterion) {
    let mut group = c.benchmark_group("gre_depth");

    for depth in [1usize, 2, 4, 8] {
        let raw = gre_tunnel(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &raw, |b, raw| {
            b.iter(|| decode_packet(black_box(raw)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_frames, bench_tunnels);
criterion_main!(benches);

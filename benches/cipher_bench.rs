//! Cipher Benchmarks - Per-request Crypto Cost
//!
//! Every trade request decrypts a wallet key and up to three credential
//! fields, each paying one PBKDF2 derivation. These benches track that
//! cost.
//!
//! Run with: cargo bench --bench cipher_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use polymarket_custody_vault::crypto::{decrypt, encrypt, keys, MasterKey};

const PRIVATE_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

/// Benchmark encrypting a private key (KDF + AES-GCM seal).
fn bench_encrypt(c: &mut Criterion) {
    let key = MasterKey::new("bench-master-key").unwrap();

    c.bench_function("encrypt_private_key", |b| {
        b.iter(|| encrypt(black_box(PRIVATE_KEY), &key).unwrap());
    });
}

/// Benchmark decrypting a private key (KDF + AES-GCM open).
fn bench_decrypt(c: &mut Criterion) {
    let key = MasterKey::new("bench-master-key").unwrap();
    let secret = encrypt(PRIVATE_KEY, &key).unwrap();

    c.bench_function("decrypt_private_key", |b| {
        b.iter(|| decrypt(black_box(&secret), &key).unwrap());
    });
}

/// Benchmark wallet generation (CSPRNG + secp256k1 + checksum).
fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_wallet", |b| {
        b.iter(|| keys::generate().unwrap());
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_encrypt, bench_decrypt, bench_generate
}
criterion_main!(benches);

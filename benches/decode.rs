//! Performance benchmarks for a3s-lsp-filter
//!
//! Run with: cargo bench

use a3s_lsp_filter::frame::MAX_FRAME_SIZE;
use a3s_lsp_filter::{filter_capabilities, FilterPolicy, Frame, Interceptor, Mode};
use criterion::{criterion_group, criterion_main, Criterion};

fn initialize_response() -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 0,
        "result": {
            "capabilities": {
                "codeActionProvider": true,
                "completionProvider": {"triggerCharacters": [".", ":"], "resolveProvider": true},
                "definitionProvider": true,
                "documentFormattingProvider": true,
                "documentSymbolProvider": true,
                "hoverProvider": true,
                "referencesProvider": true,
                "renameProvider": {"prepareProvider": true},
                "signatureHelpProvider": {"triggerCharacters": ["("]},
                "textDocumentSync": 2,
                "workspaceSymbolProvider": true
            },
            "serverInfo": {"name": "bench-ls", "version": "1.0"}
        }
    })
}

fn bench_frame_decode(c: &mut Criterion) {
    let wire = Frame::from_json(&initialize_response()).unwrap().encode();

    c.bench_function("Frame::decode", |b| {
        b.iter(|| Frame::decode(&wire, MAX_FRAME_SIZE).unwrap().unwrap());
    });

    c.bench_function("Frame::encode", |b| {
        let frame = Frame::from_json(&initialize_response()).unwrap();
        b.iter(|| frame.encode());
    });
}

fn bench_filter(c: &mut Criterion) {
    let policy = FilterPolicy::new(Mode::Enable, ["completion", "definition"]);
    let message = initialize_response();

    c.bench_function("filter_capabilities", |b| {
        b.iter(|| {
            let mut message = message.clone();
            filter_capabilities(&mut message, &policy)
        });
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut wire = Frame::from_json(&initialize_response()).unwrap().encode();
    // Passthrough tail, 1 MiB
    wire.extend(std::iter::repeat(b'x').take(1024 * 1024));

    c.bench_function("Interceptor::run 1MiB", |b| {
        b.to_async(&rt).iter(|| async {
            let mut out = Vec::with_capacity(wire.len());
            let mut interceptor =
                Interceptor::new(FilterPolicy::new(Mode::Disable, ["hover"]));
            interceptor.run(&wire[..], &mut out).await.unwrap()
        });
    });
}

criterion_group!(benches, bench_frame_decode, bench_filter, bench_pipeline);
criterion_main!(benches);

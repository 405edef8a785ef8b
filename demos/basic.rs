//! Basic example demonstrating per-host admission control.
//!
//! One host allows 3 requests per 30 second window, another uses the
//! sliding window, and a third has limiting switched off. The status page
//! is rendered at the end.

use tracing_subscriber::prelude::*;
use vhost_throttle::{
    ConnectionLimitHandler, HookOutcome, RequestInfo, VirtualHostLimitConfig,
    DEFAULT_STATUS_HANDLER,
};

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let handler = ConnectionLimitHandler::builder()
        .with_host(
            "shop.example",
            VirtualHostLimitConfig::fixed_window(3, 30).expect("30s window is valid"),
        )
        .with_host(
            "blog.example",
            VirtualHostLimitConfig::sliding_window(10).expect("10s window is valid"),
        )
        .with_host("intranet.example", VirtualHostLimitConfig::default())
        .build()
        .expect("hosts are configured once each");

    println!("=== Basic Admission Example ===\n");

    for host in ["shop.example", "blog.example", "intranet.example"] {
        let request = RequestInfo::new(host).with_handler("php-script");
        let refused = (0..100)
            .filter(|_| handler.on_request(&request) == HookOutcome::ServiceUnavailable)
            .count();
        println!("{}: 100 requests, {} refused with 503", host, refused);
    }

    // Static files served by the default handler are not counted
    let image = RequestInfo::new("shop.example")
        .with_handler("image/png")
        .with_content_type("image/png");
    println!(
        "\nshop.example static file: {:?}",
        handler.on_request(&image)
    );

    let status = RequestInfo::new("shop.example").with_handler(DEFAULT_STATUS_HANDLER);
    if let HookOutcome::StatusPage(page) = handler.on_request(&status) {
        println!("\nStatus page:\n{}", page);
    }

    let metrics = handler.metrics().snapshot();
    println!(
        "Admitted: {}, rejected: {}, rejection rate: {:.1}%",
        metrics.requests_admitted,
        metrics.requests_rejected,
        metrics.rejection_rate() * 100.0
    );
}

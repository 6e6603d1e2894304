//! Banner fetching over HTTP

#![cfg(feature = "http")]

mod common;

use common::{asha, banner_png, config_in};
use receipt_renderer::banner::banner_source_for;
use receipt_renderer::{Error, Locale, OutputMode, ReceiptRenderer, RendererConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once, OnceLock};
use tiny_http::{Header, Response, Server};

static INIT: Once = Once::new();
static BASE: OnceLock<String> = OnceLock::new();
static BANNER_HITS: AtomicUsize = AtomicUsize::new(0);

/// Start a banner server on an ephemeral port
fn start_banner_server() -> String {
    INIT.call_once(|| {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        BASE.set(format!("http://{}", addr)).unwrap();
        let png = banner_png();
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                let response = match request.url() {
                    "/banner.png" => {
                        BANNER_HITS.fetch_add(1, Ordering::SeqCst);
                        Response::from_data(png.clone())
                            .with_header("Content-Type: image/png".parse::<Header>().unwrap())
                    }
                    "/page.html" => Response::from_data(b"<html></html>".to_vec())
                        .with_header("Content-Type: text/html".parse::<Header>().unwrap()),
                    _ => Response::from_data(b"Not Found".to_vec()).with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
    });
    BASE.get().cloned().unwrap()
}

fn renderer_for(url: String) -> ReceiptRenderer {
    let config = RendererConfig {
        banner_url: url,
        timeout_ms: 5000,
        ..config_in(std::env::temp_dir())
    };
    ReceiptRenderer::new(config).unwrap()
}

#[test]
fn banner_is_fetched_on_every_render() {
    let base = start_banner_server();
    let r = renderer_for(format!("{}/banner.png", base));
    let before = BANNER_HITS.load(Ordering::SeqCst);

    for _ in 0..2 {
        let out = r.render_localized(&asha(), Locale::En, OutputMode::ReturnFile).unwrap();
        assert!(out.into_file().unwrap().bytes.starts_with(b"%PDF-"));
    }
    assert!(BANNER_HITS.load(Ordering::SeqCst) >= before + 2);
}

#[test]
fn banner_is_inlined_as_data_uri() {
    let base = start_banner_server();
    let r = renderer_for(format!("{}/banner.png", base));
    let text = r.catalog().translator(Locale::En);
    let html = r.render_html(&asha(), Locale::En, &text, chrono::Utc::now()).unwrap();
    assert!(html.contains("src=\"data:image/png;base64,"));
    assert!(!html.contains(&base));
}

#[test]
fn missing_banner_fails_the_render() {
    let base = start_banner_server();
    let r = renderer_for(format!("{}/nope.png", base));
    let err = r.render_localized(&asha(), Locale::En, OutputMode::ReturnFile).unwrap_err();
    assert!(matches!(err, Error::FetchError(_)), "got {:?}", err);
    assert_eq!(r.surface_host().attached_count(), 0);
}

#[test]
fn non_image_payload_fails_the_render() {
    let base = start_banner_server();
    let r = renderer_for(format!("{}/page.html", base));
    let err = r.render_localized(&asha(), Locale::En, OutputMode::ReturnFile).unwrap_err();
    assert!(matches!(err, Error::FetchError(_)));
}

#[test]
fn source_selection_by_scheme() {
    let config = RendererConfig::default();
    assert!(banner_source_for("https://example.org/banner.jpg", &config)
        .unwrap()
        .describe()
        .starts_with("https://"));
    assert!(banner_source_for("ftp://example.org/banner.jpg", &config).is_err());
    assert_eq!(
        banner_source_for("assets/banner-kn.jpg", &config).unwrap().describe(),
        "assets/banner-kn.jpg"
    );
}

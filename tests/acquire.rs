//! HTTP image acquisition against a local mock server.

use image::{ImageFormat, Rgba, RgbaImage};
use lento_flyers::pipeline::acquire::fetch_image;
use lento_flyers::{AcquisitionError, HttpImageSource, ImageSource};
use std::io::Cursor;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn source(timeout_secs: u64) -> HttpImageSource {
    HttpImageSource::new(timeout_secs, "Mozilla/5.0").unwrap()
}

#[tokio::test]
async fn fetches_and_decodes_png() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/10045.png"))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png_bytes(64, 48)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/img/10045.png", server.uri());
    let img = source(10).fetch(&url).await.unwrap();
    assert_eq!((img.width(), img.height()), (64, 48));
}

#[tokio::test]
async fn not_found_is_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing.jpg", server.uri());
    let err = source(10).fetch(&url).await.unwrap_err();
    assert_eq!(err, AcquisitionError::HttpStatus { url, status: 404 });
}

#[tokio::test]
async fn html_payload_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>blocked</html>"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/blocked.jpg", server.uri());
    let err = source(10).fetch(&url).await.unwrap_err();
    assert!(matches!(err, AcquisitionError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes(4, 4))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let url = format!("{}/slow.png", server.uri());
    let err = source(1).fetch(&url).await.unwrap_err();
    assert!(matches!(err, AcquisitionError::Timeout { secs: 1, .. }), "got {err:?}");
}

#[tokio::test]
async fn nan_reference_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let http = source(10);
    for reference in [None, Some(""), Some("  "), Some("nan"), Some("NaN")] {
        let err = fetch_image(&http, reference).await.unwrap_err();
        assert_eq!(err, AcquisitionError::MissingReference);
    }
}

use std::fs;
use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};
use image::{ImageFormat, Rgb, RgbImage};
use mspquote_core::cpq::catalog::Catalog;
use mspquote_core::cpq::pricing::{PricingEngine, RuleTablePricingEngine};
use mspquote_core::domain::quote::{NvrTier, QuoteState};
use mspquote_core::errors::ApplicationError;
use mspquote_core::store::PACKAGED_CATALOG;
use mspquote_document::{DocumentRenderer, RenderError};
use rust_decimal::Decimal;
use tempfile::TempDir;

fn generated_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 4)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .expect("valid timestamp")
}

fn packaged() -> Catalog {
    Catalog::from_json(PACKAGED_CATALOG).expect("packaged catalog")
}

fn small_png() -> Vec<u8> {
    let image = RgbImage::from_pixel(40, 20, Rgb([200, 30, 30]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).expect("encode png");
    bytes.into_inner()
}

fn office_quote() -> QuoteState {
    let mut state = QuoteState::default();
    state.branding.company_name = "Northwind IT".to_owned();
    state.customer.name = "Contoso Dental".to_owned();
    state.devices.servers = 1;
    state.devices.workstations = 12;
    state.devices.cameras = 6;
    state.nvr_tier = NvrTier::Port8;
    state.add_ons.server_backup = true;
    state.add_ons.huntress = true;
    state.metadata.tax_rate = Decimal::new(825, 4);
    state
}

#[test]
fn write_to_produces_pdf_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("out/quote.pdf");
    let state = office_quote();
    let quote = RuleTablePricingEngine.compute(&packaged(), &state);

    DocumentRenderer::default().write_to(&path, &state, &quote, generated_at()).expect("write");

    let bytes = fs::read(&path).expect("read back");
    let document = String::from_utf8_lossy(&bytes);
    assert!(document.starts_with("%PDF-"));
    assert!(document.contains("/MediaBox [0 0 612 792]"));
    assert!(document.contains("Huntress Cybersecurity"));
    assert!(document.contains("Customer: Contoso Dental"));
}

#[test]
fn write_failure_leaves_no_file() {
    let dir = TempDir::new().expect("temp dir");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "file").expect("seed blocker");
    let path = blocker.join("quote.pdf");
    let state = QuoteState::default();
    let quote = RuleTablePricingEngine.compute(&packaged(), &state);

    let error = DocumentRenderer::default()
        .write_to(&path, &state, &quote, generated_at())
        .expect_err("parent is a file");

    assert!(matches!(error, RenderError::Io { .. }));
    assert!(!path.exists());
    assert_eq!(ApplicationError::from(error).error_class(), "document_generation");
}

#[test]
fn png_logo_is_embedded() {
    let mut state = office_quote();
    state.branding.logo = Some(small_png());
    let quote = RuleTablePricingEngine.compute(&packaged(), &state);

    let bytes = DocumentRenderer::default().render(&state, &quote, generated_at());
    let document = String::from_utf8_lossy(&bytes);

    assert!(document.contains("/Im1"));
    assert!(document.contains("/FlateDecode"));
    assert!(document.contains("/Width 40"));
    assert!(document.contains("Northwind IT Quote"));
}

#[test]
fn packaged_prices_flow_into_totals() {
    let state = office_quote();
    let quote = RuleTablePricingEngine.compute(&packaged(), &state);

    // 150 + 12*75 + 60 + 13*8 + 6*25 + 300
    assert_eq!(quote.subtotal, Decimal::new(1664, 0));

    let bytes = DocumentRenderer::default().render(&state, &quote, generated_at());
    let document = String::from_utf8_lossy(&bytes);
    assert!(document.contains("Subtotal: $1,664.00"));
    assert!(document.contains("Total: $1,801.28"));
}

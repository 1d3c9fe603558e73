use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use mspquote_core::cpq::pricing::ComputedQuote;
use mspquote_core::domain::quote::QuoteState;
use mspquote_core::persist::write_atomically;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use tracing::{info, warn};

use crate::logo::LogoImage;
use crate::metrics::{elide, encode_win_ansi, text_width, truncate_to_width, wrap_text, Font};
use crate::money::{format_money, format_percent};
use crate::RenderError;

/// US Letter, in points.
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

const MARGIN: f32 = 40.0;
const CONTENT_RIGHT: f32 = PAGE_WIDTH - MARGIN;
const CONTENT_WIDTH: f32 = CONTENT_RIGHT - MARGIN;
const COLUMN_GAP: f32 = 12.0;
const QUANTITY_COLUMN_RIGHT: f32 = 400.0;
const LOGO_BOX: f32 = 80.0;
const TERMS_SIZE: f32 = 11.0;
const TERMS_LEADING: f32 = 14.0;

// Header caps keep the line items and totals on the page whatever the free text holds.
const MAX_TITLE_LINES: usize = 2;
const MAX_ADDRESS_LINES: usize = 6;

const LOGO_NAME: Name<'static> = Name(b"Im1");

const TIMESTAMP_FORMAT: &str = "%b %-d, %Y %-I:%M %p";
const DATE_FORMAT: &str = "%b %-d, %Y";

/// Lays a priced quote out on a single page.
#[derive(Clone, Debug)]
pub struct DocumentRenderer {
    currency_symbol: String,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new("$")
    }
}

impl DocumentRenderer {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self { currency_symbol: currency_symbol.into() }
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    /// Produces the PDF bytes. Every input yields a document: absent optional fields are
    /// left out and an undecodable logo is skipped.
    pub fn render(
        &self,
        state: &QuoteState,
        quote: &ComputedQuote,
        generated_at: NaiveDateTime,
    ) -> Vec<u8> {
        let logo = state.branding.logo.as_deref().and_then(decode_logo);

        let mut canvas = Canvas::new();
        self.lay_out(&mut canvas, state, quote, generated_at, logo.as_ref());
        if canvas.omitted > 0 {
            warn!(
                event_name = "document.layout.truncated",
                lines = canvas.omitted,
                "header lines beyond the layout caps were left out"
            );
        }
        if canvas.clipped > 0 {
            warn!(
                event_name = "document.layout.clipped",
                lines = canvas.clipped,
                "content past the bottom margin was not drawn"
            );
        }

        let title = document_title(state);
        assemble(canvas.content, logo.as_ref(), &title)
    }

    /// Renders and writes the document atomically; on failure no file is left at `path`.
    pub fn write_to(
        &self,
        path: &Path,
        state: &QuoteState,
        quote: &ComputedQuote,
        generated_at: NaiveDateTime,
    ) -> Result<(), RenderError> {
        let bytes = self.render(state, quote, generated_at);
        write_atomically(path, &bytes)
            .map_err(|source| RenderError::Io { path: path.to_path_buf(), source })?;

        info!(
            event_name = "document.write.completed",
            path = %path.display(),
            bytes = bytes.len(),
            "quote document written"
        );
        Ok(())
    }

    fn lay_out(
        &self,
        canvas: &mut Canvas,
        state: &QuoteState,
        quote: &ComputedQuote,
        generated_at: NaiveDateTime,
        logo: Option<&LogoImage>,
    ) {
        if let Some(logo) = logo {
            let (width, height) = logo.fit_within(LOGO_BOX);
            canvas.image(MARGIN, width, height);
            canvas.advance(LOGO_BOX + 10.0);
        }

        let title = document_title(state);
        let title_lines = clamp_lines(Font::Bold, 24.0, &title, CONTENT_WIDTH, MAX_TITLE_LINES);
        canvas.omitted += title_lines.omitted;
        for line in &title_lines.lines {
            canvas.text(Font::Bold, 24.0, MARGIN, line);
            canvas.advance(28.0);
        }
        canvas.advance(4.0);
        address_block(canvas, &state.branding.company_address);
        canvas.advance(8.0);

        let generated = format!("Generated: {}", generated_at.format(TIMESTAMP_FORMAT));
        canvas.text(Font::Regular, 14.0, MARGIN, &generated);
        canvas.advance(20.0);

        if let Some(metadata) = metadata_line(state) {
            let metadata = truncate_to_width(Font::Regular, 12.0, &metadata, CONTENT_WIDTH);
            canvas.text(Font::Regular, 12.0, MARGIN, &metadata);
            canvas.advance(18.0);
        }

        let customer = state.customer.name.trim();
        if !customer.is_empty() {
            let customer = format!("Customer: {customer}");
            let customer = truncate_to_width(Font::Regular, 14.0, &customer, CONTENT_WIDTH);
            canvas.text(Font::Regular, 14.0, MARGIN, &customer);
            canvas.advance(20.0);
            address_block(canvas, &state.customer.address);
        }
        canvas.advance(10.0);

        for line in quote.billable_lines() {
            let rate = format!(
                "{} @ {}",
                line.quantity,
                format_money(line.unit_price, &self.currency_symbol)
            );
            let rate_left = QUANTITY_COLUMN_RIGHT - text_width(Font::Regular, 12.0, &rate);
            let label_width = rate_left - COLUMN_GAP - MARGIN;
            let label = truncate_to_width(Font::Regular, 12.0, &line.label, label_width);
            canvas.text(Font::Regular, 12.0, MARGIN, &label);
            canvas.text_right(Font::Regular, 12.0, QUANTITY_COLUMN_RIGHT, &rate);
            canvas.text_right(
                Font::Regular,
                12.0,
                CONTENT_RIGHT,
                &format_money(line.extended_price, &self.currency_symbol),
            );
            canvas.advance(18.0);
        }

        canvas.rule(MARGIN, CONTENT_RIGHT);
        canvas.advance(12.0);

        let subtotal = format!("Subtotal: {}", format_money(quote.subtotal, &self.currency_symbol));
        canvas.text_right(Font::Regular, 12.0, CONTENT_RIGHT, &subtotal);
        canvas.advance(18.0);
        let tax = format!(
            "Tax ({}): {}",
            format_percent(quote.tax_rate),
            format_money(quote.tax, &self.currency_symbol)
        );
        canvas.text_right(Font::Regular, 12.0, CONTENT_RIGHT, &tax);
        canvas.advance(18.0);
        let total = format!("Total: {}", format_money(quote.grand_total, &self.currency_symbol));
        canvas.text_right(Font::Bold, 16.0, CONTENT_RIGHT, &total);
        canvas.advance(28.0);

        if !state.terms.trim().is_empty() {
            canvas.text(Font::Bold, 12.0, MARGIN, "Terms & Notes");
            canvas.advance(18.0);
            for line in wrap_text(Font::Regular, TERMS_SIZE, state.terms.trim(), CONTENT_WIDTH) {
                let line = truncate_to_width(Font::Regular, TERMS_SIZE, &line, CONTENT_WIDTH);
                canvas.text(Font::Regular, TERMS_SIZE, MARGIN, &line);
                canvas.advance(TERMS_LEADING);
            }
        }
    }
}

fn address_block(canvas: &mut Canvas, address: &str) {
    let lines: Vec<&str> = non_empty_lines(address).collect();
    for line in lines.iter().take(MAX_ADDRESS_LINES) {
        let line = truncate_to_width(Font::Regular, 12.0, line, CONTENT_WIDTH);
        canvas.text(Font::Regular, 12.0, MARGIN, &line);
        canvas.advance(16.0);
    }
    canvas.omitted += lines.len().saturating_sub(MAX_ADDRESS_LINES);
}

struct ClampedLines {
    lines: Vec<String>,
    omitted: usize,
}

/// Wraps `text` to `width`, keeping at most `max_lines`; the last kept line is elided
/// when anything was dropped.
fn clamp_lines(font: Font, size: f32, text: &str, width: f32, max_lines: usize) -> ClampedLines {
    let mut lines: Vec<String> = wrap_text(font, size, text, width)
        .iter()
        .map(|line| truncate_to_width(font, size, line, width))
        .collect();
    let omitted = lines.len().saturating_sub(max_lines);
    lines.truncate(max_lines);
    if omitted > 0 {
        if let Some(last) = lines.last_mut() {
            *last = elide(font, size, last.trim_end_matches("..."), width);
        }
    }
    ClampedLines { lines, omitted }
}

fn decode_logo(bytes: &[u8]) -> Option<LogoImage> {
    match LogoImage::decode(bytes) {
        Ok(logo) => Some(logo),
        Err(error) => {
            warn!(
                event_name = "document.logo.skipped",
                error = %error,
                "logo could not be decoded, rendering without it"
            );
            None
        }
    }
}

pub fn document_title(state: &QuoteState) -> String {
    let company = state.branding.company_name.trim();
    if company.is_empty() {
        "(Name) Quote".to_owned()
    } else {
        format!("{company} Quote")
    }
}

fn metadata_line(state: &QuoteState) -> Option<String> {
    let metadata = &state.metadata;
    let mut parts = Vec::new();
    let number = metadata.quote_number.trim();
    if !number.is_empty() {
        parts.push(format!("Quote #: {number}"));
    }
    if let Some(date) = metadata.issue_date {
        parts.push(format!("Date: {}", format_date(date)));
    }
    if let Some(date) = metadata.due_date {
        parts.push(format!("Due: {}", format_date(date)));
    }

    (!parts.is_empty()).then(|| parts.join("    "))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Content stream plus a running cursor measured down from the top edge.
struct Canvas {
    content: Content,
    cursor: f32,
    clipped: usize,
    omitted: usize,
}

impl Canvas {
    fn new() -> Self {
        Self { content: Content::new(), cursor: MARGIN, clipped: 0, omitted: 0 }
    }

    fn advance(&mut self, amount: f32) {
        self.cursor += amount;
    }

    fn fits(&mut self, height: f32) -> bool {
        let fits = self.cursor + height <= PAGE_HEIGHT - MARGIN;
        if !fits {
            self.clipped += 1;
        }
        fits
    }

    fn baseline(&self, size: f32) -> f32 {
        PAGE_HEIGHT - self.cursor - size * 0.8
    }

    fn text(&mut self, font: Font, size: f32, x: f32, text: &str) {
        if !self.fits(size) {
            return;
        }

        let y = self.baseline(size);
        self.content.begin_text();
        self.content.set_font(Name(font.resource_name()), size);
        self.content.next_line(x, y);
        self.content.show(Str(&encode_win_ansi(text)));
        self.content.end_text();
    }

    fn text_right(&mut self, font: Font, size: f32, right: f32, text: &str) {
        let x = right - text_width(font, size, text);
        self.text(font, size, x, text);
    }

    fn rule(&mut self, from: f32, to: f32) {
        if !self.fits(1.0) {
            return;
        }

        let y = PAGE_HEIGHT - self.cursor - 4.0;
        self.content.save_state();
        self.content.set_stroke_gray(0.6);
        self.content.set_line_width(0.75);
        self.content.move_to(from, y);
        self.content.line_to(to, y);
        self.content.stroke();
        self.content.restore_state();
    }

    fn image(&mut self, x: f32, width: f32, height: f32) {
        let y = PAGE_HEIGHT - self.cursor - height;
        self.content.save_state();
        self.content.transform([width, 0.0, 0.0, height, x, y]);
        self.content.x_object(LOGO_NAME);
        self.content.restore_state();
    }
}

fn assemble(content: Content, logo: Option<&LogoImage>, title: &str) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let regular_font_id = Ref::new(4);
    let bold_font_id = Ref::new(5);
    let content_id = Ref::new(6);
    let logo_id = Ref::new(7);
    let info_id = Ref::new(8);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
    page.parent(page_tree_id);
    page.contents(content_id);
    let mut resources = page.resources();
    resources
        .fonts()
        .pair(Name(Font::Regular.resource_name()), regular_font_id)
        .pair(Name(Font::Bold.resource_name()), bold_font_id);
    if logo.is_some() {
        resources.x_objects().pair(LOGO_NAME, logo_id);
    }
    resources.finish();
    page.finish();

    for (id, font) in [(regular_font_id, Font::Regular), (bold_font_id, Font::Bold)] {
        pdf.type1_font(id)
            .base_font(Name(font.base_font()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    if let Some(logo) = logo {
        let mut image = pdf.image_xobject(logo_id, &logo.data);
        image.filter(Filter::FlateDecode);
        image.width(logo.width as i32);
        image.height(logo.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();
    }

    let stream = content.finish();
    pdf.stream(content_id, &stream);
    pdf.document_info(info_id).title(TextStr(title)).producer(TextStr("mspquote"));

    pdf.finish()
}

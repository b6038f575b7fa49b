//! QR codes for ticket verification.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use qrcode::render::svg;
use qrcode::QrCode;

/// Verification URL encoded into the QR code.
pub fn verification_url(website_url: &str, code: &str) -> String {
    format!("{}/ticket/verify/{}", website_url.trim_end_matches('/'), code)
}

/// Render `data` as an SVG QR code wrapped in a base64 data URI.
pub fn render_qr_data_uri(data: &str) -> Result<String, qrcode::types::QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(200, 200)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();
    Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(image)))
}

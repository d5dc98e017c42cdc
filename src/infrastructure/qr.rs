// QR code rendering for published record links
use qrcode::render::svg;
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};

/// Render `url` as an SVG QR code with light modules on a dark background.
pub fn record_qr_svg(url: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::L)?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(240, 240)
        .dark_color(svg::Color("#ffffff"))
        .light_color(svg::Color("#000000"))
        .build())
}

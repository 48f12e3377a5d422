use std::io::{self, Write};
use std::sync::Mutex;

use qrcode::render::unicode::Dense1x2;
use qrcode::types::QrError;
use qrcode::QrCode;
use tracing::warn;

use ap_core::ports::ActivationSurfacePort;
use ap_core::ScannableCode;

/// Encode `payload` as a QR symbol drawn with half-block characters.
///
/// Colors are inverted so the symbol reads correctly on dark terminals.
pub fn render_symbol(payload: &str) -> Result<String, QrError> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

/// Draws the scannable code on a terminal stream, followed by its payload.
pub struct TerminalActivationSurface {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalActivationSurface {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl ActivationSurfacePort for TerminalActivationSurface {
    fn show(&self, code: &ScannableCode) {
        let caption = match code {
            ScannableCode::Placeholder => "Pass: not yet issued".to_string(),
            ScannableCode::Active(reference) => format!("Pass: {reference}"),
        };
        let symbol = match render_symbol(code.payload()) {
            Ok(symbol) => Some(symbol),
            Err(err) => {
                warn!(error = %err, "Failed to encode scannable code");
                None
            }
        };
        let Ok(mut out) = self.out.lock() else {
            warn!("Activation surface writer poisoned");
            return;
        };
        let written = match symbol {
            Some(symbol) => writeln!(out, "{symbol}"),
            None => Ok(()),
        }
        .and_then(|_| writeln!(out, "{caption}"))
        .and_then(|_| out.flush());
        if let Err(err) = written {
            warn!(error = %err, "Failed to write scannable code");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ap_core::PersistedReference;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn placeholder_and_reference_encode_to_different_symbols() {
        let reference = PersistedReference::resolve("http://api", "x.png").unwrap();

        let pending = render_symbol(ScannableCode::Placeholder.payload()).unwrap();
        let active = render_symbol(ScannableCode::Active(reference).payload()).unwrap();

        assert!(!pending.is_empty());
        assert_ne!(pending, active);
        assert!(active.chars().all(|c| matches!(c, ' ' | '\u{2580}' | '\u{2584}' | '\u{2588}' | '\n')));
    }

    #[test]
    fn prints_symbol_and_caption_for_each_code() {
        let buf = SharedBuf::default();
        let surface = TerminalActivationSurface::with_writer(Box::new(buf.clone()));
        let reference = PersistedReference::resolve("http://api", "x.png").unwrap();

        surface.show(&ScannableCode::Placeholder);
        surface.show(&ScannableCode::Active(reference.clone()));

        let printed = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let pending = render_symbol(ScannableCode::Placeholder.payload()).unwrap();
        let active = render_symbol(reference.as_str()).unwrap();
        assert_eq!(
            printed,
            format!("{pending}\nPass: not yet issued\n{active}\nPass: http://api/passes/x.png\n")
        );
    }
}

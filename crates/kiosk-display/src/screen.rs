//! Full-screen text renderer for the kiosk.
//!
//! Renders the two screens as fixed-width lines: the product screen while
//! Showing and the waiting screen otherwise. Every line is exactly `width`
//! characters (Unicode scalar values), so the output can be redrawn in place.
//!
//! # Examples
//!
//! ```
//! use kiosk_core::ConnectionStatus;
//! use kiosk_display::{Screen, ScreenContent, ScreenModel};
//!
//! let screen = Screen::new(80);
//! let model = ScreenModel {
//!     status: ConnectionStatus::Connected,
//!     sound_enabled: true,
//!     content: ScreenContent::Waiting { seconds_since_last: None },
//!     year: 2024,
//! };
//!
//! let lines = screen.render_lines(&model);
//! assert!(lines.iter().any(|l| l.trim() == "EN ESPERA DE PRODUCTO"));
//! assert!(lines.iter().all(|l| l.chars().count() == 80));
//! ```

use kiosk_core::ConnectionStatus;

use crate::ProductView;

/// Narrowest supported screen.
pub const MIN_WIDTH: usize = 40;

/// Width used when none is configured.
pub const DEFAULT_WIDTH: usize = 80;

const TITLE: &str = "SISTEMA DE MONITOREO RFID";
const WAITING_BAR: &str = "EN ESPERA DE NUEVO PRODUCTO";
const WAITING_TITLE: &str = "EN ESPERA DE PRODUCTO";
const WAITING_TEXT: &str =
    "El sistema está esperando la detección de un nuevo producto a través del lector RFID.";
const DETAILS_TITLE: &str = "DETALLES DEL PRODUCTO";
const FOOTER: &str = "Sistema RFID de Monitoreo de Productos ©";

/// Column where card values start.
const LABEL_WIDTH: usize = 22;

/// Text alignment within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    /// Extra space goes to the right when the padding is odd.
    Center,
    Right,
}

/// Body of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenContent<'a> {
    /// `seconds_since_last` is `None` until a product was ever seen.
    Waiting { seconds_since_last: Option<u64> },
    Showing(&'a ProductView),
}

/// Everything a frame depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenModel<'a> {
    pub status: ConnectionStatus,
    pub sound_enabled: bool,
    pub content: ScreenContent<'a>,
    /// Year shown in the footer.
    pub year: i32,
}

/// Fixed-width renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    width: usize,
}

impl Screen {
    /// Create a renderer; widths under [`MIN_WIDTH`] are raised to it.
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Render a frame as newline-separated lines.
    pub fn render(&self, model: &ScreenModel<'_>) -> String {
        self.render_lines(model).join("\n")
    }

    /// Render a frame, one entry per line.
    pub fn render_lines(&self, model: &ScreenModel<'_>) -> Vec<String> {
        let mut lines = Vec::with_capacity(32);
        self.header(&mut lines, model);

        match model.content {
            ScreenContent::Showing(view) => self.product(&mut lines, view),
            ScreenContent::Waiting { seconds_since_last } => {
                self.waiting(&mut lines, model.status, seconds_since_last)
            }
        }

        lines.push(self.rule('-'));
        lines.push(self.line(&format!("{FOOTER} {}", model.year), Alignment::Center));
        lines
    }

    fn header(&self, lines: &mut Vec<String>, model: &ScreenModel<'_>) {
        let sound = if model.sound_enabled { "ON" } else { "OFF" };
        let right = format!("[{}]  SONIDO: {sound}", header_badge(model.status));

        lines.push(self.rule('='));
        lines.push(self.split(TITLE, &right));
        lines.push(self.rule('='));
    }

    fn product(&self, lines: &mut Vec<String>, view: &ProductView) {
        lines.push(self.split(&format!("HORA DE ENTRADA: {}", view.entry_time), view.shift));
        lines.push(self.rule('-'));

        lines.push(self.field("FECHA", &view.date));
        lines.push(self.field("PRODUCTO", &view.name));
        lines.push(self.field("IMAGEN DEL PRODUCTO", &view.image));
        lines.push(self.blank());

        lines.push(self.line(DETAILS_TITLE, Alignment::Left));
        lines.push(self.field("CÓDIGO DE PRODUCTO", &view.code));
        lines.push(self.field("PESO NETO", &format!(">> {} <<", view.weight)));
        lines.push(self.field("PIEZAS", &view.pieces));
        lines.push(self.field("ÁREA", &view.area));
        lines.push(self.field("OPERADOR", &view.operator));
    }

    fn waiting(&self, lines: &mut Vec<String>, status: ConnectionStatus, seconds: Option<u64>) {
        lines.push(self.line(WAITING_BAR, Alignment::Center));
        lines.push(self.rule('-'));
        lines.push(self.blank());
        lines.push(self.line(WAITING_TITLE, Alignment::Center));
        lines.push(self.blank());
        for chunk in wrap(WAITING_TEXT, self.width) {
            lines.push(self.line(&chunk, Alignment::Center));
        }
        if let Some(seconds) = seconds {
            lines.push(self.line(
                &format!("Último producto detectado hace {seconds} segundos."),
                Alignment::Center,
            ));
        }
        lines.push(self.blank());
        lines.push(self.line(&format!("[{}]", waiting_badge(status)), Alignment::Center));
        lines.push(self.blank());
    }

    fn field(&self, label: &str, value: &str) -> String {
        let label = align_text(label, LABEL_WIDTH, Alignment::Left);
        self.line(&format!("{label}{value}"), Alignment::Left)
    }

    /// Left text and right text on one line; the left side is cut first.
    fn split(&self, left: &str, right: &str) -> String {
        let right_len = right.chars().count().min(self.width);
        let left_width = self.width - right_len;
        let left = align_text(left, left_width, Alignment::Left);
        format!("{left}{}", truncate_text(right, right_len))
    }

    fn line(&self, text: &str, alignment: Alignment) -> String {
        align_text(text, self.width, alignment)
    }

    fn rule(&self, fill: char) -> String {
        std::iter::repeat_n(fill, self.width).collect()
    }

    fn blank(&self) -> String {
        " ".repeat(self.width)
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH)
    }
}

/// Connection badge shown in the header.
pub fn header_badge(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Connected => "CONECTADO",
        ConnectionStatus::Connecting => "CONECTANDO",
        ConnectionStatus::Reconnecting => "RECONECTANDO",
        ConnectionStatus::Disconnected => "DESCONECTADO",
    }
}

/// Connection badge shown on the waiting screen.
pub fn waiting_badge(status: ConnectionStatus) -> &'static str {
    if status.is_connected() {
        "CONECTADO AL SERVIDOR"
    } else {
        "DESCONECTADO"
    }
}

/// Truncate text to a maximum number of characters.
///
/// ```
/// use kiosk_display::truncate_text;
///
/// assert_eq!(truncate_text("CÓDIGO", 3), "CÓD");
/// assert_eq!(truncate_text("Short", 10), "Short");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Align text within a fixed width, padding with spaces.
///
/// The result is exactly `width` characters; longer text is truncated.
///
/// ```
/// use kiosk_display::{Alignment, align_text};
///
/// assert_eq!(align_text("ÁREA", 8, Alignment::Left), "ÁREA    ");
/// assert_eq!(align_text("ÁREA", 8, Alignment::Center), "  ÁREA  ");
/// assert_eq!(align_text("ÁREA", 8, Alignment::Right), "    ÁREA");
/// ```
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let text = sanitize_text(text);
    let char_count = text.chars().count();
    if char_count >= width {
        return truncate_text(&text, width);
    }

    let padding = width - char_count;
    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

/// Greedy word wrap; words longer than `width` are cut.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&truncate_text(word, width));
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Strip control characters so escape sequences in product data cannot
/// move the cursor.
fn sanitize_text(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

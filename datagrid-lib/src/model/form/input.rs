//! Input dispatch for form fields

use crate::model::FieldDescriptor;
use crate::model::FieldKind;
use crate::model::Record;

/// Date format shown by date inputs.
pub const DATE_INPUT_FORMAT: &str = "DD.MM.YYYY";

/// Decimal separator used by number inputs.
pub const DECIMAL_SEPARATOR: char = ',';

/// The widget a renderer should draw for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// Single-line text. `email` selects an e-mail keyboard/validation.
    Text { email: bool },
    /// Numeric input.
    Number { decimal_separator: char },
    /// Date picker.
    Date { format: &'static str, clearable: bool },
    /// Checkbox bound to a boolean value.
    Checkbox,
    /// Multi-line text.
    Textarea,
    /// Output of the field's custom render callback.
    Custom(String),
}

/// Everything a renderer needs to draw one field in one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Attribute key the input is bound to.
    pub field: String,
    /// Display label.
    pub label: String,
    /// Placeholder text, empty if none.
    pub placeholder: String,
    /// Required for the current values.
    pub required: bool,
    /// Widget to draw.
    pub kind: InputKind,
}

/// Resolves the input for a field against the current form values.
///
/// Pure: the same descriptor and values always produce the same input, and
/// validation is never consulted.
pub fn resolve_input(field: &FieldDescriptor, values: &Record) -> Input {
    let kind = match &field.kind {
        FieldKind::Text => InputKind::Text {
            email: field.id.contains("email"),
        },
        FieldKind::Number => InputKind::Number {
            decimal_separator: DECIMAL_SEPARATOR,
        },
        FieldKind::Date => InputKind::Date {
            format: DATE_INPUT_FORMAT,
            clearable: true,
        },
        FieldKind::Boolean => InputKind::Checkbox,
        FieldKind::Textarea => InputKind::Textarea,
        FieldKind::Custom(render) => InputKind::Custom(render(values)),
    };

    Input {
        field: field.id.clone(),
        label: field.display_label().to_string(),
        placeholder: field.placeholder.clone().unwrap_or_default(),
        required: field.is_required(values),
        kind,
    }
}

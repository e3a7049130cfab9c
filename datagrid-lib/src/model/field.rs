//! Field descriptors

use std::sync::Arc;

use serde_json::Value;

use super::Record;

/// Callback producing the rendered output of a custom field from live form values.
pub type CustomRender = Arc<dyn Fn(&Record) -> String + Send + Sync>;

/// Predicate over the live form values.
pub type ValuePredicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// The semantic type of a field, which decides how it is edited.
#[derive(Clone, Default)]
pub enum FieldKind {
    /// Single-line text.
    #[default]
    Text,
    /// Numeric input.
    Number,
    /// Checkbox.
    Boolean,
    /// Date picker.
    Date,
    /// Multi-line text.
    Textarea,
    /// Caller-rendered field.
    Custom(CustomRender),
}

impl FieldKind {
    /// Returns the type name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Textarea => "textarea",
            Self::Custom(_) => "custom",
        }
    }
}

impl std::fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a field must be filled before submission.
#[derive(Clone, Default)]
pub enum Requiredness {
    /// Always required.
    Always,
    /// Never required.
    #[default]
    Never,
    /// Required depending on the current form values.
    Computed(ValuePredicate),
}

impl Requiredness {
    /// Evaluates the rule against the current values.
    pub fn evaluate(&self, values: &Record) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Computed(predicate) => predicate(values),
        }
    }
}

impl std::fmt::Debug for Requiredness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Never => f.write_str("Never"),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// The views a field can participate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldView {
    /// Table column / card line.
    List,
    /// Create form.
    Create,
    /// Update form.
    Update,
    /// Delete confirmation.
    Delete,
}

/// Describes one entity attribute for display and editing.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::{FieldDescriptor, FieldKind, FieldView};
///
/// let email = FieldDescriptor::new("email")
///     .label("E-Mail")
///     .in_views([FieldView::List, FieldView::Create, FieldView::Update])
///     .required();
///
/// let active = FieldDescriptor::new("active").kind(FieldKind::Boolean).everywhere();
///
/// assert!(email.participates(FieldView::Create));
/// assert!(!email.participates(FieldView::Delete));
/// assert!(active.participates(FieldView::Delete));
/// ```
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Attribute key. Dot paths address nested attributes.
    pub id: String,
    /// Display label. Falls back to the id.
    pub label: Option<String>,
    /// Semantic type.
    pub kind: FieldKind,
    /// Shown as a list column.
    pub list: bool,
    /// Editable in the create form.
    pub create: bool,
    /// Editable in the update form.
    pub update: bool,
    /// Shown in the delete confirmation.
    pub delete: bool,
    /// Initial value in the create form.
    pub default_value: Option<Value>,
    /// Required rule.
    pub required: Requiredness,
    /// Wizard step this field belongs to.
    pub step: Option<u32>,
    /// Placeholder text.
    pub placeholder: Option<String>,
    visible_when: Option<ValuePredicate>,
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("list", &self.list)
            .field("create", &self.create)
            .field("update", &self.update)
            .field("delete", &self.delete)
            .field("default_value", &self.default_value)
            .field("required", &self.required)
            .field("step", &self.step)
            .field("placeholder", &self.placeholder)
            .field("visible_when", &self.visible_when.as_ref().map(|_| ".."))
            .finish()
    }
}

impl FieldDescriptor {
    /// Creates a text field that participates in no view yet.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            kind: FieldKind::Text,
            list: false,
            create: false,
            update: false,
            delete: false,
            default_value: None,
            required: Requiredness::Never,
            step: None,
            placeholder: None,
            visible_when: None,
        }
    }

    /// Sets the display label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the semantic type.
    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds the field to the given views.
    pub fn in_views(mut self, views: impl IntoIterator<Item = FieldView>) -> Self {
        for view in views {
            match view {
                FieldView::List => self.list = true,
                FieldView::Create => self.create = true,
                FieldView::Update => self.update = true,
                FieldView::Delete => self.delete = true,
            }
        }
        self
    }

    /// Adds the field to every view.
    pub fn everywhere(self) -> Self {
        self.in_views([
            FieldView::List,
            FieldView::Create,
            FieldView::Update,
            FieldView::Delete,
        ])
    }

    /// Sets the create-form default.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Marks the field as always required.
    pub fn required(mut self) -> Self {
        self.required = Requiredness::Always;
        self
    }

    /// Makes requiredness depend on the current values.
    pub fn required_when(mut self, predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        self.required = Requiredness::Computed(Arc::new(predicate));
        self
    }

    /// Assigns the field to a wizard step.
    pub fn step(mut self, step: u32) -> Self {
        self.step = Some(step);
        self
    }

    /// Sets the placeholder text.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Shows the field only while the predicate holds for the current values.
    pub fn visible_when(mut self, predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        self.visible_when = Some(Arc::new(predicate));
        self
    }

    /// Returns the label, or the id if none was set.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Returns `true` if the field takes part in the given view.
    pub fn participates(&self, view: FieldView) -> bool {
        match view {
            FieldView::List => self.list,
            FieldView::Create => self.create,
            FieldView::Update => self.update,
            FieldView::Delete => self.delete,
        }
    }

    /// Returns `true` if the field is shown for the current values.
    pub fn is_visible(&self, values: &Record) -> bool {
        self.visible_when.as_ref().is_none_or(|predicate| predicate(values))
    }

    /// Returns `true` if the field is required for the current values.
    pub fn is_required(&self, values: &Record) -> bool {
        self.required.evaluate(values)
    }
}

/// Returns the fields that take part in a view, in declaration order.
pub fn fields_for(fields: &[FieldDescriptor], view: FieldView) -> Vec<FieldDescriptor> {
    fields.iter().filter(|f| f.participates(view)).cloned().collect()
}

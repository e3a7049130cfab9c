//! Headless form state for the create and update workflows.
//!
//! A [`FormState`] owns the values being edited, the wizard step, and the id
//! of the record once it exists on the server. Renderers call
//! [`FormState::render`] on every pass and feed user input back through
//! [`FormState::set_value`].

mod input;

pub use input::*;

use serde_json::Value;

use super::EntityId;
use super::FieldDescriptor;
use super::FieldKind;
use super::FieldView;
use super::Record;
use super::fields_for;
use crate::error::FieldValidationError;
use crate::error::ValidationError;

/// Message attached to a required field left empty.
pub const REQUIRED_MESSAGE: &str = "required";

/// What a validated form asks the store to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Create a new record from these attributes (no id).
    Create(Record),
    /// Update the record with this id.
    Update(Record),
}

/// State of a create or update form.
#[derive(Debug, Clone)]
pub struct FormState {
    fields: Vec<FieldDescriptor>,
    initial: Record,
    values: Record,
    steps: Vec<u32>,
    active_step: usize,
    record_id: Option<EntityId>,
    buttons_hidden: bool,
}

impl FormState {
    /// Builds a create form from the create-participating fields.
    ///
    /// Boolean fields start as `false`; others start with their default
    /// value, or the empty string.
    pub fn for_create(fields: &[FieldDescriptor]) -> Self {
        let fields = fields_for(fields, FieldView::Create);
        let mut initial = Record::new();
        for field in &fields {
            let value = match field.kind {
                FieldKind::Boolean => Value::Bool(false),
                _ => field.default_value.clone().unwrap_or_else(|| Value::from("")),
            };
            initial.insert_path(&field.id, value);
        }
        Self::with_values(fields, initial, None)
    }

    /// Builds an update form for an existing record.
    pub fn for_update(fields: &[FieldDescriptor], record: &Record) -> Self {
        let fields = fields_for(fields, FieldView::Update);
        let mut initial = Record::new();
        for field in &fields {
            let value = record
                .get_path(&field.id)
                .cloned()
                .unwrap_or_else(|| match field.kind {
                    FieldKind::Boolean => Value::Bool(false),
                    _ => Value::from(""),
                });
            initial.insert_path(&field.id, value);
        }
        Self::with_values(fields, initial, record.id())
    }

    fn with_values(fields: Vec<FieldDescriptor>, initial: Record, record_id: Option<EntityId>) -> Self {
        let mut steps: Vec<u32> = fields.iter().filter_map(|f| f.step).collect();
        steps.sort_unstable();
        steps.dedup();

        Self {
            fields,
            values: initial.clone(),
            initial,
            steps,
            active_step: 0,
            record_id,
            buttons_hidden: false,
        }
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Returns the current values.
    pub fn values(&self) -> &Record {
        &self.values
    }

    /// Sets one value. Dot-path ids (`"team.name"`) write into nested objects.
    pub fn set_value(&mut self, field: &str, value: impl Into<Value>) {
        self.values.insert_path(field, value);
    }

    /// Replaces all values at once (used by custom fields).
    pub fn set_values(&mut self, values: Record) {
        self.values = values;
    }

    /// Returns `true` if any value differs from its initial value.
    pub fn is_dirty(&self) -> bool {
        self.values != self.initial
    }

    /// Restores the initial values and the first step.
    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.active_step = 0;
        self.buttons_hidden = false;
    }

    /// Lets a custom field hide the submit/back buttons.
    pub fn hide_buttons(&mut self, hidden: bool) {
        self.buttons_hidden = hidden;
    }

    /// Returns `true` while a custom field hides the buttons.
    pub fn buttons_hidden(&self) -> bool {
        self.buttons_hidden
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Distinct step numbers in ascending order. Empty for single-page forms.
    pub fn steps(&self) -> &[u32] {
        &self.steps
    }

    /// Index into [`FormState::steps`] of the active step.
    pub fn active_step(&self) -> usize {
        self.active_step
    }

    /// Returns `true` on the last (or only) page.
    pub fn is_last_step(&self) -> bool {
        self.steps.is_empty() || self.active_step + 1 >= self.steps.len()
    }

    /// Moves to the next step. Returns `false` on the last step.
    pub fn next_step(&mut self) -> bool {
        if self.is_last_step() {
            return false;
        }
        self.active_step += 1;
        true
    }

    /// Moves to the previous step. Returns `false` on the first step.
    pub fn prev_step(&mut self) -> bool {
        if self.active_step == 0 {
            return false;
        }
        self.active_step -= 1;
        true
    }

    /// Fields on the active step, before visibility is applied.
    ///
    /// On multi-step forms, fields without a step are shown on every step.
    pub fn step_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        let step = self.steps.get(self.active_step).copied();
        self.fields
            .iter()
            .filter(move |f| step.is_none() || f.step.is_none() || f.step == step)
    }

    /// Fields on the active step that are visible for the current values.
    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.step_fields().filter(|f| f.is_visible(&self.values))
    }

    /// Resolves the inputs for one render pass.
    pub fn render(&self) -> Vec<Input> {
        self.visible_fields().map(|f| resolve_input(f, &self.values)).collect()
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Id of the record being edited, once it exists.
    pub fn record_id(&self) -> Option<&EntityId> {
        self.record_id.as_ref()
    }

    /// Remembers the id assigned by the server after the first submit.
    pub fn set_record_id(&mut self, id: EntityId) {
        self.record_id = Some(id);
    }

    /// Checks the required rule of every visible field on the active step.
    ///
    /// Missing values, `null`, `""`, `false` and `0` count as empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let errors: Vec<FieldValidationError> = self
            .visible_fields()
            .filter(|f| f.is_required(&self.values))
            .filter(|f| !is_truthy(self.values.get_path(&f.id)))
            .map(|f| FieldValidationError::new(f.id.clone(), REQUIRED_MESSAGE))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(errors))
        }
    }

    /// Validates and returns what the store should do with the values.
    ///
    /// The first submit of a create form creates; once a record id is known
    /// (update forms, or later wizard steps) submits update that record.
    pub fn submission(&self) -> Result<Submission, ValidationError> {
        self.validate()?;
        let values = self.values.clone().without_id();
        Ok(match &self.record_id {
            Some(id) => Submission::Update(values.with_id(id)),
            None => Submission::Create(values),
        })
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id").in_views([FieldView::List]),
            FieldDescriptor::new("name").everywhere().required().step(1),
            FieldDescriptor::new("role").everywhere().default_value("user").step(1),
            FieldDescriptor::new("active").kind(FieldKind::Boolean).everywhere().step(2),
            FieldDescriptor::new("note").everywhere().step(2).visible_when(|v| v.get("active") == Some(&Value::Bool(true))),
        ]
    }

    #[test]
    fn test_create_initial_values() {
        let form = FormState::for_create(&user_fields());
        let values = form.values();
        assert_eq!(values.get("name"), Some(&Value::from("")));
        assert_eq!(values.get("role"), Some(&Value::from("user")));
        assert_eq!(values.get("active"), Some(&Value::Bool(false)));
        assert!(!values.contains("id"));
    }

    #[test]
    fn test_steps_are_distinct_and_sorted() {
        let mut form = FormState::for_create(&user_fields());
        assert_eq!(form.steps(), &[1, 2]);
        assert!(!form.is_last_step());

        let first: Vec<_> = form.step_fields().map(|f| f.id.as_str()).collect();
        assert_eq!(first, vec!["name", "role"]);

        assert!(form.next_step());
        assert!(form.is_last_step());
        assert!(!form.next_step());
        assert!(form.prev_step());
        assert!(!form.prev_step());
    }

    #[test]
    fn test_required_validation() {
        let mut form = FormState::for_create(&user_fields());
        let err = form.validate().unwrap_err();
        assert_eq!(err.errors, vec![FieldValidationError::new("name", "required")]);

        form.set_value("name", "Ada");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_dot_path_fields_submit_nested_objects() {
        let fields = vec![
            FieldDescriptor::new("name").everywhere(),
            FieldDescriptor::new("team.name").everywhere().required(),
        ];

        let mut form = FormState::for_create(&fields);
        assert_eq!(form.values().get_path("team.name"), Some(&Value::from("")));
        assert!(form.validate().is_err());

        form.set_value("team.name", "core");
        match form.submission().unwrap() {
            Submission::Create(record) => {
                assert_eq!(record.get("team"), Some(&serde_json::json!({"name": "core"})));
                assert!(!record.contains("team.name"));
            }
            other => panic!("expected create, got {:?}", other),
        }

        let existing = Record::new().set("id", 9).set("team", serde_json::json!({"name": "ops"}));
        let mut form = FormState::for_update(&fields, &existing);
        assert_eq!(form.values().get_path("team.name"), Some(&Value::from("ops")));
        form.set_value("team.name", "infra");
        match form.submission().unwrap() {
            Submission::Update(record) => {
                assert_eq!(record.get_path("team.name"), Some(&Value::from("infra")));
                assert!(!record.contains("team.name"));
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_and_false_are_empty() {
        let fields = vec![
            FieldDescriptor::new("count").kind(FieldKind::Number).in_views([FieldView::Create]).required(),
            FieldDescriptor::new("accepted").kind(FieldKind::Boolean).in_views([FieldView::Create]).required(),
        ];
        let mut form = FormState::for_create(&fields);
        form.set_value("count", 0);
        let err = form.validate().unwrap_err();
        assert!(err.field("count").is_some());
        assert!(err.field("accepted").is_some());
    }

    #[test]
    fn test_hidden_fields_are_not_rendered_or_validated() {
        let mut form = FormState::for_create(&user_fields());
        form.next_step();
        let rendered: Vec<_> = form.render().into_iter().map(|i| i.field).collect();
        assert_eq!(rendered, vec!["active".to_string()]);

        form.set_value("active", true);
        let rendered: Vec<_> = form.render().into_iter().map(|i| i.field).collect();
        assert_eq!(rendered, vec!["active".to_string(), "note".to_string()]);
    }

    #[test]
    fn test_submission_switches_to_update_once_created() {
        let mut form = FormState::for_create(&user_fields());
        form.set_value("name", "Ada");
        assert!(matches!(form.submission().unwrap(), Submission::Create(r) if r.id().is_none()));

        form.set_record_id(EntityId::from(9));
        match form.submission().unwrap() {
            Submission::Update(record) => assert_eq!(record.id(), Some(EntityId::Number(9))),
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_update_form_reads_record() {
        let record = Record::new().set("id", "u1").set("name", "Bo").set("active", true);
        let form = FormState::for_update(&user_fields(), &record);
        assert_eq!(form.record_id(), Some(&EntityId::from("u1")));
        assert_eq!(form.values().get_str("name"), Some("Bo"));
        assert_eq!(form.values().get("role"), Some(&Value::from("")));
        assert!(!form.is_dirty());
    }

    #[test]
    fn test_reset() {
        let mut form = FormState::for_create(&user_fields());
        form.set_value("name", "x");
        form.next_step();
        assert!(form.is_dirty());
        form.reset();
        assert!(!form.is_dirty());
        assert_eq!(form.active_step(), 0);
    }
}

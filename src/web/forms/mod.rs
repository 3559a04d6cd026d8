//! HTML form handling.
//!
//! A form is a `Deserialize + Validate` struct of string fields plus a static
//! list of [`FieldSpec`]s describing how each field renders. Validation is
//! independent of rendering: [`Form::clean`] produces [`FormErrors`], and
//! [`FormView`] turns a form and its errors into the serializable shape the
//! templates iterate over.

mod accounts;
mod boards;

pub use accounts::{
    LoginForm, LogoutForm, PasswordChangeForm, PasswordResetForm, SetPasswordForm, SignUpForm,
    UserUpdateForm,
};
pub use boards::{NewTopicForm, PostReplyForm};

use std::collections::BTreeMap;

use serde::Serialize;
use validator::{Validate, ValidationErrors};

/// Error shown for a missing required value.
pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// Error shown when two password fields differ.
pub const PASSWORD_MISMATCH_MESSAGE: &str = "The two password fields didn't match.";

/// How a field is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Widget {
    TextInput,
    EmailInput,
    PasswordInput,
    Textarea,
}

impl Widget {
    /// Widget class name, as reported by the `field_type` helper.
    pub fn class_name(&self) -> &'static str {
        match self {
            Widget::TextInput => "TextInput",
            Widget::EmailInput => "EmailInput",
            Widget::PasswordInput => "PasswordInput",
            Widget::Textarea => "Textarea",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        match name {
            "TextInput" => Some(Widget::TextInput),
            "EmailInput" => Some(Widget::EmailInput),
            "PasswordInput" => Some(Widget::PasswordInput),
            "Textarea" => Some(Widget::Textarea),
            _ => None,
        }
    }

    /// `type` attribute of the `<input>` element; empty for textareas.
    pub fn input_type(&self) -> &'static str {
        match self {
            Widget::TextInput => "text",
            Widget::EmailInput => "email",
            Widget::PasswordInput => "password",
            Widget::Textarea => "",
        }
    }
}

/// Static description of a form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub required: bool,
    pub max_length: Option<usize>,
    pub help_text: &'static str,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, widget: Widget) -> Self {
        Self {
            name,
            label,
            widget,
            required: true,
            max_length: None,
            help_text: "",
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    pub const fn max_length(self, max: usize) -> Self {
        Self {
            max_length: Some(max),
            ..self
        }
    }

    pub const fn help(self, text: &'static str) -> Self {
        Self {
            help_text: text,
            ..self
        }
    }
}

/// Field-level and form-level error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the messages of a failed `validator` run.
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut result = Self::new();

        for (field, field_errors) in errors.field_errors() {
            let field = field.to_string();
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {field}"));
                result.add(field.clone(), message);
            }
        }

        result
    }

    /// Add an error to a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Add an error that belongs to the form as a whole.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// Replace a field's errors with the required-field message.
    fn set_required(&mut self, field: &str) {
        self.fields
            .insert(field.to_string(), vec![REQUIRED_MESSAGE.to_string()]);
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_field_error(&self, name: &str) -> bool {
        !self.field(name).is_empty()
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }
}

/// A submitted form.
pub trait Form: Validate {
    /// Field declarations in display order.
    fn specs() -> &'static [FieldSpec];

    /// Submitted value of a field.
    fn value(&self, name: &str) -> &str;

    /// Run per-field validation.
    ///
    /// Cross-field checks are left to the caller.
    fn clean(&self) -> FormErrors
    where
        Self: Sized,
    {
        clean_fields(self)
    }
}

/// Validate every field of `form`.
///
/// Empty required fields report only the required-field message.
pub fn clean_fields<F: Form>(form: &F) -> FormErrors {
    let mut errors = match form.validate() {
        Ok(()) => FormErrors::new(),
        Err(e) => FormErrors::from_validation(&e),
    };

    for spec in F::specs() {
        if spec.required && form.value(spec.name).trim().is_empty() {
            errors.set_required(spec.name);
        }
    }

    errors
}

/// A field ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct BoundField {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub input_type: &'static str,
    pub is_textarea: bool,
    pub value: String,
    pub errors: Vec<String>,
    pub help_text: &'static str,
    pub required: bool,
    pub max_length: Option<usize>,
    /// Whether the owning form was submitted.
    pub bound: bool,
}

impl BoundField {
    fn new(spec: &FieldSpec, value: &str, errors: Vec<String>, bound: bool) -> Self {
        // Passwords are never echoed back
        let value = if spec.widget == Widget::PasswordInput {
            String::new()
        } else {
            value.to_string()
        };

        Self {
            name: spec.name,
            label: spec.label,
            widget: spec.widget,
            input_type: spec.widget.input_type(),
            is_textarea: spec.widget == Widget::Textarea,
            value,
            errors,
            help_text: spec.help_text,
            required: spec.required,
            max_length: spec.max_length,
            bound,
        }
    }
}

/// A form ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub fields: Vec<BoundField>,
    pub errors: Vec<String>,
    pub bound: bool,
}

impl FormView {
    /// An empty, unsubmitted form.
    pub fn unbound<F: Form>() -> Self {
        Self {
            fields: F::specs()
                .iter()
                .map(|spec| BoundField::new(spec, "", Vec::new(), false))
                .collect(),
            errors: Vec::new(),
            bound: false,
        }
    }

    /// An unsubmitted form pre-filled with initial values.
    pub fn initial<F: Form>(form: &F) -> Self {
        Self {
            fields: F::specs()
                .iter()
                .map(|spec| BoundField::new(spec, form.value(spec.name), Vec::new(), false))
                .collect(),
            errors: Vec::new(),
            bound: false,
        }
    }

    /// A submitted form with its validation errors.
    pub fn bound<F: Form>(form: &F, errors: &FormErrors) -> Self {
        Self {
            fields: F::specs()
                .iter()
                .map(|spec| {
                    BoundField::new(
                        spec,
                        form.value(spec.name),
                        errors.field(spec.name).to_vec(),
                        true,
                    )
                })
                .collect(),
            errors: errors.non_field().to_vec(),
            bound: true,
        }
    }

    pub fn field(&self, name: &str) -> Option<&BoundField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_names_round_trip() {
        for widget in [
            Widget::TextInput,
            Widget::EmailInput,
            Widget::PasswordInput,
            Widget::Textarea,
        ] {
            assert_eq!(Widget::from_class_name(widget.class_name()), Some(widget));
        }
        assert_eq!(Widget::from_class_name("Select"), None);
    }

    #[test]
    fn test_field_spec_builders() {
        const SPEC: FieldSpec = FieldSpec::new("message", "Message", Widget::Textarea)
            .max_length(10)
            .help("short")
            .optional();

        assert_eq!(SPEC.max_length, Some(10));
        assert_eq!(SPEC.help_text, "short");
        assert!(!SPEC.required);
    }

    #[test]
    fn test_form_errors() {
        let mut errors = FormErrors::new();
        assert!(errors.is_empty());

        errors.add("username", "taken");
        errors.add_non_field("bad login");

        assert_eq!(errors.field("username"), ["taken".to_string()]);
        assert!(errors.field("email").is_empty());
        assert!(errors.has_field_error("username"));
        assert_eq!(errors.non_field(), ["bad login".to_string()]);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_unbound_view_has_no_errors() {
        let view = FormView::unbound::<NewTopicForm>();
        assert!(!view.bound);
        assert_eq!(view.fields.len(), 2);
        assert!(view.fields.iter().all(|f| !f.bound && f.errors.is_empty()));
    }

    #[test]
    fn test_bound_view_hides_passwords() {
        let form = LoginForm {
            username: "john".to_string(),
            password: "secret123".to_string(),
        };
        let view = FormView::bound(&form, &FormErrors::new());

        assert_eq!(view.field("username").unwrap().value, "john");
        assert_eq!(view.field("password").unwrap().value, "");
        assert!(view.field("password").unwrap().bound);
    }

    #[test]
    fn test_clean_reports_required_fields_once() {
        let form = NewTopicForm::default();
        let errors = form.clean();

        assert_eq!(errors.field("subject"), [REQUIRED_MESSAGE.to_string()]);
        assert_eq!(errors.field("message"), [REQUIRED_MESSAGE.to_string()]);
    }
}

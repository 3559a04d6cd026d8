//! Form field helpers for templates.
//!
//! `field_type` names a field's widget and `input_class` builds the CSS
//! class of its `<input>`, including the Bootstrap validity modifier.

use crate::template::{TemplateEngine, Value};

use super::forms::{BoundField, Widget};

const BASE_INPUT_CLASS: &str = "form-control";

/// Widget class name of a field.
pub fn field_type(field: &BoundField) -> &'static str {
    field.widget.class_name()
}

/// CSS class list for a field's input element.
pub fn input_class(field: &BoundField) -> String {
    let modifier = validity_modifier(field.bound, !field.errors.is_empty(), field.widget);
    format!("{BASE_INPUT_CLASS} {modifier}")
}

fn validity_modifier(bound: bool, has_errors: bool, widget: Widget) -> &'static str {
    if !bound {
        ""
    } else if has_errors {
        "is-invalid"
    } else if widget == Widget::PasswordInput {
        // Passwords are never re-displayed, so they are never marked valid
        ""
    } else {
        "is-valid"
    }
}

/// `field_type` over a serialized [`BoundField`].
fn field_type_value(field: &Value) -> String {
    field
        .get_path("widget")
        .map(Value::to_display_string)
        .unwrap_or_default()
}

/// `input_class` over a serialized [`BoundField`].
fn input_class_value(field: &Value) -> String {
    let bound = field.get_path("bound").is_some_and(Value::is_truthy);
    let has_errors = field.get_path("errors").is_some_and(Value::is_truthy);
    let widget = field
        .get_path("widget")
        .map(Value::to_display_string)
        .and_then(|name| Widget::from_class_name(&name))
        .unwrap_or(Widget::TextInput);

    let modifier = validity_modifier(bound, has_errors, widget);
    format!("{BASE_INPUT_CLASS} {modifier}")
}

/// Register `field_type` and `input_class` as template helpers.
pub fn register(engine: &mut TemplateEngine) {
    engine.register_helper("field_type", |args: &[Value]| {
        args.first().map(field_type_value).unwrap_or_default()
    });
    engine.register_helper("input_class", |args: &[Value]| {
        args.first().map(input_class_value).unwrap_or_default()
    });
}

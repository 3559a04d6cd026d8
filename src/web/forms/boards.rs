//! Topic and reply forms.

use serde::Deserialize;
use validator::Validate;

use super::{FieldSpec, Form, Widget};
use crate::board::{MAX_MESSAGE_LENGTH, MAX_SUBJECT_LENGTH};

/// Longest opening message accepted by the new-topic form.
pub const MAX_TOPIC_MESSAGE_LENGTH: usize = 2500;

/// Form for starting a topic.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewTopicForm {
    #[serde(default)]
    #[validate(length(
        max = 255,
        message = "Ensure this value has at most 255 characters."
    ))]
    pub subject: String,

    #[serde(default)]
    #[validate(length(
        max = 2500,
        message = "Ensure this value has at most 2500 characters."
    ))]
    pub message: String,
}

const NEW_TOPIC_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("subject", "Subject", Widget::TextInput).max_length(MAX_SUBJECT_LENGTH),
    FieldSpec::new("message", "Message", Widget::Textarea)
        .max_length(MAX_TOPIC_MESSAGE_LENGTH)
        .help("The max length is 2500 symbols"),
];

impl Form for NewTopicForm {
    fn specs() -> &'static [FieldSpec] {
        NEW_TOPIC_FIELDS
    }

    fn value(&self, name: &str) -> &str {
        match name {
            "subject" => &self.subject,
            "message" => &self.message,
            _ => "",
        }
    }
}

/// Form for replying to a topic.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostReplyForm {
    #[serde(default)]
    #[validate(length(
        max = 4000,
        message = "Ensure this value has at most 4000 characters."
    ))]
    pub message: String,
}

const POST_REPLY_FIELDS: &[FieldSpec] =
    &[FieldSpec::new("message", "Message", Widget::Textarea).max_length(MAX_MESSAGE_LENGTH)];

impl Form for PostReplyForm {
    fn specs() -> &'static [FieldSpec] {
        POST_REPLY_FIELDS
    }

    fn value(&self, name: &str) -> &str {
        match name {
            "message" => &self.message,
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_topic_valid() {
        let form = NewTopicForm {
            subject: "Test title".to_string(),
            message: "Lorem ipsum dolor sit amet".to_string(),
        };
        assert!(form.clean().is_empty());
    }

    #[test]
    fn test_new_topic_too_long() {
        let form = NewTopicForm {
            subject: "s".repeat(256),
            message: "m".repeat(2501),
        };
        let errors = form.clean();
        assert_eq!(
            errors.field("subject"),
            ["Ensure this value has at most 255 characters.".to_string()]
        );
        assert_eq!(
            errors.field("message"),
            ["Ensure this value has at most 2500 characters.".to_string()]
        );
    }

    #[test]
    fn test_new_topic_whitespace_only_is_missing() {
        let form = NewTopicForm {
            subject: "   ".to_string(),
            message: "hello".to_string(),
        };
        let errors = form.clean();
        assert!(errors.has_field_error("subject"));
        assert!(!errors.has_field_error("message"));
    }

    #[test]
    fn test_reply_limits() {
        let ok = PostReplyForm {
            message: "m".repeat(4000),
        };
        assert!(ok.clean().is_empty());

        let long = PostReplyForm {
            message: "m".repeat(4001),
        };
        assert!(long.clean().has_field_error("message"));

        assert!(PostReplyForm::default().clean().has_field_error("message"));
    }

    #[test]
    fn test_field_order() {
        let names: Vec<_> = NewTopicForm::specs().iter().map(|s| s.name).collect();
        assert_eq!(names, ["subject", "message"]);
    }
}

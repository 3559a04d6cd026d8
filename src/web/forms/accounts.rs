//! Account forms: signup, login, settings and password management.

use serde::Deserialize;
use validator::Validate;

use super::{clean_fields, FieldSpec, Form, FormErrors, Widget, PASSWORD_MISMATCH_MESSAGE};
use crate::auth::validation::{validate_email, MAX_EMAIL_LENGTH, MAX_USERNAME_LENGTH};

const USERNAME_HELP: &str =
    "Required. 150 characters or fewer. Letters, digits and @/./+/-/_ only.";
const PASSWORD_HELP: &str =
    "Your password must contain at least 8 characters and can't be entirely numeric.";
const PASSWORD_CONFIRM_HELP: &str = "Enter the same password as before, for verification.";

/// Add the mismatch error to `field` when two password values differ.
fn check_passwords_match(errors: &mut FormErrors, field: &str, first: &str, second: &str) {
    if !first.is_empty() && !second.is_empty() && first != second {
        errors.add(field, PASSWORD_MISMATCH_MESSAGE);
    }
}

/// Signup form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SignUpForm {
    #[serde(default)]
    #[validate(length(
        max = 150,
        message = "Ensure this value has at most 150 characters."
    ))]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[serde(default)]
    pub password1: String,

    #[serde(default)]
    pub password2: String,
}

const SIGN_UP_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("username", "Username", Widget::TextInput)
        .max_length(MAX_USERNAME_LENGTH)
        .help(USERNAME_HELP),
    FieldSpec::new("email", "Email", Widget::EmailInput).max_length(MAX_EMAIL_LENGTH),
    FieldSpec::new("password1", "Password", Widget::PasswordInput).help(PASSWORD_HELP),
    FieldSpec::new("password2", "Password confirmation", Widget::PasswordInput)
        .help(PASSWORD_CONFIRM_HELP),
];

impl Form for SignUpForm {
    fn specs() -> &'static [FieldSpec] {
        SIGN_UP_FIELDS
    }

    fn value(&self, name: &str) -> &str {
        match name {
            "username" => &self.username,
            "email" => &self.email,
            "password1" => &self.password1,
            "password2" => &self.password2,
            _ => "",
        }
    }

    fn clean(&self) -> FormErrors {
        let mut errors = clean_fields(self);
        check_passwords_match(&mut errors, "password2", &self.password1, &self.password2);
        errors
    }
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

const LOGIN_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("username", "Username", Widget::TextInput).max_length(MAX_USERNAME_LENGTH),
    FieldSpec::new("password", "Password", Widget::PasswordInput),
];

impl Form for LoginForm {
    fn specs() -> &'static [FieldSpec] {
        LOGIN_FIELDS
    }

    fn value(&self, name: &str) -> &str {
        match name {
            "username" => &self.username,
            "password" => &self.password,
            _ => "",
        }
    }
}

/// Logout carries nothing but the CSRF token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutForm {}

/// Account settings form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserUpdateForm {
    #[serde(default)]
    #[validate(length(
        max = 150,
        message = "Ensure this value has at most 150 characters."
    ))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(
        max = 150,
        message = "Ensure this value has at most 150 characters."
    ))]
    pub last_name: String,

    #[serde(default)]
    pub email: String,
}

const USER_UPDATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("first_name", "First name", Widget::TextInput)
        .optional()
        .max_length(150),
    FieldSpec::new("last_name", "Last name", Widget::TextInput)
        .optional()
        .max_length(150),
    FieldSpec::new("email", "Email address", Widget::EmailInput)
        .optional()
        .max_length(MAX_EMAIL_LENGTH),
];

impl Form for UserUpdateForm {
    fn specs() -> &'static [FieldSpec] {
        USER_UPDATE_FIELDS
    }

    fn value(&self, name: &str) -> &str {
        match name {
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "email" => &self.email,
            _ => "",
        }
    }

    fn clean(&self) -> FormErrors {
        let mut errors = clean_fields(self);
        // Email is optional here, so it is only checked when given
        if !self.email.is_empty() {
            if let Err(e) = validate_email(&self.email) {
                errors.add("email", e.to_string());
            }
        }
        errors
    }
}

/// Password reset request form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PasswordResetForm {
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

const PASSWORD_RESET_FIELDS: &[FieldSpec] =
    &[FieldSpec::new("email", "Email", Widget::EmailInput).max_length(MAX_EMAIL_LENGTH)];

impl Form for PasswordResetForm {
    fn specs() -> &'static [FieldSpec] {
        PASSWORD_RESET_FIELDS
    }

    fn value(&self, name: &str) -> &str {
        match name {
            "email" => &self.email,
            _ => "",
        }
    }
}

/// New password form reached from a reset link.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SetPasswordForm {
    #[serde(default)]
    pub new_password1: String,

    #[serde(default)]
    pub new_password2: String,
}

const SET_PASSWORD_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("new_password1", "New password", Widget::PasswordInput).help(PASSWORD_HELP),
    FieldSpec::new(
        "new_password2",
        "New password confirmation",
        Widget::PasswordInput,
    ),
];

impl Form for SetPasswordForm {
    fn specs() -> &'static [FieldSpec] {
        SET_PASSWORD_FIELDS
    }

    fn value(&self, name: &str) -> &str {
        match name {
            "new_password1" => &self.new_password1,
            "new_password2" => &self.new_password2,
            _ => "",
        }
    }

    fn clean(&self) -> FormErrors {
        let mut errors = clean_fields(self);
        check_passwords_match(
            &mut errors,
            "new_password2",
            &self.new_password1,
            &self.new_password2,
        );
        errors
    }
}

/// Password change form for a logged-in user.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PasswordChangeForm {
    #[serde(default)]
    pub old_password: String,

    #[serde(default)]
    pub new_password1: String,

    #[serde(default)]
    pub new_password2: String,
}

const PASSWORD_CHANGE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("old_password", "Old password", Widget::PasswordInput),
    FieldSpec::new("new_password1", "New password", Widget::PasswordInput).help(PASSWORD_HELP),
    FieldSpec::new(
        "new_password2",
        "New password confirmation",
        Widget::PasswordInput,
    ),
];

impl Form for PasswordChangeForm {
    fn specs() -> &'static [FieldSpec] {
        PASSWORD_CHANGE_FIELDS
    }

    fn value(&self, name: &str) -> &str {
        match name {
            "old_password" => &self.old_password,
            "new_password1" => &self.new_password1,
            "new_password2" => &self.new_password2,
            _ => "",
        }
    }

    fn clean(&self) -> FormErrors {
        let mut errors = clean_fields(self);
        check_passwords_match(
            &mut errors,
            "new_password2",
            &self.new_password1,
            &self.new_password2,
        );
        errors
    }
}

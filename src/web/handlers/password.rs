//! Password reset and password change pages.

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::auth::validation::validate_password_not_username;
use crate::auth::{decode_uid, encode_uid, hash_password, validate_password, verify_password};
use crate::db::{User, UserRepository};
use crate::mail::OutgoingMail;
use crate::template::{TemplateContext, Value};
use crate::web::csrf::{CsrfForm, CsrfToken};
use crate::web::error::{WebError, WebResult};
use crate::web::forms::{
    Form, FormErrors, FormView, PasswordChangeForm, PasswordResetForm, SetPasswordForm,
};
use crate::web::middleware::{CurrentUser, LoginRequired};
use crate::web::render::Page;
use crate::web::state::AppState;

const WRONG_OLD_PASSWORD: &str =
    "Your old password was entered incorrectly. Please enter it again.";

/// Check a new password against the password policy for `username`.
fn check_new_password(errors: &mut FormErrors, field: &str, password: &str, username: &str) {
    if password.is_empty() {
        return;
    }
    if let Err(e) = validate_password(password) {
        errors.add(field, e.to_string());
    }
    if let Err(e) = validate_password_not_username(password, username) {
        errors.add(field, e.to_string());
    }
}

/// Hash and store a new password.
async fn store_password(state: &AppState, user_id: i64, password: &str) -> WebResult<()> {
    let hash = hash_password(password).map_err(|e| WebError::Internal(e.to_string()))?;
    UserRepository::new(state.db.pool())
        .set_password(user_id, &hash)
        .await?;
    Ok(())
}

/// Path segments of a reset link: `uidb64` of URL-safe base64 characters
/// and a token `{base36 timestamp}-{signature}`.
fn is_reset_link(uidb64: &str, token: &str) -> bool {
    let uid_ok = !uidb64.is_empty()
        && uidb64
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    let token_ok = match token.split_once('-') {
        Some((ts, sig)) => {
            (1..=13).contains(&ts.len())
                && (1..=20).contains(&sig.len())
                && ts.bytes().all(|b| b.is_ascii_alphanumeric())
                && sig.bytes().all(|b| b.is_ascii_alphanumeric())
        }
        None => false,
    };

    uid_ok && token_ok
}

fn reset_request_page(
    state: &AppState,
    current: &CurrentUser,
    csrf: &CsrfToken,
    form: &FormView,
) -> WebResult<Html<String>> {
    Page::new(state, "accounts/password_reset.html", current, csrf)?
        .title("reset.title")
        .form(form)?
        .render()
}

/// GET /reset/
pub async fn password_reset_form(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
) -> WebResult<Html<String>> {
    reset_request_page(
        &state,
        &current,
        &csrf,
        &FormView::unbound::<PasswordResetForm>(),
    )
}

/// Render and send the reset mail for one user.
async fn send_reset_mail(state: &AppState, user: &User) -> WebResult<()> {
    let token = state
        .tokens
        .make_token(user)
        .map_err(|e| WebError::Internal(e.to_string()))?;
    let path = format!("/reset/{}/{}/", encode_uid(user.id), token);

    let mut context = TemplateContext::new(state.i18n.clone());
    context.set("site_name", Value::string(&state.config.forum.name));
    context.set("username", Value::string(&user.username));
    context.set("email", Value::string(&user.email));
    context.set("reset_url", Value::string(state.config.server.absolute_url(&path)));

    let subject = state
        .templates
        .render("mail/password_reset_subject.txt", &context)?;
    let body = state
        .templates
        .render("mail/password_reset_email.txt", &context)?;
    let mail = OutgoingMail::compose(&state.config.mail, &user.email, &subject, body);

    let mailer = state.mailer.clone();
    match tokio::task::spawn_blocking(move || mailer.send(&mail)).await {
        Ok(Ok(())) => info!(user_id = user.id, "Password reset mail sent"),
        Ok(Err(e)) => error!(user_id = user.id, error = %e, "Password reset mail failed"),
        Err(e) => error!(user_id = user.id, error = %e, "Mail task failed"),
    }
    Ok(())
}

/// POST /reset/ - Mail a reset link to every active account with the address.
///
/// Redirects to the done page whether or not an account matched.
pub async fn password_reset(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
    CsrfForm(form): CsrfForm<PasswordResetForm>,
) -> WebResult<Response> {
    let errors = form.clean();
    if !errors.is_empty() {
        let view = FormView::bound(&form, &errors);
        return Ok(reset_request_page(&state, &current, &csrf, &view)?.into_response());
    }

    let users = UserRepository::new(state.db.pool())
        .list_active_by_email(form.email.trim())
        .await?;
    if users.is_empty() {
        debug!("Password reset requested for an unknown address");
    }
    for user in &users {
        send_reset_mail(&state, user).await?;
    }

    Ok(Redirect::to("/reset/done/").into_response())
}

/// GET /reset/done/
pub async fn password_reset_done(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
) -> WebResult<Html<String>> {
    Page::new(&state, "accounts/password_reset_done.html", &current, &csrf)?
        .title("reset.done_title")
        .render()
}

/// Find the user a reset link was issued for, if the link is still valid.
async fn reset_link_user(state: &AppState, uidb64: &str, token: &str) -> WebResult<Option<User>> {
    let Some(user_id) = decode_uid(uidb64) else {
        debug!("Reset link with undecodable uid");
        return Ok(None);
    };

    let user = UserRepository::new(state.db.pool())
        .get_by_id(user_id)
        .await?
        .filter(|u| u.is_active);
    let Some(user) = user else {
        return Ok(None);
    };

    match state.tokens.check_token(&user, token) {
        Ok(()) => Ok(Some(user)),
        Err(e) => {
            debug!(user_id, error = %e, "Reset token rejected");
            Ok(None)
        }
    }
}

fn reset_confirm_page(
    state: &AppState,
    current: &CurrentUser,
    csrf: &CsrfToken,
    form: Option<&FormView>,
) -> WebResult<Html<String>> {
    let page = Page::new(state, "accounts/password_reset_confirm.html", current, csrf)?;
    match form {
        Some(form) => page
            .title("reset.confirm_title")
            .set("validlink", true)
            .form(form)?
            .render(),
        None => page
            .title("reset.invalid_title")
            .set("validlink", false)
            .render(),
    }
}

/// GET /reset/:uidb64/:token/
pub async fn password_reset_confirm_form(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
    Path((uidb64, token)): Path<(String, String)>,
) -> WebResult<Html<String>> {
    if !is_reset_link(&uidb64, &token) {
        return Err(WebError::NotFound);
    }

    let form = match reset_link_user(&state, &uidb64, &token).await? {
        Some(_) => Some(FormView::unbound::<SetPasswordForm>()),
        None => None,
    };
    reset_confirm_page(&state, &current, &csrf, form.as_ref())
}

/// POST /reset/:uidb64/:token/ - Set a new password from a reset link.
pub async fn password_reset_confirm(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
    Path((uidb64, token)): Path<(String, String)>,
    CsrfForm(form): CsrfForm<SetPasswordForm>,
) -> WebResult<Response> {
    if !is_reset_link(&uidb64, &token) {
        return Err(WebError::NotFound);
    }

    let Some(user) = reset_link_user(&state, &uidb64, &token).await? else {
        return Ok(reset_confirm_page(&state, &current, &csrf, None)?.into_response());
    };

    let mut errors = form.clean();
    if errors.is_empty() {
        check_new_password(
            &mut errors,
            "new_password2",
            &form.new_password1,
            &user.username,
        );
    }
    if !errors.is_empty() {
        let view = FormView::bound(&form, &errors);
        return Ok(reset_confirm_page(&state, &current, &csrf, Some(&view))?.into_response());
    }

    store_password(&state, user.id, &form.new_password1).await?;
    state.sessions.lock().await.logout_user(user.id, None);
    info!(user_id = user.id, "Password reset completed");

    Ok(Redirect::to("/reset/complete/").into_response())
}

/// GET /reset/complete/
pub async fn password_reset_complete(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
) -> WebResult<Html<String>> {
    Page::new(&state, "accounts/password_reset_complete.html", &current, &csrf)?
        .title("reset.complete_title")
        .render()
}

fn password_change_page(
    state: &AppState,
    current: &CurrentUser,
    csrf: &CsrfToken,
    form: &FormView,
) -> WebResult<Html<String>> {
    Page::new(state, "accounts/password_change.html", current, csrf)?
        .title("password_change.title")
        .form(form)?
        .render()
}

/// GET /settings/password/
pub async fn password_change_form(
    State(state): State<Arc<AppState>>,
    login: LoginRequired,
    csrf: CsrfToken,
) -> WebResult<Html<String>> {
    let current = CurrentUser::from(login);
    password_change_page(
        &state,
        &current,
        &csrf,
        &FormView::unbound::<PasswordChangeForm>(),
    )
}

/// POST /settings/password/ - Change the password, keeping this session.
pub async fn password_change(
    State(state): State<Arc<AppState>>,
    login: LoginRequired,
    csrf: CsrfToken,
    CsrfForm(form): CsrfForm<PasswordChangeForm>,
) -> WebResult<Response> {
    let mut errors = form.clean();

    if !form.old_password.is_empty()
        && verify_password(&form.old_password, &login.user.password).is_err()
    {
        errors.add("old_password", WRONG_OLD_PASSWORD);
    }
    if errors.is_empty() {
        check_new_password(
            &mut errors,
            "new_password2",
            &form.new_password1,
            &login.user.username,
        );
    }
    if !errors.is_empty() {
        let current = CurrentUser::from(login);
        let view = FormView::bound(&form, &errors);
        return Ok(password_change_page(&state, &current, &csrf, &view)?.into_response());
    }

    store_password(&state, login.user.id, &form.new_password1).await?;
    state
        .sessions
        .lock()
        .await
        .logout_user(login.user.id, Some(&login.session_token));
    info!(user_id = login.user.id, "Password changed");

    Ok(Redirect::to("/settings/password/done/").into_response())
}

/// GET /settings/password/done/
pub async fn password_change_done(
    State(state): State<Arc<AppState>>,
    login: LoginRequired,
    csrf: CsrfToken,
) -> WebResult<Html<String>> {
    let current = CurrentUser::from(login);
    Page::new(&state, "accounts/password_change_done.html", &current, &csrf)?
        .title("password_change.done_title")
        .render()
}

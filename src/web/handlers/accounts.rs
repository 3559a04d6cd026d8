//! Signup, login, logout and account settings.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::{
    register, verify_password, PasswordError, RegistrationError, RegistrationRequest,
    SessionError, ValidationError,
};
use crate::db::{UserRepository, UserUpdate};
use crate::web::csrf::{CsrfForm, CsrfToken};
use crate::web::error::{WebError, WebResult};
use crate::web::forms::{
    Form, FormErrors, FormView, LoginForm, LogoutForm, SignUpForm, UserUpdateForm,
};
use crate::web::middleware::auth::{removal_cookie, session_cookie};
use crate::web::middleware::{CurrentUser, LoginRequired};
use crate::web::render::Page;
use crate::web::state::AppState;

/// `?next=` query of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Accept only site-local paths as a post-login target.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

/// Put a failed registration on the field it belongs to.
fn registration_error(errors: &mut FormErrors, err: RegistrationError) -> WebResult<()> {
    match err {
        RegistrationError::Validation(e) => {
            let field = match &e {
                ValidationError::EmailTooLong | ValidationError::EmailInvalidFormat => "email",
                ValidationError::PasswordSimilarToUsername => "password2",
                _ => "username",
            };
            errors.add(field, e.to_string());
        }
        RegistrationError::UsernameExists => {
            errors.add("username", RegistrationError::UsernameExists.to_string())
        }
        RegistrationError::Password(PasswordError::HashError(e)) => {
            return Err(WebError::Internal(e));
        }
        RegistrationError::Password(e) => errors.add("password2", e.to_string()),
        RegistrationError::Database(e) => {
            tracing::error!(error = %e, "Registration failed");
            return Err(WebError::Internal(e));
        }
    }
    Ok(())
}

fn signup_page(
    state: &AppState,
    current: &CurrentUser,
    csrf: &CsrfToken,
    form: &FormView,
) -> WebResult<Html<String>> {
    Page::new(state, "accounts/signup.html", current, csrf)?
        .title("signup.title")
        .form(form)?
        .render()
}

/// GET /signup/
pub async fn signup_form(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
) -> WebResult<Html<String>> {
    signup_page(&state, &current, &csrf, &FormView::unbound::<SignUpForm>())
}

/// POST /signup/ - Create an account and log it in.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
    jar: CookieJar,
    CsrfForm(form): CsrfForm<SignUpForm>,
) -> WebResult<Response> {
    let mut errors = form.clean();

    if errors.is_empty() {
        let repo = UserRepository::new(state.db.pool());
        let request = RegistrationRequest::new(form.username.trim(), form.password1.as_str())
            .with_email(form.email.trim());

        match register(&repo, request).await {
            Ok(user) => {
                let session = state.sessions.lock().await.start(user.id);
                repo.update_last_login(user.id).await?;
                let jar = jar.add(session_cookie(
                    session.token,
                    state.config.session.secure_cookies,
                ));
                return Ok((jar, Redirect::to("/")).into_response());
            }
            Err(e) => registration_error(&mut errors, e)?,
        }
    }

    let view = FormView::bound(&form, &errors);
    Ok(signup_page(&state, &current, &csrf, &view)?.into_response())
}

fn login_page(
    state: &AppState,
    current: &CurrentUser,
    csrf: &CsrfToken,
    next: Option<&str>,
    form: &FormView,
) -> WebResult<Html<String>> {
    let action = match safe_next(next) {
        Some(next) => WebError::login_url(next),
        None => "/login/".to_string(),
    };

    Page::new(state, "accounts/login.html", current, csrf)?
        .title("login.title")
        .set("login_action", action)
        .form(form)?
        .render()
}

/// GET /login/
pub async fn login_form(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
    Query(query): Query<NextQuery>,
) -> WebResult<Html<String>> {
    login_page(
        &state,
        &current,
        &csrf,
        query.next.as_deref(),
        &FormView::unbound::<LoginForm>(),
    )
}

/// POST /login/ - Check credentials and start a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    csrf: CsrfToken,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    CsrfForm(form): CsrfForm<LoginForm>,
) -> WebResult<Response> {
    let mut errors = form.clean();
    let next = query.next.as_deref();
    let username = form.username.trim();

    if errors.is_empty() {
        if let Err(e) = state.sessions.lock().await.check_login(username) {
            errors.add_non_field(e.to_string());
        }
    }

    if errors.is_empty() {
        let repo = UserRepository::new(state.db.pool());
        let user = repo
            .get_by_username(username)
            .await?
            .filter(|u| verify_password(&form.password, &u.password).is_ok());

        match user {
            None => {
                state.sessions.lock().await.login_failed(username);
                errors.add_non_field(SessionError::InvalidCredentials.to_string());
            }
            Some(user) if !user.is_active => {
                errors.add_non_field(SessionError::AccountInactive.to_string());
            }
            Some(user) => {
                let session = state
                    .sessions
                    .lock()
                    .await
                    .login_succeeded(&user.username, user.id);
                repo.update_last_login(user.id).await?;

                let jar = jar.add(session_cookie(
                    session.token,
                    state.config.session.secure_cookies,
                ));
                let target = safe_next(next).unwrap_or("/");
                return Ok((jar, Redirect::to(target)).into_response());
            }
        }
    }

    let view = FormView::bound(&form, &errors);
    Ok(login_page(&state, &current, &csrf, next, &view)?.into_response())
}

/// POST /logout/ - End the current session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    jar: CookieJar,
    CsrfForm(_): CsrfForm<LogoutForm>,
) -> WebResult<Response> {
    if let Some(token) = &current.session_token {
        state.sessions.lock().await.logout(token);
    }
    if let Some(user) = &current.user {
        info!(user_id = user.id, username = %user.username, "User logged out");
    }

    let jar = jar.remove(removal_cookie());
    Ok((jar, Redirect::to("/")).into_response())
}

fn account_page(
    state: &AppState,
    current: &CurrentUser,
    csrf: &CsrfToken,
    form: &FormView,
) -> WebResult<Html<String>> {
    Page::new(state, "accounts/my_account.html", current, csrf)?
        .title("account.title")
        .form(form)?
        .render()
}

/// GET /settings/account/
pub async fn my_account_form(
    State(state): State<Arc<AppState>>,
    login: LoginRequired,
    csrf: CsrfToken,
) -> WebResult<Html<String>> {
    let initial = UserUpdateForm {
        first_name: login.user.first_name.clone(),
        last_name: login.user.last_name.clone(),
        email: login.user.email.clone(),
    };
    let current = CurrentUser::from(login);

    account_page(&state, &current, &csrf, &FormView::initial(&initial))
}

/// POST /settings/account/ - Update name and email.
pub async fn my_account(
    State(state): State<Arc<AppState>>,
    login: LoginRequired,
    csrf: CsrfToken,
    CsrfForm(form): CsrfForm<UserUpdateForm>,
) -> WebResult<Response> {
    let errors = form.clean();
    if !errors.is_empty() {
        let current = CurrentUser::from(login);
        let view = FormView::bound(&form, &errors);
        return Ok(account_page(&state, &current, &csrf, &view)?.into_response());
    }

    let update = UserUpdate::new()
        .first_name(form.first_name.trim())
        .last_name(form.last_name.trim())
        .email(form.email.trim());
    UserRepository::new(state.db.pool())
        .update(login.user.id, &update)
        .await?
        .ok_or(WebError::NotFound)?;

    info!(user_id = login.user.id, "Account settings updated");
    Ok(Redirect::to("/settings/account/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/boards/1/")), Some("/boards/1/"));
        assert_eq!(safe_next(Some("//evil.example.com/")), None);
        assert_eq!(safe_next(Some("https://evil.example.com/")), None);
        assert_eq!(safe_next(Some("/\\evil")), None);
        assert_eq!(safe_next(None), None);
    }

    #[test]
    fn test_registration_error_fields() {
        let mut errors = FormErrors::new();
        registration_error(&mut errors, RegistrationError::UsernameExists).unwrap();
        registration_error(
            &mut errors,
            RegistrationError::Validation(ValidationError::EmailInvalidFormat),
        )
        .unwrap();
        registration_error(
            &mut errors,
            RegistrationError::Password(PasswordError::EntirelyNumeric),
        )
        .unwrap();

        assert!(errors.has_field_error("username"));
        assert!(errors.has_field_error("email"));
        assert_eq!(
            errors.field("password2"),
            ["This password is entirely numeric.".to_string()]
        );

        assert!(registration_error(
            &mut errors,
            RegistrationError::Database("locked".to_string())
        )
        .is_err());
    }
}

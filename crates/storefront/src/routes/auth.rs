//! Authentication route handlers.
//!
//! One page drives the whole Wix member flow: log in, sign up, password
//! reset, and email verification, selected by `mode`. A successful login
//! swaps the visitor's refresh token cookie for a member token.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mon_core::{Email, LoginState};

use crate::cart::CartStore;
use crate::error::{add_breadcrumb, clear_sentry_user};
use crate::filters;
use crate::middleware::{Visitor, clear_refresh_cookie, member_cookie};
use crate::routes::context::PageContext;
use crate::state::AppState;
use crate::wix::{AccessToken, LoginErrorCode, LoginResponse, Tokens, WixError};

const ACCOUNT_CREATED: &str = "Account created successfully! Please log in.";
const RESET_EMAIL_SENT: &str = "Password reset email sent. Please check your e-mail.";
const VERIFICATION_REQUIRED: &str = "Email verification required. Check your email for the code.";
const PENDING_APPROVAL: &str = "Your account is pending approval.";
const LOGIN_SUCCESS: &str = "Successful! Redirecting...";
const SOMETHING_WENT_WRONG: &str = "Something went wrong. Please try again.";
const INVALID_EMAIL: &str = "Please enter a valid email address.";

// =============================================================================
// Modes
// =============================================================================

/// Which step of the member flow the page shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
    Reset,
    Verify,
}

impl AuthMode {
    /// Parse `?mode=`; anything unknown is the login form.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("register") => Self::Register,
            Some("reset") => Self::Reset,
            Some("verify") => Self::Verify,
            _ => Self::Login,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Reset => "reset",
            Self::Verify => "verify",
        }
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Login => "Log in",
            Self::Register => "Sign up",
            Self::Reset => "Reset Your Password",
            Self::Verify => "Verify Your Email",
        }
    }

    #[must_use]
    pub const fn button_label(&self) -> &'static str {
        match self {
            Self::Login => "Log In",
            Self::Register => "Sign Up",
            Self::Reset => "Reset",
            Self::Verify => "Verify",
        }
    }

    #[must_use]
    pub const fn shows_username(&self) -> bool {
        matches!(self, Self::Register)
    }

    #[must_use]
    pub const fn shows_email(&self) -> bool {
        !matches!(self, Self::Verify)
    }

    #[must_use]
    pub const fn shows_password(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    #[must_use]
    pub const fn shows_code(&self) -> bool {
        matches!(self, Self::Verify)
    }
}

/// What to show after a submission that did not log the member in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    pub mode: AuthMode,
    pub message: Option<String>,
    pub error: Option<String>,
    pub state_token: Option<String>,
}

impl Feedback {
    fn message(mode: AuthMode, message: &str) -> Self {
        Self {
            mode,
            message: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn error(mode: AuthMode, error: &str) -> Self {
        Self {
            mode,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// Feedback for an IAM state machine response.
    #[must_use]
    pub fn for_response(mode: AuthMode, response: &LoginResponse) -> Self {
        match response.state {
            LoginState::Success => Self::message(mode, LOGIN_SUCCESS),
            LoginState::Failure => {
                let message = response
                    .error_code
                    .as_ref()
                    .map_or("An unexpected error occurred!", LoginErrorCode::user_message);
                Self::error(mode, message)
            }
            LoginState::RequireEmailVerification => Self {
                state_token: response.state_token.clone(),
                ..Self::message(AuthMode::Verify, VERIFICATION_REQUIRED)
            },
            LoginState::RequireOwnerApproval => Self::message(mode, PENDING_APPROVAL),
        }
    }
}

// =============================================================================
// Forms and Templates
// =============================================================================

/// Query string for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub mode: Option<String>,
}

/// Login page form data. Which fields are present depends on `mode`.
#[derive(Deserialize)]
pub struct LoginForm {
    pub mode: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub code: String,
    pub state_token: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub mode: AuthMode,
    pub email: String,
    pub message: Option<String>,
    pub error: Option<String>,
    pub state_token: Option<String>,
}

impl LoginTemplate {
    fn with_feedback(ctx: PageContext, email: String, feedback: Feedback) -> Self {
        Self {
            ctx,
            mode: feedback.mode,
            email,
            message: feedback.message,
            error: feedback.error,
            state_token: feedback.state_token,
        }
    }
}

enum Submission {
    LoggedIn(Tokens),
    Render(Feedback),
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page. Members are sent home.
#[instrument(skip(visitor, ctx))]
pub async fn login_page(
    visitor: Visitor,
    ctx: PageContext,
    Query(query): Query<LoginQuery>,
) -> Response {
    if visitor.is_member() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate::with_feedback(
        ctx,
        String::new(),
        Feedback {
            mode: AuthMode::parse(query.mode.as_deref()),
            ..Feedback::default()
        },
    )
    .into_response()
}

/// Handle a login, sign-up, reset, or verification submission.
#[instrument(skip_all, fields(mode = tracing::field::Empty))]
pub async fn login(
    State(state): State<AppState>,
    visitor: Visitor,
    ctx: PageContext,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let mode = AuthMode::parse(form.mode.as_deref());
    tracing::Span::current().record("mode", mode.as_str());
    let email = form.email.trim().to_string();

    let result = match visitor.access_token(&state).await {
        Some(token) => submit(&state, &token, mode, &form).await,
        None => Err(WixError::Auth("No visitor token for this request".to_string())),
    };

    match result {
        Ok(Submission::LoggedIn(tokens)) => {
            add_breadcrumb("auth", "Member logged in", None);
            if let Err(e) = CartStore::clear(&session).await {
                tracing::warn!("Failed to clear visitor cart: {e}");
            }

            let mut response = Redirect::to("/").into_response();
            if let Some(cookie) =
                member_cookie(&tokens.refresh_token, state.config().secure_cookies())
            {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            response
        }
        Ok(Submission::Render(feedback)) => {
            LoginTemplate::with_feedback(ctx, email, feedback).into_response()
        }
        Err(e) => {
            tracing::error!("Error during login process: {e}");
            LoginTemplate::with_feedback(ctx, email, Feedback::error(mode, SOMETHING_WENT_WRONG))
                .into_response()
        }
    }
}

async fn submit(
    state: &AppState,
    token: &AccessToken,
    mode: AuthMode,
    form: &LoginForm,
) -> Result<Submission, WixError> {
    let wix = state.wix();
    let email = if mode.shows_email() {
        match Email::parse(&form.email) {
            Ok(email) => email.to_string(),
            Err(e) => {
                tracing::debug!("Rejected email: {e}");
                return Ok(Submission::Render(Feedback::error(mode, INVALID_EMAIL)));
            }
        }
    } else {
        String::new()
    };
    let email = email.as_str();

    let response = match mode {
        AuthMode::Login => wix.login(token, email, &form.password).await?,
        AuthMode::Register => {
            let response = wix
                .register(token, email, &form.password, form.username.trim())
                .await?;
            if response.state == LoginState::Failure {
                return Ok(Submission::Render(Feedback::for_response(mode, &response)));
            }
            return Ok(Submission::Render(Feedback::message(
                AuthMode::Login,
                ACCOUNT_CREATED,
            )));
        }
        AuthMode::Reset => {
            wix.send_password_reset_email(token, email, &state.url("/login"))
                .await?;
            return Ok(Submission::Render(Feedback::message(mode, RESET_EMAIL_SENT)));
        }
        AuthMode::Verify => {
            let state_token = form
                .state_token
                .as_deref()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| WixError::Auth("Missing verification state".to_string()))?;
            wix.process_verification(token, form.code.trim(), state_token)
                .await?
        }
    };

    if response.state != LoginState::Success {
        return Ok(Submission::Render(Feedback::for_response(mode, &response)));
    }

    let session_token = response
        .session_token
        .ok_or_else(|| WixError::Auth("Token retrieval failed".to_string()))?;
    let tokens = wix.member_tokens_for_session(&session_token).await?;
    Ok(Submission::LoggedIn(tokens))
}

/// Log out: end the Wix session, drop the token cookie and cached cart.
///
/// Redirects to Wix's logout URL, which returns to `/login`. If Wix cannot
/// be reached the visitor is sent straight to `/login`.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, visitor: Visitor, session: Session) -> Response {
    let target = match visitor.access_token(&state).await {
        Some(token) => state
            .wix()
            .logout_url(&token, &state.url("/login"))
            .await
            .map(|redirect| redirect.full_url)
            .unwrap_or_else(|e| {
                tracing::error!("Error during logout: {e}");
                "/login".to_string()
            }),
        None => "/login".to_string(),
    };

    if let Some(refresh) = &visitor.0 {
        state.wix().forget_token(refresh).await;
    }
    if let Err(e) = CartStore::clear(&session).await {
        tracing::warn!("Failed to clear cart on logout: {e}");
    }
    clear_sentry_user();

    let mut response = Redirect::to(&target).into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, clear_refresh_cookie());
    response
}

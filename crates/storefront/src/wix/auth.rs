//! OAuth token and member authentication endpoints.

use tracing::{debug, instrument, warn};

use crate::wix::WixError;
use crate::wix::types::{
    AccessToken, LoginErrorCode, LoginResponse, RedirectSession, RefreshToken, TokenRole, Tokens,
};

use super::client::WixClient;
use super::conversions::convert_login;
use super::wire::{
    Callbacks, LoginId, LoginRequest, LogoutTarget, RecoveryRedirect, RecoveryRequest,
    RedirectSessionRequest, RedirectSessionResponse, RegisterProfile, RegisterRequest,
    StateMachineResponse, TokenRequest, TokenResponse, VerifyRequest,
};

const TOKEN_PATH: &str = "/oauth2/token";
const LOGIN_PATH: &str = "/_api/iam/authentication/v2/login";
const REGISTER_PATH: &str = "/_api/iam/authentication/v2/register";
const VERIFY_PATH: &str = "/_api/iam/verification/v1/code/verify-during-authentication";
const RECOVERY_PATH: &str = "/_api/iam/recovery/v1/send-email";
pub(super) const REDIRECT_SESSION_PATH: &str = "/redirect-session/v1/redirect-session";

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl WixClient {
    async fn token_request(
        &self,
        request: &TokenRequest<'_>,
        role: TokenRole,
        fallback_refresh: Option<&str>,
    ) -> Result<Tokens, WixError> {
        let response: TokenResponse = self.post(TOKEN_PATH, request, None).await?;

        let refresh = response
            .refresh_token
            .or_else(|| fallback_refresh.map(str::to_string))
            .ok_or_else(|| WixError::Auth("Token response has no refresh token".to_string()))?;

        Ok(Tokens {
            access_token: AccessToken::new(response.access_token, now() + response.expires_in),
            refresh_token: RefreshToken {
                value: refresh,
                role,
            },
        })
    }

    /// Request tokens for an anonymous visitor.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint rejects the client ID or is unreachable.
    #[instrument(skip(self), fields(client_id = %self.client_id()))]
    pub async fn generate_visitor_tokens(&self) -> Result<Tokens, WixError> {
        let request = TokenRequest {
            client_id: self.client_id(),
            grant_type: "anonymous",
            refresh_token: None,
            session_token: None,
        };
        let tokens = self.token_request(&request, TokenRole::Visitor, None).await?;
        self.inner
            .tokens
            .insert(
                tokens.refresh_token.value.clone(),
                tokens.access_token.clone(),
            )
            .await;
        Ok(tokens)
    }

    /// Exchange a refresh token for an access token, reusing a cached one
    /// while it is still valid.
    ///
    /// # Errors
    ///
    /// Returns [`WixError::Auth`] if the refresh token is no longer accepted.
    #[instrument(skip_all, fields(role = ?refresh.role))]
    pub async fn access_token(&self, refresh: &RefreshToken) -> Result<AccessToken, WixError> {
        if let Some(token) = self.inner.tokens.get(&refresh.value).await
            && !token.is_expired_at(now())
        {
            debug!("Cache hit for access token");
            return Ok(token);
        }

        let request = TokenRequest {
            client_id: self.client_id(),
            grant_type: "refresh_token",
            refresh_token: Some(&refresh.value),
            session_token: None,
        };
        let tokens = self
            .token_request(&request, refresh.role, Some(&refresh.value))
            .await
            .map_err(|e| match e {
                WixError::Api { status, .. } if status == 400 || status == 401 => {
                    WixError::Auth("Refresh token rejected".to_string())
                }
                other => other,
            })?;

        self.inner
            .tokens
            .insert(refresh.value.clone(), tokens.access_token.clone())
            .await;

        Ok(tokens.access_token)
    }

    /// Exchange the session token from a successful login for member tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the session token is rejected.
    #[instrument(skip_all)]
    pub async fn member_tokens_for_session(&self, session_token: &str) -> Result<Tokens, WixError> {
        let request = TokenRequest {
            client_id: self.client_id(),
            grant_type: "session_token",
            refresh_token: None,
            session_token: Some(session_token),
        };
        let tokens = self.token_request(&request, TokenRole::Member, None).await?;
        self.inner
            .tokens
            .insert(
                tokens.refresh_token.value.clone(),
                tokens.access_token.clone(),
            )
            .await;
        Ok(tokens)
    }

    /// Drop the cached access token for a refresh token.
    pub async fn forget_token(&self, refresh: &RefreshToken) {
        self.inner.tokens.invalidate(&refresh.value).await;
    }

    // =========================================================================
    // IAM State Machine
    // =========================================================================

    /// Map IAM responses, turning application errors into failure states.
    fn login_outcome(
        result: Result<StateMachineResponse, WixError>,
    ) -> Result<LoginResponse, WixError> {
        match result {
            Ok(response) => Ok(convert_login(response)),
            Err(WixError::Api {
                status,
                code: Some(code),
                ..
            }) if (400..500).contains(&status) => {
                warn!(code = %code, "Login rejected");
                Ok(LoginResponse::failure(LoginErrorCode::from_wix_code(&code)))
            }
            Err(e) => Err(e),
        }
    }

    /// Log a member in with email and password.
    ///
    /// Rejected credentials are returned as a `FAILURE` response, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if Wix is unreachable or answers unexpectedly.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        token: &AccessToken,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, WixError> {
        let body = LoginRequest {
            login_id: LoginId { email },
            password,
        };
        Self::login_outcome(self.post(LOGIN_PATH, &body, Some(token)).await)
    }

    /// Register a new member.
    ///
    /// # Errors
    ///
    /// Returns an error only if Wix is unreachable or answers unexpectedly.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        token: &AccessToken,
        email: &str,
        password: &str,
        nickname: &str,
    ) -> Result<LoginResponse, WixError> {
        let body = RegisterRequest {
            login_id: LoginId { email },
            password,
            profile: RegisterProfile { nickname },
        };
        Self::login_outcome(self.post(REGISTER_PATH, &body, Some(token)).await)
    }

    /// Submit the emailed verification code for a pending login.
    ///
    /// # Errors
    ///
    /// Returns an error only if Wix is unreachable or answers unexpectedly.
    #[instrument(skip_all)]
    pub async fn process_verification(
        &self,
        token: &AccessToken,
        code: &str,
        state_token: &str,
    ) -> Result<LoginResponse, WixError> {
        let body = VerifyRequest { code, state_token };
        Self::login_outcome(self.post(VERIFY_PATH, &body, Some(token)).await)
    }

    /// Email a password reset link that returns the member to `redirect_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(email = %email))]
    pub async fn send_password_reset_email(
        &self,
        token: &AccessToken,
        email: &str,
        redirect_url: &str,
    ) -> Result<(), WixError> {
        let body = RecoveryRequest {
            email,
            redirect: RecoveryRedirect {
                url: redirect_url,
                client_id: self.client_id(),
            },
        };
        let _: serde_json::Value = self.post(RECOVERY_PATH, &body, Some(token)).await?;
        Ok(())
    }

    /// Hosted logout URL that ends the Wix session and returns to `post_flow_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect session cannot be created.
    #[instrument(skip(self, token))]
    pub async fn logout_url(
        &self,
        token: &AccessToken,
        post_flow_url: &str,
    ) -> Result<RedirectSession, WixError> {
        let body = RedirectSessionRequest {
            ecom_checkout: None,
            logout: Some(LogoutTarget {
                client_id: self.client_id(),
            }),
            callbacks: Callbacks {
                post_flow_url,
                thank_you_page_url: None,
            },
        };
        let response: RedirectSessionResponse =
            self.post(REDIRECT_SESSION_PATH, &body, Some(token)).await?;
        Ok(RedirectSession {
            id: response.redirect_session.id,
            full_url: response.redirect_session.full_url,
        })
    }
}

//! Member profile route handlers.
//!
//! These routes require a member token; visitors are sent to `/login`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result, set_sentry_user};
use crate::filters;
use crate::middleware::RequireMember;
use crate::routes::context::PageContext;
use crate::state::AppState;
use crate::wix::{Member, MemberUpdate, Order};

/// Characters of the order id shown in the history list.
const ORDER_ID_PREVIEW: usize = 10;

/// Member display data for templates.
#[derive(Clone)]
pub struct MemberView {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
}

impl From<&Member> for MemberView {
    fn from(member: &Member) -> Self {
        Self {
            username: member.nickname.clone().unwrap_or_default(),
            first_name: member.first_name.clone().unwrap_or_default(),
            last_name: member.last_name.clone().unwrap_or_default(),
            phone: member.phones.first().cloned().unwrap_or_default(),
            email: member.login_email.clone().unwrap_or_default(),
        }
    }
}

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id_preview: String,
    pub number: Option<String>,
    pub subtotal: String,
    pub created: Option<String>,
    pub status: &'static str,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let id = order.id.as_str();
        let id_preview = if id.chars().count() > ORDER_ID_PREVIEW {
            format!("{}...", id.chars().take(ORDER_ID_PREVIEW).collect::<String>())
        } else {
            id.to_string()
        };

        Self {
            id_preview,
            number: order.number.clone(),
            subtotal: order.subtotal.display(),
            created: order
                .created_at
                .map(|at| at.format("%d %b %Y").to_string()),
            status: order.status.label(),
        }
    }
}

/// Profile page query string.
#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub updated: Option<String>,
}

/// Profile update form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl From<ProfileForm> for MemberUpdate {
    fn from(form: ProfileForm) -> Self {
        Self {
            nickname: non_blank(&form.username),
            first_name: non_blank(&form.first_name),
            last_name: non_blank(&form.last_name),
            phone: non_blank(&form.phone),
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub member: MemberView,
    pub orders: Vec<OrderView>,
    pub updated: bool,
}

/// Display the member's profile and order history.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    member: RequireMember,
    ctx: PageContext,
    Query(query): Query<ProfileQuery>,
) -> Result<impl IntoResponse> {
    let wix = state.wix();
    let current = wix.get_current_member(&member.access).await?;
    set_sentry_user(&current.id, current.login_email.as_deref());

    let contact_id = current
        .contact_id
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    let orders = wix
        .search_orders_for_contact(&member.access, contact_id)
        .await
        .map_or_else(
            |e| {
                tracing::error!("Failed to load orders: {e}");
                Vec::new()
            },
            |orders| orders.iter().map(OrderView::from).collect(),
        );

    Ok(ProfileTemplate {
        ctx,
        member: MemberView::from(&current),
        orders,
        updated: query.updated.is_some(),
    })
}

/// Update the member's name and phone.
#[instrument(skip(state, member))]
pub async fn update(
    State(state): State<AppState>,
    member: RequireMember,
    Form(form): Form<ProfileForm>,
) -> Result<impl IntoResponse> {
    let wix = state.wix();
    let current = wix.get_current_member(&member.access).await?;
    wix.update_current_member(&member.access, &current.id, form.into())
        .await?;

    Ok(Redirect::to("/profile?updated=1"))
}

//! Static page route handlers: about, manual payment, proof of payment, thank-you.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::routes::context::PageContext;

/// Largest accepted proof-of-payment upload.
pub const MAX_RECEIPT_BYTES: usize = 10 * 1024 * 1024;

/// Multipart field carrying the receipt.
const RECEIPT_FIELD: &str = "proof";

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub ctx: PageContext,
}

/// Manual payment instructions template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/checkout.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
}

/// Proof of payment upload template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/upload_proof.html")]
pub struct UploadProofTemplate {
    pub ctx: PageContext,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Post-checkout thank-you template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/success.html")]
pub struct SuccessTemplate {
    pub ctx: PageContext,
}

/// Display the about page.
#[instrument(skip_all)]
pub async fn about(ctx: PageContext) -> impl IntoResponse {
    AboutTemplate { ctx }
}

/// Display the manual payment instructions.
#[instrument(skip_all)]
pub async fn checkout(ctx: PageContext) -> impl IntoResponse {
    CheckoutTemplate { ctx }
}

/// Display the thank-you page Wix returns shoppers to after checkout.
#[instrument(skip_all)]
pub async fn success(ctx: PageContext) -> impl IntoResponse {
    SuccessTemplate { ctx }
}

// =============================================================================
// Proof of Payment
// =============================================================================

/// Why an uploaded receipt was rejected. Display strings are shown to shoppers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReceiptError {
    #[error("Please choose your payment receipt to upload.")]
    Missing,

    #[error("Payment receipt must be a PDF.")]
    NotPdf,

    #[error("Payment receipt is too large (10 MB maximum).")]
    TooLarge,
}

/// Check an uploaded receipt's name, type and size.
///
/// # Errors
///
/// Returns the reason the receipt is rejected.
pub fn validate_receipt(
    file_name: Option<&str>,
    content_type: Option<&str>,
    len: usize,
) -> Result<(), ReceiptError> {
    if len == 0 {
        return Err(ReceiptError::Missing);
    }
    if len > MAX_RECEIPT_BYTES {
        return Err(ReceiptError::TooLarge);
    }

    let pdf_type = content_type.is_some_and(|t| t.eq_ignore_ascii_case("application/pdf"));
    let pdf_name = file_name.is_some_and(|n| {
        std::path::Path::new(n)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    });
    if !(pdf_type || pdf_name) {
        return Err(ReceiptError::NotPdf);
    }

    Ok(())
}

/// Body limit layer for the upload route (receipt plus form overhead).
#[must_use]
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_RECEIPT_BYTES + 64 * 1024)
}

/// Display the proof of payment form.
#[instrument(skip_all)]
pub async fn upload_proof_page(ctx: PageContext) -> impl IntoResponse {
    UploadProofTemplate {
        ctx,
        message: None,
        error: None,
    }
}

/// Accept a single PDF receipt and acknowledge it.
///
/// The receipt is validated and logged for the shop owner; payment is
/// reconciled by hand.
#[instrument(skip_all)]
pub async fn upload_proof(ctx: PageContext, mut multipart: Multipart) -> Response {
    let mut receipt = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(RECEIPT_FIELD) => {
                let file_name = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                match field.bytes().await {
                    Ok(bytes) => receipt = Some((file_name, content_type, bytes.len())),
                    Err(e) => {
                        return AppError::BadRequest(format!("Unreadable upload: {e}"))
                            .into_response();
                    }
                }
            }
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                return AppError::BadRequest(format!("Malformed upload: {e}")).into_response();
            }
        }
    }

    let (file_name, content_type, len) = receipt.unwrap_or((None, None, 0));

    match validate_receipt(file_name.as_deref(), content_type.as_deref(), len) {
        Ok(()) => {
            tracing::info!(
                file_name = file_name.as_deref().unwrap_or("-"),
                size_bytes = len,
                "Proof of payment received"
            );
            UploadProofTemplate {
                ctx,
                message: Some("Proof of payment uploaded successfully!".to_string()),
                error: None,
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected proof of payment");
            (
                StatusCode::BAD_REQUEST,
                UploadProofTemplate {
                    ctx,
                    message: None,
                    error: Some(e.to_string()),
                },
            )
                .into_response()
        }
    }
}

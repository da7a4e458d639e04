use super::Flash;
use crate::AppState;
use crate::db::contact::ContactRepository;
use crate::error::AppResult;
use crate::forms::ContactForm;
use crate::models::ContactMessage;
use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Form,
};
use std::sync::Arc;

/// Store a message from the contact form
pub async fn submit(State(state): State<Arc<AppState>>, Form(form): Form<ContactForm>) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        tracing::debug!(count = errors.len(), "Contact form rejected");
        let errors = errors.iter().map(ToString::to_string).collect();
        return Ok(Flash::error("Please correct the errors below.")
            .with_errors(errors)
            .respond(StatusCode::UNPROCESSABLE_ENTITY));
    }

    let message = ContactMessage::new(
        form.contact_name.trim().to_string(),
        form.contact_email.trim().to_string(),
        form.message.trim().to_string(),
    );
    let saved = ContactRepository::new(state.db_pool.clone()).create(&message).await?;
    tracing::info!(message_id = saved.id, email = %saved.email, "Contact message received");

    Ok(Flash::success("Your message has been sent! We will get back to you soon.")
        .redirect_to("/contacts")
        .respond(StatusCode::CREATED))
}

use axum::{Extension, Json, extract::State, http::StatusCode};
use tracing::info;
use uuid::Uuid;

use securechat_types::api::{AddContactRequest, Claims, ContactResponse, StatusResponse};

use crate::auth::AppState;
use crate::error::{AppError, Result, blocking};

pub async fn add_contact(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddContactRequest>,
) -> Result<(StatusCode, Json<StatusResponse>)> {
    let phone = req.contact_phone.trim().to_string();
    if phone.is_empty() {
        return Err(AppError::BadRequest("Contact phone required".into()));
    }
    let name = req
        .contact_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| phone.clone());

    let db = state.clone();
    let owner = claims.sub.to_string();
    blocking(move || {
        db.db.add_contact(&Uuid::new_v4().to_string(), &owner, &phone, &name)?;
        Ok(())
    })
    .await?;

    info!("{} added a contact", claims.phone);

    Ok((
        StatusCode::CREATED,
        Json(StatusResponse {
            success: true,
            message: "Contact added successfully".into(),
        }),
    ))
}

pub async fn get_contacts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ContactResponse>>> {
    let db = state.clone();
    let owner = claims.sub.to_string();
    let rows = blocking(move || Ok(db.db.get_contacts(&owner)?)).await?;

    Ok(Json(
        rows.into_iter()
            .map(|r| ContactResponse {
                phone: r.contact_phone,
                name: r.contact_name,
            })
            .collect(),
    ))
}

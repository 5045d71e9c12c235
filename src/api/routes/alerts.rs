use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::auth::MessageResponse;
use super::state::AppState;
use crate::alerts::{AlertStatus, AlertView, Alerts};
use crate::auth::{require_role, CurrentUser};
use crate::error::AlertDeskError;
use crate::time_format::format_timestamp;
use crate::users::Role;

/// Request structure for raising an alert
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateAlertRequest {
    pub latitude: f64,
    pub longitude: f64,
}

/// One alert as the dashboard sees it. Timestamps are rendered in the
/// display zone.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct AlertResponse {
    pub id: i64,
    pub user: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: Option<String>,
    pub acknowledged: bool,
    #[serde(rename = "acknowledgementTime")]
    pub acknowledgement_time: Option<String>,
    pub status: AlertStatus,
    #[serde(rename = "acknowledgedBy")]
    pub acknowledged_by: Option<String>,
}

impl From<&AlertView> for AlertResponse {
    fn from(view: &AlertView) -> Self {
        AlertResponse {
            id: view.alert_id,
            user: view.user_name.clone(),
            latitude: view.latitude,
            longitude: view.longitude,
            timestamp: format_timestamp(Some(&view.timestamp)),
            acknowledged: view.acknowledged,
            acknowledgement_time: format_timestamp(view.acknowledged_at.as_ref()),
            status: view.status,
            acknowledged_by: view.acknowledged_by_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AcknowledgeResponse {
    pub message: String,
    pub acknowledged_at: Option<String>,
    pub acknowledged_by: String,
    pub alert: AlertResponse,
}

/// POST /alert
/// Faculty only. The body is parsed after the role check so a wrong role
/// always gets 403.
pub async fn create_alert(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreateAlertRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AlertDeskError> {
    require_role(&user, Role::Faculty)?;
    let Json(req) = payload?;

    Alerts::create_alert(&state.db, &user, req.latitude, req.longitude)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Alert created successfully".to_string(),
        }),
    ))
}

/// GET /alerts
/// Security only. Newest first.
pub async fn list_alerts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AlertResponse>>, AlertDeskError> {
    require_role(&user, Role::Security)?;

    let alerts = Alerts::list_alerts(&state.db)?;

    Ok(Json(alerts.iter().map(AlertResponse::from).collect()))
}

/// POST /alert/{alert_id}/acknowledge
/// Security only. Re-acknowledging replaces the previous acknowledgment.
/// An id that isn't an integer can't name an alert, so it is a 404.
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<AcknowledgeResponse>, AlertDeskError> {
    require_role(&user, Role::Security)?;
    let Path(alert_id) = path.map_err(|e| AlertDeskError::InvalidAlertId(e.body_text()))?;

    let view = Alerts::acknowledge_alert(&state.db, alert_id, &user)?;

    Ok(Json(AcknowledgeResponse {
        message: "Alert acknowledged successfully".to_string(),
        acknowledged_at: format_timestamp(view.acknowledged_at.as_ref()),
        acknowledged_by: user.name().to_string(),
        alert: AlertResponse::from(&view),
    }))
}

use crate::api::compute::{reject_body, ComputeInput};
use crate::api::envelope::{Envelope, FieldError};
use crate::api::AppState;
use crate::db::{PageSpec, PositionQuery};
use crate::domain::{Instrument, StoredPosition};
use crate::error::AppError;
use crate::filter::{SearchRequest, SearchResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

const MAX_NOTES_LEN: usize = 4_000;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePositionInput {
    #[serde(default)]
    pub instrument: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub compute: ComputeInput,
}

impl CreatePositionInput {
    fn validate(&self) -> Result<(Instrument, Option<String>), Vec<FieldError>> {
        let mut errors = Vec::new();
        let instrument = self.instrument.trim();
        if instrument.is_empty() {
            errors.push(FieldError::new("instrument", "Required"));
        }
        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
            errors.push(FieldError::new(
                "notes",
                format!("Must be at most {} characters", MAX_NOTES_LEN),
            ));
        }
        if errors.is_empty() {
            Ok((Instrument::new(instrument.to_uppercase()), notes))
        } else {
            Err(errors)
        }
    }
}

pub async fn create_position(
    State(state): State<AppState>,
    payload: Result<Json<CreatePositionInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<StoredPosition>>), AppError> {
    let Json(input) = payload.map_err(reject_body)?;

    let identity = input.validate();
    let request = input.compute.validate();
    let ((instrument, notes), request) = match (identity, request) {
        (Ok(identity), Ok(request)) => (identity, request),
        (identity, request) => {
            let mut errors = identity.err().unwrap_or_default();
            if let Err(AppError::Validation(more)) = request {
                errors.extend(more);
            }
            return Err(AppError::Validation(errors));
        }
    };

    let computed = request.compute()?;
    let position = StoredPosition {
        id: Uuid::new_v4(),
        instrument,
        notes,
        risk_amount: request.risk_amount,
        charges_amount: request.charges_amount,
        enable_auto_charges: request.enable_auto_charges,
        trades: request.trades,
        computed,
        created_at: Utc::now(),
    };

    state.repo.insert_position(&position).await?;
    info!(
        id = %position.id,
        instrument = position.instrument.as_str(),
        status = position.computed.status.as_str(),
        "position created"
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::success("Position created", position)),
    ))
}

pub async fn get_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<StoredPosition>>, AppError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::BadRequest("Invalid position id".into()))?;

    let position = state
        .repo
        .get_position(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Position {} not found", id)))?;

    Ok(Json(Envelope::success("Position found", position)))
}

pub async fn search_positions(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Envelope<SearchResponse>>, AppError> {
    let Json(request) = payload.map_err(reject_body)?;

    let mut errors = Vec::new();
    if request.page == 0 {
        errors.push(FieldError::new("page", "Must be at least 1"));
    }
    if let (Some(from), Some(to)) = (request.filters.opened_from, request.filters.opened_to) {
        if from > to {
            errors.push(FieldError::new(
                "filters.opened_to",
                "Must not be before filters.opened_from",
            ));
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let query = PositionQuery::from_filter(&request.filters);
    let response = if request.is_column_only() {
        let total_items = state.repo.count_matching(&query).await?;
        let page = PageSpec {
            order: request.sort.order,
            limit: request.page_limit(),
            offset: request.offset(),
        };
        let items = state.repo.page_positions(&query, page).await?;
        debug!(total_items, "search paged in database");
        request.respond(items, total_items)
    } else {
        let candidates = state.repo.query_positions(&query).await?;
        debug!(candidates = candidates.len(), "search prefiltered");
        request.apply(candidates)
    };

    Ok(Json(Envelope::success("Positions found", response)))
}

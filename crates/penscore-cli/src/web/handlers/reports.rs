use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use tracing::info;

use penscore_core::analysis::scoring;
use penscore_core::error::StoreError;
use penscore_core::pdf::{report_file_name, REPORTS_URL_PREFIX};
use penscore_core::{summarize, Report, UploadDir};

use crate::web::error::{AppError, AppResult};
use crate::web::pages::{self, ResultView};
use crate::web::session::{RequireUser, SessionUser};
use crate::web::AppState;

const REPORT_NOT_FOUND: &str = "Report not found!";

/// Load a report that belongs to `user`.
async fn owned_report(
    state: &AppState,
    user: &SessionUser,
    report_id: i64,
) -> AppResult<Option<Report>> {
    let report = state.db.get_report(report_id).await?;
    Ok(report.filter(|r| r.user_id == user.id))
}

pub async fn view_report(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(report_id): Path<i64>,
) -> AppResult<Response> {
    let Some(report) = owned_report(&state, &user, report_id).await? else {
        return Ok(REPORT_NOT_FOUND.into_response());
    };

    let feedback = scoring::feedback(report.language(), &report.weak_areas);
    let view = ResultView {
        image_url: UploadDir::public_url(&report.image_path),
        processed_url: UploadDir::public_url(&report.processed_path),
        scores: &report.scores,
        overall: report.overall,
        weak_areas: &report.weak_areas,
        feedback: &feedback,
        features: Vec::new(),
        report_id: Some(report.id),
    };
    Ok(pages::result(view, Some(&user)).into_response())
}

pub async fn list_reports(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> AppResult<Html<String>> {
    let reports = state.db.list_reports_for_user(user.id).await?;
    Ok(pages::reports(&reports, &user))
}

pub async fn dashboard(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> AppResult<Html<String>> {
    let reports = state.db.list_reports_for_user(user.id).await?;
    let stats = summarize(&reports);
    Ok(pages::dashboard(stats.as_ref(), &user))
}

/// Write the PDF summary and redirect to it.
pub async fn download_report(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(report_id): Path<i64>,
) -> AppResult<Response> {
    let Some(report) = owned_report(&state, &user, report_id).await? else {
        return Ok(REPORT_NOT_FOUND.into_response());
    };

    let writer = state.reports.clone();
    let path = tokio::task::spawn_blocking(move || writer.write(&report)).await??;
    info!("Report {} ready at {}", report_id, path.display());

    let target = format!("{REPORTS_URL_PREFIX}/{}", report_file_name(report_id));
    Ok(Redirect::to(&target).into_response())
}

pub async fn delete_report(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(report_id): Path<i64>,
) -> AppResult<Redirect> {
    match state.db.delete_report(report_id, user.id).await {
        Ok(_) => Ok(Redirect::to("/reports")),
        Err(StoreError::NotFound(_)) => {
            Err(AppError::not_found("Report not found or unauthorized!"))
        }
        Err(e) => Err(e.into()),
    }
}

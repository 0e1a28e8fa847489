use axum::extract::{Multipart, Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::Local;
use tracing::{debug, info};

use penscore_core::models::NewReport;
use penscore_core::{secure_filename, Language, UploadDir};

use crate::web::error::{AppError, AppResult};
use crate::web::pages::{self, ResultView};
use crate::web::session::MaybeUser;
use crate::web::AppState;

pub async fn upload_page(MaybeUser(user): MaybeUser) -> Html<String> {
    pages::upload_form(user.as_ref())
}

/// Store the uploaded sample and send the browser to its result page.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut language = Language::English;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !name.is_empty() {
                    file = Some((name, bytes.to_vec()));
                }
            }
            Some("language") => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    language = value.parse()?;
                }
            }
            _ => {}
        }
    }

    let Some((name, bytes)) = file else {
        return Ok("No file selected!".into_response());
    };
    if secure_filename(&name).is_none() {
        return Err(AppError::bad_request("Invalid file name"));
    }

    let uploads = state.uploads.clone();
    let (saved, path) = tokio::task::spawn_blocking(move || uploads.save(&name, &bytes)).await??;
    info!("Stored upload {}", path.display());

    let target = format!("/result/{}/{}", urlencoding::encode(&saved), language.as_str());
    Ok(Redirect::to(&target).into_response())
}

/// Analyse a stored upload; logged-in users get the result saved as a report.
pub async fn result(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((filename, lang)): Path<(String, String)>,
) -> AppResult<Html<String>> {
    let language: Language = lang.parse()?;
    let filename = secure_filename(&filename)
        .filter(|name| *name == filename)
        .ok_or_else(|| AppError::not_found("File not found!"))?;

    let original = state.uploads.original_path(&filename);
    if !original.is_file() {
        return Err(AppError::not_found("File not found!"));
    }
    let processed = state.uploads.processed_path(&filename);

    let analyzer = state.analyzer.clone();
    let (input, output) = (original.clone(), processed.clone());
    let analysis =
        tokio::task::spawn_blocking(move || analyzer.analyze_file(&input, &output, language))
            .await??;
    debug!("Analysed {} in {}ms", filename, analysis.processing_time_ms);

    let assessment = &analysis.assessment;
    let report_id = match &user {
        Some(user) => {
            let report = state
                .db
                .create_report(NewReport {
                    user_id: user.id,
                    image_path: original.to_string_lossy().into_owned(),
                    processed_path: processed.to_string_lossy().into_owned(),
                    scores: assessment.scores,
                    overall: assessment.overall,
                    weak_areas: assessment.weak_areas.clone(),
                    created_at: Local::now().naive_local(),
                })
                .await?;
            Some(report.id)
        }
        None => None,
    };

    let view = ResultView {
        image_url: UploadDir::public_url(&original),
        processed_url: UploadDir::public_url(&processed),
        scores: &assessment.scores,
        overall: assessment.overall,
        weak_areas: &assessment.weak_areas,
        feedback: &assessment.feedback,
        features: analysis.features.entries(),
        report_id,
    };
    Ok(pages::result(view, user.as_ref()))
}

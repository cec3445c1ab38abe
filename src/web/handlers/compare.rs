// POST /api/compare — compare two uploaded sheets.
//
// Expects multipart fields `sheet1` and `sheet2`, each a spreadsheet file
// with a `Comment` column. Responds with the result workbook as an
// attachment. Input problems are 400s; per-pair oracle failures are not
// errors here, they show up as 0 scores in the workbook and in the
// X-Failed-Pairs header.

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, info};

use crate::dataset::Dataset;
use crate::matching::PairwiseComparator;
use crate::output::report::{build_workbook, DEFAULT_OUTPUT};
use crate::web::{api_error, AppState};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One uploaded file: (file name, contents).
type Upload = (String, Vec<u8>);

pub async fn compare_uploads(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut sheet1: Option<Upload> = None;
    let mut sheet2: Option<Upload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return api_error(StatusCode::BAD_REQUEST, &format!("Bad upload: {e}")),
        };

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{name}.xlsx"));
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => return api_error(StatusCode::BAD_REQUEST, &format!("Bad upload: {e}")),
        };

        match name.as_str() {
            "sheet1" => sheet1 = Some((file_name, bytes)),
            "sheet2" => sheet2 = Some((file_name, bytes)),
            _ => {}
        }
    }

    let (Some((name1, bytes1)), Some((name2, bytes2))) = (sheet1, sheet2) else {
        return api_error(
            StatusCode::BAD_REQUEST,
            "Upload both 'sheet1' and 'sheet2' files",
        );
    };

    let dataset_a = match Dataset::from_bytes(&name1, bytes1) {
        Ok(ds) => ds,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    let dataset_b = match Dataset::from_bytes(&name2, bytes2) {
        Ok(ds) => ds,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let comparator =
        PairwiseComparator::new(state.oracle.as_ref()).with_concurrency(state.concurrency);
    let report = comparator.compare(&dataset_a, &dataset_b, |_, _| {}).await;

    let workbook = match build_workbook(&report.results) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Failed to build result workbook");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build results");
        }
    };

    info!(
        pairs = report.results.len(),
        flagged = report.flagged_count(),
        failed = report.warnings.len(),
        "Served comparison workbook"
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DEFAULT_OUTPUT}\""),
            ),
            (
                header::HeaderName::from_static("x-flagged-pairs"),
                report.flagged_count().to_string(),
            ),
            (
                header::HeaderName::from_static("x-failed-pairs"),
                report.warnings.len().to_string(),
            ),
        ],
        workbook,
    )
        .into_response()
}

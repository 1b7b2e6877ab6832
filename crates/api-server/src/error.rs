use analysis_core::AnalysisError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Analysis(e) => match e {
                AnalysisError::InvalidWeights(_) | AnalysisError::InvalidData(_) => {
                    StatusCode::BAD_REQUEST
                }
                AnalysisError::UnknownTicker(_) => StatusCode::NOT_FOUND,
                AnalysisError::InsufficientData(_)
                | AnalysisError::DegenerateSeries(_)
                | AnalysisError::FactorAlignment(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AnalysisError::UpstreamData(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AnalysisError::InvalidWeights("x".into()), StatusCode::BAD_REQUEST),
            (AnalysisError::InvalidData("x".into()), StatusCode::BAD_REQUEST),
            (AnalysisError::UnknownTicker("X".into()), StatusCode::NOT_FOUND),
            (AnalysisError::InsufficientData("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AnalysisError::DegenerateSeries("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AnalysisError::FactorAlignment("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AnalysisError::UpstreamData("x".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
        assert_eq!(
            AppError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

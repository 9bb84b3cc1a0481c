#[cfg(test)]
mod tests {
    use crate::auth::CredentialProvider;
    use crate::service::{classify_error_body, classify_status, GoogleCalendarGateway};
    use calbridge_common::services::{CalendarGateway, EventQuery, GatewayError};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn google_error(code: u16, reason: &str, message: &str) -> serde_json::Value {
        json!({
            "error": {
                "code": code,
                "message": message,
                "errors": [{ "domain": "global", "reason": reason, "message": message }]
            }
        })
    }

    #[test]
    fn test_not_found_body() {
        let err = classify_error_body(&google_error(404, "notFound", "Not Found"));
        assert!(matches!(err, GatewayError::NotFound(ref m) if m == "Not Found"));
    }

    #[test]
    fn test_gone_body_is_already_deleted() {
        let err = classify_error_body(&google_error(410, "deleted", "Resource has been deleted"));
        assert!(matches!(err, GatewayError::AlreadyDeleted(_)));
        assert!(err.is_gone());
    }

    #[test]
    fn test_deleted_reason_wins_over_status() {
        let err = classify_error_body(&google_error(400, "deleted", "Resource has been deleted"));
        assert!(matches!(err, GatewayError::AlreadyDeleted(_)));
    }

    #[test]
    fn test_forbidden_body() {
        let err = classify_error_body(&google_error(403, "forbidden", "Forbidden"));
        assert!(matches!(err, GatewayError::PermissionDenied(_)));
    }

    #[test]
    fn test_rate_limit_is_upstream_not_permission() {
        let body = google_error(403, "rateLimitExceeded", "Rate Limit Exceeded");
        match classify_error_body(&body) {
            GatewayError::Upstream { message, detail } => {
                assert_eq!(message, "Rate Limit Exceeded");
                assert_eq!(detail, Some(body));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn test_unauthorized_is_credential() {
        let err = classify_error_body(&google_error(401, "authError", "Invalid Credentials"));
        assert!(matches!(err, GatewayError::Credential(_)));
    }

    #[test]
    fn test_server_error_keeps_body_as_detail() {
        let body = google_error(503, "backendError", "Backend Error");
        let err = classify_error_body(&body);
        assert!(matches!(
            err,
            GatewayError::Upstream { ref detail, .. } if detail.as_ref() == Some(&body)
        ));
    }

    #[test]
    fn test_body_without_error_envelope() {
        let err = classify_error_body(&json!({ "code": 404, "message": "gone missing" }));
        assert!(matches!(err, GatewayError::NotFound(ref m) if m == "gone missing"));

        let err = classify_error_body(&json!("unexpected"));
        assert!(matches!(err, GatewayError::Upstream { .. }));
    }

    #[test]
    fn test_status_only_classification() {
        assert!(matches!(
            classify_status(404, &[], "x".into(), None),
            GatewayError::NotFound(_)
        ));
        assert!(matches!(
            classify_status(410, &[], "x".into(), None),
            GatewayError::AlreadyDeleted(_)
        ));
        assert!(matches!(
            classify_status(500, &[], "x".into(), None),
            GatewayError::Upstream { detail: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_gateway_without_credentials_reports_credential_error() {
        let gateway = GoogleCalendarGateway::new(
            Arc::new(CredentialProvider::new(None)),
            Duration::from_secs(5),
        );
        let result = gateway.list_events("primary", EventQuery::default()).await;
        assert!(matches!(result, Err(GatewayError::Credential(_))));

        let result = gateway.list_calendar_list().await;
        assert!(matches!(result, Err(GatewayError::Credential(_))));
    }
}

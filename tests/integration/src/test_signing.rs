//! Signed request round trips against a running server.

#[cfg(test)]
mod tests {
    use apisign_auth::body::collect_body;
    use apisign_auth::{Credential, SignError, Signer};

    use crate::{build_request, send, send_signed, test_signer};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_echo_signed_form_request() {
        let signer = test_signer();
        let request = build_request(
            "POST",
            "/v1/photos/generate?data=a",
            Some("application/x-www-form-urlencoded"),
            b"a=b&d=c",
        )
        .unwrap();

        let response = send_signed(&signer, request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);

        let response = signer
            .validate_response("/v1/photos/generate", response)
            .await
            .expect("response signature should verify");
        let body = collect_body(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"a=b&d=c");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_echo_signed_json_request() {
        let signer = test_signer();
        let request =
            build_request("POST", "/v1/items", Some("application/json"), br#"{"a":1}"#).unwrap();

        let response = send_signed(&signer, request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        assert!(signer.validate_response("/v1/items", response).await.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unsigned_request() {
        let request = build_request("GET", "/v1/items?page=1", None, b"").unwrap();

        let response = send(request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);

        let body = collect_body(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "MissingTimestampError");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_request_signed_with_wrong_secret() {
        let signer = Signer::new(Credential::new("ak", "wrong", 3600));
        let request = build_request("GET", "/v1/items?page=1", None, b"").unwrap();

        let response = send_signed(&signer, request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);

        let body = collect_body(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], SignError::SignatureMismatch.code());
    }
}

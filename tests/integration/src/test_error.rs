//! Error handling integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use reqwest::header::{ACCEPT, ALLOW, CONTENT_TYPE};
    use serde_json::Value;

    use crate::{client, url};

    async fn message(response: reqwest::Response) -> String {
        let body: Value = response.json().await.unwrap();
        body["message"].as_str().unwrap_or_default().to_owned()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_404_for_unknown_resource() {
        let response = client()
            .get(url("/ghosts/1"))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(message(response).await, "resource: ghosts");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_400_for_invalid_id() {
        let response = client()
            .get(url("/notes/abc"))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(message(response).await, "Invalid id \"abc\"");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_405_with_allow() {
        let response = client()
            .patch(url("/notes/1"))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers()[ALLOW].to_str().unwrap(),
            "DELETE, GET, POST, PUT"
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_400_for_unknown_relation() {
        let response = client()
            .get(url("/notes/1/nonsense"))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_wrong_content_type() {
        let response = client()
            .post(url("/notes"))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "text/plain")
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            message(response).await,
            "Expected Content-Type application/json got text/plain"
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_malformed_json() {
        let response = client()
            .post(url("/notes"))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body("{")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(message(response).await.starts_with("Invalid JSON: "));
    }
}

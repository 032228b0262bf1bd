//! Notes resource integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use reqwest::header::{ACCEPT, CONTENT_TYPE};
    use serde_json::{Value, json};

    use crate::{cleanup_note, client, create_note, href_url, note_id, test_title, url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_note_with_links() {
        let client = client();
        let title = test_title("create");
        let note = create_note(&client, &title).await.unwrap();
        let id = note_id(&note);

        assert_eq!(note["title"], json!(title));
        let links = note["_links"].as_array().expect("note should carry links");
        assert!(links.iter().any(|link| {
            link["rel"] == "self"
                && link["method"] == "GET"
                && link["href"] == json!(format!("/api/notes/{id}"))
        }));

        cleanup_note(&client, id).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_follow_self_link() {
        let client = client();
        let note = create_note(&client, &test_title("follow")).await.unwrap();

        let link = note["_links"]
            .as_array()
            .unwrap()
            .iter()
            .find(|link| link["rel"] == "self" && link["method"] == "GET")
            .cloned()
            .unwrap();
        let fetched: Value = client
            .get(href_url(link["href"].as_str().unwrap()))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(fetched["id"], note["id"]);

        cleanup_note(&client, note_id(&note)).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_write_and_read_contents() {
        let client = client();
        let note = create_note(&client, &test_title("contents")).await.unwrap();
        let id = note_id(&note);

        let response = client
            .put(url(&format!("/notes/{id}/contents")))
            .header(CONTENT_TYPE, "text/plain")
            .body("remember the milk")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let text = client
            .get(url(&format!("/notes/{id}/contents")))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(text, "remember the milk");

        cleanup_note(&client, id).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_selected_notes() {
        let client = client();
        let first = create_note(&client, &test_title("list")).await.unwrap();
        let second = create_note(&client, &test_title("list")).await.unwrap();
        let (a, b) = (note_id(&first), note_id(&second));

        let notes: Value = client
            .get(url(&format!("/notes/{b},{a}")))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let ids: Vec<u64> = notes.as_array().unwrap().iter().map(note_id).collect();
        assert_eq!(ids, [b, a]);

        cleanup_note(&client, a).await;
        cleanup_note(&client, b).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_note() {
        let client = client();
        let note = create_note(&client, &test_title("delete")).await.unwrap();
        let id = note_id(&note);

        let response = client
            .delete(url(&format!("/notes/{id}")))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = client
            .get(url(&format!("/notes/{id}")))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}

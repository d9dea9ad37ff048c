mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

struct Chat {
    form_id: String,
    unique_id: String,
}

async fn start_chat(server: &common::TestServer, token: &str) -> Result<Chat> {
    let form = common::create_form(server, token, &common::sample_form("Signup <beta>")).await?;
    let form_id = form["id"].as_str().unwrap_or_default().to_string();

    let res = server
        .client
        .get(server.url(&format!("/api/generate-unique-id/{}", form_id)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["formId"], form_id.as_str());
    let unique_id = body["data"]["uniqueId"].as_str().unwrap_or_default().to_string();

    Ok(Chat { form_id, unique_id })
}

async fn submit(server: &common::TestServer, chat: &Chat, answers: Value, completed: bool) -> Result<reqwest::Response> {
    Ok(server
        .client
        .post(server.url("/api/submit-response"))
        .json(&json!({
            "formId": chat.form_id,
            "uniqueId": chat.unique_id,
            "answers": answers,
            "completed": completed
        }))
        .send()
        .await?)
}

#[tokio::test]
async fn chat_page_renders_with_escaped_name_and_theme() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = common::register_and_login(&server, "owner@example.com").await?;
    let chat = start_chat(&server, &token).await?;

    let res = server.client.get(server.url(&format!("/chat/{}", chat.form_id))).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let html = res.text().await?;

    assert!(html.contains("Signup &lt;beta&gt;"));
    assert!(!html.contains("<beta>"));
    assert!(html.contains("theme-dark"));
    assert!(html.contains(&format!("data-form-id=\"{}\"", chat.form_id)));
    assert!(!html.contains("{{"));
    Ok(())
}

#[tokio::test]
async fn unknown_or_malformed_form_ids_are_not_found() -> Result<()> {
    let server = common::spawn_server().await?;

    for path in [
        "/chat/not-a-uuid",
        "/chat/00000000-0000-0000-0000-000000000000",
        "/api/form/not-a-uuid",
        "/api/generate-unique-id/00000000-0000-0000-0000-000000000000",
    ] {
        let res = server.client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{}", path);
    }
    Ok(())
}

#[tokio::test]
async fn form_definition_is_public_and_counts_views() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = common::register_and_login(&server, "owner@example.com").await?;
    let chat = start_chat(&server, &token).await?;

    for _ in 0..2 {
        let res = server.client.get(server.url(&format!("/api/form/{}", chat.form_id))).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.json::<Value>().await?;
        assert_eq!(body["data"]["fields"][1]["id"], "email");
        assert!(body["data"].get("ownerId").is_none(), "owner leaked: {}", body);
    }

    let res = server
        .client
        .get(server.url(&format!("/api/submissions/form/{}", chat.form_id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.json::<Value>().await?["data"]["stats"]["views"], 2);
    Ok(())
}

#[tokio::test]
async fn answers_accumulate_until_completion() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = common::register_and_login(&server, "owner@example.com").await?;
    let chat = start_chat(&server, &token).await?;

    let res = submit(&server, &chat, json!({ "score": 4 }), false).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.json::<Value>().await?["data"]["status"], "started");

    // Required email still missing
    let res = submit(&server, &chat, json!({}), true).await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json::<Value>().await?;
    assert!(body["fieldErrors"].get("email").is_some(), "{}", body);

    let res = submit(&server, &chat, json!({ "email": "respondent@example.com" }), true).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["answers"], json!({ "score": 4, "email": "respondent@example.com" }));

    let res = submit(&server, &chat, json!({ "score": 1 }), false).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn invalid_answers_are_rejected_per_field() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = common::register_and_login(&server, "owner@example.com").await?;
    let chat = start_chat(&server, &token).await?;

    let res = submit(
        &server,
        &chat,
        json!({ "email": "nope", "score": 9, "mystery": "x" }),
        false,
    )
    .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = res.json::<Value>().await?;
    let fields = body["fieldErrors"].as_object().cloned().unwrap_or_default();
    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("score"));
    assert_eq!(fields.get("mystery"), Some(&json!("Unknown field")));
    Ok(())
}

#[tokio::test]
async fn session_must_exist_and_match_the_form() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = common::register_and_login(&server, "owner@example.com").await?;
    let chat = start_chat(&server, &token).await?;
    let other = start_chat(&server, &token).await?;

    let forged = Chat {
        form_id: chat.form_id.clone(),
        unique_id: "00000000-0000-0000-0000-000000000000".to_string(),
    };
    let res = submit(&server, &forged, json!({}), false).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let crossed = Chat {
        form_id: chat.form_id.clone(),
        unique_id: other.unique_id.clone(),
    };
    let res = submit(&server, &crossed, json!({}), false).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn owner_sees_stats_and_can_delete_submissions() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = common::register_and_login(&server, "owner@example.com").await?;
    let stranger = common::register_and_login(&server, "stranger@example.com").await?;
    let chat = start_chat(&server, &token).await?;

    submit(&server, &chat, json!({ "email": "a@example.com" }), true).await?;

    // A second session that never finishes
    let res = server
        .client
        .get(server.url(&format!("/api/generate-unique-id/{}", chat.form_id)))
        .send()
        .await?;
    let unique_id = res.json::<Value>().await?["data"]["uniqueId"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let pending = Chat {
        form_id: chat.form_id.clone(),
        unique_id,
    };
    submit(&server, &pending, json!({ "score": 2 }), false).await?;

    let listing = format!("/api/submissions/form/{}", chat.form_id);
    let res = server.client.get(server.url(&listing)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["stats"]["starts"], 2);
    assert_eq!(body["data"]["stats"]["completed"], 1);
    assert_eq!(body["data"]["stats"]["completionRate"], 50.0);

    let res = server.client.get(server.url(&listing)).bearer_auth(&stranger).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let submission_id = body["data"]["submissions"][0]["id"].as_str().unwrap_or_default().to_string();
    let path = format!("/api/submissions/{}", submission_id);

    let res = server.client.delete(server.url(&path)).bearer_auth(&stranger).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = server.client.delete(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = server.client.get(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

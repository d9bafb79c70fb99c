mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn game_and_cardset_lifecycle() -> Result<()> {
    let server = common::TestServer::start().await?;
    let (_, access, _) = server.register("player").await?;

    let res = server
        .client
        .post(server.url("/api/games"))
        .bearer_auth(&access)
        .json(&json!({ "name": "Poker" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let game_id = body["gameId"].as_str().unwrap().to_string();

    let res = server
        .client
        .post(server.url("/api/cardsets"))
        .bearer_auth(&access)
        .json(&json!({ "name": "Deck", "data": { "cards": ["AS", "KH"] }, "gameId": game_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let cardset_id = body["cardsetId"].as_str().unwrap().to_string();

    let res = server
        .client
        .get(server.url(&format!("/api/games/{}", game_id)))
        .bearer_auth(&access)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["name"], "Poker");
    assert_eq!(body["cardsets"][0]["id"], cardset_id.as_str());

    let res = server
        .client
        .put(server.url(&format!("/api/cardsets/{}", cardset_id)))
        .bearer_auth(&access)
        .json(&json!({ "data": { "cards": ["QS"] } }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .get(server.url(&format!("/api/cardsets/{}", cardset_id)))
        .bearer_auth(&access)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["name"], "Deck");
    assert_eq!(body["data"], json!({ "cards": ["QS"] }));
    assert_eq!(body["gameId"], game_id.as_str());

    let res = server
        .client
        .put(server.url(&format!("/api/games/{}", game_id)))
        .bearer_auth(&access)
        .json(&json!({ "name": "Texas Hold'em" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(server.url("/api/games")).bearer_auth(&access).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["games"], json!([{ "id": game_id, "name": "Texas Hold'em" }]));

    let res = server
        .client
        .delete(server.url(&format!("/api/games/{}", game_id)))
        .bearer_auth(&access)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .get(server.url(&format!("/api/cardsets/{}", cardset_id)))
        .bearer_auth(&access)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn other_users_games_look_absent() -> Result<()> {
    let server = common::TestServer::start().await?;
    let (_, owner, _) = server.register("owner").await?;
    let (_, intruder, _) = server.register("intruder").await?;

    let res = server
        .client
        .post(server.url("/api/games"))
        .bearer_auth(&owner)
        .json(&json!({ "name": "Private" }))
        .send()
        .await?;
    let body: Value = res.json().await?;
    let game_url = server.url(&format!("/api/games/{}", body["gameId"].as_str().unwrap()));

    let res = server.client.get(&game_url).bearer_auth(&intruder).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .put(&game_url)
        .bearer_auth(&intruder)
        .json(&json!({ "name": "Mine now" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.delete(&game_url).bearer_auth(&intruder).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .post(server.url("/api/cardsets"))
        .bearer_auth(&intruder)
        .json(&json!({ "name": "Sneaky", "data": [], "gameId": body["gameId"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.get(&game_url).bearer_auth(&owner).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn games_require_an_access_token() -> Result<()> {
    let server = common::TestServer::start().await?;
    let (_, _, refresh) = server.register("nobody").await?;

    let res = server.client.get(server.url("/api/games")).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.client.get(server.url("/api/games")).bearer_auth(&refresh).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

mod support;

use axum::http::{header, StatusCode};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use models::post;
use support::{body_json, location, post_form, post_json, spawn};

#[tokio::test]
async fn valid_form_creates_one_post_and_redirects_to_profile() -> anyhow::Result<()> {
    let t = spawn().await?;
    let author = t.user("auth").await?;
    let group = t.group("Test group", "test-slug").await?;
    let before = post::Entity::find().count(&t.db).await?;

    let body = format!("text=Test+text&group={}", group.id);
    let resp = t.send(post_form("/create/", &body, Some(&author.token))).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/profile/auth/"));

    assert_eq!(post::Entity::find().count(&t.db).await?, before + 1);
    let created = post::Entity::find().one(&t.db).await?.ok_or_else(|| anyhow::anyhow!("no post"))?;
    assert_eq!(created.text, "Test text");
    assert_eq!(created.group_id, Some(group.id));
    assert_eq!(created.author_id, author.id);
    Ok(())
}

#[tokio::test]
async fn editing_persists_and_redirects_to_detail() -> anyhow::Result<()> {
    let t = spawn().await?;
    let author = t.user("auth").await?;
    let post = t.post(&author, "Old text", None).await?;
    let count = post::Entity::find().count(&t.db).await?;

    let uri = format!("/posts/{}/edit/", post.id);
    let resp = t.send(post_form(&uri, "text=New+text&group=", Some(&author.token))).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some(format!("/posts/{}/", post.id)));

    let reloaded = post::Entity::find_by_id(post.id).one(&t.db).await?.ok_or_else(|| anyhow::anyhow!("gone"))?;
    assert_eq!(reloaded.text, "New text");
    assert_eq!(reloaded.author_id, author.id);
    assert_eq!(reloaded.pub_date, post.pub_date);
    assert_eq!(post::Entity::find().count(&t.db).await?, count);
    Ok(())
}

#[tokio::test]
async fn non_author_cannot_change_a_post() -> anyhow::Result<()> {
    let t = spawn().await?;
    let author = t.user("auth").await?;
    let other = t.user("NoName").await?;
    let post = t.post(&author, "Mine", None).await?;

    let uri = format!("/posts/{}/edit/", post.id);
    let resp = t.send(post_form(&uri, "text=Hijacked", Some(&other.token))).await?;
    assert_eq!(location(&resp), Some(format!("/posts/{}/", post.id)));
    let reloaded = post::Entity::find_by_id(post.id).one(&t.db).await?.ok_or_else(|| anyhow::anyhow!("gone"))?;
    assert_eq!(reloaded.text, "Mine");
    Ok(())
}

#[tokio::test]
async fn invalid_form_is_returned_with_errors() -> anyhow::Result<()> {
    let t = spawn().await?;
    let author = t.user("auth").await?;

    let resp = t.send(post_form("/create/", "text=++&group=", Some(&author.token))).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let ctx = body_json(resp).await?;
    assert_eq!(ctx["errors"]["text"], json!(["This field is required."]));

    let resp = t.send(post_form("/create/", "text=ok&group=4242", Some(&author.token))).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let ctx = body_json(resp).await?;
    assert!(ctx["errors"]["group"].is_array());
    assert_eq!(ctx["initial"]["text"], "ok");

    assert_eq!(post::Entity::find().count(&t.db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn signup_then_login_follows_next() -> anyhow::Result<()> {
    let t = spawn().await?;
    let creds = json!({"username": "newbie", "email": "newbie@example.com", "password": "S3curePass!"});

    let resp = t.send(post_json("/auth/signup/", creds.clone())).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = t.send(post_json("/auth/signup/", creds)).await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let login = json!({"username": "newbie", "password": "S3curePass!"});
    let resp = t.send(post_json("/auth/login/?next=/create/", login.clone())).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/create/"));
    let cookie = resp.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(cookie.starts_with("auth_token="));

    // backslash targets are not followed
    let resp = t.send(post_json("/auth/login/?next=/%5Cevil.example", login.clone())).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(location(&resp).is_none());

    let resp = t.send(post_json("/auth/login/", json!({"username": "newbie", "password": "wrong"}))).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

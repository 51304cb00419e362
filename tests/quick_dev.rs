//! Manual smoke test against a running server: `cargo run` in one terminal,
//! then `cargo test --test quick_dev -- --ignored --nocapture`.

use anyhow::Result;
use serde_json::json;

#[tokio::test]
#[ignore = "needs a server on localhost:3000"]
async fn quick_dev() -> Result<()> {
    let hc = httpc_test::new_client("http://localhost:3000")?;

    hc.do_get("/api/settings").await?.print().await?;
    hc.do_get("/api/packages").await?.print().await?;
    hc.do_get("/api/hotels").await?.print().await?;

    hc.do_post(
        "/api/auth/signup",
        json!({
            "email": "quick.dev@example.com",
            "name": "Quick Dev",
            "password": "quick-dev-pass",
        }),
    )
    .await?
    .print()
    .await?;
    hc.do_post(
        "/api/auth/login",
        json!({ "email": "quick.dev@example.com", "password": "quick-dev-pass" }),
    )
    .await?
    .print()
    .await?;
    hc.do_get("/api/auth/me").await?.print().await?;
    hc.do_get("/api/register").await?.print().await?;

    Ok(())
}

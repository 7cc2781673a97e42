use skreenit_client::{handle_envelope, BackendClient, RequestOptions, StaticToken};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let token = std::env::var("SKREENIT_TOKEN")?;

    let client = BackendClient::from_env(StaticToken::new(token))?;

    for status in client.backend_status().await {
        println!("{} healthy={}", status.url, status.healthy);
    }

    let response = client.get("/applicant/jobs", RequestOptions::new()).await?;
    let jobs = handle_envelope(response).await?;
    println!("{jobs:?}");

    println!("{:?}", client.telemetry());
    Ok(())
}

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    blocktail_listener::run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crabigateur_backend::run().await
}

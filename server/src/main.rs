#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::launch().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    depot_server::run().await
}

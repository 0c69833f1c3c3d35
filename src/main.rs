#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shotter_cli::cli::run().await
}

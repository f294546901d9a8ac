#[tokio::main]
async fn main() -> anyhow::Result<()> {
    keytree::cli::run_cli().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    thermaguard_controller::host::run().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hsk_tutor_backend::run().await
}

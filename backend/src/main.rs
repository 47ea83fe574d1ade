#[tokio::main]
async fn main() -> anyhow::Result<()> {
    schools::start_server().await
}

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    factline::run().await
}

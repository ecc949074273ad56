use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    pyconsole::run().await
}

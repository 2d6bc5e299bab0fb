#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = pinquiz::run().await {
        eprintln!("pinquiz fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

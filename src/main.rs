#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = mcq_proctor::run().await {
        eprintln!("mcq-proctor fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

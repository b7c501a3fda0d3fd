#[tokio::main]
async fn main() {
    if let Err(err) = gm_api::run().await {
        tracing::error!(error = %err, "gm-api failed");
        eprintln!("gm-api failed: {err}");
        std::process::exit(1);
    }
}

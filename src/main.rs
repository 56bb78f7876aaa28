#[tokio::main]
async fn main() {
    if let Err(e) = media_relay_lib::run().await {
        eprintln!("media-relay: {}", e);
        std::process::exit(1);
    }
}

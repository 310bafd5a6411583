use droidtail::runtime::{boot, tail};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let (client, config) = boot::boot()?;
    tail::tail(client, config).await
}

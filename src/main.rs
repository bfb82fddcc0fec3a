#[tokio::main]
async fn main() {
    if let Err(e) = gym_booking::run().await {
        eprintln!("gym-booking failed: {}", e);
        std::process::exit(1);
    }
}

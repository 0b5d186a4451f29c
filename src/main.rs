#![forbid(unsafe_code)]

use dotenvy::dotenv;

#[rocket::main]
async fn main() -> Result<(), eyre::Error> {
    dotenv().ok();
    pretty_env_logger::init_timed();

    let _rocket = halak_web::rocket()?.launch().await?;

    Ok(())
}

mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use iti_registration::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

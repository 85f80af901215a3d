mod cli;
mod client;
mod console;
mod evaluate;
mod infra;
mod routes;
mod screening;
mod server;

use loan_offers::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

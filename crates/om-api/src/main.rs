use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match om_api::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "om-api failed");
            eprintln!("om-api: {err}");
            ExitCode::FAILURE
        }
    }
}

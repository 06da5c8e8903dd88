use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match patchboot_lib::run(args).await {
        Ok(mut session) => {
            if session.state().has_started {
                if let Err(e) = session.shutdown() {
                    tracing::warn!("Shutdown failed: {}", e);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Bootstrap failed: {}", e);
            eprintln!("patchboot: {}", e);
            ExitCode::FAILURE
        }
    }
}

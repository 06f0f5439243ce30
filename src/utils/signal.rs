use tokio::signal;

/// Resolves on Ctrl+C so `axum::serve` can drain in-flight requests.
pub async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        crate::error::log_error(&e);
        // without a handler the server just runs until killed
        std::future::pending::<()>().await;
    }

    #[cfg(not(windows))]
    println!();
    tracing::info!("Ctrl+C received. Please wait, this could take a while.");
}

use std::sync::LazyLock;
use std::time::Duration;

/// Global HTTP client instance for provider requests
///
/// This client is initialized lazily on first access and reused across the application.
///
/// # Benefits
/// - **Connection pooling**: Reuses TCP connections for better performance
/// - **DNS caching**: Reduces DNS lookup overhead
/// - **Memory efficiency**: Single client instance for the entire application
///
/// # Features
/// - **Compression**: Supports gzip, deflate, brotli, and zstd compression
/// - **HTTP/2**: Full HTTP/2 support with adaptive window sizing and keep-alive
/// - **Timeouts**: 30s request timeout, 10s connect timeout; per-request
///   overrides come from the delivery configuration
/// - **Security**: Uses Rustls for TLS (no OpenSSL dependency)
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        // Timeouts
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        // HTTP/2 settings
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Duration::from_secs(10))
        .http2_keep_alive_timeout(Duration::from_secs(20))
        // Enable compression (gzip, deflate, brotli, zstd)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        // Security
        .use_rustls_tls()
        .user_agent(concat!("automail-rs/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to build HTTP client")
});

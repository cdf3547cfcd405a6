use std::time::Duration;

/// How long to wait for the server to become ready before giving up.
pub const SERVER_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// How often to poll the health endpoint while waiting for readiness.
pub const SERVER_READY_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Timeout applied to every request the test client makes.
pub const CLIENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// The completion the stub chat service returns unless a test overrides it.
pub const DEFAULT_COMPLETION: &str = "情緒描述：寧靜的雨夜，適合放鬆心情。\n標籤：calm, rain, piano";

/// Access token handed out by the stub token endpoint.
pub const STUB_ACCESS_TOKEN: &str = "stub-access-token";

/// Minimal bytes that sniff as a PNG image.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52,
];

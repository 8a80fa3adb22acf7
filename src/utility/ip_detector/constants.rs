/// Endpoints queried when none are configured.
pub const DEFAULT_APIS: [&str; 5] = [
    "https://api64.ipify.org",
    "https://icanhazip.com",
    "https://ifconfig.me/ip",
    "https://ip.erix.dev:11313",
    "https://ipecho.net/plain",
];

/// With several endpoints racing, an answer rarely takes longer than this.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3;

/// Separator between individual endpoint failures in an aggregate error.
pub const REASON_SEPARATOR: &str = " | ";

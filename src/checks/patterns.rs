//! Detection patterns shared by the built-in checks

use lazy_static::lazy_static;
use regex::Regex;

/// A pattern for detecting hardcoded credentials
pub struct CredentialPattern {
    pub name: &'static str,
    pub regex: Regex,
}

lazy_static! {
    /// Credential shapes reported by `security/hardcoded-credentials`
    pub static ref CREDENTIAL_PATTERNS: Vec<CredentialPattern> = vec![
        CredentialPattern {
            name: "Password assignment",
            regex: Regex::new(r#"(?i)\b(password|passwd|pwd)\s*[=:]\s*['"][^'"]{8,}['"]"#).unwrap(),
        },
        CredentialPattern {
            name: "API key assignment",
            regex: Regex::new(r#"(?i)\b(api[_-]?key|apikey)\s*[=:]\s*['"][^'"]{16,}['"]"#).unwrap(),
        },
        CredentialPattern {
            name: "Secret key assignment",
            regex: Regex::new(r#"(?i)\b(secret[_-]?key|secretkey|encryption[_-]?key)\s*[=:]\s*['"][^'"]{16,}['"]"#).unwrap(),
        },
        CredentialPattern {
            name: "Token assignment",
            regex: Regex::new(r#"(?i)\b(access[_-]?token|auth[_-]?token|jwt[_-]?secret)\s*[=:]\s*['"][^'"]{16,}['"]"#).unwrap(),
        },
        CredentialPattern {
            name: "Private key",
            regex: Regex::new(r"-----BEGIN (RSA|DSA|EC|OPENSSH) PRIVATE KEY-----").unwrap(),
        },
        CredentialPattern {
            name: "Database URL with credentials",
            regex: Regex::new(r"(postgres(ql)?|mysql|redis|mongodb(\+srv)?)://[^:/\s]+:[^@\s]+@").unwrap(),
        },
    ];

    /// `unsafe` blocks, functions and impls
    pub static ref UNSAFE_CODE: Regex =
        Regex::new(r"\bunsafe\s*(\{|fn\b|impl\b)").unwrap();

    /// Web server crates that serve HTTP responses
    pub static ref WEB_FRAMEWORK_DEPENDENCY: Regex =
        Regex::new(r#"(?m)^\s*(actix-web|axum|rocket|warp|tide|poem)\s*="#).unwrap();

    pub static ref CSP_HEADER: Regex =
        Regex::new(r"(?i)content[-_]security[-_]policy").unwrap();

    /// Wallet RPC bound to every interface
    pub static ref RPC_BIND_ALL: Regex =
        Regex::new(r"rpc-bind-ip[\s=]+0\.0\.0\.0|0\.0\.0\.0:1808[0-9]").unwrap();

    pub static ref RPC_LOGIN_DISABLED: Regex =
        Regex::new(r"--disable-rpc-login").unwrap();

    pub static ref TESTNET_FLAG: Regex =
        Regex::new(r"(?i)\b(testnet|stagenet)\b").unwrap();

    /// Monero RPC URL; group 1 is the host
    pub static ref MONERO_RPC_URL: Regex =
        Regex::new(r"https?://([A-Za-z0-9.\-]+):1808[0-9]").unwrap();

    /// Logging macro whose arguments mention wallet secrets
    pub static ref SECRET_LOGGING: Regex = Regex::new(
        r"(?i)\b(println!|eprintln!|print!|info!|debug!|warn!|error!|trace!|log::\w+!)\s*\(.*\b(seed|mnemonic|spend_key|view_key|private_key|priv_key)\b"
    ).unwrap();

    /// SOCKS5 proxy resolving DNS locally (`socks5h://` resolves through Tor)
    pub static ref SOCKS_LOCAL_DNS: Regex =
        Regex::new(r"socks5://").unwrap();

    pub static ref UNWRAP_CALL: Regex =
        Regex::new(r"\.(unwrap|expect)\(").unwrap();

    pub static ref DEBUG_OUTPUT: Regex =
        Regex::new(r"\b(println!|dbg!)").unwrap();

    pub static ref TODO_MARKER: Regex =
        Regex::new(r"\b(TODO|FIXME)\b").unwrap();

    /// `ss`/`netstat` line with a Monero RPC port on every interface
    pub static ref EXPOSED_RPC_LISTENER: Regex =
        Regex::new(r"(0\.0\.0\.0|\*|\[::\]|:::?):(1808[0-9])\b").unwrap();
}

/// Substrings marking a value copied from an example file
pub const PLACEHOLDER_MARKERS: &[&str] = &[
    "your-",
    "your_",
    "xxx",
    "changeme",
    "change_me",
    "placeholder",
    "dummy",
    "test123",
    "password123",
    "secret123",
    "key123",
    "-here",
    "_here",
];

/// First placeholder marker contained in `value`, case-insensitive
pub fn placeholder_marker(value: &str) -> Option<&'static str> {
    let lower = value.to_lowercase();
    PLACEHOLDER_MARKERS
        .iter()
        .copied()
        .find(|marker| lower.contains(marker))
}

/// Whether a host is loopback or an onion service. LAN names such as
/// mDNS `.local` hosts are not private.
pub fn is_private_host(host: &str) -> bool {
    let host = host.to_lowercase();
    host == "localhost"
        || host == "127.0.0.1"
        || host.starts_with("127.")
        || host == "::1"
        || host.ends_with(".onion")
}

//! Fixed protocol constants that should NOT be changed.
//!
//! Remote panels are built against these values (ports, paths, wire timings),
//! so changing them breaks every deployed client page.

// ─────────────────────────────────────────────────────────────────────────────
// Ports & Paths
// ─────────────────────────────────────────────────────────────────────────────

/// Default base port. HTTP listens here, WebSocket on `base + WS_PORT_OFFSET`.
pub const DEFAULT_BASE_PORT: u16 = 7673;

/// Offset of the WebSocket port from the HTTP base port.
pub const WS_PORT_OFFSET: u16 = 1;

/// Path of the VSCS state WebSocket service.
///
/// The bootstrap page connects to `ws://<host>:<base+1>/vatsys/vscs`.
pub const WS_VSCS_PATH: &str = "/vatsys/vscs";

/// File name of the bootstrap document served for `GET /`.
pub const BOOTSTRAP_DOCUMENT: &str = "vscs.html";

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Responder
// ─────────────────────────────────────────────────────────────────────────────

/// File extensions the static responder is allowed to serve (lowercase, no dot).
pub const HTTP_PERMITTED_EXTENSIONS: &[&str] = &[
    "html",
    "htm",
    "txt",
    "ico",
    "css",
    "js",
    "ttf",
    "json",
    "webmanifest",
    "png",
    "svg",
    "jpg",
    "jpeg",
    "gif",
];

/// Write timeout for a single HTTP response (milliseconds).
pub const HTTP_WRITE_TIMEOUT_MS: u64 = 500;

/// Linger period on close so the final bytes flush (milliseconds).
pub const HTTP_LINGER_MS: u64 = 500;

/// How long to wait for the request bytes before dropping the connection (milliseconds).
pub const HTTP_READ_TIMEOUT_MS: u64 = 2000;

/// Maximum request bytes read from a connection. Only the request line matters.
pub const HTTP_MAX_REQUEST_BYTES: usize = 8192;

/// Shortest request that can carry a `GET` request line.
pub const HTTP_MIN_REQUEST_BYTES: usize = 3;

// ─────────────────────────────────────────────────────────────────────────────
// Wire Format
// ─────────────────────────────────────────────────────────────────────────────

/// Separator mixed into stable id hashes between the name and the discriminator.
///
/// ASCII unit separator: cannot appear in callsigns or frequency names.
pub const ID_FIELD_SEPARATOR: u8 = 0x1F;

/// FNV-1a 32-bit offset basis.
pub const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// FNV-1a 32-bit prime.
pub const FNV32_PRIME: u32 = 0x0100_0193;

//! Named fingerprint profiles.
//!
//! The registry is a process-wide constant: it is built once on first use
//! and only ever read afterwards, so request tasks share it without locking.
//! Names are already sanitized (see [`super::resolver::sanitize`]).

use std::collections::HashMap;
use std::sync::LazyLock;

/// Name of the profile used when a lookup misses.
pub const DEFAULT_PROFILE: &str = "chrome_120";

/// GREASE placeholder used inside profile tables. Replaced by real GREASE
/// values at handshake time.
pub const GREASE: u16 = 0x0a0a;

/// True for any of the sixteen RFC 8701 GREASE codepoints.
pub fn is_grease(value: u16) -> bool {
    (value & 0x0f0f) == 0x0a0a && (value >> 8) == (value & 0xff)
}

/// One immutable handshake fingerprint.
#[derive(Debug, PartialEq, Eq)]
pub struct FingerprintProfile {
    pub name: &'static str,
    pub cipher_suites: &'static [u16],
    pub extensions: &'static [u16],
    pub alpn: &'static [&'static str],
    pub supported_groups: &'static [u16],
    pub signature_algorithms: &'static [u16],
    pub supported_versions: &'static [u16],
    /// Browser randomizes extension order on every hello.
    pub permute_extensions: bool,
}

impl FingerprintProfile {
    /// Whether the profile carries GREASE values.
    pub fn uses_grease(&self) -> bool {
        self.cipher_suites.iter().any(|&c| is_grease(c))
            || self.extensions.iter().any(|&e| is_grease(e))
    }
}

mod tables {
    use super::GREASE;

    pub const ALPN_H2: &[&str] = &["h2", "http/1.1"];

    pub const CHROME_CIPHERS: &[u16] = &[
        GREASE, 0x1301, 0x1302, 0x1303, 0xc02b, 0xc02f, 0xc02c, 0xc030, 0xcca9, 0xcca8, 0xc013,
        0xc014, 0x009c, 0x009d, 0x002f, 0x0035,
    ];
    pub const CHROME_EXTENSIONS: &[u16] = &[
        GREASE, 0x0000, 0x0017, 0xff01, 0x000a, 0x000b, 0x0023, 0x0010, 0x0005, 0x000d, 0x0012,
        0x0033, 0x002d, 0x002b, 0x001b, 0x4469, GREASE, 0x0015,
    ];
    pub const CHROME_116_PSK_EXTENSIONS: &[u16] = &[
        GREASE, 0x0000, 0x0017, 0xff01, 0x000a, 0x000b, 0x0023, 0x0010, 0x0005, 0x000d, 0x0012,
        0x0033, 0x002d, 0x002b, 0x001b, 0x4469, GREASE, 0x0015, 0x0029,
    ];
    pub const CHROME_120_EXTENSIONS: &[u16] = &[
        GREASE, 0x0000, 0x0017, 0xff01, 0x000a, 0x000b, 0x0023, 0x0010, 0x0005, 0x000d, 0x0012,
        0x0033, 0x002d, 0x002b, 0x001b, 0x4469, 0xfe0d, GREASE, 0x0015,
    ];
    pub const CHROME_GROUPS: &[u16] = &[GREASE, 0x001d, 0x0017, 0x0018];
    pub const CHROME_PQ_GROUPS: &[u16] = &[GREASE, 0x6399, 0x001d, 0x0017, 0x0018];
    pub const CHROME_SIGALGS: &[u16] = &[
        0x0403, 0x0804, 0x0401, 0x0503, 0x0805, 0x0501, 0x0806, 0x0601,
    ];

    pub const FIREFOX_CIPHERS: &[u16] = &[
        0x1301, 0x1303, 0x1302, 0xc02b, 0xc02f, 0xcca9, 0xcca8, 0xc02c, 0xc030, 0xc00a, 0xc009,
        0xc013, 0xc014, 0x009c, 0x009d, 0x002f, 0x0035,
    ];
    pub const FIREFOX_EXTENSIONS: &[u16] = &[
        0x0000, 0x0017, 0xff01, 0x000a, 0x000b, 0x0023, 0x0010, 0x0005, 0x0022, 0x0033, 0x002b,
        0x000d, 0x002d, 0x001c, 0x0015,
    ];
    pub const FIREFOX_117_EXTENSIONS: &[u16] = &[
        0x0000, 0x0017, 0xff01, 0x000a, 0x000b, 0x0023, 0x0010, 0x0005, 0x0022, 0x0033, 0x002b,
        0x000d, 0x002d, 0x001c, 0xfe0d,
    ];
    pub const FIREFOX_GROUPS: &[u16] = &[0x001d, 0x0017, 0x0018, 0x0019, 0x0100, 0x0101];
    pub const FIREFOX_SIGALGS: &[u16] = &[
        0x0403, 0x0503, 0x0603, 0x0804, 0x0805, 0x0806, 0x0401, 0x0501, 0x0601, 0x0203, 0x0201,
    ];

    pub const SAFARI_CIPHERS: &[u16] = &[
        GREASE, 0x1301, 0x1302, 0x1303, 0xc02c, 0xc02b, 0xcca9, 0xc030, 0xc02f, 0xcca8, 0xc00a,
        0xc009, 0xc014, 0xc013, 0x009d, 0x009c, 0x0035, 0x002f, 0xc008, 0xc012, 0x000a,
    ];
    pub const SAFARI_EXTENSIONS: &[u16] = &[
        GREASE, 0x0000, 0x0017, 0xff01, 0x000a, 0x000b, 0x0010, 0x0005, 0x000d, 0x0012, 0x0033,
        0x002d, 0x002b, 0x001b, GREASE, 0x0015,
    ];
    pub const SAFARI_GROUPS: &[u16] = &[GREASE, 0x001d, 0x0017, 0x0018, 0x0019];
    pub const SAFARI_SIGALGS: &[u16] = &[
        0x0403, 0x0804, 0x0401, 0x0503, 0x0203, 0x0805, 0x0501, 0x0806, 0x0601, 0x0201,
    ];

    pub const OKHTTP_CIPHERS: &[u16] = &[
        0x1301, 0x1302, 0x1303, 0xc02b, 0xc02f, 0xc02c, 0xc030, 0xcca9, 0xcca8, 0xc013, 0xc014,
        0x009c, 0x009d, 0x002f, 0x0035,
    ];
    pub const OKHTTP_EXTENSIONS: &[u16] = &[
        0x0000, 0x0017, 0xff01, 0x000a, 0x000b, 0x0023, 0x0010, 0x0005, 0x000d, 0x0033, 0x002d,
        0x002b, 0x0015,
    ];
    pub const OKHTTP_LEGACY_CIPHERS: &[u16] = &[
        0xc02b, 0xc02f, 0xc02c, 0xc030, 0xcca9, 0xcca8, 0xc013, 0xc014, 0x009c, 0x009d, 0x002f,
        0x0035,
    ];
    pub const OKHTTP_LEGACY_EXTENSIONS: &[u16] = &[
        0xff01, 0x0000, 0x0017, 0x0023, 0x000d, 0x0005, 0x0010, 0x000b, 0x000a,
    ];
    pub const OKHTTP_GROUPS: &[u16] = &[0x001d, 0x0017, 0x0018];
    pub const OKHTTP_SIGALGS: &[u16] = &[
        0x0403, 0x0804, 0x0401, 0x0503, 0x0805, 0x0501, 0x0806, 0x0601, 0x0201,
    ];

    pub const TLS13_AND_12: &[u16] = &[0x0304, 0x0303];
    pub const TLS12_ONLY: &[u16] = &[0x0303];
}

use tables::*;

const fn chrome(name: &'static str, permute: bool) -> FingerprintProfile {
    FingerprintProfile {
        name,
        cipher_suites: CHROME_CIPHERS,
        extensions: CHROME_EXTENSIONS,
        alpn: ALPN_H2,
        supported_groups: CHROME_GROUPS,
        signature_algorithms: CHROME_SIGALGS,
        supported_versions: TLS13_AND_12,
        permute_extensions: permute,
    }
}

const fn firefox(name: &'static str, extensions: &'static [u16]) -> FingerprintProfile {
    FingerprintProfile {
        name,
        cipher_suites: FIREFOX_CIPHERS,
        extensions,
        alpn: ALPN_H2,
        supported_groups: FIREFOX_GROUPS,
        signature_algorithms: FIREFOX_SIGALGS,
        supported_versions: TLS13_AND_12,
        permute_extensions: false,
    }
}

const fn safari(name: &'static str) -> FingerprintProfile {
    FingerprintProfile {
        name,
        cipher_suites: SAFARI_CIPHERS,
        extensions: SAFARI_EXTENSIONS,
        alpn: ALPN_H2,
        supported_groups: SAFARI_GROUPS,
        signature_algorithms: SAFARI_SIGALGS,
        supported_versions: TLS13_AND_12,
        permute_extensions: false,
    }
}

const fn okhttp(name: &'static str, tls13: bool) -> FingerprintProfile {
    FingerprintProfile {
        name,
        cipher_suites: if tls13 { OKHTTP_CIPHERS } else { OKHTTP_LEGACY_CIPHERS },
        extensions: if tls13 { OKHTTP_EXTENSIONS } else { OKHTTP_LEGACY_EXTENSIONS },
        alpn: ALPN_H2,
        supported_groups: OKHTTP_GROUPS,
        signature_algorithms: OKHTTP_SIGALGS,
        supported_versions: if tls13 { TLS13_AND_12 } else { TLS12_ONLY },
        permute_extensions: false,
    }
}

static PROFILES: &[FingerprintProfile] = &[
    FingerprintProfile {
        extensions: CHROME_120_EXTENSIONS,
        ..chrome("chrome_120", true)
    },
    chrome("chrome_117", true),
    FingerprintProfile {
        extensions: CHROME_116_PSK_EXTENSIONS,
        supported_groups: CHROME_PQ_GROUPS,
        ..chrome("chrome_116_PSK_PQ", true)
    },
    FingerprintProfile {
        extensions: CHROME_116_PSK_EXTENSIONS,
        ..chrome("chrome_116_PSK", true)
    },
    chrome("chrome_112", true),
    chrome("chrome_111", true),
    chrome("chrome_110", true),
    chrome("chrome_109", false),
    chrome("chrome_108", false),
    chrome("chrome_107", false),
    chrome("chrome_106", false),
    chrome("chrome_105", false),
    chrome("chrome_104", false),
    chrome("chrome_103", false),
    firefox("firefox_117", FIREFOX_117_EXTENSIONS),
    firefox("firefox_110", FIREFOX_EXTENSIONS),
    firefox("firefox_108", FIREFOX_EXTENSIONS),
    firefox("firefox_106", FIREFOX_EXTENSIONS),
    firefox("firefox_105", FIREFOX_EXTENSIONS),
    firefox("firefox_104", FIREFOX_EXTENSIONS),
    firefox("firefox_102", FIREFOX_EXTENSIONS),
    chrome("opera_91", false),
    chrome("opera_90", false),
    chrome("opera_89", false),
    safari("safari_16_0"),
    safari("safari_15_6_1"),
    safari("safari_ipad_15_6"),
    safari("safari_ios_16_0"),
    safari("safari_ios_15_6"),
    safari("safari_ios_15_5"),
    okhttp("okhttp4_android_13", true),
    okhttp("okhttp4_android_12", true),
    okhttp("okhttp4_android_11", true),
    okhttp("okhttp4_android_10", true),
    okhttp("okhttp4_android_9", false),
    okhttp("okhttp4_android_8", false),
    okhttp("okhttp4_android_7", false),
];

/// Read-only lookup table from sanitized name to profile.
#[derive(Debug)]
pub struct FingerprintRegistry {
    profiles: HashMap<&'static str, &'static FingerprintProfile>,
    default: &'static FingerprintProfile,
}

static REGISTRY: LazyLock<FingerprintRegistry> = LazyLock::new(|| FingerprintRegistry::from_table(PROFILES));

impl FingerprintRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static FingerprintRegistry {
        &REGISTRY
    }

    fn from_table(table: &'static [FingerprintProfile]) -> Self {
        let profiles: HashMap<_, _> = table.iter().map(|p| (p.name, p)).collect();
        let default = profiles
            .get(DEFAULT_PROFILE)
            .copied()
            .unwrap_or(&table[0]);
        Self { profiles, default }
    }

    /// Look up a sanitized profile name.
    pub fn get(&self, name: &str) -> Option<&'static FingerprintProfile> {
        self.profiles.get(name).copied()
    }

    /// The built-in profile used when a lookup misses.
    pub fn default_profile(&self) -> &'static FingerprintProfile {
        self.default
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.profiles.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered profiles.
    pub fn count(&self) -> usize {
        self.profiles.len()
    }
}

use strsim::jaro_winkler;

/// Minimum similarity score (Jaro-Winkler) required for a raw label to be
/// folded into a platform family when no keyword matches.
pub const MIN_PLATFORM_SIMILARITY: f64 = 0.90;

/// Canonicalized platform key used for fuzzy comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformKey {
    normalized: String,
}

impl PlatformKey {
    /// Build a normalized comparison key from a raw platform label.
    ///
    /// Normalization steps:
    /// - trim whitespace
    /// - lowercase and remove punctuation/whitespace
    /// - remove PAL/NTSC region prefixes
    /// - expand PSx abbreviations to "playstationx"
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim().to_ascii_lowercase();
        let without_prefix = strip_region_prefixes(&trimmed);
        let alnum_only: String = without_prefix
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        Self {
            normalized: expand_common_abbreviations(&alnum_only),
        }
    }

    /// The normalization output as a lowercase ASCII alphanumeric token.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Jaro-Winkler similarity between two normalized keys.
    pub fn similarity(&self, other: &Self) -> f64 {
        jaro_winkler(self.normalized(), other.normalized())
    }
}

/// Display families that several upstream platform variants collapse into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    Pc,
    PlayStation,
    Xbox,
    NintendoSwitch,
    MacOs,
}

impl PlatformFamily {
    /// Families always offered by the platform listing, with their catalog ids.
    pub const BASELINE: [(PlatformFamily, i64); 4] = [
        (PlatformFamily::Pc, 6),
        (PlatformFamily::PlayStation, 48),
        (PlatformFamily::Xbox, 49),
        (PlatformFamily::NintendoSwitch, 130),
    ];

    const ALL: [PlatformFamily; 5] = [
        PlatformFamily::PlayStation,
        PlatformFamily::Xbox,
        PlatformFamily::Pc,
        PlatformFamily::NintendoSwitch,
        PlatformFamily::MacOs,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            PlatformFamily::Pc => "PC",
            PlatformFamily::PlayStation => "PlayStation",
            PlatformFamily::Xbox => "Xbox",
            PlatformFamily::NintendoSwitch => "Nintendo Switch",
            PlatformFamily::MacOs => "macOS",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            PlatformFamily::Pc => "pc",
            PlatformFamily::PlayStation => "playstation",
            PlatformFamily::Xbox => "xbox",
            PlatformFamily::NintendoSwitch => "nintendoswitch",
            PlatformFamily::MacOs => "macos",
        }
    }

    /// Classify a raw upstream label, e.g. "PlayStation 5" or "PC (Microsoft Windows)".
    pub fn classify(raw: &str) -> Option<Self> {
        let key = PlatformKey::new(raw);
        let normalized = key.normalized();
        if normalized.is_empty() {
            return None;
        }
        for family in Self::ALL {
            let matched = match family {
                // "pc" is too short for a substring test ("pcengine" is not a PC).
                PlatformFamily::Pc => has_pc_token(raw),
                _ => normalized.contains(family.keyword()),
            };
            if matched {
                return Some(family);
            }
        }
        Self::ALL.into_iter().find(|family| {
            key.similarity(&PlatformKey::new(family.keyword())) >= MIN_PLATFORM_SIMILARITY
        })
    }
}

/// Canonical display name for a raw upstream platform label; unknown labels are returned trimmed.
pub fn canonical_platform_name(raw: &str) -> String {
    match PlatformFamily::classify(raw) {
        Some(family) => family.display_name().to_string(),
        None => raw.trim().to_string(),
    }
}

fn has_pc_token(raw: &str) -> bool {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token.eq_ignore_ascii_case("pc"))
}

fn strip_region_prefixes(input: &str) -> &str {
    const PREFIXES: [&str; 2] = ["pal", "ntsc"];
    for prefix in PREFIXES {
        for sep in ["-", "_", " "] {
            if let Some(rest) = input
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix(sep))
            {
                return rest.trim();
            }
        }
    }
    input
}

fn expand_common_abbreviations(input: &str) -> String {
    if let Some(rest) = input.strip_prefix("ps") {
        if rest.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return format!("playstation{rest}");
        }
    }
    input.to_string()
}

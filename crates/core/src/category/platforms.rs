//! Manufacturer -> platform lookup table.
//!
//! The table is plain data: adding a console means adding an entry here,
//! the resolution logic never changes. Matching ignores case, spacing and
//! punctuation, so "PS4", "ps 4" and "PS-4" are the same key.

/// A platform and the names it is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformEntry {
    /// Label used in category paths.
    pub label: &'static str,
    pub aliases: &'static [&'static str],
}

/// A manufacturer, its alternative names, and its recognized platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturerEntry {
    /// Label used in category paths.
    pub label: &'static str,
    pub aliases: &'static [&'static str],
    pub platforms: &'static [PlatformEntry],
}

impl ManufacturerEntry {
    fn matches(&self, key: &str) -> bool {
        names_match(self.label, self.aliases, key)
    }

    fn find_platform(&self, key: &str) -> Option<&'static PlatformEntry> {
        self.platforms
            .iter()
            .find(|p| names_match(p.label, p.aliases, key))
    }
}

/// The two upper levels of a category path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPath {
    pub manufacturer: String,
    pub platform: String,
}

/// Manufacturer label used when neither the provider nor the table knows it.
pub const UNKNOWN_MANUFACTURER: &str = "Unknown";

const fn platform(label: &'static str, aliases: &'static [&'static str]) -> PlatformEntry {
    PlatformEntry { label, aliases }
}

static BUILTIN: &[ManufacturerEntry] = &[
    ManufacturerEntry {
        label: "Microsoft",
        aliases: &["Microsoft Corporation", "MS"],
        platforms: &[
            platform("Windows", &["PC", "Win", "Microsoft Windows", "Windows PC"]),
            platform("DOS", &["MS-DOS"]),
            platform("Xbox", &["Original Xbox"]),
            platform("Xbox 360", &["X360", "360"]),
            platform("Xbox One", &["XB1", "XBO"]),
            platform("Xbox Series X", &["Xbox Series", "Xbox Series S", "Xbox Series X|S", "XSX"]),
        ],
    },
    ManufacturerEntry {
        label: "Sony",
        aliases: &[
            "Sony Interactive Entertainment",
            "Sony Computer Entertainment",
            "SIE",
            "SCE",
        ],
        platforms: &[
            platform("PlayStation", &["PS1", "PSX", "PS One", "PlayStation 1"]),
            platform("PlayStation 2", &["PS2"]),
            platform("PlayStation 3", &["PS3"]),
            platform("PlayStation 4", &["PS4"]),
            platform("PlayStation 5", &["PS5"]),
            platform("PlayStation Portable", &["PSP"]),
            platform("PlayStation Vita", &["PS Vita", "Vita"]),
        ],
    },
    ManufacturerEntry {
        label: "Nintendo",
        aliases: &["Nintendo Co., Ltd."],
        platforms: &[
            platform("NES", &["Nintendo Entertainment System", "Famicom"]),
            platform(
                "SNES",
                &["Super Nintendo", "Super Nintendo Entertainment System", "Super Famicom"],
            ),
            platform("Nintendo 64", &["N64"]),
            platform("GameCube", &["Nintendo GameCube", "GCN", "NGC"]),
            platform("Wii", &["Nintendo Wii"]),
            platform("Wii U", &["Nintendo Wii U"]),
            platform("Nintendo Switch", &["Switch", "NSW"]),
            platform("Game Boy", &["GB"]),
            platform("Game Boy Color", &["GBC"]),
            platform("Game Boy Advance", &["GBA"]),
            platform("Nintendo DS", &["DS", "NDS"]),
            platform("Nintendo 3DS", &["3DS", "N3DS"]),
            platform("Virtual Boy", &["VB"]),
        ],
    },
    ManufacturerEntry {
        label: "Sega",
        aliases: &["Sega Corporation"],
        platforms: &[
            platform("Master System", &["Sega Master System", "SMS"]),
            platform("Mega Drive", &["Sega Mega Drive", "Genesis", "Sega Genesis"]),
            platform("Sega CD", &["Mega CD", "Sega Mega CD"]),
            platform("32X", &["Sega 32X"]),
            platform("Saturn", &["Sega Saturn"]),
            platform("Dreamcast", &["Sega Dreamcast", "DC"]),
            platform("Game Gear", &["Sega Game Gear", "GG"]),
        ],
    },
    ManufacturerEntry {
        label: "Apple",
        aliases: &["Apple Inc."],
        platforms: &[
            platform("Mac", &["macOS", "OS X", "Macintosh"]),
            platform("iOS", &["iPhone", "iPad"]),
            platform("Apple II", &["Apple IIe", "Apple 2"]),
        ],
    },
    ManufacturerEntry {
        label: "Google",
        aliases: &[],
        platforms: &[platform("Android", &[])],
    },
    ManufacturerEntry {
        label: "Linux",
        aliases: &[],
        platforms: &[platform("Linux", &["GNU/Linux"])],
    },
    ManufacturerEntry {
        label: "Valve",
        aliases: &["Valve Corporation"],
        platforms: &[platform("Steam Deck", &[])],
    },
    ManufacturerEntry {
        label: "Atari",
        aliases: &[],
        platforms: &[
            platform("Atari 2600", &["2600", "VCS", "Atari VCS"]),
            platform("Atari 5200", &["5200"]),
            platform("Atari 7800", &["7800"]),
            platform("Atari ST", &[]),
            platform("Jaguar", &["Atari Jaguar"]),
            platform("Lynx", &["Atari Lynx"]),
        ],
    },
    ManufacturerEntry {
        label: "NEC",
        aliases: &[],
        platforms: &[
            platform("TurboGrafx-16", &["PC Engine", "TG16"]),
            platform("TurboGrafx-CD", &["PC Engine CD", "CD-ROM2"]),
        ],
    },
    ManufacturerEntry {
        label: "SNK",
        aliases: &[],
        platforms: &[
            platform("Neo Geo", &["Neo Geo AES", "AES"]),
            platform("Neo Geo Pocket Color", &["NGPC"]),
        ],
    },
];

/// Immutable manufacturer -> platform table.
#[derive(Debug, Clone, Copy)]
pub struct PlatformTable {
    manufacturers: &'static [ManufacturerEntry],
}

impl Default for PlatformTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PlatformTable {
    /// The table shipped with catsync.
    pub fn builtin() -> Self {
        Self {
            manufacturers: BUILTIN,
        }
    }

    /// Build a table from custom entries.
    pub fn from_entries(manufacturers: &'static [ManufacturerEntry]) -> Self {
        Self { manufacturers }
    }

    pub fn manufacturers(&self) -> &'static [ManufacturerEntry] {
        self.manufacturers
    }

    /// Find a manufacturer by label or alias.
    pub fn manufacturer(&self, name: &str) -> Option<&'static ManufacturerEntry> {
        let key = normalize_key(name);
        if key.is_empty() {
            return None;
        }
        self.manufacturers.iter().find(|m| m.matches(&key))
    }

    /// Find a platform anywhere in the table, with its manufacturer.
    pub fn find_platform(
        &self,
        name: &str,
    ) -> Option<(&'static ManufacturerEntry, &'static PlatformEntry)> {
        let key = normalize_key(name);
        if key.is_empty() {
            return None;
        }
        self.manufacturers
            .iter()
            .find_map(|m| m.find_platform(&key).map(|p| (m, p)))
    }

    /// Map reported manufacturer/platform names to category labels.
    ///
    /// - known manufacturer: its label, plus the platform's label when the
    ///   platform belongs to it, else the reported platform unchanged;
    /// - unknown or absent manufacturer: the platform is searched across the
    ///   whole table; without a hit the reported names pass through, with
    ///   `Unknown` standing in for an absent manufacturer.
    pub fn resolve(&self, manufacturer: Option<&str>, platform: &str) -> PlatformPath {
        let reported = manufacturer.map(str::trim).filter(|m| !m.is_empty());

        if let Some(entry) = reported.and_then(|m| self.manufacturer(m)) {
            let platform = entry
                .find_platform(&normalize_key(platform))
                .map(|p| p.label.to_string())
                .unwrap_or_else(|| platform.trim().to_string());
            return PlatformPath {
                manufacturer: entry.label.to_string(),
                platform,
            };
        }

        match self.find_platform(platform) {
            Some((m, p)) => PlatformPath {
                manufacturer: m.label.to_string(),
                platform: p.label.to_string(),
            },
            None => PlatformPath {
                manufacturer: reported.unwrap_or(UNKNOWN_MANUFACTURER).to_string(),
                platform: platform.trim().to_string(),
            },
        }
    }
}

/// Lowercase alphanumerics only.
fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn names_match(label: &str, aliases: &[&str], key: &str) -> bool {
    normalize_key(label) == key || aliases.iter().any(|a| normalize_key(a) == key)
}

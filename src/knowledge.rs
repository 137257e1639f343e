//! Heuristic fallback data.
//!
//! Hand-authored tables standing in for facts the scraped corpus does not
//! carry: matching idioms, curated "main entity" lists, scope lists,
//! character rankings, vehicle specs and a few relationships. None of it is
//! derived from the store. A data-complete build can empty these tables
//! without touching control flow.

// ── Query normalization ──────────────────────────────────────────────────

/// Multi-word idioms rewritten before stop-word stripping. Only the first
/// phrase found in a query is applied.
pub const ALIAS_PHRASES: &[(&str, &str)] = &[
    ("city of gotham", "gotham city"),
    ("batman's base", "batcave"),
    ("batman base", "batcave"),
    ("where does batman live", "wayne manor"),
    ("batman's primary mode of transportation", "batmobile"),
    ("batman's car", "batmobile"),
    ("batman car", "batmobile"),
    ("what does batman drive", "batmobile"),
    ("batman's plane", "batwing"),
    ("batman plane", "batwing"),
    ("dark knight", "batman"),
    ("caped crusader", "batman"),
    ("world's greatest detective", "batman"),
    ("clown prince of crime", "joker"),
    ("scarecrow's real name", "jonathan crane"),
    ("scarecrow real name", "jonathan crane"),
];

pub const STOP_WORDS: &[&str] = &[
    "who", "is", "what", "where", "the", "a", "an", "tell", "me", "about", "does", "usually",
    "operate",
];

/// Wider stop list for description keyword search.
pub const KEYWORD_STOP_WORDS: &[&str] = &[
    "who", "is", "what", "where", "when", "how", "the", "a", "an", "and", "or", "but", "tell",
    "me", "about", "can", "you",
];

// ── Importance bonus ─────────────────────────────────────────────────────

pub const MAIN_CHARACTERS: &[&str] = &[
    "batman", "robin", "joker", "catwoman", "penguin", "riddler", "two_face", "two-face",
    "harvey_dent", "scarecrow", "poison_ivy", "mr_freeze", "bane", "harley_quinn",
    "ra's_al_ghul", "alfred", "commissioner_gordon", "batgirl", "nightwing", "red_hood",
    "red_robin",
];

pub const MAIN_LOCATIONS: &[&str] = &[
    "gotham_city", "arkham_asylum", "wayne_manor", "batcave", "gcpd", "ace_chemicals",
    "blackgate_prison",
];

pub const MAIN_VEHICLES: &[&str] = &["batmobile", "batplane", "batwing", "batboat"];

pub const MAIN_CHARACTER_BONUS: f64 = 20.0;
pub const MAIN_LOCATION_BONUS: f64 = 15.0;
pub const MAIN_VEHICLE_BONUS: f64 = 15.0;
pub const SHORT_NAME_BONUS: f64 = 5.0;

// ── Scope filter ─────────────────────────────────────────────────────────

pub const OTHER_UNIVERSE_HEROES: &[&str] = &[
    "superman", "clark kent", "kal-el",
    "wonder woman", "diana prince",
    "green lantern", "hal jordan", "john stewart", "kyle rayner",
    "flash", "barry allen", "wally west",
    "aquaman", "arthur curry",
    "green arrow", "oliver queen",
    "martian manhunter", "j'onn j'onzz",
    "cyborg", "victor stone",
    "shazam", "billy batson",
    "hawkman", "carter hall",
    "atom", "ray palmer",
    "firestorm", "ronnie raymond",
];

pub const OTHER_UNIVERSE_PLACES: &[&str] = &[
    "metropolis", "smallville", "daily planet",
    "lexcorp", "lex corp", "luthorcorp",
    "themyscira", "paradise island",
    "coast city", "central city", "keystone city",
    "atlantis", "star city",
    "mount justice", "watchtower",
    "fortress of solitude",
    "hall of justice",
];

pub const FRANCHISE_ANCHORS: &[&str] = &["batman", "bruce wayne", "dark knight", "gotham", "bat-family"];

/// Phrasings that turn an out-of-scope refusal into the vehicles/equipment variant.
pub const EQUIPMENT_PHRASES: &[&str] = &[
    "what does", "what vehicles", "what cars", "drives", "rides", "gadgets", "weapons",
    "equipment", "gear", "tools",
];

// ── Fallback keyword classifier ──────────────────────────────────────────

pub const VEHICLE_KEYWORDS: &[&str] = &[
    "batmobile", "batwing", "batboat", "batcycle", "vehicle", "car", "plane", "boat", "drive",
    "drives",
];
pub const LOCATION_KEYWORDS: &[&str] =
    &["gotham", "arkham", "wayne manor", "batcave", "where is", "location", "place"];
pub const RELATIONSHIP_KEYWORDS: &[&str] =
    &["relationship", "ally", "enemy", "friend", "vs", "versus", "against"];
pub const SIDEKICK_KEYWORDS: &[&str] = &["sidekick", "partner", "robin", "assistant", "helper"];
pub const CHARACTER_KEYWORDS: &[&str] =
    &["who is", "tell me about", "what about", "character", "person"];

/// Names with several same-kind holders; a bare mention asks the user to pick.
pub const AMBIGUOUS_NAMES: &[&str] = &["robin", "batgirl", "flash", "green lantern", "joker", "batman"];

// ── Character-specific vehicles ──────────────────────────────────────────

/// Extra vehicle-name fragments that count as "belonging" to a character,
/// beyond plain name containment. Keys and fragments are folded text.
pub const CHARACTER_VEHICLE_RULES: &[(&str, &[&str])] = &[
    ("batman", &["batmobile", "batcycle", "batwing", "batboat", "batcopter"]),
    ("two face", &["two face", "twoface"]),
    ("twoface", &["two face", "twoface"]),
    ("harvey dent", &["two face", "twoface", "harvey", "dent"]),
    ("harvey", &["two face", "twoface", "harvey", "dent"]),
    ("penguin", &["penguin"]),
    ("riddler", &["riddler"]),
    ("catwoman", &["catwoman", "catmobile", "catcycle", "catboat"]),
];

// ── Character rankings (1..10) ───────────────────────────────────────────

pub const STRENGTH_RANKING: &[(&str, u8)] = &[
    ("superman", 10), ("doomsday", 10), ("darkseid", 10),
    ("bane", 9), ("killer_croc", 8), ("clayface", 8),
    ("batman", 7), ("nightwing", 6), ("robin", 5), ("batgirl", 5),
    ("catwoman", 5), ("two-face", 4), ("penguin", 3), ("joker", 3),
    ("riddler", 2), ("scarecrow", 2), ("alfred", 2),
];

pub const INTELLIGENCE_RANKING: &[(&str, u8)] = &[
    ("batman", 10), ("oracle", 10), ("mr_terrific", 10),
    ("lex_luthor", 9), ("riddler", 8), ("ra's_al_ghul", 8),
    ("joker", 7), ("two-face", 7), ("penguin", 6),
    ("nightwing", 7), ("robin", 6), ("catwoman", 6),
    ("bane", 6), ("scarecrow", 7), ("alfred", 8),
];

pub const SPEED_RANKING: &[(&str, u8)] = &[
    ("flash", 10), ("superman", 9),
    ("nightwing", 7), ("batman", 6), ("robin", 6),
    ("catwoman", 7), ("batgirl", 6),
    ("joker", 4), ("bane", 3), ("penguin", 2), ("riddler", 3),
];

pub const COMBAT_RANKING: &[(&str, u8)] = &[
    ("batman", 10), ("lady_shiva", 10), ("ra's_al_ghul", 9),
    ("nightwing", 8), ("robin", 7), ("batgirl", 8),
    ("catwoman", 7), ("bane", 8), ("joker", 5),
    ("two-face", 6), ("penguin", 3), ("riddler", 4),
];

/// Unranked characters score this unless a category hint applies.
pub const NEUTRAL_RANK: u8 = 5;

/// Name-fragment categories for unranked characters, checked in order.
pub const RANK_HINTS: &[(&[&str], u8)] = &[
    (&["batman", "robin", "nightwing", "batgirl"], 7),
    (&["joker", "penguin", "riddler"], 4),
    (&["bane", "killer", "croc", "clay"], 8),
];

/// Identity and nickname folding applied before a ranking lookup.
pub const RANKING_ALIASES: &[(&str, &str)] = &[
    ("dark knight", "batman"),
    ("caped crusader", "batman"),
    ("world's greatest detective", "batman"),
    ("bruce wayne", "batman"),
    ("clown prince of crime", "joker"),
    ("mr j", "joker"),
    ("harvey dent", "two-face"),
    ("dick grayson", "nightwing"),
    ("tim drake", "robin"),
    ("jason todd", "robin"),
    ("damian wayne", "robin"),
    ("selina kyle", "catwoman"),
    ("oswald cobblepot", "penguin"),
    ("edward nygma", "riddler"),
    ("jonathan crane", "scarecrow"),
];

// ── Vehicle specs ────────────────────────────────────────────────────────

/// `(folded key, max speed, armor rating, weapon count)`.
pub const VEHICLE_SPECS: &[(&str, &str, u32, u32)] = &[
    ("batmobile", "200 mph", 9, 8),
    ("batwing", "400 mph", 6, 10),
    ("batboat", "80 mph", 7, 6),
    ("batcycle", "180 mph", 4, 3),
    ("batsub", "60 mph", 8, 7),
];

pub const VEHICLE_NAME_ALIASES: &[(&str, &str)] = &[
    ("batcar", "batmobile"),
    ("batplane", "batwing"),
    ("batship", "batboat"),
    ("batsubmarine", "batsub"),
    ("batmotorcycle", "batcycle"),
];

/// Estimates by name fragment: `(fragments, max speed, armor, weapons)`.
pub const VEHICLE_ESTIMATES: &[(&[&str], &str, u32, u32)] = &[
    (&["mobile", "car"], "150 mph", 6, 5),
    (&["wing", "plane"], "300 mph", 5, 7),
    (&["boat", "ship"], "70 mph", 6, 4),
    (&["cycle", "bike"], "120 mph", 3, 2),
];
pub const VEHICLE_ESTIMATE_DEFAULT: (&str, u32, u32) = ("100 mph", 4, 3);

// ── Relationships ────────────────────────────────────────────────────────

/// `(name fragment, allies, enemies)`; the first fragment found in the
/// character's folded name wins.
pub const FALLBACK_RELATIONS: &[(&[&str], &[&str], &[&str])] = &[
    (
        &["batman", "bruce wayne"],
        &[
            "Robin", "Nightwing", "Batgirl", "Alfred_Pennyworth", "Commissioner_Gordon",
            "Oracle", "Red_Robin", "Catwoman",
        ],
        &[
            "Joker", "Two-Face", "Penguin", "Riddler", "Bane", "Scarecrow", "Poison_Ivy",
            "Mr_Freeze", "Harley_Quinn", "Ra's_al_Ghul",
        ],
    ),
    (
        &["joker"],
        &["Harley_Quinn", "Penguin"],
        &["Batman", "Robin", "Nightwing", "Batgirl"],
    ),
];

/// Everyone else is assumed to count Batman among their enemies.
pub const DEFAULT_ENEMIES: &[&str] = &["Batman"];

/// At most this many fallback names are resolved.
pub const FALLBACK_RELATION_LIMIT: usize = 8;

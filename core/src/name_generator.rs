//! Deterministic names for clients, firm staff and client locations.
//!
//! All generation is deterministic (same stream = same names).

use crate::rng::RandomSource;

/// Curated name and place lists for synthetic clients and firm staff.
pub struct NameGenerator;

impl NameGenerator {
    /// "First Last"
    pub fn full_name(rng: &mut RandomSource) -> String {
        let first = rng.pick(FIRST_NAMES);
        let last = rng.pick(LAST_NAMES);
        format!("{first} {last}")
    }

    /// City bucket a client is filed under.
    pub fn location(rng: &mut RandomSource) -> String {
        (*rng.pick(LOCATIONS)).to_string()
    }

    /// `Attorney_k` with k uniform in 1..=pool.
    pub fn attorney(rng: &mut RandomSource, pool: u32) -> String {
        format!("Attorney_{}", 1 + rng.next_u64_below(pool.max(1).into()))
    }

    /// `Staff_k` with k uniform in 1..=pool.
    pub fn staff(rng: &mut RandomSource, pool: u32) -> String {
        format!("Staff_{}", 1 + rng.next_u64_below(pool.max(1).into()))
    }
}

const FIRST_NAMES: &[&str] = &[
    "Amelia", "Bernard", "Camila", "Desmond", "Elena", "Farah", "Gideon", "Harriet",
    "Imran", "Josephine", "Kwame", "Lucia", "Mateo", "Nadia", "Oscar", "Priya",
    "Quentin", "Rosa", "Samir", "Tamsin", "Ulrich", "Valeria", "Wesley", "Ximena",
    "Yusuf", "Zoe", "Abel", "Bianca", "Cyrus", "Delphine", "Emeka", "Fiona",
    "Graham", "Hana", "Ivan", "Jolene", "Kenji", "Leona", "Marcus", "Noor",
];

const LAST_NAMES: &[&str] = &[
    "Abernathy", "Bautista", "Castellanos", "Drummond", "Eastwood", "Fitzgerald",
    "Gallagher", "Holloway", "Ibarra", "Jovanovic", "Kowalski", "Lindqvist",
    "Mbeki", "Nakamura", "Okafor", "Pemberton", "Quintero", "Rasmussen",
    "Sandoval", "Thornton", "Underwood", "Vasquez", "Whitaker", "Yamamoto",
    "Zielinski", "Ashford", "Blackwood", "Carrington", "Delacroix", "Ellison",
    "Fairbanks", "Greenberg", "Hargrove", "Iverson", "Kensington", "Langley",
];

const LOCATIONS: &[&str] = &[
    "Springfield", "Riverton", "Lakewood", "Fairview", "Brookhaven", "Oakridge",
    "Milltown", "Harbor City", "Cedar Falls", "Westport", "Greenville", "Ashland",
];

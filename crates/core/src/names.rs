//! Display-name generation and de-duplication.
//!
//! Users who join without a name get a random adjective+animal handle.
//! Duplicate names within a session are suffixed with a counter so every
//! member is distinguishable: "Sam", "Sam(2)", "Sam(3)".

use rand::seq::IndexedRandom;

const ADJECTIVES: &[&str] = &[
    "Happy", "Clever", "Swift", "Bright", "Cool", "Smart", "Quick", "Calm", "Bold", "Wise",
];

const ANIMALS: &[&str] = &[
    "Panda", "Tiger", "Eagle", "Dolphin", "Fox", "Wolf", "Bear", "Hawk", "Lion", "Owl",
];

/// Generate a random display name, e.g. "SwiftEagle".
pub fn random_display_name() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).expect("non-empty list");
    let animal = ANIMALS.choose(&mut rng).expect("non-empty list");
    format!("{adjective}{animal}")
}

/// Make `base` unique against `existing` by appending "(2)", "(3)", ... as
/// needed. Returns `base` unchanged when it is already free.
pub fn uniquify<'a, I>(base: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: std::collections::HashSet<&str> = existing.into_iter().collect();
    if !taken.contains(base) {
        return base.to_string();
    }

    let mut counter = 2;
    loop {
        let candidate = format!("{base}({counter})");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        counter += 1;
    }
}

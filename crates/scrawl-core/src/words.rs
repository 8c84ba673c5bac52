use rand::Rng;

/// Candidate words for the guessing game. Sampled uniformly with no
/// exclusion of recent picks, so consecutive rounds may repeat a word.
pub const WORD_POOL: &[&str] = &[
    "tree",
    "flower",
    "house",
    "bus",
    "airplane",
    "boat",
    "truck",
    "train",
    "cat",
    "dog",
    "turtle",
    "key",
    "cup",
    "fork",
    "spoon",
    "chair",
    "table",
    "toilet",
    "pencil",
    "book",
    "door",
    "rug",
    "television",
    "phone",
    "refrigerator",
    "plunger",
    "bag",
    "bottle",
    "acorn",
    "cheese",
    "apple",
    "banana",
    "money",
    "clock",
    "bed",
    "scissor",
    "jeans",
    "shirt",
    "boots",
    "slippers",
    "microwave",
    "toaster",
    "toothbrush",
    "hand",
    "leg",
    "mouth",
    "eye",
    "nose",
    "ear",
    "mail",
    "lamp",
    "pan",
    "spatula",
    "bread",
    "egg",
    "scarf",
    "gloves",
    "socks",
    "bell",
    "stairs",
    "sun",
    "cloud",
    "fish",
    "earth",
    "can",
    "milk",
    "strawberry",
    "ice cream",
    "ice cube",
    "fire",
    "syringe",
    "umbrella",
    "tie",
    "stapler",
    "horse",
    "moon",
    "sign",
    "fence",
];

/// Pick a word uniformly at random from the pool.
pub fn random_word() -> &'static str {
    let mut rng = rand::rng();
    WORD_POOL[rng.random_range(0..WORD_POOL.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_is_nonempty_and_lowercase() {
        assert!(!WORD_POOL.is_empty());
        for word in WORD_POOL {
            assert!(!word.is_empty());
            assert_eq!(*word, word.to_lowercase().as_str());
        }
    }

    #[test]
    fn random_word_comes_from_pool() {
        for _ in 0..50 {
            assert!(WORD_POOL.contains(&random_word()));
        }
    }
}

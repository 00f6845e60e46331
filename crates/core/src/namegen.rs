//! Replica name generation.
//!
//! Cloned dashboards get a human-readable `<adjective>-<verb>` label drawn
//! uniformly from two fixed word lists. Collisions with earlier names are
//! accepted; the label is cosmetic, not an identifier.

use rand::Rng;

pub const ADJECTIVES: &[&str] = &[
    "happy", "elated", "sad", "angry", "furious", "mysterious", "bright", "dark", "silent", "loud",
    "luminous", "calm", "serene", "fluffy", "spiky", "colorful", "vibrant", "gloomy", "slimy",
    "grumpy", "joyful", "optimistic", "pessimistic", "melodic", "harsh", "hollow", "stuffed",
    "bulky", "slender", "brave", "meek", "heroic", "cowardly", "glittering", "dull", "shiny",
    "matte", "spherical", "flat", "crispy", "soft", "rigid", "flexible", "sturdy", "flimsy",
    "chunky", "sparse", "dense", "witty", "dim", "boisterous", "muted", "candid", "staged",
    "authentic", "forged", "moving", "still", "animated", "lifelike", "distant", "nearby",
    "exotic", "common", "splendid", "dreary", "beaming", "sour", "spicy", "mild", "scalding",
    "icy", "steamy", "frozen", "thunderous", "noisy", "hushed", "rough", "smooth", "plush",
    "wrinkled", "muddy", "clean", "filthy", "spotless", "ragged", "pristine", "aged", "new",
];

pub const VERBS: &[&str] = &[
    "run", "jump", "swim", "dive", "climb", "crawl", "sing", "shout", "whisper", "write",
    "sketch", "draw", "paint", "build", "destroy", "dance", "laugh", "cry", "sulk", "ponder",
    "wonder", "dream", "hope", "fear", "create", "invent", "discover", "explore", "wander",
    "stumble", "grasp", "clutch", "release", "catch", "throw", "punch", "kick", "push", "pull",
    "lift", "drop", "break", "fix", "mend", "weld", "carve", "sculpt", "measure", "design",
    "plot", "scheme", "act", "perform", "entertain", "calculate", "think", "believe", "doubt",
    "guess", "play", "work", "rest", "sleep", "awaken", "startle", "surprise", "frighten",
    "scare", "console", "comfort", "coax", "convince", "persuade", "dissuade", "begin", "end",
    "commence", "terminate", "introduce", "eliminate", "increase", "decrease", "inflate",
    "deflate", "expand", "contract", "magnify", "diminish", "accelerate",
];

/// Source of one uniform index in `0..len`. Injected so tests can supply a
/// deterministic sequence instead of a process-wide RNG.
pub trait IndexSource: Send + Sync {
    fn pick(&self, len: usize) -> usize;
}

/// Production source backed by the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngIndexSource;

impl IndexSource for ThreadRngIndexSource {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

pub struct ReplicaNamer {
    source: Box<dyn IndexSource>,
}

impl Default for ReplicaNamer {
    fn default() -> Self {
        Self::new(ThreadRngIndexSource)
    }
}

impl ReplicaNamer {
    pub fn new<S>(source: S) -> Self
    where
        S: IndexSource + 'static,
    {
        Self { source: Box::new(source) }
    }

    pub fn generate(&self) -> String {
        let adjective = ADJECTIVES[self.source.pick(ADJECTIVES.len())];
        let verb = VERBS[self.source.pick(VERBS.len())];
        format!("{adjective}-{verb}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{IndexSource, ReplicaNamer, ADJECTIVES, VERBS};

    struct SequenceSource {
        values: Vec<usize>,
        cursor: AtomicUsize,
    }

    impl SequenceSource {
        fn new(values: Vec<usize>) -> Self {
            Self { values, cursor: AtomicUsize::new(0) }
        }
    }

    impl IndexSource for SequenceSource {
        fn pick(&self, len: usize) -> usize {
            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            self.values[index % self.values.len()] % len
        }
    }

    #[test]
    fn generated_name_is_adjective_dash_verb() {
        let namer = ReplicaNamer::default();
        for _ in 0..50 {
            let name = namer.generate();
            let (adjective, verb) =
                name.split_once('-').expect("name should contain a separator");
            assert!(ADJECTIVES.contains(&adjective), "unknown adjective `{adjective}`");
            assert!(VERBS.contains(&verb), "unknown verb `{verb}`");
        }
    }

    #[test]
    fn deterministic_source_yields_deterministic_name() {
        let namer = ReplicaNamer::new(SequenceSource::new(vec![0, 0]));
        assert_eq!(namer.generate(), "happy-run");

        let namer = ReplicaNamer::new(SequenceSource::new(vec![1, 2]));
        assert_eq!(namer.generate(), "elated-swim");
    }

    #[test]
    fn word_lists_are_nonempty_and_dash_free() {
        assert!(!ADJECTIVES.is_empty());
        assert!(!VERBS.is_empty());
        for word in ADJECTIVES.iter().chain(VERBS.iter()) {
            assert!(!word.contains('-'), "`{word}` would break the word-word format");
        }
    }
}

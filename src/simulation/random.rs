//! Randomized content: display names, contact handles and message bodies.
//!
//! Every function draws from the caller's RNG so a seeded generator yields a
//! reproducible directory and transcript.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::protocol::{AttachmentRef, MessageContent};

pub const PHONE_HANDLE_PROBABILITY: f64 = 0.8;
pub const HANDLE_NUMBER_MIN: u32 = 10_000_000;
pub const HANDLE_NUMBER_MAX: u32 = 20_000_000;
pub const HANDLE_EMAIL_DOMAIN: &str = "icloud.com";

pub const ALIAS_MIN_TOKENS: usize = 1;
pub const ALIAS_MAX_TOKENS: usize = 3;

pub const SENTENCE_MIN_WORDS: usize = 1;
pub const SENTENCE_MAX_WORDS: usize = 12;

pub const PLACEHOLDER_ATTACHMENT_ID: u64 = 1;
pub const PLACEHOLDER_ATTACHMENT_MIMETYPE: &str = "image/jpeg";
pub const PLACEHOLDER_ATTACHMENT_SIZE: u64 = 1_000_000;

const NAMES: &[&str] = &[
    "Aaren", "Abbey", "Adela", "Agatha", "Aida", "Alane", "Alexa", "Alfie", "Alma", "Amara",
    "Ambrose", "Anika", "Ansel", "Arden", "Ariel", "Astrid", "Aubrey", "Aurora", "Barnaby",
    "Beatrix", "Benedict", "Bertha", "Bianca", "Blythe", "Bruno", "Calla", "Calvin", "Carmen",
    "Cecily", "Celeste", "Cedric", "Cora", "Cosmo", "Dagny", "Dahlia", "Dante", "Delphine",
    "Dexter", "Dora", "Edgar", "Edith", "Elio", "Elsa", "Emeric", "Enid", "Esme", "Ezra",
    "Fabian", "Felix", "Fern", "Fiona", "Florian", "Freya", "Gideon", "Greta", "Gus", "Hattie",
    "Hazel", "Hector", "Hilda", "Hugo", "Ida", "Ines", "Ingrid", "Isla", "Ivo", "Jasper",
    "Juno", "Kaia", "Kasimir", "Keira", "Lars", "Leona", "Linus", "Lorna", "Lucian", "Mabel",
    "Magnus", "Maren", "Matilda", "Milo", "Mira", "Nadia", "Nell", "Nico", "Nora", "Odette",
    "Olaf", "Opal", "Orla", "Otis", "Pearl", "Percy", "Petra", "Quentin", "Rafael", "Rhea",
    "Rosalind", "Rufus", "Sabine", "Selma", "Silas", "Sonja", "Tamsin", "Thea", "Tobias",
    "Ulla", "Vera", "Viggo", "Wanda", "Wilhelmina", "Xavier", "Yara", "Yusuf", "Zelda", "Zora",
];

const WORDS: &[&str] = &[
    "about", "after", "again", "almost", "already", "always", "answer", "around", "back",
    "before", "better", "bring", "call", "can", "coffee", "come", "could", "day", "dinner",
    "done", "early", "easy", "evening", "every", "fine", "first", "found", "friday", "friend",
    "funny", "game", "get", "going", "good", "great", "happy", "have", "here", "home", "hope",
    "idea", "just", "keep", "know", "late", "later", "leave", "let", "like", "little", "long",
    "look", "lunch", "made", "make", "maybe", "meet", "message", "minute", "monday", "morning",
    "movie", "much", "need", "never", "new", "next", "nice", "night", "now", "okay", "only",
    "party", "people", "phone", "picture", "place", "plan", "pretty", "quick", "ready",
    "really", "remember", "right", "running", "said", "saw", "see", "send", "should", "soon",
    "sorry", "sound", "still", "sure", "talk", "tell", "thanks", "that", "there", "thing",
    "think", "this", "time", "today", "tomorrow", "tonight", "train", "try", "wait", "walk",
    "want", "was", "weekend", "well", "what", "when", "where", "will", "with", "work", "would",
    "yes", "yesterday", "you",
];

/// `true` with the given probability.
pub fn chance(rng: &mut impl Rng, probability: f64) -> bool {
    rng.gen_bool(probability.clamp(0.0, 1.0))
}

pub fn generate_alias(rng: &mut impl Rng) -> String {
    let tokens = rng.gen_range(ALIAS_MIN_TOKENS..=ALIAS_MAX_TOKENS);
    (0..tokens)
        .filter_map(|_| NAMES.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A phone-number handle (`+12345678`) or, less often, an email handle
/// (`12345678@icloud.com`).
pub fn generate_handle(rng: &mut impl Rng) -> String {
    let is_phone = chance(rng, PHONE_HANDLE_PROBABILITY);
    let number = rng.gen_range(HANDLE_NUMBER_MIN..HANDLE_NUMBER_MAX);
    if is_phone {
        format!("+{number}")
    } else {
        format!("{number}@{HANDLE_EMAIL_DOMAIN}")
    }
}

pub fn generate_handles(rng: &mut impl Rng, count: usize) -> Vec<String> {
    (0..count).map(|_| generate_handle(rng)).collect()
}

pub fn generate_sentence(rng: &mut impl Rng, min_words: usize, max_words: usize) -> String {
    let (min_words, max_words) = if min_words <= max_words {
        (min_words.max(1), max_words.max(1))
    } else {
        (max_words.max(1), min_words.max(1))
    };
    let count = rng.gen_range(min_words..=max_words);
    let mut sentence = String::new();
    for index in 0..count {
        let word = WORDS.choose(rng).copied().unwrap_or("ok");
        if index == 0 {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                sentence.extend(first.to_uppercase());
                sentence.push_str(chars.as_str());
            }
        } else {
            sentence.push(' ');
            sentence.push_str(word);
        }
    }
    sentence.push('.');
    sentence
}

pub fn placeholder_attachment() -> AttachmentRef {
    AttachmentRef {
        id: PLACEHOLDER_ATTACHMENT_ID,
        mimetype: PLACEHOLDER_ATTACHMENT_MIMETYPE.to_string(),
        size: PLACEHOLDER_ATTACHMENT_SIZE,
    }
}

/// A short sentence, or the fixed placeholder attachment when `is_text` is false.
pub fn generate_message_content(rng: &mut impl Rng, is_text: bool) -> MessageContent {
    if is_text {
        MessageContent::Text {
            text: generate_sentence(rng, SENTENCE_MIN_WORDS, SENTENCE_MAX_WORDS),
        }
    } else {
        MessageContent::Attachments {
            attachments: vec![placeholder_attachment()],
        }
    }
}

/// Whether `handle` has the shape produced by [`generate_handle`].
pub fn is_generated_handle(handle: &str) -> bool {
    let digits = if let Some(rest) = handle.strip_prefix('+') {
        rest
    } else if let Some(local) = handle.strip_suffix(HANDLE_EMAIL_DOMAIN) {
        match local.strip_suffix('@') {
            Some(local) => local,
            None => return false,
        }
    } else {
        return false;
    };
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

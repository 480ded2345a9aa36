//! Repeating-key attacks: single-byte XOR and dictionary Vigenère.
//!
//! Both attacks recognise a win by a flag prefix in the output. The XOR
//! search also ranks every key by English letter frequency so callers can
//! inspect the best guess when no flag turns up.

use tracing::trace;

/// Expected relative frequency of common English letters and space
pub const FREQUENCY_TABLE: [(u8, f64); 13] = [
    (b'e', 12.7),
    (b't', 9.1),
    (b'a', 8.2),
    (b'o', 7.5),
    (b'i', 7.0),
    (b'n', 6.7),
    (b's', 6.3),
    (b'h', 6.1),
    (b'r', 6.0),
    (b'd', 4.3),
    (b'l', 4.0),
    (b'u', 2.8),
    (b' ', 15.0),
];

/// Vigenère keys tried in order
pub const KEY_DICTIONARY: [&str; 5] = ["CYLAB", "PICO", "FLAG", "ADMIN", "PASSWORD"];

/// Confidence reported when a flag prefix shows up in the plaintext
pub const INSTANT_WIN_CONFIDENCE: f64 = 1000.0;

const FLAG_PREFIXES: [&[u8]; 2] = [b"picoCTF{", b"HTB{"];
const NON_PRINTABLE_PENALTY: f64 = 10.0;

/// Whether `data` contains a known flag prefix (case-sensitive)
pub fn contains_flag(data: &[u8]) -> bool {
    FLAG_PREFIXES
        .iter()
        .any(|prefix| data.windows(prefix.len()).any(|w| w == *prefix))
}

fn letter_weight(b: u8) -> Option<f64> {
    let lower = b.to_ascii_lowercase();
    FREQUENCY_TABLE
        .iter()
        .find(|(letter, _)| *letter == lower)
        .map(|(_, weight)| *weight)
}

/// English-likeness score of a candidate plaintext
pub fn score_plaintext(data: &[u8]) -> f64 {
    data.iter().fold(0.0, |score, &b| {
        if let Some(weight) = letter_weight(b) {
            score + weight
        } else if !(32..=126).contains(&b) && !matches!(b, b'\n' | b'\r' | b'\t') {
            score - NON_PRINTABLE_PENALTY
        } else {
            score
        }
    })
}

/// Result of the single-byte XOR search
#[derive(Debug, Clone, PartialEq)]
pub enum XorOutcome {
    /// A flag prefix appeared under `key`
    Found {
        /// Winning key
        key: u8,
        /// Decrypted bytes
        plaintext: Vec<u8>,
    },
    /// No flag; the highest scoring key
    BestGuess {
        /// Best-scoring key
        key: u8,
        /// Decrypted bytes
        plaintext: Vec<u8>,
        /// Frequency score
        score: f64,
    },
}

impl XorOutcome {
    /// The key of either outcome
    pub fn key(&self) -> u8 {
        match self {
            XorOutcome::Found { key, .. } | XorOutcome::BestGuess { key, .. } => *key,
        }
    }

    /// The plaintext of either outcome
    pub fn plaintext(&self) -> &[u8] {
        match self {
            XorOutcome::Found { plaintext, .. } | XorOutcome::BestGuess { plaintext, .. } => {
                plaintext
            }
        }
    }

    /// Frequency score, or [`INSTANT_WIN_CONFIDENCE`] for a found flag
    pub fn confidence(&self) -> f64 {
        match self {
            XorOutcome::Found { .. } => INSTANT_WIN_CONFIDENCE,
            XorOutcome::BestGuess { score, .. } => *score,
        }
    }

    /// Whether a flag was found
    pub fn is_found(&self) -> bool {
        matches!(self, XorOutcome::Found { .. })
    }

    /// Label used in reports
    pub fn algorithm(&self) -> String {
        format!("Single Byte XOR (Key: 0x{:02X})", self.key())
    }
}

/// XOR every byte with `key`
pub fn xor_with(data: &[u8], key: u8) -> Vec<u8> {
    data.iter().map(|b| b ^ key).collect()
}

/// Try all 256 keys.
///
/// Keys are visited in ascending order; the first one that exposes a flag
/// wins outright. Otherwise the highest score wins and ties keep the lower
/// key.
pub fn solve_single_byte_xor(data: &[u8]) -> XorOutcome {
    let (mut best_key, mut best_plaintext, mut best_score) = (0u8, Vec::new(), f64::NEG_INFINITY);

    for key in 0..=u8::MAX {
        let plaintext = xor_with(data, key);

        if contains_flag(&plaintext) {
            trace!("XOR key 0x{:02X} exposes a flag", key);
            return XorOutcome::Found { key, plaintext };
        }

        let score = score_plaintext(&plaintext);
        if score > best_score {
            best_key = key;
            best_plaintext = plaintext;
            best_score = score;
        }
    }

    XorOutcome::BestGuess {
        key: best_key,
        plaintext: best_plaintext,
        score: best_score,
    }
}

/// A dictionary key that decrypted to a flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VigenereHit {
    /// Dictionary key
    pub key: String,
    /// Decrypted bytes
    pub plaintext: Vec<u8>,
}

impl VigenereHit {
    /// Label used in reports
    pub fn algorithm(&self) -> String {
        format!("Vigenère (Key: {})", self.key)
    }
}

fn key_shifts(key: &str) -> Vec<u8> {
    key.bytes()
        .filter(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase() - b'A')
        .collect()
}

fn vigenere_apply(data: &[u8], key: &str, decrypt: bool) -> Vec<u8> {
    let shifts = key_shifts(key);
    if shifts.is_empty() {
        return data.to_vec();
    }

    let mut index = 0;
    data.iter()
        .map(|&b| {
            let base = match b {
                b'a'..=b'z' => b'a',
                b'A'..=b'Z' => b'A',
                _ => return b,
            };
            let shift = shifts[index % shifts.len()];
            index += 1;
            let shift = if decrypt { 26 - shift } else { shift };
            base + (b - base + shift) % 26
        })
        .collect()
}

/// Decrypt with a repeating key. Only ASCII letters consume key positions.
pub fn vigenere_decrypt(data: &[u8], key: &str) -> Vec<u8> {
    vigenere_apply(data, key, true)
}

/// Inverse of [`vigenere_decrypt`]
pub fn vigenere_encrypt(data: &[u8], key: &str) -> Vec<u8> {
    vigenere_apply(data, key, false)
}

/// Try every [`KEY_DICTIONARY`] entry and return the first that yields a
/// flag
pub fn solve_vigenere(data: &[u8]) -> Option<VigenereHit> {
    KEY_DICTIONARY.iter().find_map(|&key| {
        let plaintext = vigenere_decrypt(data, key);
        if contains_flag(&plaintext) {
            Some(VigenereHit {
                key: key.to_string(),
                plaintext,
            })
        } else {
            trace!("Vigenère key {} missed", key);
            None
        }
    })
}
